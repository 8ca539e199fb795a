//! Structural and phase errors raised by the graph itself (spec §7,
//! `StructuralError`).

use thiserror::Error;

use crate::ids::{EdgeId, NodeId};

use super::node::PhaseState;
use super::slot::SlotIndex;

/// Errors raised while building or compiling a graph (spec §7).
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("node {0:?} not found")]
    UnknownNode(NodeId),
    #[error("duplicate node name {0:?}")]
    DuplicateNodeName(String),
    #[error("node {0:?} has no input slot {1}")]
    UnknownInputSlot(NodeId, SlotIndex),
    #[error("node {0:?} has no output slot {1}")]
    UnknownOutputSlot(NodeId, SlotIndex),
    #[error("slot type mismatch connecting {source:?}.{source_slot} -> {target:?}.{target_slot}: {source_type:?} != {target_type:?}")]
    SlotTypeMismatch {
        source: NodeId,
        source_slot: SlotIndex,
        target: NodeId,
        target_slot: SlotIndex,
        source_type: crate::resource::ResourceType,
        target_type: crate::resource::ResourceType,
    },
    #[error("conflicting modifiers on edge {0:?}: {1}")]
    ConflictingModifiers(EdgeId, String),
    #[error("node {0:?} non-nullable input slot {1} is unconnected")]
    MissingRequiredInput(NodeId, SlotIndex),
    #[error("cycle detected: {0}")]
    Cycle(String),
    #[error("no node type registered under name {0:?}")]
    UnknownNodeType(String),
    #[error("RenderFrame called before a successful Compile")]
    NotCompiled,
    #[error("node {0:?} invalid operation for phase {1:?}: {2}")]
    WrongPhase(NodeId, PhaseState, &'static str),
    #[error("node {0:?} output slot {1} type mismatch: expected {2:?}, got {3:?}")]
    OutputTypeMismatch(NodeId, SlotIndex, crate::resource::ResourceType, crate::resource::ResourceType),
    #[error(transparent)]
    Resource(#[from] crate::resource::ResourceError),
}

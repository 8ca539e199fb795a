//! The immutable artifact `Compile` produces (spec §4.4, step 7).

use crate::ids::{NodeId, ResourceId};
use crate::resource::ResourceRef;

use super::slot::SlotIndex;

/// One step of the compiled execution order: a node together with the
/// bundle indices it will execute this frame.
#[derive(Debug, Clone)]
pub struct PlanStep {
    pub node: NodeId,
    pub bundle_indices: Vec<usize>,
    /// Barrier placeholders the backend-specific executor fills in before
    /// recording this node's tasks (spec §4.4, "pre/post barriers
    /// placeholder") — the core compiler only knows which resources need
    /// a barrier, not how the backend expresses one.
    pub pre_barriers: Vec<ResourceId>,
    pub post_barriers: Vec<ResourceId>,
}

impl PlanStep {
    pub fn new(node: NodeId, bundle_indices: Vec<usize>) -> Self {
        Self { node, bundle_indices, pre_barriers: Vec::new(), post_barriers: Vec::new() }
    }
}

/// A resolved input binding: which realized resource satisfies a node's
/// input slot in the compiled plan.
#[derive(Clone)]
pub struct DescriptorBinding {
    pub node: NodeId,
    pub slot: SlotIndex,
    pub resource: ResourceRef,
    /// Which of the node's bundles this binding belongs to (spec §4.1,
    /// array-slot / per-iteration bundle model).
    pub bundle_index: usize,
}

/// The immutable artifact `Compile` produces: an ordered execution plan
/// plus the resolved descriptor-binding table (spec §4.4, step 7).
///
/// Holding `ResourceRef` (`Arc<Resource>`) rather than a snapshot handle
/// in each binding is what lets the lazy-extraction invariant hold
/// across the plan's lifetime (spec §4.2).
#[derive(Clone, Default)]
pub struct ExecutionPlan {
    pub steps: Vec<PlanStep>,
    pub bindings: Vec<DescriptorBinding>,
}

impl ExecutionPlan {
    pub fn bindings_for(&self, node: NodeId) -> impl Iterator<Item = &DescriptorBinding> {
        self.bindings.iter().filter(move |b| b.node == node)
    }

    pub fn step_for(&self, node: NodeId) -> Option<&PlanStep> {
        self.steps.iter().find(|s| s.node == node)
    }
}

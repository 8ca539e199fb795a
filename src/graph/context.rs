//! Phase contexts: the only way a node's [`NodeBehavior`](super::node::NodeBehavior)
//! implementation may touch inputs, outputs, or resources (spec §4.1,
//! "Contract").

use std::collections::HashMap;

use crate::ids::NodeId;
use crate::resource::{ResourceDescriptor, ResourceHandleValue, ResourceRef, ResourceType};

use super::error::GraphError;
use super::node::Bundle;
use super::slot::{NodeSchema, SlotIndex};
use super::task::VirtualTask;

/// A node parameter value, drawn from the same closed type registry as
/// resources (spec §3, "typed parameters").
pub type ParamValue = ResourceHandleValue;

/// Setup phase: read parameters, read input slot *types* (not values);
/// must not submit GPU work (spec §4.1).
pub struct SetupContext<'a> {
    node: NodeId,
    schema: &'a NodeSchema,
    params: &'a HashMap<String, ParamValue>,
}

impl<'a> SetupContext<'a> {
    pub fn new(node: NodeId, schema: &'a NodeSchema, params: &'a HashMap<String, ParamValue>) -> Self {
        Self { node, schema, params }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    /// The declared type of input slot `slot`, without reading its value
    /// (spec §4.1, "may read input slot *types* but not values").
    pub fn input_type(&self, slot: SlotIndex) -> Option<ResourceType> {
        self.schema.input(slot).map(|s| s.resource_type)
    }
}

/// Compile phase: read inputs, request resource descriptors, publish
/// output resources. Failure here is recoverable and marks the node
/// Dirty for retry (spec §4.1).
pub struct CompileContext<'a> {
    node: NodeId,
    schema: &'a NodeSchema,
    bundle: &'a Bundle,
    params: &'a HashMap<String, ParamValue>,
    published: Vec<(SlotIndex, usize, ResourceRef)>,
}

impl<'a> CompileContext<'a> {
    pub fn new(node: NodeId, schema: &'a NodeSchema, bundle: &'a Bundle, params: &'a HashMap<String, ParamValue>) -> Self {
        Self { node, schema, bundle, params, published: Vec::new() }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    /// `In<S>()`: a reference to input slot `S`'s realized resource
    /// (spec §4.1).
    pub fn input(&self, slot: SlotIndex) -> Result<&ResourceRef, GraphError> {
        self.schema.input(slot).ok_or(GraphError::UnknownInputSlot(self.node, slot))?;
        self.bundle.input(slot as usize).ok_or(GraphError::MissingRequiredInput(self.node, slot))
    }

    /// `GetInputCount<S>()`: how many resources an array input slot's
    /// fused collection currently holds (spec §4.1).
    pub fn input_count(&self, slot: SlotIndex) -> usize {
        self.bundle.input_count(slot as usize)
    }

    /// `GetInputResource<S>(i)`: the `i`-th resource in an array input
    /// slot's fused collection (spec §4.1).
    pub fn input_at(&self, slot: SlotIndex, index: usize) -> Result<&ResourceRef, GraphError> {
        self.schema.input(slot).ok_or(GraphError::UnknownInputSlot(self.node, slot))?;
        self.bundle.input_at(slot as usize, index).ok_or(GraphError::MissingRequiredInput(self.node, slot))
    }

    /// Replace a resource's descriptor; legal only here and at Setup, per
    /// the resource system's phase-gating invariant (spec §4.2).
    pub fn set_descriptor(&self, resource: &ResourceRef, descriptor: ResourceDescriptor) -> Result<(), GraphError> {
        resource.set_descriptor(descriptor).map_err(Into::into)
    }

    /// `Out<S>(resource)`: publish a resource on output slot `S` of this
    /// node's bundle 0; the resource's type tag must match the slot's
    /// declared type (spec §4.1). A thin wrapper over
    /// [`publish_output_indexed`](Self::publish_output_indexed) for
    /// nodes that don't produce a per-iteration bundle array.
    pub fn publish_output(&mut self, slot: SlotIndex, resource: ResourceRef) -> Result<(), GraphError> {
        self.publish_output_indexed(slot, 0, resource)
    }

    /// `Out<S>(resource)` targeting bundle `bundle_index` explicitly
    /// (spec §4.1, per-iteration bundle model): the caller writes the
    /// published outputs into `bundles[bundle_index]`, resizing the
    /// node's bundle array first if necessary.
    pub fn publish_output_indexed(&mut self, slot: SlotIndex, bundle_index: usize, resource: ResourceRef) -> Result<(), GraphError> {
        let decl = self.schema.output(slot).ok_or(GraphError::UnknownOutputSlot(self.node, slot))?;
        if resource.type_tag() != decl.resource_type {
            return Err(GraphError::OutputTypeMismatch(self.node, slot, decl.resource_type, resource.type_tag()));
        }
        self.published.push((slot, bundle_index, resource));
        Ok(())
    }

    pub fn into_published(self) -> Vec<(SlotIndex, usize, ResourceRef)> {
        self.published
    }
}

/// Execute phase: read fully realized inputs, write outputs, emit virtual
/// tasks for the scheduler (spec §4.1, §4.5).
pub struct ExecuteContext<'a> {
    node: NodeId,
    schema: &'a NodeSchema,
    bundle: &'a Bundle,
    tasks: Vec<VirtualTask>,
}

impl<'a> ExecuteContext<'a> {
    pub fn new(node: NodeId, schema: &'a NodeSchema, bundle: &'a Bundle) -> Self {
        Self { node, schema, bundle, tasks: Vec::new() }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn input(&self, slot: SlotIndex) -> Result<&ResourceRef, GraphError> {
        self.schema.input(slot).ok_or(GraphError::UnknownInputSlot(self.node, slot))?;
        self.bundle.input(slot as usize).ok_or(GraphError::MissingRequiredInput(self.node, slot))
    }

    /// `GetInputCount<S>()` (spec §4.1).
    pub fn input_count(&self, slot: SlotIndex) -> usize {
        self.bundle.input_count(slot as usize)
    }

    /// `GetInputResource<S>(i)` (spec §4.1).
    pub fn input_at(&self, slot: SlotIndex, index: usize) -> Result<&ResourceRef, GraphError> {
        self.schema.input(slot).ok_or(GraphError::UnknownInputSlot(self.node, slot))?;
        self.bundle.input_at(slot as usize, index).ok_or(GraphError::MissingRequiredInput(self.node, slot))
    }

    /// Queue one virtual task for the scheduler to run this frame.
    pub fn emit_task(&mut self, task: VirtualTask) {
        self.tasks.push(task);
    }

    /// `CreateParallelTasks(executeBundle)`: emit one task per bundle,
    /// each built by `make` (spec §4.5, "Parallelism helper").
    pub fn create_parallel_tasks(&mut self, bundle_count: usize, make: impl Fn(usize) -> VirtualTask) {
        for i in 0..bundle_count {
            self.tasks.push(make(i));
        }
    }

    pub fn into_tasks(self) -> Vec<VirtualTask> {
        self.tasks
    }
}

/// Cleanup phase: release owned resources. Must be idempotent (spec
/// §4.1).
pub struct CleanupContext {
    node: NodeId,
}

impl CleanupContext {
    pub fn new(node: NodeId) -> Self {
        Self { node }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }
}

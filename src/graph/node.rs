//! Node lifecycle state and the per-instance bundle storage (spec §3,
//! §4.1).

use std::collections::HashMap;

use crate::ids::ResourceId;
use crate::resource::{ResourceHandleValue, ResourceRef};

use super::context::{CleanupContext, CompileContext, ExecuteContext, SetupContext};
use super::error::GraphError;
use super::slot::NodeSchema;

/// A node's current position in its Setup → Compile → Execute → Cleanup
/// lifecycle (spec §3, "phase state").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseState {
    Declared,
    Setup,
    Compiled,
    Dirty,
    Executing,
    Cleaned,
}

/// One cell of a node's input/output arrays, corresponding to one
/// iteration of an array slot (spec §3, "Bundle"; GLOSSARY).
///
/// An input slot holds a collection rather than a single resource: most
/// slots carry exactly one entry, but a slot fed by more than one edge
/// (or by an edge carrying a `GroupKey`/`Sort` modifier) fuses its
/// producers' outputs into an ordered collection here (spec §4.3,
/// "Accumulation / Grouping / Sort").
#[derive(Default)]
pub struct Bundle {
    inputs: Vec<Vec<ResourceRef>>,
    outputs: Vec<Option<ResourceRef>>,
}

impl Bundle {
    pub fn new(input_count: usize, output_count: usize) -> Self {
        Self { inputs: vec![Vec::new(); input_count], outputs: vec![None; output_count] }
    }

    /// `In<S>()`: the first (and ordinarily only) resource on input slot
    /// `slot`.
    pub fn input(&self, slot: usize) -> Option<&ResourceRef> {
        self.inputs.get(slot).and_then(|v| v.first())
    }

    /// `GetInputCount<S>()` (spec §4.1, array-slot contract).
    pub fn input_count(&self, slot: usize) -> usize {
        self.inputs.get(slot).map_or(0, Vec::len)
    }

    /// `GetInputResource<S>(i)` (spec §4.1, array-slot contract).
    pub fn input_at(&self, slot: usize, index: usize) -> Option<&ResourceRef> {
        self.inputs.get(slot).and_then(|v| v.get(index))
    }

    pub fn set_input(&mut self, slot: usize, resource: ResourceRef) {
        if let Some(cell) = self.inputs.get_mut(slot) {
            *cell = vec![resource];
        }
    }

    /// Replace an accumulation slot's whole fused collection at once
    /// (spec §4.3).
    pub fn set_input_collection(&mut self, slot: usize, resources: Vec<ResourceRef>) {
        if let Some(cell) = self.inputs.get_mut(slot) {
            *cell = resources;
        }
    }

    pub fn clear_input(&mut self, slot: usize) {
        if let Some(cell) = self.inputs.get_mut(slot) {
            cell.clear();
        }
    }

    /// Whether `resource` is one of this bundle's entries on `slot`, used
    /// by lifetime analysis to find a resource's last consumer across
    /// accumulation slots (spec §4.4, step 4).
    pub fn input_contains(&self, slot: usize, resource: ResourceId) -> bool {
        self.inputs.get(slot).is_some_and(|v| v.iter().any(|r| r.id() == resource))
    }

    pub fn output(&self, slot: usize) -> Option<&ResourceRef> {
        self.outputs.get(slot).and_then(|s| s.as_ref())
    }

    /// `Out<S>(resource)`: publish into bundle-local output slot `S`
    /// (indexing *which bundle* a multi-bundle Compile output lands in
    /// happens one level up, in `Node::run_compile`'s caller).
    pub fn set_output(&mut self, slot: usize, resource: ResourceRef) {
        if let Some(cell) = self.outputs.get_mut(slot) {
            *cell = Some(resource);
        }
    }
}

/// The phase hooks a node type implements (spec §4.1).
///
/// Dispatch is through the phase context object passed to each hook, not
/// through additional trait methods the framework would have to expose
/// to authors beyond these four (spec §9, "Polymorphic nodes" — "dispatch
/// is through the phase context, not a base class with virtual methods
/// exposed to authors").
pub trait NodeBehavior: Send + Sync {
    /// Read parameters, allocate persistent CPU resources. Must not
    /// submit GPU work.
    fn setup(&mut self, ctx: &mut SetupContext) -> Result<(), GraphError> {
        let _ = ctx;
        Ok(())
    }

    /// Read inputs, request resource descriptors, create derived
    /// resources via caches, register cleanup actions. Failure here is
    /// recoverable and marks the node Dirty for retry.
    fn compile(&mut self, ctx: &mut CompileContext) -> Result<(), GraphError>;

    /// Read fully realized inputs, write outputs, record GPU commands.
    /// Failure here aborts the frame.
    fn execute(&mut self, ctx: &mut ExecuteContext) -> Result<(), GraphError>;

    /// Release owned resources. Must be idempotent.
    fn cleanup(&mut self, ctx: &mut CleanupContext) {
        let _ = ctx;
    }
}

/// One node instance in the graph (spec §3, "Node").
pub struct Node {
    name: String,
    type_name: &'static str,
    schema: NodeSchema,
    phase: PhaseState,
    /// Order in which `AddNode` was called; used to break topological-sort
    /// ties deterministically (spec §4.4).
    creation_index: u64,
    bundles: Vec<Bundle>,
    behavior: Box<dyn NodeBehavior>,
    params: HashMap<String, ResourceHandleValue>,
}

impl Node {
    pub fn new(name: String, type_name: &'static str, schema: NodeSchema, creation_index: u64, behavior: Box<dyn NodeBehavior>) -> Self {
        let bundle = Bundle::new(schema.inputs.len(), schema.outputs.len());
        Self {
            name,
            type_name,
            schema,
            phase: PhaseState::Declared,
            creation_index,
            bundles: vec![bundle],
            behavior,
            params: HashMap::new(),
        }
    }

    /// `SetParameter(handle, name, value)` (spec §6, author surface).
    pub fn set_param(&mut self, name: impl Into<String>, value: ResourceHandleValue) {
        self.params.insert(name.into(), value);
    }

    pub fn params(&self) -> &HashMap<String, ResourceHandleValue> {
        &self.params
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn schema(&self) -> &NodeSchema {
        &self.schema
    }

    pub fn phase(&self) -> PhaseState {
        self.phase
    }

    pub fn set_phase(&mut self, phase: PhaseState) {
        self.phase = phase;
    }

    pub fn creation_index(&self) -> u64 {
        self.creation_index
    }

    pub fn bundle(&self, index: usize) -> Option<&Bundle> {
        self.bundles.get(index)
    }

    pub fn bundle_mut(&mut self, index: usize) -> Option<&mut Bundle> {
        self.bundles.get_mut(index)
    }

    pub fn bundle_count(&self) -> usize {
        self.bundles.len()
    }

    /// Resize the bundle array, used when an array input/output's count
    /// changes (spec §3, "per-instance bundles").
    pub fn resize_bundles(&mut self, count: usize) {
        self.bundles.resize_with(count, || Bundle::new(self.schema.inputs.len(), self.schema.outputs.len()));
    }

    pub fn behavior_mut(&mut self) -> &mut dyn NodeBehavior {
        self.behavior.as_mut()
    }

    /// Run the Setup hook through a freshly built [`SetupContext`] (spec
    /// §4.1). Exists on `Node` itself, rather than being assembled by the
    /// compiler, so the disjoint borrows of `schema`/`params`/`behavior`
    /// stay within one function body.
    pub fn run_setup(&mut self, node_id: crate::ids::NodeId) -> Result<(), GraphError> {
        let params = self.params.clone();
        let schema = &self.schema;
        let mut ctx = SetupContext::new(node_id, schema, &params);
        self.behavior.setup(&mut ctx)
    }

    /// Run the Compile hook, returning whatever outputs it published,
    /// each tagged with the bundle index it was published into (spec
    /// §4.1). The caller is responsible for writing these into the
    /// corresponding bundle's output slots, resizing `bundles` first if a
    /// published index doesn't exist yet.
    pub fn run_compile(
        &mut self,
        node_id: crate::ids::NodeId,
        bundle_index: usize,
    ) -> Result<Vec<(super::slot::SlotIndex, usize, ResourceRef)>, GraphError> {
        let params = self.params.clone();
        let schema = &self.schema;
        let bundle = self.bundles.get(bundle_index).ok_or(GraphError::UnknownNode(node_id))?;
        let mut ctx = CompileContext::new(node_id, schema, bundle, &params);
        self.behavior.compile(&mut ctx)?;
        Ok(ctx.into_published())
    }

    /// Run the Execute hook, returning the virtual tasks it emitted (spec
    /// §4.1, §4.5).
    pub fn run_execute(
        &mut self,
        node_id: crate::ids::NodeId,
        bundle_index: usize,
    ) -> Result<Vec<super::task::VirtualTask>, GraphError> {
        let schema = &self.schema;
        let bundle = self.bundles.get(bundle_index).ok_or(GraphError::UnknownNode(node_id))?;
        let mut ctx = ExecuteContext::new(node_id, schema, bundle);
        self.behavior.execute(&mut ctx)?;
        Ok(ctx.into_tasks())
    }

    /// Run the Cleanup hook. Must be idempotent (spec §4.1).
    pub fn run_cleanup(&mut self, node_id: crate::ids::NodeId) {
        let mut ctx = CleanupContext::new(node_id);
        self.behavior.cleanup(&mut ctx);
    }
}

//! The top-level `Graph`: owns every node and edge, and exposes the
//! author-facing surface (spec §6, "Graph-builder API").

use std::collections::{HashMap, HashSet};

use crate::event_bus::{EventBus, GraphEvent};
use crate::ids::NodeId;
use crate::lifetime::AliasPlan;
use crate::resource::ResourceHandleValue;

use super::compiler::Compiler;
use super::edge::Modifier;
use super::error::GraphError;
use super::node::{Node, NodeBehavior, PhaseState};
use super::plan::ExecutionPlan;
use super::rules::{build_edge, default_rules, validate_connection, ConnectionContext, ConnectionRule};
use super::slot::{NodeSchema, SlotIndex};
use super::task::VirtualTask;
use super::topology::Topology;

/// Constructs a fresh schema and behavior instance for one node type,
/// registered under the name passed to `AddNode` (spec §6).
pub type NodeFactory = Box<dyn Fn() -> (NodeSchema, Box<dyn NodeBehavior>) + Send + Sync>;

/// What `RenderFrame` hands back: the frame it just recorded plus every
/// virtual task emitted by the plan's nodes, left unexecuted for the
/// scheduler to run (spec §4.5 — the scheduler sits above the graph in
/// the dependency order, so `Graph` never runs a task itself).
pub struct FrameResult {
    pub frame_number: u64,
    pub tasks: Vec<VirtualTask>,
}

/// A render graph instance (spec §3, "Node & Slot Model"; §6, author
/// surface). Owns the node set, the edge list, the dependency topology,
/// and the most recent compiled plan.
pub struct Graph {
    nodes: HashMap<NodeId, Node>,
    edges: Vec<super::edge::Edge>,
    topology: Topology,
    creation_index: HashMap<NodeId, u64>,
    next_creation_index: u64,
    next_node_id: crate::foundation::collections::HandleMap<()>,
    dirty: HashSet<NodeId>,
    plan: Option<ExecutionPlan>,
    alias_plan: Option<AliasPlan>,
    rules: Vec<Box<dyn ConnectionRule>>,
    factories: HashMap<String, NodeFactory>,
    event_bus: EventBus,
    frame_number: u64,
}

impl Graph {
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            nodes: HashMap::new(),
            edges: Vec::new(),
            topology: Topology::new(),
            creation_index: HashMap::new(),
            next_creation_index: 0,
            next_node_id: crate::foundation::collections::HandleMap::new(),
            dirty: HashSet::new(),
            plan: None,
            alias_plan: None,
            rules: default_rules(),
            factories: HashMap::new(),
            event_bus,
            frame_number: 0,
        }
    }

    /// Register a node type's constructor under `type_name`, making it a
    /// valid first argument to [`Graph::add_node`].
    pub fn register_node_type(&mut self, type_name: impl Into<String>, factory: NodeFactory) {
        self.factories.insert(type_name.into(), factory);
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn plan(&self) -> Option<&ExecutionPlan> {
        self.plan.as_ref()
    }

    pub fn alias_plan(&self) -> Option<&AliasPlan> {
        self.alias_plan.as_ref()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// `AddNode(typeName, instanceName) -> NodeHandle` (spec §6).
    pub fn add_node(&mut self, type_name: &str, instance_name: impl Into<String>) -> Result<NodeId, GraphError> {
        let factory = self.factories.get(type_name).ok_or_else(|| GraphError::UnknownNodeType(type_name.to_string()))?;
        let (schema, behavior) = factory();

        let creation_index = self.next_creation_index;
        self.next_creation_index += 1;

        let id: NodeId = crate::foundation::collections::TypedHandle::new(self.next_node_id.insert(()));
        let node = Node::new(instance_name.into(), type_name_static(type_name), schema, creation_index, behavior);

        self.nodes.insert(id, node);
        self.creation_index.insert(id, creation_index);
        self.topology.add_node(id);
        self.dirty.insert(id);
        Ok(id)
    }

    /// `SetParameter(handle, name, value)` (spec §6). Cascades Dirty to
    /// every transitive dependent, since a parameter change can change
    /// what the node publishes (spec §4.4, "Dirty-set recompile").
    pub fn set_parameter(&mut self, node: NodeId, name: impl Into<String>, value: ResourceHandleValue) -> Result<(), GraphError> {
        let n = self.nodes.get_mut(&node).ok_or(GraphError::UnknownNode(node))?;
        n.set_param(name, value);
        self.mark_dirty_cascade(node);
        Ok(())
    }

    /// `Connect(source, sourceSlot, target, targetSlot, modifiers)` (spec
    /// §6, §4.3). Runs the full connection-rule pipeline before the edge
    /// is recorded; a rejected edge leaves the graph unchanged.
    pub fn connect(
        &mut self,
        source: NodeId,
        source_slot: SlotIndex,
        target: NodeId,
        target_slot: SlotIndex,
        modifiers: Vec<Modifier>,
    ) -> Result<(), GraphError> {
        let source_type = self
            .nodes
            .get(&source)
            .ok_or(GraphError::UnknownNode(source))?
            .schema()
            .output(source_slot)
            .ok_or(GraphError::UnknownOutputSlot(source, source_slot))?
            .resource_type;
        let target_input = self
            .nodes
            .get(&target)
            .ok_or(GraphError::UnknownNode(target))?
            .schema()
            .input(target_slot)
            .ok_or(GraphError::UnknownInputSlot(target, target_slot))?;
        let target_type = target_input.resource_type;
        let target_array = target_input.array;
        let target_role = target_input.role;

        let ctx = ConnectionContext {
            source,
            source_slot,
            target,
            target_slot,
            source_type,
            target_type,
            modifiers: &modifiers,
            target_array,
        };
        validate_connection(&self.rules, &ctx)?;

        let edge = build_edge(&ctx);
        if edge.carries_dependency(target_role) {
            self.topology.add_edge(source, target);
        }
        self.edges.push(edge);
        self.mark_dirty_cascade(target);
        Ok(())
    }

    /// `RemoveNode(handle)` (spec §6). Dependents are marked Dirty so the
    /// next `Compile` notices their missing input.
    pub fn remove_node(&mut self, node: NodeId) {
        let dependents = self.topology.transitive_dependents(node);

        self.nodes.remove(&node);
        self.topology.remove_node(node);
        self.edges.retain(|e| e.source != node && e.target != node);
        self.dirty.remove(&node);
        self.creation_index.remove(&node);

        self.event_bus.publish(GraphEvent::NodeRemoved { node });
        for dependent in dependents {
            self.mark_dirty_cascade(dependent);
        }
    }

    /// `Compile()` (spec §6, §4.4). Runs the full multi-phase compile
    /// pipeline over every node currently in the graph; nodes not in
    /// Declared/Dirty phase reuse their last-published bundle outputs.
    pub fn compile(&mut self) -> Result<(), GraphError> {
        let (plan, alias_plan) = Compiler::compile(&mut self.nodes, &self.edges, &self.topology, &self.creation_index)?;
        self.plan = Some(plan);
        self.alias_plan = Some(alias_plan);
        self.dirty.clear();
        self.event_bus.publish(GraphEvent::GraphCompilationComplete);
        Ok(())
    }

    /// `RenderFrame() -> FrameResult` (spec §6). Walks the compiled plan
    /// in order, running each node's Execute hook and collecting the
    /// virtual tasks it emits; the caller (normally `scheduler::Executor`)
    /// is responsible for actually running them.
    pub fn render_frame(&mut self) -> Result<FrameResult, GraphError> {
        let steps = self.plan.as_ref().ok_or(GraphError::NotCompiled)?.steps.clone();

        let frame_number = self.frame_number;
        self.event_bus.publish(GraphEvent::FrameStart { frame_number, timestamp: frame_number as f64 });

        let mut tasks = Vec::new();
        for step in &steps {
            for &bundle_index in &step.bundle_indices {
                if let Some(node) = self.nodes.get_mut(&step.node) {
                    node.set_phase(PhaseState::Executing);
                    tasks.extend(node.run_execute(step.node, bundle_index)?);
                    node.set_phase(PhaseState::Compiled);
                }
            }
        }

        self.frame_number += 1;
        Ok(FrameResult { frame_number, tasks })
    }

    /// `Shutdown()` (spec §6). Runs every node's Cleanup hook; must be
    /// safe to call even if `Compile`/`RenderFrame` never ran.
    pub fn shutdown(&mut self) {
        self.event_bus.publish(GraphEvent::ApplicationShuttingDown);
        for (&id, node) in self.nodes.iter_mut() {
            node.run_cleanup(id);
            node.set_phase(PhaseState::Cleaned);
        }
    }

    fn mark_dirty_cascade(&mut self, node: NodeId) {
        let mut to_mark = vec![node];
        to_mark.extend(self.topology.transitive_dependents(node));
        for n in to_mark {
            if let Some(node) = self.nodes.get_mut(&n) {
                if node.phase() != PhaseState::Declared {
                    node.set_phase(PhaseState::Dirty);
                }
            }
            if self.dirty.insert(n) {
                self.event_bus.publish(GraphEvent::NodeDirty { node: n });
            }
        }
    }
}

/// Node type names are supplied by callers as `&str`, but `Node::type_name`
/// stores a `&'static str` (it's expected to be a literal at each call
/// site); leak is a one-time cost paid once per distinct type name over
/// the graph's lifetime, not per node instance.
fn type_name_static(type_name: &str) -> &'static str {
    Box::leak(type_name.to_string().into_boxed_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::context::{CompileContext, ExecuteContext};
    use crate::graph::slot::{InputSlotDesc, OutputSlotDesc};
    use crate::resource::{BufferDescriptor, LifetimeClass, MemoryLocation, Resource, ResourceDescriptor, ResourceScope, ResourceType};
    use std::sync::Arc;

    struct ProducerBehavior;
    impl NodeBehavior for ProducerBehavior {
        fn compile(&mut self, ctx: &mut CompileContext) -> Result<(), GraphError> {
            let resource = Arc::new(
                Resource::new(
                    crate::ids::ResourceId::default(),
                    ResourceType::Buffer,
                    ResourceDescriptor::Buffer(BufferDescriptor::new(256, 0)),
                    LifetimeClass::Transient,
                    ResourceScope::NodeLevel,
                    256,
                    MemoryLocation::DeviceLocal,
                )
                .unwrap(),
            );
            resource.publish_handle(crate::resource::ResourceHandleValue::Buffer(1));
            ctx.publish_output(0, resource)
        }
        fn execute(&mut self, _ctx: &mut ExecuteContext) -> Result<(), GraphError> {
            Ok(())
        }
    }

    struct ConsumerBehavior;
    impl NodeBehavior for ConsumerBehavior {
        fn compile(&mut self, ctx: &mut CompileContext) -> Result<(), GraphError> {
            let input = ctx.input(0)?.clone();
            ctx.publish_output(0, input)
        }
        fn execute(&mut self, _ctx: &mut ExecuteContext) -> Result<(), GraphError> {
            Ok(())
        }
    }

    fn new_graph() -> Graph {
        let mut graph = Graph::new(EventBus::default());
        graph.register_node_type(
            "producer",
            Box::new(|| {
                let schema = NodeSchema::new(vec![], vec![OutputSlotDesc::new(0, "out", ResourceType::Buffer, LifetimeClass::Transient)]);
                (schema, Box::new(ProducerBehavior) as Box<dyn NodeBehavior>)
            }),
        );
        graph.register_node_type(
            "consumer",
            Box::new(|| {
                let schema = NodeSchema::new(
                    vec![InputSlotDesc::new(0, "in", ResourceType::Buffer)],
                    vec![OutputSlotDesc::new(0, "out", ResourceType::Buffer, LifetimeClass::Transient)],
                );
                (schema, Box::new(ConsumerBehavior) as Box<dyn NodeBehavior>)
            }),
        );
        graph
    }

    #[test]
    fn add_connect_compile_and_render_a_two_node_chain() {
        let mut graph = new_graph();
        let a = graph.add_node("producer", "A").unwrap();
        let b = graph.add_node("consumer", "B").unwrap();
        graph.connect(a, 0, b, 0, vec![]).unwrap();

        graph.compile().unwrap();
        assert!(graph.plan().is_some());

        let result = graph.render_frame().unwrap();
        assert_eq!(result.frame_number, 0);

        graph.shutdown();
    }

    #[test]
    fn render_frame_before_compile_is_rejected() {
        let mut graph = new_graph();
        let result = graph.render_frame();
        assert!(matches!(result, Err(GraphError::NotCompiled)));
    }

    #[test]
    fn unknown_node_type_is_rejected() {
        let mut graph = new_graph();
        assert!(graph.add_node("nonexistent", "X").is_err());
    }

    #[test]
    fn removing_a_node_drops_its_edges() {
        let mut graph = new_graph();
        let a = graph.add_node("producer", "A").unwrap();
        let b = graph.add_node("consumer", "B").unwrap();
        graph.connect(a, 0, b, 0, vec![]).unwrap();
        graph.remove_node(a);
        assert!(graph.node(a).is_none());
        assert!(graph.compile().is_err()); // B's required input is now unconnected
    }
}

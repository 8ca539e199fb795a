//! Multi-phase compiler (spec §4.4): Validate → Setup walk → Compile walk
//! → Lifetime analysis → Aliasing → Plan emission.
//!
//! Pipeline/descriptor-layout materialization (step 6) is left to node
//! authors calling into a [`crate::cache::ContentCache`] from inside
//! their own `compile` hook; the compiler has no generic notion of
//! "the" pipeline cache to drive centrally.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::ids::{NodeId, ResourceId};
use crate::lifetime::{compute_aliasing, AliasPlan, ResourceInterval};
use crate::resource::{MemoryLocation, ResourceHandleValue, ResourceRef};

use super::edge::{Edge, Modifier, SortOrder};
use super::error::GraphError;
use super::node::{Node, PhaseState};
use super::plan::{DescriptorBinding, ExecutionPlan, PlanStep};
use super::slot::SlotIndex;
use super::topology::Topology;

/// A modifier's projected key, drawn from the producing node's own
/// parameters (spec §4.3, "the key is projected from the producing
/// node, resources themselves carry no key fields").
#[derive(Debug, Clone, PartialEq)]
enum ProjectedKey {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl ProjectedKey {
    fn from_param(value: &ResourceHandleValue) -> Option<Self> {
        match value {
            ResourceHandleValue::Int(v) => Some(Self::Int(*v)),
            ResourceHandleValue::Float(v) => Some(Self::Float(*v)),
            ResourceHandleValue::String(v) => Some(Self::Text(v.clone())),
            ResourceHandleValue::Bool(v) => Some(Self::Bool(*v)),
            _ => None,
        }
    }

    fn cmp_value(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

fn project_key(params: &HashMap<String, ResourceHandleValue>, field: &str) -> Option<ProjectedKey> {
    params.get(field).and_then(ProjectedKey::from_param)
}

/// The key field named by an edge's `GroupKey` or explicit-key `Sort`
/// modifier, if any (`Sort::Custom` carries no field name the compiler
/// can project against — left to the node author, spec §4.3's
/// documented limitation on custom comparators).
fn key_field_of(edge: &Edge) -> Option<&'static str> {
    edge.modifiers.iter().find_map(|m| match m {
        Modifier::GroupKey { key_field } => Some(*key_field),
        Modifier::Sort(SortOrder::Ascending { key_field } | SortOrder::Descending { key_field }) => Some(*key_field),
        _ => None,
    })
}

/// Runs the compile pipeline over a node set (spec §4.4).
pub struct Compiler;

impl Compiler {
    /// Compile `nodes` following `topology`'s dependency edges. Only
    /// nodes in `Declared`/`Dirty` phase re-run Setup/Compile; nodes
    /// already `Compiled` keep their previously published bundle outputs
    /// so downstream wiring still sees them (spec §4.4, "recompile walks
    /// only the transitive dependent set... must reuse cached artifacts
    /// whose content hash is unchanged"). Scoping the walk to only the
    /// dirty transitive-dependent set is the caller's job (`graph::Graph`
    /// marks nodes Dirty via `topology::transitive_dependents` before
    /// calling this).
    pub fn compile(
        nodes: &mut HashMap<NodeId, Node>,
        edges: &[Edge],
        topology: &Topology,
        creation_index: &HashMap<NodeId, u64>,
    ) -> Result<(ExecutionPlan, AliasPlan), GraphError> {
        Self::validate(nodes, edges)?;

        let order = topology.topological_order(creation_index).map_err(|cycle| {
            let names: Vec<String> = cycle.iter().map(|n| format!("{n:?}")).collect();
            GraphError::Cycle(names.join(" -> "))
        })?;
        let index_of: HashMap<NodeId, usize> = order.iter().enumerate().map(|(i, &n)| (n, i)).collect();

        Self::setup_walk(nodes, &order)?;
        Self::compile_walk(nodes, edges, &order)?;

        let intervals = Self::lifetime_analysis(nodes, &order, &edges, &index_of);
        let alias_plan = Self::alias_by_location(nodes, &order, intervals);

        let plan = Self::emit_plan(nodes, &order);
        Ok((plan, alias_plan))
    }

    /// Step 1: every non-nullable input must be connected (slot-type
    /// agreement is already enforced by `graph::rules` at `Connect` time).
    fn validate(nodes: &HashMap<NodeId, Node>, edges: &[Edge]) -> Result<(), GraphError> {
        for (&node_id, node) in nodes.iter() {
            for input in &node.schema().inputs {
                if input.nullable {
                    continue;
                }
                let connected = edges.iter().any(|e| e.target == node_id && e.target_slot == input.index);
                if !connected {
                    return Err(GraphError::MissingRequiredInput(node_id, input.index));
                }
            }
        }
        Ok(())
    }

    /// Step 2: Setup each Declared/Dirty node in topological order.
    fn setup_walk(nodes: &mut HashMap<NodeId, Node>, order: &[NodeId]) -> Result<(), GraphError> {
        for &node_id in order {
            let phase = nodes.get(&node_id).map(|n| n.phase()).ok_or(GraphError::UnknownNode(node_id))?;
            if matches!(phase, PhaseState::Declared | PhaseState::Dirty) {
                nodes.get_mut(&node_id).unwrap().run_setup(node_id)?;
                nodes.get_mut(&node_id).unwrap().set_phase(PhaseState::Setup);
            }
        }
        Ok(())
    }

    /// Step 3: wire each node's bundle-0 inputs from its producers'
    /// already-published outputs (fusing multi-edge/accumulation slots
    /// into a collection per spec §4.3), then Compile in topological
    /// order. A Compile failure demotes the node back to Dirty and aborts
    /// (spec §4.4, step 3: "Failure demotes the node to Dirty and aborts;
    /// the caller may retry").
    fn compile_walk(nodes: &mut HashMap<NodeId, Node>, edges: &[Edge], order: &[NodeId]) -> Result<(), GraphError> {
        for &node_id in order {
            Self::wire_inputs(nodes, edges, node_id);

            let phase = nodes.get(&node_id).map(|n| n.phase()).ok_or(GraphError::UnknownNode(node_id))?;
            if phase != PhaseState::Setup {
                continue;
            }

            match nodes.get_mut(&node_id).unwrap().run_compile(node_id, 0) {
                Ok(published) => {
                    let max_bundle = published.iter().map(|(_, idx, _)| *idx).max();
                    let node = nodes.get_mut(&node_id).unwrap();
                    if let Some(max_bundle) = max_bundle {
                        if max_bundle + 1 > node.bundle_count() {
                            node.resize_bundles(max_bundle + 1);
                        }
                    }
                    for (slot, bundle_index, resource) in published {
                        if let Some(bundle) = node.bundle_mut(bundle_index) {
                            bundle.set_output(slot as usize, resource);
                        }
                    }
                    node.set_phase(PhaseState::Compiled);
                }
                Err(err) => {
                    if let Some(node) = nodes.get_mut(&node_id) {
                        node.set_phase(PhaseState::Dirty);
                    }
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// Gather a producer's published output at `slot` across every one
    /// of its bundles (spec §3, per-iteration bundle array).
    fn source_outputs(nodes: &HashMap<NodeId, Node>, source: NodeId, slot: SlotIndex) -> Vec<ResourceRef> {
        let Some(node) = nodes.get(&source) else { return Vec::new() };
        (0..node.bundle_count()).filter_map(|i| node.bundle(i).and_then(|b| b.output(slot as usize)).cloned()).collect()
    }

    /// Wire one node's bundle-0 inputs from its incoming edges. A slot
    /// fed by exactly one non-accumulation edge keeps the old
    /// single-resource semantics; a slot fed by more than one edge, or by
    /// any edge carrying a `GroupKey`/`Sort` modifier, fuses every
    /// contributing edge's source outputs into an ordered collection
    /// (spec §4.3, "Accumulation / Grouping / Sort"). Grouping/sorting
    /// keys are projected from the *producing node's* own parameters,
    /// since resources themselves carry no key fields.
    fn wire_inputs(nodes: &mut HashMap<NodeId, Node>, edges: &[Edge], node_id: NodeId) {
        let incoming: Vec<&Edge> = edges.iter().filter(|e| e.target == node_id).collect();

        let mut by_slot: HashMap<SlotIndex, Vec<&Edge>> = HashMap::new();
        for edge in incoming {
            by_slot.entry(edge.target_slot).or_default().push(edge);
        }

        for (slot, slot_edges) in by_slot {
            let accumulates = slot_edges.len() > 1 || slot_edges.iter().any(|e| e.is_accumulation());

            if !accumulates {
                let Some(edge) = slot_edges.first() else { continue };
                if let Some(resource) = Self::source_outputs(nodes, edge.source, edge.source_slot).into_iter().next() {
                    if let Some(node) = nodes.get_mut(&node_id) {
                        if let Some(bundle) = node.bundle_mut(0) {
                            bundle.set_input(slot as usize, resource);
                        }
                    }
                }
                continue;
            }

            let mut keyed: Vec<(Option<ProjectedKey>, ResourceRef)> = Vec::new();
            for edge in &slot_edges {
                let key =
                    key_field_of(edge).and_then(|field| nodes.get(&edge.source).and_then(|n| project_key(n.params(), field)));
                for resource in Self::source_outputs(nodes, edge.source, edge.source_slot) {
                    keyed.push((key.clone(), resource));
                }
            }

            let has_explicit_sort = slot_edges.iter().any(|e| {
                e.modifiers.iter().any(|m| matches!(m, Modifier::Sort(SortOrder::Ascending { .. } | SortOrder::Descending { .. })))
            });
            if has_explicit_sort {
                let descending = slot_edges
                    .iter()
                    .any(|e| e.modifiers.iter().any(|m| matches!(m, Modifier::Sort(SortOrder::Descending { .. }))));
                keyed.sort_by(|a, b| {
                    let ord = match (&a.0, &b.0) {
                        (Some(ka), Some(kb)) => ka.cmp_value(kb),
                        _ => Ordering::Equal,
                    };
                    if descending {
                        ord.reverse()
                    } else {
                        ord
                    }
                });
            } else {
                // GroupKey without an explicit-key Sort: stable-partition
                // into contiguous groups ordered by first appearance.
                let mut group_keys: Vec<Option<ProjectedKey>> = Vec::new();
                let mut groups: Vec<Vec<(Option<ProjectedKey>, ResourceRef)>> = Vec::new();
                for item in keyed {
                    match group_keys.iter().position(|k| k == &item.0) {
                        Some(idx) => groups[idx].push(item),
                        None => {
                            group_keys.push(item.0.clone());
                            groups.push(vec![item]);
                        }
                    }
                }
                keyed = groups.into_iter().flatten().collect();
            }

            let resources: Vec<ResourceRef> = keyed.into_iter().map(|(_, r)| r).collect();
            if let Some(node) = nodes.get_mut(&node_id) {
                if let Some(bundle) = node.bundle_mut(0) {
                    bundle.set_input_collection(slot as usize, resources);
                }
            }
        }
    }

    /// Step 4: for each published resource, `birth` = producer's
    /// topological index, `death` = max index over consumers. Iterates
    /// every one of a node's bundles, not just bundle 0, since Compile
    /// may publish outputs across several (spec §3, per-iteration bundle
    /// array).
    fn lifetime_analysis(
        nodes: &HashMap<NodeId, Node>,
        order: &[NodeId],
        edges: &[Edge],
        index_of: &HashMap<NodeId, usize>,
    ) -> Vec<ResourceInterval> {
        let mut intervals = Vec::new();
        let mut seen: HashSet<ResourceId> = HashSet::new();

        for &node_id in order {
            let Some(node) = nodes.get(&node_id) else { continue };
            for bundle_index in 0..node.bundle_count() {
                let Some(bundle) = node.bundle(bundle_index) else { continue };
                for slot in 0..node.schema().outputs.len() {
                    let Some(resource) = bundle.output(slot) else { continue };
                    if !seen.insert(resource.id()) {
                        continue;
                    }
                    let birth = index_of[&node_id];
                    let death = Self::death_index(nodes, edges, index_of, resource.id(), birth);
                    intervals.push(ResourceInterval {
                        resource: resource.id(),
                        birth,
                        death,
                        size_bytes: resource.size_bytes(),
                        alias_group: None,
                        alignment_class: Self::alignment_class_of(resource.size_bytes()),
                    });
                }
            }
        }
        intervals
    }

    /// A resource with no consumer yet is flagged as unconsumed by
    /// keeping its own birth as death (spec §4.4, step 4b); this compiler
    /// doesn't separately report the unconsumed-output flag since no
    /// caller currently reads it.
    fn death_index(
        nodes: &HashMap<NodeId, Node>,
        edges: &[Edge],
        index_of: &HashMap<NodeId, usize>,
        resource: ResourceId,
        birth: usize,
    ) -> usize {
        edges
            .iter()
            .filter(|e| {
                nodes.get(&e.target).is_some_and(|n| {
                    (0..n.bundle_count()).any(|i| n.bundle(i).is_some_and(|b| b.input_contains(e.target_slot as usize, resource)))
                })
            })
            .filter_map(|e| index_of.get(&e.target).copied())
            .max()
            .unwrap_or(birth)
    }

    /// Coarse alignment bucket derived from a resource's byte size (spec
    /// §4.4 step 5, "only alias resources of a compatible alignment
    /// class"): counts trailing power-of-two factors, capped at 8 (a
    /// 256-byte-or-coarser alignment is one class).
    fn alignment_class_of(size_bytes: u64) -> u32 {
        if size_bytes == 0 {
            return 0;
        }
        size_bytes.trailing_zeros().min(8)
    }

    /// Step 5: only resources sharing a memory location *and* alignment
    /// class may alias each other (spec §4.6, "compatible memory
    /// requirements"; spec §4.4 step 5); run the greedy interval
    /// scheduler once per group and merge the resulting pools under one
    /// combined plan.
    fn alias_by_location(nodes: &HashMap<NodeId, Node>, order: &[NodeId], intervals: Vec<ResourceInterval>) -> AliasPlan {
        let mut resource_location: HashMap<ResourceId, MemoryLocation> = HashMap::new();
        for node_id in order {
            let Some(node) = nodes.get(node_id) else { continue };
            for bundle_index in 0..node.bundle_count() {
                let Some(bundle) = node.bundle(bundle_index) else { continue };
                for slot in 0..node.schema().outputs.len() {
                    if let Some(resource) = bundle.output(slot) {
                        resource_location.insert(resource.id(), resource.memory_location());
                    }
                }
            }
        }

        let mut by_group: HashMap<(MemoryLocation, u32), Vec<ResourceInterval>> = HashMap::new();
        for interval in intervals {
            let location = resource_location.get(&interval.resource).copied().unwrap_or(MemoryLocation::DeviceLocal);
            by_group.entry((location, interval.alignment_class)).or_default().push(interval);
        }

        let mut merged = AliasPlan::default();
        for group in by_group.into_values() {
            let plan = compute_aliasing(group);
            let offset = merged.pools.len();
            merged.naive_total_bytes += plan.naive_total_bytes;
            merged.aliased_total_bytes += plan.aliased_total_bytes;
            for (resource, pool_idx) in plan.assignment {
                merged.assignment.insert(resource, pool_idx + offset);
            }
            merged.pools.extend(plan.pools);
        }
        merged
    }

    /// Step 7: the immutable execution plan and resolved binding table,
    /// one binding per (node, bundle, slot) with a realized resource.
    fn emit_plan(nodes: &HashMap<NodeId, Node>, order: &[NodeId]) -> ExecutionPlan {
        let mut steps = Vec::with_capacity(order.len());
        let mut bindings = Vec::new();

        for &node_id in order {
            let Some(node) = nodes.get(&node_id) else { continue };
            steps.push(PlanStep::new(node_id, (0..node.bundle_count()).collect()));
            for bundle_index in 0..node.bundle_count() {
                let Some(bundle) = node.bundle(bundle_index) else { continue };
                for input in &node.schema().inputs {
                    if let Some(resource) = bundle.input(input.index as usize) {
                        bindings.push(DescriptorBinding { node: node_id, slot: input.index, resource: resource.clone(), bundle_index });
                    }
                }
            }
        }

        ExecutionPlan { steps, bindings }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::foundation::collections::{HandleMap, TypedHandle};
    use crate::graph::context::{CompileContext, ExecuteContext};
    use crate::graph::node::NodeBehavior;
    use crate::graph::slot::{InputSlotDesc, NodeSchema, OutputSlotDesc};
    use crate::resource::{
        BufferDescriptor, LifetimeClass, MemoryLocation, Resource, ResourceDescriptor, ResourceHandleValue,
        ResourceRef, ResourceScope, ResourceType,
    };

    fn handle<T>(slots: &mut HandleMap<()>) -> TypedHandle<T> {
        TypedHandle::new(slots.insert(()))
    }

    struct ProducerBehavior(ResourceRef);
    impl NodeBehavior for ProducerBehavior {
        fn compile(&mut self, ctx: &mut CompileContext) -> Result<(), GraphError> {
            self.0.publish_handle(ResourceHandleValue::Buffer(1));
            ctx.publish_output(0, self.0.clone())
        }
        fn execute(&mut self, _ctx: &mut ExecuteContext) -> Result<(), GraphError> {
            Ok(())
        }
    }

    struct PassThroughBehavior;
    impl NodeBehavior for PassThroughBehavior {
        fn compile(&mut self, ctx: &mut CompileContext) -> Result<(), GraphError> {
            let input = ctx.input(0)?.clone();
            ctx.publish_output(0, input)
        }
        fn execute(&mut self, _ctx: &mut ExecuteContext) -> Result<(), GraphError> {
            Ok(())
        }
    }

    #[test]
    fn compiles_a_chain_and_wires_bundle_resources() {
        let mut slots = HandleMap::new();
        let node_a: NodeId = handle(&mut slots);
        let node_b: NodeId = handle(&mut slots);
        let resource_id = handle(&mut slots);

        let resource = Arc::new(
            Resource::new(
                resource_id,
                ResourceType::Buffer,
                ResourceDescriptor::Buffer(BufferDescriptor::new(256, 0)),
                LifetimeClass::Transient,
                ResourceScope::NodeLevel,
                256,
                MemoryLocation::DeviceLocal,
            )
            .unwrap(),
        );

        let schema_a = NodeSchema::new(vec![], vec![OutputSlotDesc::new(0, "out", ResourceType::Buffer, LifetimeClass::Transient)]);
        let schema_b = NodeSchema::new(
            vec![InputSlotDesc::new(0, "in", ResourceType::Buffer)],
            vec![OutputSlotDesc::new(0, "out", ResourceType::Buffer, LifetimeClass::Transient)],
        );

        let mut nodes = HashMap::new();
        nodes.insert(node_a, Node::new("A".to_string(), "producer", schema_a, 0, Box::new(ProducerBehavior(resource))));
        nodes.insert(node_b, Node::new("B".to_string(), "passthrough", schema_b, 1, Box::new(PassThroughBehavior)));

        let mut topology = Topology::new();
        topology.add_edge(node_a, node_b);

        let edges = vec![Edge::new(node_a, 0, node_b, 0)];
        let creation_index: HashMap<NodeId, u64> = [(node_a, 0), (node_b, 1)].into_iter().collect();

        let (plan, _alias) = Compiler::compile(&mut nodes, &edges, &topology, &creation_index).unwrap();

        assert_eq!(plan.steps.len(), 2);
        assert_eq!(nodes[&node_b].phase(), PhaseState::Compiled);
        assert!(nodes[&node_b].bundle(0).unwrap().output(0).is_some());
        assert_eq!(plan.bindings_for(node_b).count(), 1);
    }

    #[test]
    fn missing_required_input_fails_validation() {
        let mut slots = HandleMap::new();
        let node_b: NodeId = handle(&mut slots);
        let schema_b = NodeSchema::new(
            vec![InputSlotDesc::new(0, "in", ResourceType::Buffer)],
            vec![],
        );
        let mut nodes = HashMap::new();
        nodes.insert(node_b, Node::new("B".to_string(), "passthrough", schema_b, 0, Box::new(PassThroughBehavior)));

        let topology = Topology::new();
        let creation_index: HashMap<NodeId, u64> = [(node_b, 0)].into_iter().collect();

        let result = Compiler::compile(&mut nodes, &[], &topology, &creation_index);
        assert!(matches!(result, Err(GraphError::MissingRequiredInput(_, 0))));
    }

    struct ArrayConsumerBehavior;
    impl NodeBehavior for ArrayConsumerBehavior {
        fn compile(&mut self, _ctx: &mut CompileContext) -> Result<(), GraphError> {
            Ok(())
        }
        fn execute(&mut self, _ctx: &mut ExecuteContext) -> Result<(), GraphError> {
            Ok(())
        }
    }

    /// Spec §8 scenario S2: sources P1(groupId=0), P2(groupId=0),
    /// P3(groupId=1) feeding one array-typed target slot via `GroupKey`
    /// edges should fuse into two contiguous groups, `[P1, P2]` then
    /// `[P3]`, even when the edges themselves are declared out of group
    /// order.
    #[test]
    fn accumulation_fuses_grouped_inputs_into_contiguous_groups() {
        let mut slots = HandleMap::new();
        let p1: NodeId = handle(&mut slots);
        let p2: NodeId = handle(&mut slots);
        let p3: NodeId = handle(&mut slots);
        let t: NodeId = handle(&mut slots);

        let new_resource = |slots: &mut HandleMap<()>, backend: u64| -> ResourceRef {
            let r = Arc::new(
                Resource::new(
                    handle(slots),
                    ResourceType::Buffer,
                    ResourceDescriptor::Buffer(BufferDescriptor::new(256, 0)),
                    LifetimeClass::Transient,
                    ResourceScope::NodeLevel,
                    256,
                    MemoryLocation::DeviceLocal,
                )
                .unwrap(),
            );
            r.publish_handle(ResourceHandleValue::Buffer(backend));
            r
        };

        let r1 = new_resource(&mut slots, 1);
        let r2 = new_resource(&mut slots, 2);
        let r3 = new_resource(&mut slots, 3);
        let (id1, id2, id3) = (r1.id(), r2.id(), r3.id());

        let schema_p = NodeSchema::new(vec![], vec![OutputSlotDesc::new(0, "out", ResourceType::Buffer, LifetimeClass::Transient)]);
        let schema_t = NodeSchema::new(vec![InputSlotDesc::new(0, "in", ResourceType::Buffer).array()], vec![]);

        let mut nodes = HashMap::new();
        nodes.insert(p1, Node::new("P1".to_string(), "producer", schema_p.clone(), 0, Box::new(ProducerBehavior(r1))));
        nodes.insert(p2, Node::new("P2".to_string(), "producer", schema_p.clone(), 1, Box::new(ProducerBehavior(r2))));
        nodes.insert(p3, Node::new("P3".to_string(), "producer", schema_p, 2, Box::new(ProducerBehavior(r3))));
        nodes.insert(t, Node::new("T".to_string(), "array_consumer", schema_t, 3, Box::new(ArrayConsumerBehavior)));

        nodes.get_mut(&p1).unwrap().set_param("group_id", ResourceHandleValue::Int(0));
        nodes.get_mut(&p2).unwrap().set_param("group_id", ResourceHandleValue::Int(0));
        nodes.get_mut(&p3).unwrap().set_param("group_id", ResourceHandleValue::Int(1));

        let mut topology = Topology::new();
        topology.add_edge(p1, t);
        topology.add_edge(p2, t);
        topology.add_edge(p3, t);

        // Declared out of group order (P1, P3, P2) to prove the fusion
        // groups by key rather than by edge-declaration order.
        let edges = vec![
            Edge::new(p1, 0, t, 0).with_modifier(Modifier::GroupKey { key_field: "group_id" }),
            Edge::new(p3, 0, t, 0).with_modifier(Modifier::GroupKey { key_field: "group_id" }),
            Edge::new(p2, 0, t, 0).with_modifier(Modifier::GroupKey { key_field: "group_id" }),
        ];
        let creation_index: HashMap<NodeId, u64> = [(p1, 0), (p2, 1), (p3, 2), (t, 3)].into_iter().collect();

        Compiler::compile(&mut nodes, &edges, &topology, &creation_index).unwrap();

        let bundle = nodes[&t].bundle(0).unwrap();
        assert_eq!(bundle.input_count(0), 3);
        assert_eq!(bundle.input_at(0, 0).unwrap().id(), id1);
        assert_eq!(bundle.input_at(0, 1).unwrap().id(), id2);
        assert_eq!(bundle.input_at(0, 2).unwrap().id(), id3);
    }
}

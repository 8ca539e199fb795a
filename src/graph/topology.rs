//! Adjacency storage, deterministic topological sort, and cycle reporting
//! (spec §4.4).

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, VecDeque};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::ids::NodeId;

/// Adjacency-list topology over the graph's nodes, backed by `petgraph`
/// for O(1) neighbor iteration (spec §4.4).
#[derive(Default)]
pub struct Topology {
    graph: DiGraph<NodeId, ()>,
    index_of: HashMap<NodeId, NodeIndex>,
}

impl Topology {
    pub fn new() -> Self {
        Self { graph: DiGraph::new(), index_of: HashMap::new() }
    }

    pub fn add_node(&mut self, node: NodeId) {
        if !self.index_of.contains_key(&node) {
            let idx = self.graph.add_node(node);
            self.index_of.insert(node, idx);
        }
    }

    pub fn remove_node(&mut self, node: NodeId) {
        if let Some(idx) = self.index_of.remove(&node) {
            self.graph.remove_node(idx);
            // `remove_node` swaps the last index into the removed slot;
            // refresh every mapping to stay consistent.
            self.index_of.clear();
            for idx in self.graph.node_indices() {
                self.index_of.insert(self.graph[idx], idx);
            }
        }
    }

    pub fn add_edge(&mut self, from: NodeId, to: NodeId) {
        self.add_node(from);
        self.add_node(to);
        let from_idx = self.index_of[&from];
        let to_idx = self.index_of[&to];
        self.graph.update_edge(from_idx, to_idx, ());
    }

    pub fn remove_edge(&mut self, from: NodeId, to: NodeId) {
        if let (Some(&f), Some(&t)) = (self.index_of.get(&from), self.index_of.get(&to)) {
            if let Some(e) = self.graph.find_edge(f, t) {
                self.graph.remove_edge(e);
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Nodes with a direct dependency edge into `node` (spec §4.4, "O(1)
    /// neighbor iteration").
    pub fn dependencies_of(&self, node: NodeId) -> Vec<NodeId> {
        let Some(&idx) = self.index_of.get(&node) else { return Vec::new() };
        self.graph.neighbors_directed(idx, Direction::Incoming).map(|i| self.graph[i]).collect()
    }

    /// Nodes with a direct dependency edge out of `node`.
    pub fn dependents_of(&self, node: NodeId) -> Vec<NodeId> {
        let Some(&idx) = self.index_of.get(&node) else { return Vec::new() };
        self.graph.neighbors_directed(idx, Direction::Outgoing).map(|i| self.graph[i]).collect()
    }

    /// All nodes transitively depending on `node` (its dirty-cascade set,
    /// spec §4.4 "Dirty-set recompile").
    pub fn transitive_dependents(&self, node: NodeId) -> Vec<NodeId> {
        let mut visited = Vec::new();
        let mut queue = VecDeque::from(self.dependents_of(node));
        let mut seen: std::collections::HashSet<NodeId> = queue.iter().copied().collect();
        while let Some(n) = queue.pop_front() {
            visited.push(n);
            for next in self.dependents_of(n) {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        visited
    }

    /// A stable topological order, ties broken by `creation_index` for
    /// determinism (spec §4.4, "`TopologicalSort` produces a stable
    /// order; ties broken by node creation index"). On failure, returns
    /// the node ids forming a cycle (spec §4.4, "shortest cycle edges").
    pub fn topological_order(&self, creation_index: &HashMap<NodeId, u64>) -> Result<Vec<NodeId>, Vec<NodeId>> {
        let mut in_degree: HashMap<NodeIndex, usize> = HashMap::new();
        for idx in self.graph.node_indices() {
            in_degree.insert(idx, self.graph.neighbors_directed(idx, Direction::Incoming).count());
        }

        let key_of = |idx: NodeIndex| -> u64 { *creation_index.get(&self.graph[idx]).unwrap_or(&0) };

        let mut ready: BinaryHeap<Reverse<(u64, NodeIndex)>> = in_degree
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(&idx, _)| Reverse((key_of(idx), idx)))
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse((_, idx))) = ready.pop() {
            order.push(self.graph[idx]);
            for next in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                let deg = in_degree.get_mut(&next).unwrap();
                *deg -= 1;
                if *deg == 0 {
                    ready.push(Reverse((key_of(next), next)));
                }
            }
        }

        if order.len() == self.graph.node_count() {
            Ok(order)
        } else {
            let ordered: std::collections::HashSet<NodeId> = order.iter().copied().collect();
            let remaining: Vec<NodeIndex> =
                self.graph.node_indices().filter(|idx| !ordered.contains(&self.graph[*idx])).collect();
            Err(self.shortest_cycle(&remaining))
        }
    }

    /// BFS from every node remaining after Kahn's algorithm back to
    /// itself, restricted to the cyclic remainder, keeping the shortest
    /// return path found.
    fn shortest_cycle(&self, remaining: &[NodeIndex]) -> Vec<NodeId> {
        let remaining_set: std::collections::HashSet<NodeIndex> = remaining.iter().copied().collect();
        let mut best: Option<Vec<NodeId>> = None;

        for &start in remaining {
            let mut prev: HashMap<NodeIndex, NodeIndex> = HashMap::new();
            let mut queue = VecDeque::new();
            queue.push_back(start);
            let mut visited = std::collections::HashSet::new();
            visited.insert(start);

            'bfs: while let Some(current) = queue.pop_front() {
                for next in self.graph.neighbors_directed(current, Direction::Outgoing) {
                    if !remaining_set.contains(&next) {
                        continue;
                    }
                    if next == start {
                        let mut path = vec![self.graph[current]];
                        let mut walk = current;
                        while let Some(&p) = prev.get(&walk) {
                            path.push(self.graph[p]);
                            walk = p;
                        }
                        path.reverse();
                        path.push(self.graph[start]);
                        if best.as_ref().map(|b| path.len() < b.len()).unwrap_or(true) {
                            best = Some(path);
                        }
                        break 'bfs;
                    }
                    if visited.insert(next) {
                        prev.insert(next, current);
                        queue.push_back(next);
                    }
                }
            }
        }

        best.unwrap_or_else(|| remaining.iter().map(|&idx| self.graph[idx]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::collections::{HandleMap, TypedHandle};

    fn ids(n: usize) -> (HandleMap<()>, Vec<NodeId>) {
        let mut slots = HandleMap::new();
        let nodes = (0..n).map(|_| TypedHandle::new(slots.insert(()))).collect();
        (slots, nodes)
    }

    #[test]
    fn chain_of_three_sorts_in_dependency_order() {
        let (_slots, nodes) = ids(3);
        let mut topo = Topology::new();
        topo.add_edge(nodes[0], nodes[1]);
        topo.add_edge(nodes[1], nodes[2]);

        let creation_index: HashMap<NodeId, u64> = nodes.iter().enumerate().map(|(i, &n)| (n, i as u64)).collect();
        let order = topo.topological_order(&creation_index).unwrap();
        assert_eq!(order, vec![nodes[0], nodes[1], nodes[2]]);
    }

    #[test]
    fn ties_broken_by_creation_index() {
        let (_slots, nodes) = ids(3);
        let mut topo = Topology::new();
        // nodes[1] and nodes[2] both depend only on nodes[0]; no edge
        // between them, so creation index must decide their order.
        topo.add_edge(nodes[0], nodes[1]);
        topo.add_edge(nodes[0], nodes[2]);

        let creation_index: HashMap<NodeId, u64> = nodes.iter().enumerate().map(|(i, &n)| (n, i as u64)).collect();
        let order = topo.topological_order(&creation_index).unwrap();
        assert_eq!(order, vec![nodes[0], nodes[1], nodes[2]]);
    }

    #[test]
    fn cycle_is_reported() {
        let (_slots, nodes) = ids(3);
        let mut topo = Topology::new();
        topo.add_edge(nodes[0], nodes[1]);
        topo.add_edge(nodes[1], nodes[2]);
        topo.add_edge(nodes[2], nodes[0]);

        let creation_index: HashMap<NodeId, u64> = nodes.iter().enumerate().map(|(i, &n)| (n, i as u64)).collect();
        let err = topo.topological_order(&creation_index).unwrap_err();
        assert_eq!(err.len(), 4); // A -> B -> C -> A
    }
}

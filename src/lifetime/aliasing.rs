//! Interval-based memory aliasing: packing transient resources whose
//! lifetimes don't overlap into shared backing memory (spec §4.6).

use std::collections::HashMap;

use crate::ids::ResourceId;

/// A resource's lifetime, expressed as node indices in topological order
/// (spec §4.3, "Lifetime analysis"): `birth` is the producing node's
/// index, `death` is the max index over consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceInterval {
    pub resource: ResourceId,
    pub birth: usize,
    pub death: usize,
    pub size_bytes: u64,
    /// Resources sharing a group tag are never aliased against each
    /// other even if their intervals don't overlap (e.g. a ping-pong
    /// pair the author wants to keep physically distinct).
    pub alias_group: Option<u64>,
    /// Coarse alignment bucket derived from the resource's byte size
    /// (spec §4.4 step 5, "only alias resources of a compatible
    /// alignment class"); pools are never shared across classes even
    /// when their memory location and alias group match.
    pub alignment_class: u32,
}

/// One memory pool opened by the aliasing engine: a byte extent sized to
/// its largest assigned resource, reused by every resource placed in it.
#[derive(Debug, Clone)]
pub struct MemoryPool {
    pub size_bytes: u64,
    last_freed_at: usize,
    assigned_group: Option<u64>,
    members: Vec<ResourceId>,
}

/// The result of running the aliasing engine once over a set of
/// intervals (spec §4.6, "Report total savings and alias graph").
#[derive(Debug, Clone, Default)]
pub struct AliasPlan {
    pub pools: Vec<MemoryPool>,
    pub assignment: HashMap<ResourceId, usize>,
    pub naive_total_bytes: u64,
    pub aliased_total_bytes: u64,
}

impl AliasPlan {
    /// Bytes saved versus giving every resource its own allocation.
    pub fn savings_bytes(&self) -> u64 {
        self.naive_total_bytes.saturating_sub(self.aliased_total_bytes)
    }

    pub fn pool_of(&self, resource: ResourceId) -> Option<&MemoryPool> {
        self.assignment.get(&resource).and_then(|&idx| self.pools.get(idx))
    }
}

/// Greedy interval-scheduling aliasing: sort by birth, assign each
/// resource to the first pool whose last-freed-at is at or before the
/// candidate's birth, else open a new pool (spec §4.6).
pub fn compute_aliasing(mut intervals: Vec<ResourceInterval>) -> AliasPlan {
    intervals.sort_by_key(|i| i.birth);

    let mut plan = AliasPlan::default();
    for interval in intervals {
        plan.naive_total_bytes += interval.size_bytes;

        let reusable = plan.pools.iter().position(|pool| {
            pool.last_freed_at <= interval.birth
                && pool.assigned_group == interval.alias_group
        });

        match reusable {
            Some(idx) => {
                let pool = &mut plan.pools[idx];
                pool.size_bytes = pool.size_bytes.max(interval.size_bytes);
                pool.last_freed_at = interval.death;
                pool.members.push(interval.resource);
                plan.assignment.insert(interval.resource, idx);
            }
            None => {
                let idx = plan.pools.len();
                plan.pools.push(MemoryPool {
                    size_bytes: interval.size_bytes,
                    last_freed_at: interval.death,
                    assigned_group: interval.alias_group,
                    members: vec![interval.resource],
                });
                plan.assignment.insert(interval.resource, idx);
            }
        }
    }

    plan.aliased_total_bytes = plan.pools.iter().map(|p| p.size_bytes).sum();
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::collections::{HandleMap, TypedHandle};

    fn rid(slots: &mut HandleMap<()>) -> ResourceId {
        TypedHandle::new(slots.insert(()))
    }

    #[test]
    fn non_overlapping_intervals_share_one_pool() {
        let mut slots = HandleMap::new();
        let a = ResourceInterval { resource: rid(&mut slots), birth: 0, death: 2, size_bytes: 1024, alias_group: None, alignment_class: 0 };
        let b = ResourceInterval { resource: rid(&mut slots), birth: 3, death: 5, size_bytes: 2048, alias_group: None, alignment_class: 0 };
        let plan = compute_aliasing(vec![a, b]);
        assert_eq!(plan.pools.len(), 1);
        assert_eq!(plan.aliased_total_bytes, 2048);
        assert_eq!(plan.naive_total_bytes, 3072);
        assert_eq!(plan.savings_bytes(), 1024);
    }

    #[test]
    fn overlapping_intervals_open_separate_pools() {
        let mut slots = HandleMap::new();
        let a = ResourceInterval { resource: rid(&mut slots), birth: 0, death: 4, size_bytes: 1024, alias_group: None, alignment_class: 0 };
        let b = ResourceInterval { resource: rid(&mut slots), birth: 1, death: 5, size_bytes: 1024, alias_group: None, alignment_class: 0 };
        let plan = compute_aliasing(vec![a, b]);
        assert_eq!(plan.pools.len(), 2);
        assert_eq!(plan.savings_bytes(), 0);
    }

    #[test]
    fn distinct_alias_groups_never_share_a_pool() {
        let mut slots = HandleMap::new();
        let a = ResourceInterval { resource: rid(&mut slots), birth: 0, death: 1, size_bytes: 1024, alias_group: Some(7), alignment_class: 0 };
        let b = ResourceInterval { resource: rid(&mut slots), birth: 2, death: 3, size_bytes: 1024, alias_group: Some(8), alignment_class: 0 };
        let plan = compute_aliasing(vec![a, b]);
        assert_eq!(plan.pools.len(), 2);
    }
}

//! Edges and the modifier pipeline applied across them (spec §4.3).

use crate::ids::NodeId;

use super::slot::SlotIndex;

/// A transformation applied to the value crossing an edge (spec §4.3,
/// GLOSSARY "Modifier").
#[derive(Debug, Clone)]
pub enum Modifier {
    /// Source output is a struct; target expects one field, projected by
    /// a named field descriptor (spec §4.3, "Field extraction").
    FieldExtraction { field_name: &'static str },
    /// Partition an accumulation target's collection by a projected key
    /// before the target sees it (spec §4.3, "Grouping / partitioning").
    GroupKey { key_field: &'static str },
    /// Order an accumulation target's collection before (or after)
    /// grouping (spec §4.3, "Sort").
    Sort(SortOrder),
    /// Narrow or widen a slot's role for this one edge (spec §4.3, "Role
    /// override").
    RoleOverride(super::slot::SlotRole),
}

/// Ordering applied by a [`Modifier::Sort`].
#[derive(Debug, Clone)]
pub enum SortOrder {
    Ascending { key_field: &'static str },
    Descending { key_field: &'static str },
    /// A user-supplied custom ordering, identified by name (the builder
    /// doesn't carry an actual comparator function across the wire; the
    /// node author's compiled code supplies it).
    Custom { comparator_name: &'static str },
}

/// A directed link from one node's output slot to another's input slot
/// (spec §4.3, "Edge"; spec §3, "Edge").
#[derive(Debug, Clone)]
pub struct Edge {
    pub source: NodeId,
    pub source_slot: SlotIndex,
    pub target: NodeId,
    pub target_slot: SlotIndex,
    pub modifiers: Vec<Modifier>,
}

impl Edge {
    pub fn new(source: NodeId, source_slot: SlotIndex, target: NodeId, target_slot: SlotIndex) -> Self {
        Self { source, source_slot, target, target_slot, modifiers: Vec::new() }
    }

    pub fn with_modifier(mut self, modifier: Modifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    pub fn with_modifiers(mut self, modifiers: Vec<Modifier>) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Whether this edge carries an accumulation-shaped modifier
    /// (`GroupKey` or `Sort`), i.e. feeds into a collection-typed target
    /// slot rather than a single-value one.
    pub fn is_accumulation(&self) -> bool {
        self.modifiers.iter().any(|m| matches!(m, Modifier::GroupKey { .. } | Modifier::Sort(_)))
    }

    /// Whether this edge constrains topological order (spec §4.3, "Role
    /// override" and spec §3, role bitset — an edge overridden to
    /// Execute-only still carries a dependency for scheduling purposes
    /// unless explicitly narrowed).
    pub fn carries_dependency(&self, default_role: super::slot::SlotRole) -> bool {
        let role = self
            .modifiers
            .iter()
            .find_map(|m| match m {
                Modifier::RoleOverride(role) => Some(*role),
                _ => None,
            })
            .unwrap_or(default_role);
        role.contains(super::slot::SlotRole::DEPENDENCY)
    }
}

//! The ordered connection-rule pipeline evaluated by `Connect` (spec
//! §4.3).

use crate::ids::{EdgeId, NodeId};
use crate::resource::ResourceType;

use super::edge::{Edge, Modifier, SortOrder};
use super::error::GraphError;

/// Everything a [`ConnectionRule`] needs to validate one proposed edge.
pub struct ConnectionContext<'a> {
    pub source: NodeId,
    pub source_slot: super::slot::SlotIndex,
    pub target: NodeId,
    pub target_slot: super::slot::SlotIndex,
    pub source_type: ResourceType,
    pub target_type: ResourceType,
    pub modifiers: &'a [Modifier],
    /// Whether the target input slot is declared array (spec §4.1); a
    /// `GroupKey`/`Sort` modifier only makes sense fusing into such a
    /// slot's collection.
    pub target_array: bool,
}

/// One rule in the ordered pipeline `Connect` runs a proposed edge
/// through (spec §4.3). Rules are evaluated in ascending priority order;
/// the first failure aborts validation with a diagnostic naming the
/// rule, source type, target type, and applied modifiers.
pub trait ConnectionRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn priority(&self) -> i32;
    fn validate(&self, ctx: &ConnectionContext) -> Result<(), GraphError>;
}

/// Default rule: type identity of source output and target input,
/// skipped when a `FieldExtraction` modifier is present (the projected
/// field's type is established by the node author's reflection code, not
/// by this generic rule).
struct TypeIdentityRule;

impl ConnectionRule for TypeIdentityRule {
    fn name(&self) -> &'static str {
        "type_identity"
    }

    fn priority(&self) -> i32 {
        0
    }

    fn validate(&self, ctx: &ConnectionContext) -> Result<(), GraphError> {
        let has_field_extraction = ctx.modifiers.iter().any(|m| matches!(m, Modifier::FieldExtraction { .. }));
        if has_field_extraction {
            return Ok(());
        }
        if ctx.source_type != ctx.target_type {
            return Err(GraphError::SlotTypeMismatch {
                source: ctx.source,
                source_slot: ctx.source_slot,
                target: ctx.target,
                target_slot: ctx.target_slot,
                source_type: ctx.source_type,
                target_type: ctx.target_type,
            });
        }
        Ok(())
    }
}

/// Rejects edges carrying more than one mutually exclusive `Sort`
/// modifier — the spec leaves the precedence between `SortAscending` and
/// a custom `SortBy` unspecified and calls for a hard validation error
/// instead (spec §9, Open Questions).
struct SortConflictRule;

impl ConnectionRule for SortConflictRule {
    fn name(&self) -> &'static str {
        "sort_conflict"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn validate(&self, ctx: &ConnectionContext) -> Result<(), GraphError> {
        let sort_count = ctx.modifiers.iter().filter(|m| matches!(m, Modifier::Sort(_))).count();
        if sort_count > 1 {
            return Err(GraphError::ConflictingModifiers(
                EdgeId::default(),
                "edge carries more than one Sort modifier".to_string(),
            ));
        }
        Ok(())
    }
}

/// Rejects a `GroupKey` modifier on an edge that isn't shaped for
/// accumulation (i.e. paired with neither another `GroupKey`-compatible
/// edge nor a `Sort`) — partitioning only makes sense against a
/// collection-typed target (spec §4.3, "Grouping / partitioning").
struct GroupKeyRequiresAccumulationRule;

impl ConnectionRule for GroupKeyRequiresAccumulationRule {
    fn name(&self) -> &'static str {
        "group_key_requires_accumulation"
    }

    fn priority(&self) -> i32 {
        20
    }

    fn validate(&self, ctx: &ConnectionContext) -> Result<(), GraphError> {
        let has_group_key = ctx.modifiers.iter().any(|m| matches!(m, Modifier::GroupKey { .. }));
        let has_sort = ctx.modifiers.iter().any(|m| matches!(m, Modifier::Sort(_)));
        if (has_group_key || has_sort) && !ctx.target_array {
            return Err(GraphError::ConflictingModifiers(
                EdgeId::default(),
                "GroupKey/Sort modifiers require an array-typed target input slot".to_string(),
            ));
        }
        Ok(())
    }
}

/// The ordered pipeline `Connect` evaluates every proposed edge through
/// (spec §4.3).
pub fn default_rules() -> Vec<Box<dyn ConnectionRule>> {
    let mut rules: Vec<Box<dyn ConnectionRule>> =
        vec![Box::new(TypeIdentityRule), Box::new(SortConflictRule), Box::new(GroupKeyRequiresAccumulationRule)];
    rules.sort_by_key(|r| r.priority());
    rules
}

/// Run every rule in `rules` against `ctx`, stopping at the first
/// failure (spec §4.3, "builder fails at validation time with a precise
/// diagnostic").
pub fn validate_connection(rules: &[Box<dyn ConnectionRule>], ctx: &ConnectionContext) -> Result<(), GraphError> {
    for rule in rules {
        rule.validate(ctx)?;
    }
    Ok(())
}

/// Build an [`Edge`] from a proposed connection, for callers that have
/// already validated it.
pub fn build_edge(ctx: &ConnectionContext) -> Edge {
    Edge::new(ctx.source, ctx.source_slot, ctx.target, ctx.target_slot).with_modifiers(ctx.modifiers.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(source_type: ResourceType, target_type: ResourceType, modifiers: &'a [Modifier]) -> ConnectionContext<'a> {
        ctx_array(source_type, target_type, modifiers, false)
    }

    fn ctx_array<'a>(
        source_type: ResourceType,
        target_type: ResourceType,
        modifiers: &'a [Modifier],
        target_array: bool,
    ) -> ConnectionContext<'a> {
        use crate::foundation::collections::{HandleMap, TypedHandle};
        let mut slots: HandleMap<()> = HandleMap::new();
        ConnectionContext {
            source: TypedHandle::new(slots.insert(())),
            source_slot: 0,
            target: TypedHandle::new(slots.insert(())),
            target_slot: 0,
            source_type,
            target_type,
            modifiers,
            target_array,
        }
    }

    #[test]
    fn mismatched_types_are_rejected_without_field_extraction() {
        let rules = default_rules();
        let c = ctx(ResourceType::Buffer, ResourceType::Image, &[]);
        assert!(validate_connection(&rules, &c).is_err());
    }

    #[test]
    fn field_extraction_bypasses_type_identity() {
        let rules = default_rules();
        let modifiers = [Modifier::FieldExtraction { field_name: "color" }];
        let c = ctx(ResourceType::Buffer, ResourceType::Image, &modifiers);
        assert!(validate_connection(&rules, &c).is_ok());
    }

    #[test]
    fn two_sort_modifiers_on_one_edge_are_rejected() {
        let rules = default_rules();
        let modifiers = [
            Modifier::Sort(SortOrder::Ascending { key_field: "id" }),
            Modifier::Sort(SortOrder::Custom { comparator_name: "by_distance" }),
        ];
        let c = ctx(ResourceType::Buffer, ResourceType::Buffer, &modifiers);
        assert!(validate_connection(&rules, &c).is_err());
    }

    #[test]
    fn group_key_on_non_array_target_is_rejected() {
        let rules = default_rules();
        let modifiers = [Modifier::GroupKey { key_field: "group_id" }];
        let c = ctx_array(ResourceType::Buffer, ResourceType::Buffer, &modifiers, false);
        assert!(validate_connection(&rules, &c).is_err());
    }

    #[test]
    fn group_key_on_array_target_is_accepted() {
        let rules = default_rules();
        let modifiers = [Modifier::GroupKey { key_field: "group_id" }];
        let c = ctx_array(ResourceType::Buffer, ResourceType::Buffer, &modifiers, true);
        assert!(validate_connection(&rules, &c).is_ok());
    }
}

//! The typed slot schema a node type declares (spec §3, §4.1).

use bitflags::bitflags;

use crate::resource::ResourceType;

/// Index of a slot within a node's input or output sequence.
pub type SlotIndex = u16;

bitflags! {
    /// What an input slot's connection is used for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SlotRole: u8 {
        /// The edge constrains topological order but carries no value
        /// read during Execute.
        const DEPENDENCY = 0b01;
        /// The edge's resource is bound for reading during Execute.
        const EXECUTE = 0b10;
    }
}

impl Default for SlotRole {
    fn default() -> Self {
        Self::DEPENDENCY | Self::EXECUTE
    }
}

/// Declaration of one input slot (spec §3, "Node").
#[derive(Debug, Clone)]
pub struct InputSlotDesc {
    pub index: SlotIndex,
    pub name: &'static str,
    pub resource_type: ResourceType,
    pub nullable: bool,
    pub role: SlotRole,
    /// Whether this slot accepts an ordered collection rather than a
    /// single resource (spec §3, "Variadic/array inputs").
    pub array: bool,
}

impl InputSlotDesc {
    pub fn new(index: SlotIndex, name: &'static str, resource_type: ResourceType) -> Self {
        Self { index, name, resource_type, nullable: false, role: SlotRole::default(), array: false }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_role(mut self, role: SlotRole) -> Self {
        self.role = role;
        self
    }

    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }
}

/// Declaration of one output slot (spec §3, "Node").
#[derive(Debug, Clone)]
pub struct OutputSlotDesc {
    pub index: SlotIndex,
    pub name: &'static str,
    pub resource_type: ResourceType,
    pub lifetime_class: crate::resource::LifetimeClass,
    pub array: bool,
}

impl OutputSlotDesc {
    pub fn new(
        index: SlotIndex,
        name: &'static str,
        resource_type: ResourceType,
        lifetime_class: crate::resource::LifetimeClass,
    ) -> Self {
        Self { index, name, resource_type, lifetime_class, array: false }
    }

    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }
}

/// The fixed slot schema a node type declares: sorted input and output
/// slots plus the closed set of typed parameters (spec §3).
#[derive(Debug, Clone, Default)]
pub struct NodeSchema {
    pub inputs: Vec<InputSlotDesc>,
    pub outputs: Vec<OutputSlotDesc>,
}

impl NodeSchema {
    pub fn new(inputs: Vec<InputSlotDesc>, outputs: Vec<OutputSlotDesc>) -> Self {
        Self { inputs, outputs }
    }

    pub fn input(&self, index: SlotIndex) -> Option<&InputSlotDesc> {
        self.inputs.iter().find(|s| s.index == index)
    }

    pub fn output(&self, index: SlotIndex) -> Option<&OutputSlotDesc> {
        self.outputs.iter().find(|s| s.index == index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_role_carries_both_dependency_and_execute() {
        let role = SlotRole::default();
        assert!(role.contains(SlotRole::DEPENDENCY));
        assert!(role.contains(SlotRole::EXECUTE));
    }

    #[test]
    fn schema_looks_up_slots_by_index() {
        let schema = NodeSchema::new(
            vec![InputSlotDesc::new(0, "depth", ResourceType::Image)],
            vec![OutputSlotDesc::new(0, "color", ResourceType::Image, crate::resource::LifetimeClass::Transient)],
        );
        assert!(schema.input(0).is_some());
        assert!(schema.output(1).is_none());
    }
}

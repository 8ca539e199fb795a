//! Shader / pipeline contract (spec §6): the core consumes a reflection
//! table produced externally from shader source; it never compiles or
//! interprets shader text itself.

/// One binding inside a descriptor set layout, as produced by shader
/// reflection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorBindingSpec {
    pub binding: u32,
    /// Backend-defined descriptor type tag (uniform buffer, sampled
    /// image, storage buffer, ...), opaque to the core.
    pub kind: u32,
    pub count: u32,
    /// Bitmask of shader stages that reference this binding.
    pub stage_mask: u32,
}

/// A descriptor set layout spec, one per `set` index referenced by the
/// shader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorLayoutSpec {
    pub set: u32,
    pub bindings: Vec<DescriptorBindingSpec>,
}

/// The push-constant range a shader declares, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushConstantLayout {
    pub offset: u32,
    pub size: u32,
    pub stage_mask: u32,
}

/// A named specialization constant and its declared constant ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecializationConstant {
    pub constant_id: u32,
    pub name: String,
}

/// One vertex input attribute, as reflected from a vertex shader's inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexInputAttribute {
    pub location: u32,
    pub binding: u32,
    pub format: u32,
    pub offset: u32,
}

/// The full reflection table for one shader module (spec §6, "Shader /
/// pipeline contract"): everything the core needs to build pipeline and
/// descriptor-set-layout resource descriptors, without ever parsing SPIR-V
/// itself.
#[derive(Debug, Clone, Default)]
pub struct ShaderReflection {
    pub spirv: Vec<u32>,
    pub descriptor_layouts: Vec<DescriptorLayoutSpec>,
    pub push_constants: Option<PushConstantLayout>,
    pub specialization_constants: Vec<SpecializationConstant>,
    pub vertex_inputs: Vec<VertexInputAttribute>,
}

impl ShaderReflection {
    /// A content hash suitable for keying a [`crate::cache::ContentCache`]
    /// of compiled pipelines, cheap enough to recompute per lookup rather
    /// than cache separately.
    pub fn content_hash(&self) -> u64 {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.spirv.hash(&mut hasher);
        self.descriptor_layouts.len().hash(&mut hasher);
        for layout in &self.descriptor_layouts {
            layout.set.hash(&mut hasher);
            layout.bindings.len().hash(&mut hasher);
        }
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_reflection_tables_hash_equal() {
        let a = ShaderReflection { spirv: vec![1, 2, 3], ..Default::default() };
        let b = ShaderReflection { spirv: vec![1, 2, 3], ..Default::default() };
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn differing_spirv_hashes_differ() {
        let a = ShaderReflection { spirv: vec![1, 2, 3], ..Default::default() };
        let b = ShaderReflection { spirv: vec![1, 2, 4], ..Default::default() };
        assert_ne!(a.content_hash(), b.content_hash());
    }
}

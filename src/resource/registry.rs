//! The closed, compile-time enumerated resource type registry (spec §4.2).
//!
//! Adding a new GPU/CPU type means adding a variant here and to every
//! `match` the compiler then forces you to extend (`descriptor.rs`,
//! `handle.rs`) — the "closed registry" the spec calls for is simply an
//! exhaustively-matched Rust enum rather than an open-ended trait object
//! table.

/// One entry in the closed resource type registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    /// A GPU buffer.
    Buffer,
    /// A GPU image (texture, render target, etc.).
    Image,
    /// A view into a GPU image.
    ImageView,
    /// A sampler.
    Sampler,
    /// A graphics, compute, or ray-tracing pipeline.
    Pipeline,
    /// A descriptor set layout.
    DescriptorSetLayout,
    /// A bottom- or top-level acceleration structure.
    AccelerationStructure,
    /// A render pass.
    RenderPass,
    /// A command pool.
    CommandPool,
    /// A backend handle of a kind the registry doesn't model specially
    /// (used by node-author wrapper types via the lazy extractor).
    Generic,
    /// A signed integer value.
    Int,
    /// A floating-point value.
    Float,
    /// A boolean value.
    Bool,
    /// A 2-component float vector.
    Vec2,
    /// A 3-component float vector.
    Vec3,
    /// A 4-component float vector.
    Vec4,
    /// A 4x4 float matrix.
    Mat4,
    /// An owned string.
    String,
}

impl ResourceType {
    /// Whether this type tag names a GPU-backed resource (as opposed to a
    /// plain CPU value).
    pub fn is_gpu_resource(self) -> bool {
        !matches!(
            self,
            Self::Int | Self::Float | Self::Bool | Self::Vec2 | Self::Vec3 | Self::Vec4 | Self::Mat4 | Self::String
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpu_resource_classification() {
        assert!(ResourceType::Image.is_gpu_resource());
        assert!(!ResourceType::Float.is_gpu_resource());
    }
}

//! Descriptors: the creation parameters for a resource, variant by type
//! (spec §3, §4.2).

use super::registry::ResourceType;

/// Creation parameters for a GPU image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDescriptor {
    /// Width, height, depth in texels.
    pub extent: [u32; 3],
    /// Backend-defined format tag (opaque to the core; the shader/pipeline
    /// contract interprets it).
    pub format: u32,
    /// Usage flags (sampled, color attachment, transfer src/dst, ...),
    /// opaque bitmask defined by the GPU backend.
    pub usage: u32,
    pub mip_levels: u32,
    pub array_layers: u32,
    pub sample_count: u32,
}

impl ImageDescriptor {
    /// A 2D image with one mip level, one array layer, no multisampling.
    pub fn new_2d(width: u32, height: u32, format: u32, usage: u32) -> Self {
        Self {
            extent: [width, height, 1],
            format,
            usage,
            mip_levels: 1,
            array_layers: 1,
            sample_count: 1,
        }
    }

    /// Whether this descriptor describes a valid allocation (non-zero
    /// extent on every dimension — spec §4.2, "Fails with ... invalid
    /// descriptor (e.g., zero extent)").
    pub fn is_valid(&self) -> bool {
        self.extent.iter().all(|&d| d > 0) && self.mip_levels > 0 && self.array_layers > 0 && self.sample_count > 0
    }
}

/// Creation parameters for a GPU buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferDescriptor {
    /// Size in bytes.
    pub size: u64,
    /// Usage flags, opaque bitmask defined by the GPU backend.
    pub usage: u32,
}

impl BufferDescriptor {
    pub fn new(size: u64, usage: u32) -> Self {
        Self { size, usage }
    }

    pub fn is_valid(&self) -> bool {
        self.size > 0
    }
}

/// Creation parameters for an image view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageViewDescriptor {
    pub base_mip: u32,
    pub mip_count: u32,
    pub base_layer: u32,
    pub layer_count: u32,
}

/// Creation parameters for a sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerDescriptor {
    pub min_filter: u32,
    pub mag_filter: u32,
    pub address_mode: u32,
}

/// Opaque pipeline creation parameters. The reflection table (spec §6)
/// populates `descriptor_set_layouts`/`push_constant_size` from shader
/// source; the core does not interpret shader bytecode itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineDescriptor {
    pub shader_stage_hash: u64,
    pub descriptor_set_layout_hashes: Vec<u64>,
    pub push_constant_size: u32,
    pub is_compute: bool,
}

/// Creation parameters for a descriptor set layout, expressed as the
/// reflection table would produce it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DescriptorSetLayoutDescriptor {
    pub binding_type_hashes: Vec<u64>,
}

/// Creation parameters for an acceleration structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccelerationStructureDescriptor {
    pub is_top_level: bool,
    pub primitive_count: u32,
}

/// Creation parameters for a render pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderPassDescriptor {
    pub attachment_format_hashes: Vec<u64>,
}

/// Creation parameters for a command pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandPoolDescriptor {
    pub queue_family_index: u32,
    pub transient: bool,
}

/// A value-typed (non-GPU) descriptor is simply the type tag; the value
/// itself lives in the resource's handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueDescriptor;

/// The descriptor variant for one resource, tagged by [`ResourceType`].
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceDescriptor {
    Buffer(BufferDescriptor),
    Image(ImageDescriptor),
    ImageView(ImageViewDescriptor),
    Sampler(SamplerDescriptor),
    Pipeline(PipelineDescriptor),
    DescriptorSetLayout(DescriptorSetLayoutDescriptor),
    AccelerationStructure(AccelerationStructureDescriptor),
    RenderPass(RenderPassDescriptor),
    CommandPool(CommandPoolDescriptor),
    Generic,
    Value(ValueDescriptor),
}

impl ResourceDescriptor {
    /// The type tag this descriptor variant corresponds to, or `None` for
    /// `Value` descriptors (a plain value's type comes from the owning
    /// resource's declared tag, not from the descriptor).
    pub fn resource_type(&self) -> Option<ResourceType> {
        Some(match self {
            Self::Buffer(_) => ResourceType::Buffer,
            Self::Image(_) => ResourceType::Image,
            Self::ImageView(_) => ResourceType::ImageView,
            Self::Sampler(_) => ResourceType::Sampler,
            Self::Pipeline(_) => ResourceType::Pipeline,
            Self::DescriptorSetLayout(_) => ResourceType::DescriptorSetLayout,
            Self::AccelerationStructure(_) => ResourceType::AccelerationStructure,
            Self::RenderPass(_) => ResourceType::RenderPass,
            Self::CommandPool(_) => ResourceType::CommandPool,
            Self::Generic => ResourceType::Generic,
            Self::Value(_) => return None,
        })
    }

    /// Whether this descriptor describes a valid, creatable resource
    /// (spec §4.2 "invalid descriptor" failure mode).
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Buffer(b) => b.is_valid(),
            Self::Image(i) => i.is_valid(),
            _ => true,
        }
    }
}

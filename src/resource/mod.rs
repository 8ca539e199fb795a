//! # Resource system
//!
//! A closed-registry, tagged-union resource model sitting directly above
//! the event bus in the dependency order (spec §4.2, §3). Every other
//! subsystem — lifetime tracking, caches, the graph's slot bindings —
//! is built on top of [`Resource`] and its handle/descriptor types.

mod descriptor;
mod handle;
mod registry;
mod resource;

pub use descriptor::{
    AccelerationStructureDescriptor, BufferDescriptor, CommandPoolDescriptor,
    DescriptorSetLayoutDescriptor, ImageDescriptor, ImageViewDescriptor, PipelineDescriptor,
    RenderPassDescriptor, ResourceDescriptor, SamplerDescriptor, ValueDescriptor,
};
pub use handle::{extractor, BackendHandle, Extractor, HandleState, ResourceHandleValue};
pub use registry::ResourceType;
pub use resource::{
    LifetimeClass, MemoryLocation, Resource, ResourceError, ResourceRef, ResourceScope,
    ResourceState,
};

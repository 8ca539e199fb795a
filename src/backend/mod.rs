//! # Backend
//!
//! The abstract GPU backend contract (spec §6) and the shader/pipeline
//! reflection types it consumes. Everything here is an interface; no
//! concrete graphics API calls live in this crate.

mod error;
mod reflection;
mod traits;

pub use error::BackendError;
pub use reflection::{
    DescriptorBindingSpec, DescriptorLayoutSpec, PushConstantLayout, ShaderReflection,
    SpecializationConstant, VertexInputAttribute,
};
pub use traits::{
    BackendResult, CommandBufferHandle, GpuBackend, MemoryBudgetReport, TimelinePoint,
    TimelineSemaphoreHandle,
};

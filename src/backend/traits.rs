//! The abstract GPU backend contract (spec §6): device/queue handles,
//! command-buffer recording, typed resource creation/destruction, memory
//! allocation with location hints, timestamp queries, timeline semaphores,
//! and a device-memory budget query. Concrete Vulkan calls are out of
//! scope; a real backend lives behind this trait in its own crate.

use crate::resource::{
    AccelerationStructureDescriptor, BufferDescriptor, CommandPoolDescriptor,
    DescriptorSetLayoutDescriptor, ImageDescriptor, ImageViewDescriptor, MemoryLocation,
    PipelineDescriptor, RenderPassDescriptor, SamplerDescriptor,
};

use super::error::BackendError;
use super::reflection::ShaderReflection;

pub type BackendResult<T> = Result<T, BackendError>;

/// Opaque handle to a backend command buffer, returned by
/// [`GpuBackend::allocate_command_buffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandBufferHandle(pub u64);

/// Opaque handle to a timeline semaphore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimelineSemaphoreHandle(pub u64);

/// A point on a timeline semaphore, used both to submit a signal and to
/// wait for completion (spec §4.10, batched upload tickets).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelinePoint {
    pub semaphore: TimelineSemaphoreHandle,
    pub value: u64,
}

/// Current device-memory budget, queried per location class (spec §6,
/// "a device-memory budget query").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryBudgetReport {
    pub location: MemoryLocation,
    pub budget_bytes: u64,
    pub in_use_bytes: u64,
}

/// The core's abstract view of a GPU device. Node authors and the
/// compiler's pipeline-materialization step issue creation/destruction
/// calls through this trait; nothing in the graph, compiler, or scheduler
/// names a concrete backend.
pub trait GpuBackend: Send + Sync {
    /// Monotonic clock period for timestamp queries, in nanoseconds per
    /// tick (spec §6, "timestamp queries with a monotonic clock period").
    fn timestamp_period_ns(&self) -> f64;

    fn allocate_command_buffer(&self, queue_family_index: u32) -> BackendResult<CommandBufferHandle>;
    fn free_command_buffer(&self, handle: CommandBufferHandle);
    fn begin_command_buffer(&self, handle: CommandBufferHandle) -> BackendResult<()>;
    fn end_command_buffer(&self, handle: CommandBufferHandle) -> BackendResult<()>;

    fn create_buffer(&self, descriptor: &BufferDescriptor, location: MemoryLocation) -> BackendResult<u64>;
    fn destroy_buffer(&self, handle: u64);

    fn create_image(&self, descriptor: &ImageDescriptor, location: MemoryLocation) -> BackendResult<u64>;
    fn destroy_image(&self, handle: u64);

    fn create_image_view(&self, descriptor: &ImageViewDescriptor, image: u64) -> BackendResult<u64>;
    fn destroy_image_view(&self, handle: u64);

    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> BackendResult<u64>;
    fn destroy_sampler(&self, handle: u64);

    /// Builds a pipeline from a descriptor plus the reflection table that
    /// produced it (spec §6, "Shader / pipeline contract").
    fn create_pipeline(&self, descriptor: &PipelineDescriptor, reflection: &ShaderReflection) -> BackendResult<u64>;
    fn destroy_pipeline(&self, handle: u64);

    fn create_descriptor_set_layout(&self, descriptor: &DescriptorSetLayoutDescriptor) -> BackendResult<u64>;
    fn destroy_descriptor_set_layout(&self, handle: u64);

    fn create_acceleration_structure(&self, descriptor: &AccelerationStructureDescriptor) -> BackendResult<u64>;
    fn destroy_acceleration_structure(&self, handle: u64);

    fn create_render_pass(&self, descriptor: &RenderPassDescriptor) -> BackendResult<u64>;
    fn destroy_render_pass(&self, handle: u64);

    fn create_command_pool(&self, descriptor: &CommandPoolDescriptor) -> BackendResult<u64>;
    fn destroy_command_pool(&self, handle: u64);

    /// Records a GPU timestamp into `command_buffer` at the current point
    /// in recording; the raw tick value is read back once the submission
    /// completes.
    fn write_timestamp(&self, command_buffer: CommandBufferHandle) -> BackendResult<u64>;

    fn create_timeline_semaphore(&self, initial_value: u64) -> BackendResult<TimelineSemaphoreHandle>;
    fn destroy_timeline_semaphore(&self, handle: TimelineSemaphoreHandle);
    fn signal_timeline_semaphore(&self, point: TimelinePoint) -> BackendResult<()>;

    /// Blocks (the caller's cooperative-wait point, not this trait's
    /// concern) until `point` is reached or `timeout_ns` elapses.
    fn wait_timeline_semaphore(&self, point: TimelinePoint, timeout_ns: u64) -> BackendResult<()>;

    fn query_memory_budget(&self, location: MemoryLocation) -> BackendResult<MemoryBudgetReport>;
}

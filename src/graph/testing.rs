//! In-memory fixtures for exercising a graph without a real GPU device,
//! gated behind the `testing` feature (spec §8's scenario tests and any
//! downstream crate's own integration tests both want this without
//! depending on a concrete backend). Mirrors how the teacher's renderer
//! facade is unit-tested against a fake `RenderBackend` rather than a
//! live one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::backend::{
    BackendResult, CommandBufferHandle, GpuBackend, MemoryBudgetReport, ShaderReflection,
    TimelinePoint, TimelineSemaphoreHandle,
};
use crate::ids::ResourceId;
use crate::resource::{
    AccelerationStructureDescriptor, BufferDescriptor, CommandPoolDescriptor,
    DescriptorSetLayoutDescriptor, ImageDescriptor, ImageViewDescriptor, LifetimeClass,
    MemoryLocation, PipelineDescriptor, RenderPassDescriptor, Resource, ResourceDescriptor,
    ResourceHandleValue, ResourceRef, ResourceScope, ResourceType, SamplerDescriptor,
};

use super::context::{CompileContext, ExecuteContext};
use super::error::GraphError;
use super::node::NodeBehavior;
use super::task::VirtualTask;

/// A backend that allocates nothing real and never fails, handing out
/// distinct handles so aliasing/lifetime tests can still tell resources
/// apart.
pub struct NullGpuBackend {
    next_handle: AtomicU64,
}

impl NullGpuBackend {
    pub fn new() -> Self {
        Self { next_handle: AtomicU64::new(1) }
    }

    fn next(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for NullGpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuBackend for NullGpuBackend {
    fn timestamp_period_ns(&self) -> f64 {
        1.0
    }
    fn allocate_command_buffer(&self, _queue_family_index: u32) -> BackendResult<CommandBufferHandle> {
        Ok(CommandBufferHandle(self.next()))
    }
    fn free_command_buffer(&self, _handle: CommandBufferHandle) {}
    fn begin_command_buffer(&self, _handle: CommandBufferHandle) -> BackendResult<()> {
        Ok(())
    }
    fn end_command_buffer(&self, _handle: CommandBufferHandle) -> BackendResult<()> {
        Ok(())
    }
    fn create_buffer(&self, _descriptor: &BufferDescriptor, _location: MemoryLocation) -> BackendResult<u64> {
        Ok(self.next())
    }
    fn destroy_buffer(&self, _handle: u64) {}
    fn create_image(&self, _descriptor: &ImageDescriptor, _location: MemoryLocation) -> BackendResult<u64> {
        Ok(self.next())
    }
    fn destroy_image(&self, _handle: u64) {}
    fn create_image_view(&self, _descriptor: &ImageViewDescriptor, _image: u64) -> BackendResult<u64> {
        Ok(self.next())
    }
    fn destroy_image_view(&self, _handle: u64) {}
    fn create_sampler(&self, _descriptor: &SamplerDescriptor) -> BackendResult<u64> {
        Ok(self.next())
    }
    fn destroy_sampler(&self, _handle: u64) {}
    fn create_pipeline(&self, _descriptor: &PipelineDescriptor, _reflection: &ShaderReflection) -> BackendResult<u64> {
        Ok(self.next())
    }
    fn destroy_pipeline(&self, _handle: u64) {}
    fn create_descriptor_set_layout(&self, _descriptor: &DescriptorSetLayoutDescriptor) -> BackendResult<u64> {
        Ok(self.next())
    }
    fn destroy_descriptor_set_layout(&self, _handle: u64) {}
    fn create_acceleration_structure(&self, _descriptor: &AccelerationStructureDescriptor) -> BackendResult<u64> {
        Ok(self.next())
    }
    fn destroy_acceleration_structure(&self, _handle: u64) {}
    fn create_render_pass(&self, _descriptor: &RenderPassDescriptor) -> BackendResult<u64> {
        Ok(self.next())
    }
    fn destroy_render_pass(&self, _handle: u64) {}
    fn create_command_pool(&self, _descriptor: &CommandPoolDescriptor) -> BackendResult<u64> {
        Ok(self.next())
    }
    fn destroy_command_pool(&self, _handle: u64) {}
    fn write_timestamp(&self, _command_buffer: CommandBufferHandle) -> BackendResult<u64> {
        Ok(0)
    }
    fn create_timeline_semaphore(&self, _initial_value: u64) -> BackendResult<TimelineSemaphoreHandle> {
        Ok(TimelineSemaphoreHandle(self.next()))
    }
    fn destroy_timeline_semaphore(&self, _handle: TimelineSemaphoreHandle) {}
    fn signal_timeline_semaphore(&self, _point: TimelinePoint) -> BackendResult<()> {
        Ok(())
    }
    fn wait_timeline_semaphore(&self, _point: TimelinePoint, _timeout_ns: u64) -> BackendResult<()> {
        Ok(())
    }
    fn query_memory_budget(&self, location: MemoryLocation) -> BackendResult<MemoryBudgetReport> {
        Ok(MemoryBudgetReport { location, budget_bytes: 1 << 30, in_use_bytes: 0 })
    }
}

/// Publishes a fixed-size dummy buffer on output slot 0 and counts how
/// many times it has executed; a source node for wiring tests.
pub struct PassThroughSource {
    size_bytes: u64,
    executed: Arc<AtomicU64>,
}

impl PassThroughSource {
    pub fn new(size_bytes: u64) -> Self {
        Self { size_bytes, executed: Arc::new(AtomicU64::new(0)) }
    }

    pub fn execution_count(&self) -> Arc<AtomicU64> {
        self.executed.clone()
    }
}

impl NodeBehavior for PassThroughSource {
    fn compile(&mut self, ctx: &mut CompileContext) -> Result<(), GraphError> {
        let resource = Arc::new(
            Resource::new(
                ResourceId::default(),
                ResourceType::Buffer,
                ResourceDescriptor::Buffer(BufferDescriptor::new(self.size_bytes, 0)),
                LifetimeClass::Transient,
                ResourceScope::NodeLevel,
                self.size_bytes,
                MemoryLocation::DeviceLocal,
            )
            .expect("fixture descriptor is always valid"),
        );
        resource.publish_handle(ResourceHandleValue::Buffer(1));
        ctx.publish_output(0, resource)
    }

    fn execute(&mut self, ctx: &mut ExecuteContext) -> Result<(), GraphError> {
        let executed = self.executed.clone();
        ctx.emit_task(VirtualTask::new(move || {
            executed.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }));
        Ok(())
    }
}

/// Forwards input slot 0 to output slot 0 unmodified; a fan-through node
/// for chain tests.
#[derive(Default)]
pub struct PassThroughRelay;

impl NodeBehavior for PassThroughRelay {
    fn compile(&mut self, ctx: &mut CompileContext) -> Result<(), GraphError> {
        let resource: ResourceRef = ctx.input(0)?.clone();
        ctx.publish_output(0, resource)
    }

    fn execute(&mut self, ctx: &mut ExecuteContext) -> Result<(), GraphError> {
        let _ = ctx.input(0)?;
        ctx.emit_task(VirtualTask::new(|| Ok(())));
        Ok(())
    }
}

/// Reads every resource fused into an array-typed input slot 0 and
/// records how many it saw each time it ran; a fan-in node for
/// accumulation/grouping tests.
#[derive(Default)]
pub struct FanInSink {
    last_seen_count: Arc<AtomicU64>,
}

impl FanInSink {
    pub fn new() -> Self {
        Self { last_seen_count: Arc::new(AtomicU64::new(0)) }
    }

    pub fn last_seen_count(&self) -> Arc<AtomicU64> {
        self.last_seen_count.clone()
    }
}

impl NodeBehavior for FanInSink {
    fn compile(&mut self, ctx: &mut CompileContext) -> Result<(), GraphError> {
        self.last_seen_count.store(ctx.input_count(0) as u64, Ordering::Relaxed);
        Ok(())
    }

    fn execute(&mut self, ctx: &mut ExecuteContext) -> Result<(), GraphError> {
        let _ = ctx.input_count(0);
        ctx.emit_task(VirtualTask::new(|| Ok(())));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::GpuBackend;

    #[test]
    fn null_backend_hands_out_distinct_handles() {
        let backend = NullGpuBackend::new();
        let first = backend.create_buffer(&BufferDescriptor::new(4, 0), MemoryLocation::DeviceLocal).unwrap();
        let second = backend.create_buffer(&BufferDescriptor::new(4, 0), MemoryLocation::DeviceLocal).unwrap();
        assert_ne!(first, second);
    }
}

//! End-to-end tests driving the `Runtime` composition root the way an
//! embedding application would: register node types, connect a small
//! graph, compile, render frames, and shut down (spec §8, scenario S1
//! plus the `ApplicationInitialized`/`ApplicationShuttingDown` lifecycle).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use vixen::backend::{BackendResult, CommandBufferHandle, GpuBackend, MemoryBudgetReport, ShaderReflection, TimelinePoint, TimelineSemaphoreHandle};
use vixen::core::config::{GraphConfig, RuntimeConfig};
use vixen::event_bus::{DeliveryMode, DeviceMetadata, EventTag, GraphEvent, HardwareFingerprint};
use vixen::graph::{CompileContext, ExecuteContext, NodeBehavior, NodeSchema, OutputSlotDesc, InputSlotDesc};
use vixen::resource::{BufferDescriptor, LifetimeClass, MemoryLocation, Resource, ResourceDescriptor, ResourceHandleValue, ResourceScope, ResourceType};
use vixen::Runtime;

/// A backend that records nothing and never fails; exercises the graph
/// and scheduler plumbing without a real GPU.
struct NullBackend;

impl GpuBackend for NullBackend {
    fn timestamp_period_ns(&self) -> f64 {
        1.0
    }
    fn allocate_command_buffer(&self, _queue_family_index: u32) -> BackendResult<CommandBufferHandle> {
        Ok(CommandBufferHandle(0))
    }
    fn free_command_buffer(&self, _handle: CommandBufferHandle) {}
    fn begin_command_buffer(&self, _handle: CommandBufferHandle) -> BackendResult<()> {
        Ok(())
    }
    fn end_command_buffer(&self, _handle: CommandBufferHandle) -> BackendResult<()> {
        Ok(())
    }
    fn create_buffer(&self, _descriptor: &BufferDescriptor, _location: MemoryLocation) -> BackendResult<u64> {
        Ok(1)
    }
    fn destroy_buffer(&self, _handle: u64) {}
    fn create_image(&self, _descriptor: &vixen::resource::ImageDescriptor, _location: MemoryLocation) -> BackendResult<u64> {
        Ok(1)
    }
    fn destroy_image(&self, _handle: u64) {}
    fn create_image_view(&self, _descriptor: &vixen::resource::ImageViewDescriptor, _image: u64) -> BackendResult<u64> {
        Ok(1)
    }
    fn destroy_image_view(&self, _handle: u64) {}
    fn create_sampler(&self, _descriptor: &vixen::resource::SamplerDescriptor) -> BackendResult<u64> {
        Ok(1)
    }
    fn destroy_sampler(&self, _handle: u64) {}
    fn create_pipeline(&self, _descriptor: &vixen::resource::PipelineDescriptor, _reflection: &ShaderReflection) -> BackendResult<u64> {
        Ok(1)
    }
    fn destroy_pipeline(&self, _handle: u64) {}
    fn create_descriptor_set_layout(&self, _descriptor: &vixen::resource::DescriptorSetLayoutDescriptor) -> BackendResult<u64> {
        Ok(1)
    }
    fn destroy_descriptor_set_layout(&self, _handle: u64) {}
    fn create_acceleration_structure(&self, _descriptor: &vixen::resource::AccelerationStructureDescriptor) -> BackendResult<u64> {
        Ok(1)
    }
    fn destroy_acceleration_structure(&self, _handle: u64) {}
    fn create_render_pass(&self, _descriptor: &vixen::resource::RenderPassDescriptor) -> BackendResult<u64> {
        Ok(1)
    }
    fn destroy_render_pass(&self, _handle: u64) {}
    fn create_command_pool(&self, _descriptor: &vixen::resource::CommandPoolDescriptor) -> BackendResult<u64> {
        Ok(1)
    }
    fn destroy_command_pool(&self, _handle: u64) {}
    fn write_timestamp(&self, _command_buffer: CommandBufferHandle) -> BackendResult<u64> {
        Ok(0)
    }
    fn create_timeline_semaphore(&self, _initial_value: u64) -> BackendResult<TimelineSemaphoreHandle> {
        Ok(TimelineSemaphoreHandle(0))
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

struct ProducerBehavior {
    executed: Arc<AtomicUsize>,
}

impl NodeBehavior for ProducerBehavior {
    fn compile(&mut self, ctx: &mut CompileContext) -> Result<(), vixen::graph::GraphError> {
        let resource = Arc::new(
            Resource::new(
                vixen::ids::ResourceId::default(),
                ResourceType::Buffer,
                ResourceDescriptor::Buffer(BufferDescriptor::new(256, 0)),
                LifetimeClass::Transient,
                ResourceScope::NodeLevel,
                256,
                MemoryLocation::DeviceLocal,
            )
            .unwrap(),
        );
        resource.publish_handle(ResourceHandleValue::Buffer(7));
        ctx.publish_output(0, resource)
    }

    fn execute(&mut self, ctx: &mut ExecuteContext) -> Result<(), vixen::graph::GraphError> {
        let executed = self.executed.clone();
        ctx.emit_task(vixen::graph::VirtualTask::new(move || {
            executed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));
        Ok(())
    }
}

struct ConsumerBehavior {
    executed: Arc<AtomicUsize>,
}

impl NodeBehavior for ConsumerBehavior {
    fn compile(&mut self, ctx: &mut CompileContext) -> Result<(), vixen::graph::GraphError> {
        let input = ctx.input(0)?.clone();
        ctx.publish_output(0, input)
    }

    fn execute(&mut self, ctx: &mut ExecuteContext) -> Result<(), vixen::graph::GraphError> {
        let _ = ctx.input(0)?;
        let executed = self.executed.clone();
        ctx.emit_task(vixen::graph::VirtualTask::new(move || {
            executed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));
        Ok(())
    }
}

fn build_runtime(calibration_path: &str) -> Runtime {
    let graph_config = GraphConfig::new(2);
    let mut config = RuntimeConfig::new(graph_config);
    config.calibration.store_path = calibration_path.to_string();
    Runtime::new(config, Arc::new(NullBackend), 2)
}

#[test]
fn compiles_and_renders_a_two_node_chain_end_to_end() {
    let dir = std::env::temp_dir().join(format!("vixen-runtime-chain-{}", std::process::id()));
    let path = dir.join("profiles.json");
    let mut runtime = build_runtime(path.to_str().unwrap());

    let producer_executed = Arc::new(AtomicUsize::new(0));
    let consumer_executed = Arc::new(AtomicUsize::new(0));

    {
        let producer_executed = producer_executed.clone();
        runtime.graph.register_node_type(
            "producer",
            Box::new(move || {
                let schema = NodeSchema::new(vec![], vec![OutputSlotDesc::new(0, "out", ResourceType::Buffer, LifetimeClass::Transient)]);
                let behavior = Box::new(ProducerBehavior { executed: producer_executed.clone() }) as Box<dyn NodeBehavior>;
                (schema, behavior)
            }),
        );
    }
    {
        let consumer_executed = consumer_executed.clone();
        runtime.graph.register_node_type(
            "consumer",
            Box::new(move || {
                let schema = NodeSchema::new(
                    vec![InputSlotDesc::new(0, "in", ResourceType::Buffer)],
                    vec![OutputSlotDesc::new(0, "out", ResourceType::Buffer, LifetimeClass::Transient)],
                );
                let behavior = Box::new(ConsumerBehavior { executed: consumer_executed.clone() }) as Box<dyn NodeBehavior>;
                (schema, behavior)
            }),
        );
    }

    let a = runtime.graph.add_node("producer", "A").unwrap();
    let b = runtime.graph.add_node("consumer", "B").unwrap();
    runtime.graph.connect(a, 0, b, 0, vec![]).unwrap();

    let fingerprint = HardwareFingerprint { vendor_id: 0x10DE, device_id: 0x1234, driver_version: "1.0".to_string() };
    let loaded_profiles = runtime.initialize(DeviceMetadata { device_name: "Test GPU".to_string(), fingerprint: fingerprint.clone() });
    assert!(loaded_profiles.is_empty());

    runtime.compile().unwrap();
    runtime.render_frame().unwrap();
    runtime.render_frame().unwrap();

    assert_eq!(producer_executed.load(Ordering::SeqCst), 2);
    assert_eq!(consumer_executed.load(Ordering::SeqCst), 2);

    runtime.shutdown(fingerprint, loaded_profiles);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn render_frame_publishes_frame_lifecycle_events() {
    let dir = std::env::temp_dir().join(format!("vixen-runtime-events-{}", std::process::id()));
    let path = dir.join("profiles.json");
    let mut runtime = build_runtime(path.to_str().unwrap());

    runtime.graph.register_node_type(
        "producer",
        Box::new(|| {
            let schema = NodeSchema::new(vec![], vec![OutputSlotDesc::new(0, "out", ResourceType::Buffer, LifetimeClass::Transient)]);
            let behavior = Box::new(ProducerBehavior { executed: Arc::new(AtomicUsize::new(0)) }) as Box<dyn NodeBehavior>;
            (schema, behavior)
        }),
    );
    runtime.graph.add_node("producer", "A").unwrap();

    let seen_frame_starts = Arc::new(Mutex::new(Vec::new()));
    let seen_frame_starts_clone = seen_frame_starts.clone();
    runtime.event_bus().subscribe(EventTag::FrameStart, DeliveryMode::Immediate, move |event| {
        if let GraphEvent::FrameStart { frame_number, .. } = event {
            seen_frame_starts_clone.lock().unwrap().push(*frame_number);
        }
    });

    runtime.compile().unwrap();
    runtime.render_frame().unwrap();
    runtime.render_frame().unwrap();

    assert_eq!(*seen_frame_starts.lock().unwrap(), vec![0, 1]);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn render_frame_before_compile_returns_an_error() {
    let dir = std::env::temp_dir().join(format!("vixen-runtime-uncompiled-{}", std::process::id()));
    let path = dir.join("profiles.json");
    let mut runtime = build_runtime(path.to_str().unwrap());
    assert!(runtime.render_frame().is_err());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn calibration_profiles_round_trip_across_shutdown_and_reinitialize() {
    let dir = std::env::temp_dir().join(format!("vixen-runtime-calib-{}", std::process::id()));
    let path = dir.join("profiles.json");
    let fingerprint = HardwareFingerprint { vendor_id: 0x1002, device_id: 0x73a0, driver_version: "test".to_string() };

    let mut snapshots = std::collections::HashMap::new();
    snapshots.insert(
        "shadow_pass".to_string(),
        vixen::calibration::ProfileSnapshot { baseline_ns: 100.0, cost_per_unit_ns: 2.0, work_units: 8.0 },
    );

    {
        let mut runtime = build_runtime(path.to_str().unwrap());
        let loaded = runtime.initialize(DeviceMetadata { device_name: "GPU".to_string(), fingerprint: fingerprint.clone() });
        assert!(loaded.is_empty());
        runtime.shutdown(fingerprint.clone(), snapshots.clone());
    }

    {
        let mut runtime = build_runtime(path.to_str().unwrap());
        let loaded = runtime.initialize(DeviceMetadata { device_name: "GPU".to_string(), fingerprint: fingerprint.clone() });
        assert_eq!(loaded.get("shadow_pass").unwrap().work_units, 8.0);
        runtime.shutdown(fingerprint, loaded);
    }

    let _ = std::fs::remove_dir_all(&dir);
}

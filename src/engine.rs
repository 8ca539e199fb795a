//! The runtime composition root (spec §2, "Data flow"): owns the graph,
//! the GPU backend, the scheduler, staging, and calibration state, and
//! drives the per-frame loop. Generalizes the teacher's `Engine::new`/
//! `Engine::run` composition-root shape from an ECS-driven game loop to a
//! render-graph runtime.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use log::{info, warn};

use crate::backend::GpuBackend;
use crate::calibration::{CalibrationStore, CapacityTracker, PredictionErrorTracker, TaskProfileRegistry};
use crate::core::config::RuntimeConfig;
use crate::error::VixenError;
use crate::event_bus::{DeliveryMode, DeviceMetadata, EventBus, EventTag, GraphEvent, HardwareFingerprint};
use crate::graph::Graph;
use crate::lifetime::{DeferredDestructionQueue, DeviceBudgetManager, HostBudgetManager};
use crate::scheduler::{CancelToken, Executor, TaskBudget, TaskQueue};
use crate::staging::{BatchedUploader, StagingBufferPool};

/// Owns every long-lived runtime subsystem, assembled in the same
/// leaves-first order the subsystems depend on each other in: event bus,
/// budgets, calibration, staging, graph, scheduler.
///
/// `capacity_tracker`, `profiles`, and `deferred_destruction` are shared
/// with the `FrameStart`/`FrameEnd` subscriber closures registered in
/// `new`, so they're reached through the event bus rather than called
/// directly from `render_frame` (spec §4.8: capacity tracking and
/// deferred-destruction retirement are frame-lifecycle reactions, not
/// calls the frame loop makes itself).
pub struct Runtime {
    pub graph: Graph,
    backend: Arc<dyn GpuBackend>,
    executor: Executor,
    task_queue: TaskQueue,
    cancel: CancelToken,
    staging_pool: StagingBufferPool,
    uploader: BatchedUploader,
    capacity_tracker: Arc<Mutex<CapacityTracker>>,
    profiles: Arc<Mutex<TaskProfileRegistry>>,
    prediction: PredictionErrorTracker,
    calibration_store: CalibrationStore,
    host_budget: HostBudgetManager,
    device_budget: DeviceBudgetManager,
    deferred_destruction: Arc<Mutex<DeferredDestructionQueue>>,
    event_bus: EventBus,
    config: RuntimeConfig,
}

impl Runtime {
    /// Assemble the runtime from a configuration and a concrete backend.
    /// Proportions the single host/device byte ceilings in `config` across
    /// the finer-grained budgets `lifetime::budget` tracks (stack/heap,
    /// device-local/host-visible/staging) — 10/90 for host, 70/20/10 for
    /// device, a starting split a real deployment would tune.
    pub fn new(config: RuntimeConfig, backend: Arc<dyn GpuBackend>, worker_threads: usize) -> Self {
        if let Err(reason) = config.validate() {
            warn!("runtime configuration failed validation: {reason}; proceeding with it anyway");
        }

        info!("assembling runtime: {} worker threads, {} frames in flight", worker_threads, config.graph.frames_in_flight);

        let event_bus = EventBus::new(config.graph.event_queue_capacity, config.graph.event_queue_warn_fraction);
        let graph = Graph::new(event_bus.clone());

        let host_max = config.host_budget.hard_max_bytes;
        let host_budget = HostBudgetManager::new(host_max / 10, host_max * 9 / 10, config.host_budget.mode);

        let device_max = config.device_budget.hard_max_bytes;
        let device_budget = DeviceBudgetManager::new(
            device_max * 7 / 10,
            device_max * 2 / 10,
            device_max / 10,
            config.device_budget.mode,
        );

        let deferred_destruction = Arc::new(Mutex::new(DeferredDestructionQueue::new(
            config.graph.deferred_destruction_capacity(),
            config.graph.frames_in_flight as u64,
        )));

        let calibration_store =
            CalibrationStore::new(config.calibration.store_path.clone(), config.calibration.mismatch_policy);

        let capacity_tracker = Arc::new(Mutex::new(CapacityTracker::new(1_000_000_000.0 / 60.0)));
        let profiles = Arc::new(Mutex::new(TaskProfileRegistry::new()));

        // FrameStart: retire resources whose in-flight delay has elapsed
        // and apply any profile pressure adjustment queued by the
        // previous frame's BudgetOverrun/BudgetAvailable (spec §4.6, §4.7).
        let frame_start_destruction = deferred_destruction.clone();
        let frame_start_profiles = profiles.clone();
        event_bus.subscribe(EventTag::FrameStart, DeliveryMode::Immediate, move |event| {
            if let GraphEvent::FrameStart { frame_number, .. } = event {
                frame_start_destruction.lock().unwrap().retire(*frame_number);
                frame_start_profiles.lock().unwrap().apply_pending_adjustments();
            }
        });

        // FrameEnd: feed the measured frame duration into the capacity
        // tracker and react to whatever BudgetOverrun/BudgetAvailable it
        // derives by republishing it and nudging every task's profile
        // pressure (spec §4.7).
        let frame_end_tracker = capacity_tracker.clone();
        let frame_end_profiles = profiles.clone();
        let frame_end_bus = event_bus.clone();
        event_bus.subscribe(EventTag::FrameEnd, DeliveryMode::Immediate, move |event| {
            if let GraphEvent::FrameEnd { measured_ns, .. } = event {
                let derived = frame_end_tracker.lock().unwrap().record_frame(*measured_ns);
                if let Some(derived) = derived {
                    match derived {
                        GraphEvent::BudgetOverrun { .. } => frame_end_profiles.lock().unwrap().on_budget_overrun(),
                        GraphEvent::BudgetAvailable { .. } => frame_end_profiles.lock().unwrap().on_budget_available(),
                        _ => {}
                    }
                    frame_end_bus.publish(derived);
                }
            }
        });

        Self {
            graph,
            backend,
            executor: Executor::new(worker_threads),
            task_queue: TaskQueue::new(TaskBudget::preset_fps(60.0, config.graph.default_budget_mode)),
            cancel: CancelToken::new(),
            staging_pool: StagingBufferPool::new(),
            uploader: BatchedUploader::new(),
            capacity_tracker,
            profiles,
            prediction: PredictionErrorTracker::new(),
            calibration_store,
            host_budget,
            device_budget,
            deferred_destruction,
            event_bus,
            config,
        }
    }

    /// Re-derive the task budget and capacity tracker's target for an
    /// actual refresh rate, once the caller knows it (spec §4.5, preset
    /// factory).
    pub fn set_target_fps(&mut self, fps: f64) {
        self.task_queue = TaskQueue::new(TaskBudget::preset_fps(fps, self.config.graph.default_budget_mode));
        *self.capacity_tracker.lock().unwrap() = CapacityTracker::new(1_000_000_000.0 / fps);
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn backend(&self) -> &Arc<dyn GpuBackend> {
        &self.backend
    }

    pub fn staging_pool(&self) -> &StagingBufferPool {
        &self.staging_pool
    }

    pub fn uploader(&self) -> &BatchedUploader {
        &self.uploader
    }

    /// Lock and access the task profile registry; shared with the
    /// `FrameStart`/`FrameEnd` subscribers registered in `new`.
    pub fn profiles(&self) -> MutexGuard<'_, TaskProfileRegistry> {
        self.profiles.lock().unwrap()
    }

    pub fn host_budget_mut(&mut self) -> &mut HostBudgetManager {
        &mut self.host_budget
    }

    pub fn device_budget_mut(&mut self) -> &mut DeviceBudgetManager {
        &mut self.device_budget
    }

    /// Lock and access the deferred-destruction queue; shared with the
    /// `FrameStart` subscriber registered in `new`.
    pub fn deferred_destruction(&self) -> MutexGuard<'_, DeferredDestructionQueue> {
        self.deferred_destruction.lock().unwrap()
    }

    /// Publish `ApplicationInitialized` and attempt to load this device's
    /// persisted calibration profiles (spec §4.7). Loaded snapshots are
    /// handed back for node authors to seed their own `TaskProfile`s with;
    /// this runtime has no way to know a task's identity before the graph
    /// registers one.
    pub fn initialize(&mut self, device: DeviceMetadata) -> HashMap<String, crate::calibration::ProfileSnapshot> {
        let fingerprint = device.fingerprint.clone();
        self.event_bus.publish(GraphEvent::ApplicationInitialized { device_metadata: device });

        match self.calibration_store.load(&fingerprint) {
            Ok(snapshots) => snapshots,
            Err(err) => {
                warn!("failed to load calibration store: {err}");
                HashMap::new()
            }
        }
    }

    /// `Compile()` (spec §6).
    pub fn compile(&mut self) -> Result<(), VixenError> {
        self.graph.compile().map_err(VixenError::from)
    }

    /// Run one frame: Execute walk, virtual-task dispatch, capacity
    /// tracking, deferred-destruction retirement (spec §2 "Data flow").
    ///
    /// Capacity tracking and deferred-destruction retirement happen as a
    /// side effect of publishing `FrameEnd` below, not as direct calls
    /// here — see the subscribers registered in `new` (spec §4.8).
    pub fn render_frame(&mut self) -> Result<(), VixenError> {
        let started = Instant::now();

        let result = self.graph.render_frame()?;

        let mut tasks = result.tasks;
        for task in &mut tasks {
            if let (Some(task_id), Some(raw)) = (task.profile, task.estimated_cost_ns) {
                task.estimated_cost_ns = Some(self.prediction.correct(task_id, raw));
            }
        }

        let (errors, samples) = self.executor.run(tasks, &mut self.task_queue, &self.cancel);
        for err in &errors {
            warn!("task error during frame {}: {err}", result.frame_number);
        }
        for sample in samples {
            self.prediction.record(sample.task, sample.estimated_ns, sample.measured_ns);
        }

        let measured_ns = started.elapsed().as_nanos() as f64;
        self.event_bus.publish(GraphEvent::FrameEnd {
            frame_number: result.frame_number,
            timestamp: result.frame_number as f64,
            measured_ns,
        });

        self.task_queue.reset();

        if let Some(first) = errors.into_iter().next() {
            return Err(VixenError::from(first));
        }
        Ok(())
    }

    /// Request cooperative cancellation of the in-flight frame (spec §5).
    pub fn cancel_frame(&self) {
        self.cancel.cancel();
    }

    /// Persist calibration profiles and run every node's Cleanup hook
    /// (spec §4.7, §6 `Shutdown()`).
    pub fn shutdown(&mut self, fingerprint: HardwareFingerprint, profile_snapshots: HashMap<String, crate::calibration::ProfileSnapshot>) {
        if let Err(err) = self.calibration_store.save(&fingerprint, profile_snapshots) {
            warn!("failed to save calibration store: {err}");
        }
        self.graph.shutdown();
        info!("runtime shutdown complete");
    }
}

//! Per-task cost models: `TaskProfile` learns `baseline + workUnits *
//! costPerUnit` from measured samples (spec §4.7).

use std::collections::HashMap;
use std::time::Instant;

use crate::ids::TaskId;
use crate::lifetime::Priority;

/// Fraction by which a profile's `work_units` pressure parameter is
/// nudged on each `BudgetOverrun`/`BudgetAvailable` (spec §4.7: decrease
/// the lowest-priority profile, increase the highest-priority one).
const PRESSURE_STEP_FRACTION: f64 = 0.10;

/// A per-task-identity cost model (spec §4.7, `TaskProfile`).
pub struct TaskProfile {
    priority: Priority,
    baseline_ns: f64,
    cost_per_unit_ns: f64,
    work_units: f64,
    ewma_alpha: f64,
    /// Deferred `AdjustPressure` delta, applied at the next `FrameStart`
    /// rather than mid-frame (spec §4.7).
    pending_delta: Option<f64>,
}

impl TaskProfile {
    pub fn new(priority: Priority, baseline_ns: f64, cost_per_unit_ns: f64, work_units: f64) -> Self {
        Self {
            priority,
            baseline_ns,
            cost_per_unit_ns,
            work_units,
            ewma_alpha: 0.2,
            pending_delta: None,
        }
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn work_units(&self) -> f64 {
        self.work_units
    }

    /// Estimated cost in nanoseconds for a given `work_units` value,
    /// before any [`super::prediction::PredictionErrorTracker`]
    /// correction factor is applied.
    pub fn estimated_cost_ns(&self, work_units: f64) -> f64 {
        self.baseline_ns + work_units * self.cost_per_unit_ns
    }

    /// Start a sampling window against this profile's current
    /// `work_units` (spec §4.7, `Sample()`).
    pub fn sample(&self) -> TaskSampler {
        TaskSampler { work_units: self.work_units, started: Instant::now() }
    }

    fn record_sample(&mut self, sampled_work_units: f64, measured_ns: f64) {
        if sampled_work_units <= f64::EPSILON {
            self.baseline_ns += self.ewma_alpha * (measured_ns - self.baseline_ns);
        } else {
            let attributable = (measured_ns - self.baseline_ns).max(0.0);
            let per_unit_sample = attributable / sampled_work_units;
            self.cost_per_unit_ns += self.ewma_alpha * (per_unit_sample - self.cost_per_unit_ns);
        }
    }

    /// Request a change to `work_units`; deferred until
    /// [`Self::apply_pending_adjustment`] runs (spec §4.7: "Adjustments
    /// are deferred ... and applied at the next `FrameStart`").
    pub fn adjust_pressure(&mut self, delta: f64) {
        *self.pending_delta.get_or_insert(0.0) += delta;
    }

    /// Apply any deferred pressure adjustment, clamping `work_units` to
    /// stay non-negative.
    pub fn apply_pending_adjustment(&mut self) {
        if let Some(delta) = self.pending_delta.take() {
            self.work_units = (self.work_units + delta).max(0.0);
        }
    }
}

/// A sampling handle returned by [`TaskProfile::sample`]; call
/// [`Self::finalize`] with the measured duration once the task completes.
pub struct TaskSampler {
    work_units: f64,
    started: Instant,
}

impl TaskSampler {
    pub fn elapsed_ns(&self) -> f64 {
        self.started.elapsed().as_nanos() as f64
    }

    /// Record the measured duration against `profile`, updating its
    /// baseline/cost-per-unit estimate with an exponentially weighted
    /// average (spec §4.7, `sampler.Finalize(measuredNs)`).
    pub fn finalize(self, profile: &mut TaskProfile, measured_ns: f64) {
        profile.record_sample(self.work_units, measured_ns);
    }
}

/// Owns one [`TaskProfile`] per task identity (spec §4.7,
/// `TaskProfileRegistry`).
pub struct TaskProfileRegistry {
    profiles: HashMap<TaskId, TaskProfile>,
}

impl TaskProfileRegistry {
    pub fn new() -> Self {
        Self { profiles: HashMap::new() }
    }

    pub fn register(&mut self, task: TaskId, profile: TaskProfile) {
        self.profiles.insert(task, profile);
    }

    pub fn get(&self, task: TaskId) -> Option<&TaskProfile> {
        self.profiles.get(&task)
    }

    pub fn get_mut(&mut self, task: TaskId) -> Option<&mut TaskProfile> {
        self.profiles.get_mut(&task)
    }

    /// React to a `BudgetOverrun` event: decrease the lowest-priority
    /// profile's work units (spec §4.7).
    pub fn on_budget_overrun(&mut self) {
        if let Some(profile) = self.profiles.values_mut().min_by_key(|p| p.priority) {
            let step = -profile.work_units * PRESSURE_STEP_FRACTION;
            profile.adjust_pressure(step);
        }
    }

    /// React to a `BudgetAvailable` event: increase the highest-priority
    /// profile's work units (spec §4.7).
    pub fn on_budget_available(&mut self) {
        if let Some(profile) = self.profiles.values_mut().max_by_key(|p| p.priority) {
            let step = profile.work_units * PRESSURE_STEP_FRACTION;
            profile.adjust_pressure(step);
        }
    }

    /// Apply every profile's deferred pressure adjustment; called once
    /// per `FrameStart`.
    pub fn apply_pending_adjustments(&mut self) {
        for profile in self.profiles.values_mut() {
            profile.apply_pending_adjustment();
        }
    }
}

impl Default for TaskProfileRegistry {
    fn default() -> Self {
        Self::new()
    }
}

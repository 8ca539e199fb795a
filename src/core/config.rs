//! # Unified Configuration System
//!
//! Consolidates the configuration structures used by every runtime
//! subsystem: the graph itself, the budget managers, and the calibration
//! store. Mirrors the teacher's configuration layer in spirit (builder
//! methods, `Config` trait for file-backed load/save, `validate()` before
//! use) but is shaped around render-graph concerns rather than renderer
//! bring-up.
//!
//! ## Configuration Categories
//!
//! - **Graph config**: frames-in-flight, deferred-destruction capacity,
//!   event-queue sizing.
//! - **Budget config**: host/device byte ceilings and eviction policy.
//! - **Calibration config**: persistence path and fingerprint-mismatch
//!   policy.

use serde::{Deserialize, Serialize};

pub use crate::config::{Config, ConfigError};

/// Strictness applied when a budget or task queue would be exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BudgetMode {
    /// Refuse the operation that would exceed the budget.
    Strict,
    /// Accept the operation but invoke a warning callback.
    Lenient,
}

impl Default for BudgetMode {
    fn default() -> Self {
        Self::Lenient
    }
}

/// # Graph Configuration
///
/// Top-level knobs for the render-graph runtime: pipelining depth and the
/// sizing of the ring buffers that back deferred destruction and the
/// event bus's deferred queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Number of frames the backend pipelines concurrently (N in
    /// `PerFrame` resource rotation and in deferred-destruction retirement).
    pub frames_in_flight: u32,
    /// Expected steady-state node count, used to size the deferred
    /// destruction ring buffer (`nodeCount x avgResourcesPerNode x
    /// framesInFlight`).
    pub expected_node_count: usize,
    /// Expected resources produced per node on average.
    pub avg_resources_per_node: usize,
    /// Event bus deferred-queue capacity.
    pub event_queue_capacity: usize,
    /// Fraction of `event_queue_capacity` at which an overflow warning
    /// fires (default 0.8 per spec §4.8).
    pub event_queue_warn_fraction: f32,
    /// Default task budget mode applied when a node doesn't specify one.
    pub default_budget_mode: BudgetMode,
}

impl GraphConfig {
    /// Construct a configuration for a given number of frames in flight.
    pub fn new(frames_in_flight: u32) -> Self {
        Self {
            frames_in_flight,
            expected_node_count: 64,
            avg_resources_per_node: 4,
            event_queue_capacity: 1024,
            event_queue_warn_fraction: 0.8,
            default_budget_mode: BudgetMode::Lenient,
        }
    }

    /// Preset tuned for a 60 FPS target: double-buffered, 16.67ms budget.
    pub fn preset_60fps() -> Self {
        Self::new(2)
    }

    /// Preset tuned for a 120 FPS target: triple-buffered to absorb jitter.
    pub fn preset_120fps() -> Self {
        Self::new(3)
    }

    /// Preset tuned for a 144 FPS target.
    pub fn preset_144fps() -> Self {
        Self::new(3)
    }

    /// Set the expected node/resource counts used to size the deferred
    /// destruction ring buffer.
    pub fn with_expected_scale(mut self, node_count: usize, avg_resources_per_node: usize) -> Self {
        self.expected_node_count = node_count;
        self.avg_resources_per_node = avg_resources_per_node;
        self
    }

    /// Set the event queue capacity and warning fraction.
    pub fn with_event_queue(mut self, capacity: usize, warn_fraction: f32) -> Self {
        self.event_queue_capacity = capacity;
        self.event_queue_warn_fraction = warn_fraction.clamp(0.0, 1.0);
        self
    }

    /// The deferred-destruction ring buffer's initial capacity.
    pub fn deferred_destruction_capacity(&self) -> usize {
        self.expected_node_count * self.avg_resources_per_node * self.frames_in_flight as usize
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.frames_in_flight == 0 {
            return Err("frames_in_flight must be at least 1".to_string());
        }
        if self.event_queue_capacity == 0 {
            return Err("event_queue_capacity must be non-zero".to_string());
        }
        Ok(())
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self::preset_60fps()
    }
}

impl Config for GraphConfig {}

/// # Budget Configuration
///
/// Byte ceilings and eviction policy for one `HostBudgetManager` or
/// `DeviceBudgetManager` instance (spec §4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Hard maximum in bytes; exceeding it in `Strict` mode fails the
    /// allocation.
    pub hard_max_bytes: u64,
    /// Warning threshold in bytes (should be < `hard_max_bytes`).
    pub warning_threshold_bytes: u64,
    /// Strict or lenient enforcement.
    pub mode: BudgetMode,
}

impl BudgetConfig {
    /// Create a budget with a hard maximum and a warning threshold at 90%.
    pub fn new(hard_max_bytes: u64) -> Self {
        Self {
            hard_max_bytes,
            warning_threshold_bytes: (hard_max_bytes as f64 * 0.9) as u64,
            mode: BudgetMode::Strict,
        }
    }

    /// Override the warning threshold.
    pub fn with_warning_threshold(mut self, bytes: u64) -> Self {
        self.warning_threshold_bytes = bytes;
        self
    }

    /// Override the enforcement mode.
    pub fn with_mode(mut self, mode: BudgetMode) -> Self {
        self.mode = mode;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.warning_threshold_bytes > self.hard_max_bytes {
            return Err("warning_threshold_bytes cannot exceed hard_max_bytes".to_string());
        }
        Ok(())
    }
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self::new(256 * 1024 * 1024)
    }
}

impl Config for BudgetConfig {}

/// Policy applied when a loaded calibration record's hardware fingerprint
/// does not match the running device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FingerprintMismatchPolicy {
    /// Load anyway, emitting a `CalibrationWarning` (spec §4.7, §6 default).
    WarnAndLoad,
    /// Discard the record and start from defaults.
    Discard,
}

impl Default for FingerprintMismatchPolicy {
    fn default() -> Self {
        Self::WarnAndLoad
    }
}

/// # Calibration Configuration
///
/// Where the `CalibrationStore` persists profiles, and what to do about a
/// hardware fingerprint mismatch on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Path to the calibration store file (TOML/RON/JSON determined by
    /// extension, same as `Config::load_from_file`).
    pub store_path: String,
    /// Mismatch handling policy.
    pub mismatch_policy: FingerprintMismatchPolicy,
}

impl CalibrationConfig {
    /// Create a calibration config pointing at a given store path.
    pub fn new(store_path: impl Into<String>) -> Self {
        Self {
            store_path: store_path.into(),
            mismatch_policy: FingerprintMismatchPolicy::default(),
        }
    }

    /// Override the mismatch policy.
    pub fn with_mismatch_policy(mut self, policy: FingerprintMismatchPolicy) -> Self {
        self.mismatch_policy = policy;
        self
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self::new("calibration.json")
    }
}

impl Config for CalibrationConfig {}

/// # Complete Runtime Configuration
///
/// Top-level configuration bundling graph, budget, and calibration
/// settings, analogous to the teacher's `ApplicationConfig`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Graph-level configuration.
    pub graph: GraphConfig,
    /// Host-memory budget.
    pub host_budget: BudgetConfig,
    /// Device-memory budget.
    pub device_budget: BudgetConfig,
    /// Calibration store configuration.
    pub calibration: CalibrationConfig,
}

impl RuntimeConfig {
    /// Build a runtime configuration from a graph config, deriving
    /// defaults for the budgets and calibration store.
    pub fn new(graph: GraphConfig) -> Self {
        Self {
            graph,
            host_budget: BudgetConfig::default(),
            device_budget: BudgetConfig::new(2 * 1024 * 1024 * 1024),
            calibration: CalibrationConfig::default(),
        }
    }

    /// Validate the entire configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.graph.validate()?;
        self.host_budget.validate()?;
        self.device_budget.validate()?;
        Ok(())
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new(GraphConfig::default())
    }
}

impl Config for RuntimeConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deferred_destruction_capacity_scales_with_frames_in_flight() {
        let cfg = GraphConfig::new(3).with_expected_scale(100, 5);
        assert_eq!(cfg.deferred_destruction_capacity(), 100 * 5 * 3);
    }

    #[test]
    fn budget_config_rejects_inverted_threshold() {
        let cfg = BudgetConfig::new(100).with_warning_threshold(200);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn graph_config_rejects_zero_frames_in_flight() {
        let cfg = GraphConfig::new(0);
        assert!(cfg.validate().is_err());
    }
}

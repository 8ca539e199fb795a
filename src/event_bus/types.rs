//! The closed catalog of events the bus carries (spec §4.8).

use serde::{Deserialize, Serialize};

use crate::ids::NodeId;

/// Vendor/device/driver triple used as a calibration record key (spec §6).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HardwareFingerprint {
    /// GPU vendor identifier (e.g. `0x10DE` for NVIDIA).
    pub vendor_id: u32,
    /// GPU device identifier.
    pub device_id: u32,
    /// Driver version string, opaque to the runtime.
    pub driver_version: String,
}

impl std::fmt::Display for HardwareFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04x}:{:04x}:{}",
            self.vendor_id, self.device_id, self.driver_version
        )
    }
}

impl std::str::FromStr for HardwareFingerprint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let vendor_id = u32::from_str_radix(parts.next().ok_or("missing vendor id")?, 16)
            .map_err(|e| e.to_string())?;
        let device_id = u32::from_str_radix(parts.next().ok_or("missing device id")?, 16)
            .map_err(|e| e.to_string())?;
        let driver_version = parts.next().ok_or("missing driver version")?.to_string();
        Ok(Self {
            vendor_id,
            device_id,
            driver_version,
        })
    }
}

/// Metadata describing the active GPU device, published with
/// `ApplicationInitialized`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMetadata {
    /// Human-readable device name.
    pub device_name: String,
    /// Hardware fingerprint used to key calibration records.
    pub fingerprint: HardwareFingerprint,
}

/// Stable numeric tag identifying an event's variant, independent of the
/// payload it carries (spec §6: "Each event type has a stable numeric
/// tag").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum EventTag {
    /// `FrameStart`.
    FrameStart = 0,
    /// `FrameEnd`.
    FrameEnd = 1,
    /// `BudgetOverrun`.
    BudgetOverrun = 2,
    /// `BudgetAvailable`.
    BudgetAvailable = 3,
    /// `DeviceInvalidated`.
    DeviceInvalidated = 4,
    /// `SwapChainInvalidated`.
    SwapChainInvalidated = 5,
    /// `WindowResized`.
    WindowResized = 6,
    /// `ApplicationInitialized`.
    ApplicationInitialized = 7,
    /// `ApplicationShuttingDown`.
    ApplicationShuttingDown = 8,
    /// `NodeDirty`.
    NodeDirty = 9,
    /// `NodeRemoved`.
    NodeRemoved = 10,
    /// `GraphCompilationComplete`.
    GraphCompilationComplete = 11,
}

/// A message broadcast on the event bus.
///
/// Closed set per spec §4.8; new variants require extending both this enum
/// and [`EventTag`].
#[derive(Debug, Clone)]
pub enum GraphEvent {
    /// Published at the start of every frame, before any node executes.
    FrameStart {
        /// Monotonically increasing frame counter.
        frame_number: u64,
        /// Host timestamp in seconds since graph construction.
        timestamp: f64,
    },
    /// Published after the last node of the frame has executed.
    FrameEnd {
        /// Frame counter matching the paired `FrameStart`.
        frame_number: u64,
        /// Host timestamp in seconds since graph construction.
        timestamp: f64,
        /// Wall-clock duration of the frame in nanoseconds, as measured
        /// by the runtime composition root (spec §4.7, capacity
        /// tracking's input signal).
        measured_ns: f64,
    },
    /// Measured GPU/CPU time exceeded `target * overThreshold`.
    BudgetOverrun {
        /// Measured utilization as a fraction of the budget (> 1.0 means over).
        utilization: f32,
    },
    /// Measured GPU/CPU time fell below `target * underThreshold`.
    BudgetAvailable {
        /// Remaining budget headroom as a fraction of the target.
        remaining: f32,
    },
    /// The GPU device was lost or otherwise invalidated.
    DeviceInvalidated,
    /// The swap chain became invalid (resize, surface loss) and must be
    /// recreated; resources backed by a swap-chain-derived extractor must
    /// re-extract on next bind.
    SwapChainInvalidated,
    /// The presentation surface changed size.
    WindowResized {
        /// New width in pixels.
        width: u32,
        /// New height in pixels.
        height: u32,
    },
    /// Published once, after the backend and device are ready.
    ApplicationInitialized {
        /// Metadata describing the active device.
        device_metadata: DeviceMetadata,
    },
    /// Published once, before graph teardown.
    ApplicationShuttingDown,
    /// A node was marked dirty and needs recompilation.
    NodeDirty {
        /// The node that became dirty.
        node: NodeId,
    },
    /// A node was removed from the graph.
    NodeRemoved {
        /// The node that was removed.
        node: NodeId,
    },
    /// `Compile` finished producing a new execution plan.
    GraphCompilationComplete,
}

impl GraphEvent {
    /// The stable tag identifying this event's variant.
    pub fn tag(&self) -> EventTag {
        match self {
            Self::FrameStart { .. } => EventTag::FrameStart,
            Self::FrameEnd { .. } => EventTag::FrameEnd,
            Self::BudgetOverrun { .. } => EventTag::BudgetOverrun,
            Self::BudgetAvailable { .. } => EventTag::BudgetAvailable,
            Self::DeviceInvalidated => EventTag::DeviceInvalidated,
            Self::SwapChainInvalidated => EventTag::SwapChainInvalidated,
            Self::WindowResized { .. } => EventTag::WindowResized,
            Self::ApplicationInitialized { .. } => EventTag::ApplicationInitialized,
            Self::ApplicationShuttingDown => EventTag::ApplicationShuttingDown,
            Self::NodeDirty { .. } => EventTag::NodeDirty,
            Self::NodeRemoved { .. } => EventTag::NodeRemoved,
            Self::GraphCompilationComplete => EventTag::GraphCompilationComplete,
        }
    }
}

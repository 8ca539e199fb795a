//! # Event bus
//!
//! A typed publish/subscribe bus driving frame lifecycle and invalidation
//! (spec §4.8). This is the lowest-level subsystem in the runtime's
//! dependency order: every other subsystem subscribes to it rather than
//! being called directly by the executor, which owns only the
//! `FrameManager` that publishes frame events (spec §4.8, "Role of the
//! event bus in decoupling").

mod bus;
mod scoped;
mod types;

pub use bus::{DeliveryMode, EventBus};
pub use scoped::ScopedSubscriptions;
pub use types::{DeviceMetadata, EventTag, GraphEvent, HardwareFingerprint};

//! # Vixen
//!
//! A render-graph runtime: typed nodes and slots, a multi-phase compiler
//! with dirty-set recompile, interval-based memory aliasing, budget-aware
//! task scheduling with adaptive calibration, and content-addressed
//! caches for derived artifacts — everything above an abstract GPU
//! backend the crate never names concretely.
//!
//! ## Dependency order (leaves first)
//!
//! Event bus → Resource system → Lifetime/aliasing → Budget/calibration →
//! Caches → Node & Slot model → Connection rules → Graph topology →
//! Compiler → Staging → Executor. `backend` is consumed throughout as an
//! external-interface abstraction rather than sitting at a fixed point in
//! this order.

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod backend;
pub mod cache;
pub mod calibration;
pub mod config;
pub mod core;
pub mod error;
pub mod event_bus;
pub mod foundation;
pub mod graph;
pub mod ids;
pub mod lifetime;
pub mod resource;
pub mod scheduler;
pub mod staging;

mod engine;

pub use engine::Runtime;
pub use error::VixenError;

/// Common imports for runtime users.
pub mod prelude {
    pub use crate::backend::{BackendError, GpuBackend};
    pub use crate::core::config::{BudgetMode, GraphConfig, RuntimeConfig};
    pub use crate::error::VixenError;
    pub use crate::event_bus::{DeviceMetadata, EventBus, GraphEvent, HardwareFingerprint};
    pub use crate::graph::{
        CleanupContext, CompileContext, ExecuteContext, Graph, NodeBehavior, NodeSchema, SetupContext,
    };
    pub use crate::ids::{EdgeId, NodeId, ResourceId, SubscriptionId, TaskId};
    pub use crate::resource::{Resource, ResourceDescriptor, ResourceRef, ResourceType};
    pub use crate::scheduler::{query_point, QueryResolver, QueryWaiter};
    pub use crate::Runtime;
}

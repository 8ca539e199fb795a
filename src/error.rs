//! Top-level error aggregation (spec §7): wraps the structural/resource
//! errors raised by the graph, backend errors propagated verbatim from the
//! GPU backend, and scheduling/staging failures, the way the teacher's
//! `EngineError` aggregated its subsystem errors.

use thiserror::Error;

use crate::backend::BackendError;
use crate::graph::GraphError;
use crate::scheduler::SchedulerError;
use crate::staging::StagingError;

/// The runtime's aggregate error type. `CalibrationWarning` (spec §7) is
/// deliberately absent here — the spec calls it out as "not an error";
/// it is surfaced as a [`crate::event_bus::GraphEvent`] instead.
#[derive(Debug, Error)]
pub enum VixenError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error(transparent)]
    Staging(#[from] StagingError),
}

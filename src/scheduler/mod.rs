//! # Scheduler
//!
//! Budget-aware admission and worker-pool dispatch of the virtual tasks a
//! compiled graph's Execute walk emits (spec §4.5, §5). Depends on `graph`
//! for [`crate::graph::VirtualTask`] and `crate::core::config::BudgetMode`
//! for strict/lenient budget semantics; nothing in `graph` depends back on
//! this module, preserving "scheduler depends on graph, not vice versa."

mod budget;
mod executor;
mod suspension;

pub use budget::{ScheduleError, TaskBudget, TaskQueue};
pub use executor::{CancelToken, Executor, SchedulerError};
pub use suspension::{query_point, QueryResolver, QueryWaiter};

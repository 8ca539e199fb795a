//! Virtual tasks: the schedulable unit a node's Execute phase emits
//! (spec §4.5, §4.1).

use crate::ids::TaskId;

use super::error::GraphError;

/// One schedulable unit of work emitted by a node's Execute phase (spec
/// §4.5: "execute closure, optional GPU cost estimate, optional profile
/// handle").
pub struct VirtualTask {
    pub execute: Box<dyn FnOnce() -> Result<(), GraphError> + Send>,
    pub estimated_cost_ns: Option<f64>,
    pub profile: Option<TaskId>,
    /// Priority used by the task queue's budget check (spec §4.5).
    pub priority: u8,
}

impl VirtualTask {
    pub fn new(execute: impl FnOnce() -> Result<(), GraphError> + Send + 'static) -> Self {
        Self { execute: Box::new(execute), estimated_cost_ns: None, profile: None, priority: 0 }
    }

    pub fn with_cost_estimate(mut self, cost_ns: f64) -> Self {
        self.estimated_cost_ns = Some(cost_ns);
        self
    }

    pub fn with_profile(mut self, profile: TaskId) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }
}

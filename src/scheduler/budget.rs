//! Budget-aware task queue (spec §4.5). Distinct from [`crate::lifetime::Budget`]:
//! that one tracks memory bytes, this one tracks per-frame GPU/CPU time.

use thiserror::Error;

use crate::core::config::BudgetMode;

/// `{gpuTimeBudgetNs, cpuTimeBudgetNs, mode}` (spec §4.5).
#[derive(Debug, Clone, Copy)]
pub struct TaskBudget {
    pub gpu_time_budget_ns: f64,
    pub cpu_time_budget_ns: f64,
    pub mode: BudgetMode,
}

impl TaskBudget {
    pub fn new(gpu_time_budget_ns: f64, cpu_time_budget_ns: f64, mode: BudgetMode) -> Self {
        Self { gpu_time_budget_ns, cpu_time_budget_ns, mode }
    }

    /// Preset factory for a target frame rate: both budgets get the full
    /// frame period (spec §4.5, "16.67 ms for 60 FPS").
    pub fn preset_fps(target_fps: f64, mode: BudgetMode) -> Self {
        let frame_ns = 1_000_000_000.0 / target_fps;
        Self::new(frame_ns, frame_ns, mode)
    }

    pub fn preset_60fps() -> Self {
        Self::preset_fps(60.0, BudgetMode::Lenient)
    }

    pub fn preset_120fps() -> Self {
        Self::preset_fps(120.0, BudgetMode::Lenient)
    }

    pub fn preset_144fps() -> Self {
        Self::preset_fps(144.0, BudgetMode::Lenient)
    }
}

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("task queue over budget: consumed {consumed:.1}ns + requested {requested:.1}ns > {budget:.1}ns")]
    OverBudget { consumed: f64, requested: f64, budget: f64 },
}

/// Tracks CPU time consumed against a [`TaskBudget`] within one frame and
/// decides whether a new task may be enqueued (spec §4.5, `TryEnqueue`).
///
/// GPU time is tracked separately by the caller once actual query results
/// land; this queue only gates *admission*, which happens before a task
/// has run and can only be estimated from its CPU-side cost.
pub struct TaskQueue {
    budget: TaskBudget,
    consumed_cpu_ns: f64,
}

impl TaskQueue {
    pub fn new(budget: TaskBudget) -> Self {
        Self { budget, consumed_cpu_ns: 0.0 }
    }

    /// `TryEnqueue`: checks `consumed + cost` against the budget. Returns
    /// `Ok(true)` if admitted but over budget (Lenient mode only, caller
    /// should warn), `Ok(false)` if admitted within budget, or `Err` if
    /// refused (Strict mode only).
    pub fn try_enqueue(&mut self, estimated_cost_ns: f64) -> Result<bool, ScheduleError> {
        let projected = self.consumed_cpu_ns + estimated_cost_ns;
        if projected > self.budget.cpu_time_budget_ns {
            match self.budget.mode {
                BudgetMode::Strict => {
                    return Err(ScheduleError::OverBudget {
                        consumed: self.consumed_cpu_ns,
                        requested: estimated_cost_ns,
                        budget: self.budget.cpu_time_budget_ns,
                    });
                }
                BudgetMode::Lenient => {
                    self.consumed_cpu_ns = projected;
                    return Ok(true);
                }
            }
        }
        self.consumed_cpu_ns = projected;
        Ok(false)
    }

    /// Reset consumption at the start of a new frame.
    pub fn reset(&mut self) {
        self.consumed_cpu_ns = 0.0;
    }

    pub fn consumed_cpu_ns(&self) -> f64 {
        self.consumed_cpu_ns
    }

    pub fn budget(&self) -> TaskBudget {
        self.budget
    }
}

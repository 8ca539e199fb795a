//! Dispatches the virtual tasks emitted by a frame's Execute walk onto a
//! worker pool, respecting ordering and the frame's [`TaskQueue`] budget
//! (spec §4.5).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::graph::{GraphError, VirtualTask};
use crate::ids::TaskId;

use super::budget::{ScheduleError, TaskQueue};

/// One task's (estimate, actual) pair, captured for profile-bearing tasks
/// so the caller can feed `calibration::PredictionErrorTracker` (spec
/// §4.7).
#[derive(Debug, Clone, Copy)]
pub struct TaskSample {
    pub task: TaskId,
    pub estimated_ns: f64,
    pub measured_ns: f64,
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Task(#[from] GraphError),
    #[error(transparent)]
    Budget(#[from] ScheduleError),
}

/// Cooperative per-frame cancellation (spec §5, "Cancellation is per-frame
/// and cooperative"). The executor checks this between tasks; long-running
/// tasks are expected to check it themselves at their own yield points.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Runs virtual tasks concurrently on a dedicated `rayon` thread pool
/// (spec §4.5, §5). Tasks of parallel-safe nodes at the same topological
/// level may run concurrently; tasks are admitted against the frame's
/// [`TaskQueue`] before dispatch, in priority order, so a Strict-mode
/// refusal stops admitting further tasks rather than aborting ones already
/// running.
pub struct Executor {
    pool: rayon::ThreadPool,
}

impl Executor {
    pub fn new(worker_threads: usize) -> Self {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_threads)
            .thread_name(|i| format!("vixen-worker-{i}"))
            .build()
            .expect("failed to build the task executor's thread pool");
        Self { pool }
    }

    /// Run one frame's tasks to completion (or first cancellation).
    /// Returns every error raised, either from a budget refusal or from a
    /// task's own execute closure, plus one [`TaskSample`] per
    /// profile-bearing task that actually ran (spec §4.7); a run with
    /// errors still executes every admitted task to completion (spec §7:
    /// "Execute errors abort frame but preserve compiled plan", handled by
    /// the caller, not here).
    ///
    /// Priority only decides which tasks are admitted against `queue`'s
    /// budget when not every task fits; it never reorders dispatch. Tasks
    /// are admitted in priority order but *run* in the order the Execute
    /// walk emitted them, which is topological (spec §4.5, §5) — admission
    /// and dispatch order are independent concerns.
    pub fn run(&self, tasks: Vec<VirtualTask>, queue: &mut TaskQueue, cancel: &CancelToken) -> (Vec<SchedulerError>, Vec<TaskSample>) {
        let mut admission_order: Vec<usize> = (0..tasks.len()).collect();
        admission_order.sort_by(|&a, &b| tasks[b].priority.cmp(&tasks[a].priority));

        let mut errors = Vec::new();
        let mut admitted = vec![false; tasks.len()];
        for index in admission_order {
            if cancel.is_cancelled() {
                break;
            }
            match queue.try_enqueue(tasks[index].estimated_cost_ns.unwrap_or(0.0)) {
                Ok(_warn) => admitted[index] = true,
                Err(err) => errors.push(SchedulerError::from(err)),
            }
        }

        let dispatch: Vec<VirtualTask> = tasks
            .into_iter()
            .enumerate()
            .filter(|(index, _)| admitted[*index])
            .map(|(_, task)| task)
            .collect();

        let mut samples = Vec::new();
        self.pool.install(|| {
            use rayon::prelude::*;
            let results: Vec<(Result<(), GraphError>, Option<TaskSample>)> = dispatch
                .into_par_iter()
                .take_while(|_| !cancel.is_cancelled())
                .map(|task| {
                    let profile = task.profile;
                    let estimated_ns = task.estimated_cost_ns.unwrap_or(0.0);
                    let started = Instant::now();
                    let result = (task.execute)();
                    let sample = profile.map(|task| TaskSample {
                        task,
                        estimated_ns,
                        measured_ns: started.elapsed().as_nanos() as f64,
                    });
                    (result, sample)
                })
                .collect();
            for (result, sample) in results {
                if let Err(err) = result {
                    errors.push(SchedulerError::from(err));
                }
                if let Some(sample) = sample {
                    samples.push(sample);
                }
            }
        });

        (errors, samples)
    }
}

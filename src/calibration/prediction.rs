//! Correction factors learned from (estimate, actual) divergence (spec
//! §4.7, `PredictionErrorTracker`).

use std::collections::HashMap;

use crate::ids::TaskId;

/// How many (estimate, actual) samples are retained per task before the
/// oldest is dropped.
const HISTORY_CAPACITY: usize = 64;

/// Fraction of the most extreme ratios (both high and low) excluded from
/// the geometric mean (spec §4.7, "outlier trimming").
const TRIM_FRACTION: f64 = 0.10;

struct TaskHistory {
    ratios: Vec<f64>,
}

/// Tracks how far each task's cost estimates diverge from measured
/// reality and derives a correction factor to pre-multiply future
/// estimates by (spec §4.7).
pub struct PredictionErrorTracker {
    histories: HashMap<TaskId, TaskHistory>,
}

impl PredictionErrorTracker {
    pub fn new() -> Self {
        Self { histories: HashMap::new() }
    }

    /// Record one (estimate, actual) pair for `task`.
    pub fn record(&mut self, task: TaskId, estimate_ns: f64, actual_ns: f64) {
        if estimate_ns <= 0.0 {
            return;
        }
        let history = self.histories.entry(task).or_insert_with(|| TaskHistory { ratios: Vec::new() });
        history.ratios.push(actual_ns / estimate_ns);
        if history.ratios.len() > HISTORY_CAPACITY {
            history.ratios.remove(0);
        }
    }

    /// The correction factor for `task`: the geometric mean of recorded
    /// `actual/estimate` ratios, with the most extreme `TRIM_FRACTION` of
    /// samples on each end excluded. Defaults to `1.0` (no correction)
    /// when no samples are recorded yet.
    pub fn correction_factor(&self, task: TaskId) -> f64 {
        let Some(history) = self.histories.get(&task) else {
            return 1.0;
        };
        if history.ratios.is_empty() {
            return 1.0;
        }

        let mut sorted = history.ratios.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let trim = ((sorted.len() as f64) * TRIM_FRACTION).floor() as usize;
        let trimmed = if sorted.len() > 2 * trim {
            &sorted[trim..sorted.len() - trim]
        } else {
            &sorted[..]
        };

        let log_sum: f64 = trimmed.iter().map(|r| r.ln()).sum();
        (log_sum / trimmed.len() as f64).exp()
    }

    /// Apply the learned correction factor to a raw estimate.
    pub fn correct(&self, task: TaskId, raw_estimate_ns: f64) -> f64 {
        raw_estimate_ns * self.correction_factor(task)
    }
}

impl Default for PredictionErrorTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::collections::{HandleMap, TypedHandle};

    fn task_id(slots: &mut HandleMap<()>) -> TaskId {
        TypedHandle::new(slots.insert(()))
    }

    #[test]
    fn no_samples_yields_unit_correction() {
        let mut slots = HandleMap::new();
        let tracker = PredictionErrorTracker::new();
        assert_eq!(tracker.correction_factor(task_id(&mut slots)), 1.0);
    }

    #[test]
    fn consistent_underestimate_yields_correction_above_one() {
        let mut slots = HandleMap::new();
        let task = task_id(&mut slots);
        let mut tracker = PredictionErrorTracker::new();
        for _ in 0..10 {
            tracker.record(task, 100.0, 150.0);
        }
        let factor = tracker.correction_factor(task);
        assert!((factor - 1.5).abs() < 1e-6);
        assert!((tracker.correct(task, 200.0) - 300.0).abs() < 1e-3);
    }

    #[test]
    fn outliers_are_trimmed_from_the_geometric_mean() {
        let mut slots = HandleMap::new();
        let task = task_id(&mut slots);
        let mut tracker = PredictionErrorTracker::new();
        for _ in 0..20 {
            tracker.record(task, 100.0, 100.0);
        }
        tracker.record(task, 100.0, 10_000.0);
        let factor = tracker.correction_factor(task);
        assert!(factor < 1.2);
    }
}

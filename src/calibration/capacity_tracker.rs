//! Rolling per-frame timing statistics with damped hysteresis (spec §4.7).

use crate::event_bus::GraphEvent;

/// How close measured utilization must come to target before the
/// tracker emits a budget event (spec §4.7).
#[derive(Debug, Clone, Copy)]
pub struct CapacityThresholds {
    /// Emit `BudgetOverrun` once `measured > target * over_threshold`.
    pub over_threshold: f32,
    /// Emit `BudgetAvailable` once `measured < target * under_threshold`.
    pub under_threshold: f32,
}

impl Default for CapacityThresholds {
    fn default() -> Self {
        Self { over_threshold: 1.1, under_threshold: 0.8 }
    }
}

/// Rolling statistics over a bounded history of per-frame measurements
/// (mean, min, max, a percentile estimate), smoothed with damped
/// hysteresis: the tracked value can move by at most `max_change_fraction`
/// per update, and moves smaller than `deadband_fraction` of the current
/// value are ignored entirely, so near-threshold noise doesn't flap the
/// published events (spec §4.7, "≤10% max change and 5% deadband").
pub struct CapacityTracker {
    target_ns: f64,
    thresholds: CapacityThresholds,
    history: Vec<f64>,
    history_capacity: usize,
    smoothed_ns: f64,
    max_change_fraction: f64,
    deadband_fraction: f64,
}

impl CapacityTracker {
    pub fn new(target_ns: f64) -> Self {
        Self {
            target_ns,
            thresholds: CapacityThresholds::default(),
            history: Vec::new(),
            history_capacity: 240,
            smoothed_ns: target_ns,
            max_change_fraction: 0.10,
            deadband_fraction: 0.05,
        }
    }

    pub fn with_thresholds(mut self, thresholds: CapacityThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Record one frame's measured duration and return the event to
    /// publish on `FrameEnd`, if any (spec §4.7).
    pub fn record_frame(&mut self, measured_ns: f64) -> Option<GraphEvent> {
        self.history.push(measured_ns);
        if self.history.len() > self.history_capacity {
            self.history.remove(0);
        }

        let delta = measured_ns - self.smoothed_ns;
        let deadband = self.smoothed_ns * self.deadband_fraction;
        if delta.abs() > deadband {
            let max_step = self.smoothed_ns * self.max_change_fraction;
            let clamped = delta.clamp(-max_step, max_step);
            self.smoothed_ns += clamped;
        }

        let utilization = (self.smoothed_ns / self.target_ns) as f32;
        if utilization > self.thresholds.over_threshold {
            Some(GraphEvent::BudgetOverrun { utilization })
        } else if utilization < self.thresholds.under_threshold {
            Some(GraphEvent::BudgetAvailable { remaining: 1.0 - utilization })
        } else {
            None
        }
    }

    pub fn mean_ns(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        self.history.iter().sum::<f64>() / self.history.len() as f64
    }

    pub fn min_ns(&self) -> f64 {
        self.history.iter().cloned().fold(f64::INFINITY, f64::min)
    }

    pub fn max_ns(&self) -> f64 {
        self.history.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Linear-interpolated percentile over the retained history,
    /// `p` in `[0.0, 1.0]`.
    pub fn percentile_ns(&self, p: f64) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        let mut sorted = self.history.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let rank = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
        let lo = rank.floor() as usize;
        let hi = rank.ceil() as usize;
        if lo == hi {
            sorted[lo]
        } else {
            let frac = rank - lo as f64;
            sorted[lo] * (1.0 - frac) + sorted[hi] * frac
        }
    }

    pub fn smoothed_ns(&self) -> f64 {
        self.smoothed_ns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrun_fires_once_smoothed_value_crosses_threshold() {
        let mut tracker = CapacityTracker::new(1_000_000.0);
        let mut saw_overrun = false;
        for _ in 0..50 {
            if let Some(GraphEvent::BudgetOverrun { .. }) = tracker.record_frame(2_000_000.0) {
                saw_overrun = true;
            }
        }
        assert!(saw_overrun);
    }

    #[test]
    fn max_change_fraction_limits_single_frame_jump() {
        let mut tracker = CapacityTracker::new(1_000_000.0);
        tracker.record_frame(10_000_000.0);
        assert!(tracker.smoothed_ns() < 1_000_000.0 * 1.11);
    }

    #[test]
    fn deadband_ignores_small_moves() {
        let mut tracker = CapacityTracker::new(1_000_000.0);
        let before = tracker.smoothed_ns();
        tracker.record_frame(1_010_000.0);
        assert_eq!(tracker.smoothed_ns(), before);
    }
}

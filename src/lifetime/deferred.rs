//! Deferred destruction: resources are destroyed only after every frame
//! that might still be reading them has retired (spec §4.6).

use std::collections::VecDeque;

use log::warn;

/// A pending destruction: a deleter to run once `retirement_frame` has
/// passed, paired with the frame it was queued on (for diagnostics).
pub struct PendingDestruction {
    pub deleter: Box<dyn FnOnce() + Send>,
    pub retirement_frame: u64,
}

impl std::fmt::Debug for PendingDestruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingDestruction")
            .field("retirement_frame", &self.retirement_frame)
            .finish_non_exhaustive()
    }
}

/// A pre-allocated ring buffer of pending destructions, sized to
/// `nodeCount * avgResourcesPerNode * framesInFlight` (spec §4.6). Growth
/// beyond that capacity still works (backed by a `VecDeque`) but logs a
/// capacity warning once per overflow episode, the same latch pattern
/// used by the event bus's deferred queue.
pub struct DeferredDestructionQueue {
    queue: VecDeque<PendingDestruction>,
    capacity: usize,
    frames_in_flight: u64,
    warned_over_capacity: bool,
}

impl DeferredDestructionQueue {
    pub fn new(capacity: usize, frames_in_flight: u64) -> Self {
        Self {
            queue: VecDeque::with_capacity(capacity),
            capacity,
            frames_in_flight,
            warned_over_capacity: false,
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Queue a destruction to run once `current_frame` has advanced past
    /// its retirement point.
    pub fn push(&mut self, current_frame: u64, deleter: Box<dyn FnOnce() + Send>) {
        self.queue.push_back(PendingDestruction {
            deleter,
            retirement_frame: current_frame,
        });
        if self.queue.len() > self.capacity {
            if !self.warned_over_capacity {
                warn!(
                    "deferred destruction queue exceeded preallocated capacity {} (now {}); tune expected_node_count/avg_resources_per_node",
                    self.capacity,
                    self.queue.len()
                );
                self.warned_over_capacity = true;
            }
        } else {
            self.warned_over_capacity = false;
        }
    }

    /// Run and drop every entry whose `retirement_frame <= current_frame -
    /// frames_in_flight`, called on `FrameStart` (spec §4.6).
    pub fn retire(&mut self, current_frame: u64) -> usize {
        let Some(cutoff) = current_frame.checked_sub(self.frames_in_flight) else {
            return 0;
        };
        let mut retired = 0;
        while let Some(front) = self.queue.front() {
            if front.retirement_frame > cutoff {
                break;
            }
            let entry = self.queue.pop_front().unwrap();
            (entry.deleter)();
            retired += 1;
        }
        retired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn retires_only_entries_past_frames_in_flight() {
        let mut q = DeferredDestructionQueue::new(8, 2);
        let ran = Arc::new(AtomicUsize::new(0));

        let ran_clone = ran.clone();
        q.push(0, Box::new(move || { ran_clone.fetch_add(1, Ordering::SeqCst); }));

        // frame 1: cutoff = 1 - 2 underflows, nothing retires yet.
        assert_eq!(q.retire(1), 0);
        assert_eq!(ran.load(Ordering::SeqCst), 0);

        // frame 2: cutoff = 0, entry queued at frame 0 retires.
        assert_eq!(q.retire(2), 1);
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn over_capacity_push_logs_without_losing_entries() {
        let mut q = DeferredDestructionQueue::new(1, 1);
        q.push(0, Box::new(|| {}));
        q.push(0, Box::new(|| {}));
        assert_eq!(q.len(), 2);
        assert!(q.warned_over_capacity);
    }
}

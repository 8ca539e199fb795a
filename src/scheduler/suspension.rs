//! Cooperative suspension (spec §4.5, "Suspension. Tasks may request GPU
//! query results, causing a cooperative wait bounded by a per-frame
//! timeout"). A suspended task doesn't block a worker thread forever: it
//! waits on a bounded channel up to a caller-supplied timeout, and gives up
//! if the backend hasn't resolved the query by then.

use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

/// The waiting half of a query suspension point, held by the task that
/// issued the request.
pub struct QueryWaiter {
    receiver: Receiver<u64>,
}

impl QueryWaiter {
    /// Block until the resolver reports a value or `timeout` elapses.
    /// Returns `None` on timeout, matching spec §4.5's "bounded wait" —
    /// the task must treat an unresolved query as unavailable this frame,
    /// not retry indefinitely.
    pub fn wait(&self, timeout: Duration) -> Option<u64> {
        match self.receiver.recv_timeout(timeout) {
            Ok(value) => Some(value),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }
}

/// The resolving half, held by whatever polls the backend's timeline
/// semaphore or query pool on the query's behalf.
pub struct QueryResolver {
    sender: Sender<u64>,
}

impl QueryResolver {
    /// Deliver the query's result. A dropped `QueryWaiter` (task gave up
    /// already) makes this a no-op rather than a panic.
    pub fn resolve(self, value: u64) {
        let _ = self.sender.send(value);
    }
}

/// Create a linked waiter/resolver pair for one in-flight GPU query.
pub fn query_point() -> (QueryWaiter, QueryResolver) {
    let (sender, receiver) = bounded(1);
    (QueryWaiter { receiver }, QueryResolver { sender })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn resolved_query_is_delivered_to_the_waiter() {
        let (waiter, resolver) = query_point();
        resolver.resolve(42);
        assert_eq!(waiter.wait(Duration::from_millis(10)), Some(42));
    }

    #[test]
    fn unresolved_query_times_out() {
        let (waiter, _resolver) = query_point();
        assert_eq!(waiter.wait(Duration::from_millis(5)), None);
    }

    #[test]
    fn resolution_from_another_thread_unblocks_the_wait() {
        let (waiter, resolver) = query_point();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(5));
            resolver.resolve(7);
        });
        assert_eq!(waiter.wait(Duration::from_millis(200)), Some(7));
    }
}

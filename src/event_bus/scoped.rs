//! RAII bundle of subscriptions, released on every exit path.

use crate::ids::SubscriptionId;

use super::bus::EventBus;

/// A scoped acquisition of one or more event-bus subscriptions.
///
/// Dropping this (by any exit path — normal return, early `?`, or panic
/// unwind) unsubscribes every handle it holds. This is the event-bus
/// analogue of a `ScopeGuard` (spec §4.6): callers that subscribe for the
/// duration of one pass or one node's lifetime should hold a
/// `ScopedSubscriptions` rather than individual `SubscriptionId`s.
pub struct ScopedSubscriptions {
    bus: EventBus,
    ids: Vec<SubscriptionId>,
}

impl ScopedSubscriptions {
    /// Start an empty scope bound to `bus`.
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            ids: Vec::new(),
        }
    }

    /// Add an already-created subscription to this scope.
    pub fn adopt(&mut self, id: SubscriptionId) {
        self.ids.push(id);
    }

    /// How many subscriptions this scope currently owns.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether this scope owns no subscriptions.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Release all subscriptions early, leaving the scope empty. Drop
    /// calls this too, so this is only needed to unsubscribe before the
    /// scope itself goes out of scope.
    pub fn release_all(&mut self) {
        for id in self.ids.drain(..) {
            self.bus.unsubscribe(id);
        }
    }
}

impl Drop for ScopedSubscriptions {
    fn drop(&mut self) {
        self.release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::{DeliveryMode, EventTag};

    #[test]
    fn drop_without_explicit_unsubscribe_leaves_zero_dangling_subscribers() {
        let bus = EventBus::default();
        {
            let mut scope = ScopedSubscriptions::new(bus.clone());
            let id = bus.subscribe(EventTag::FrameStart, DeliveryMode::Immediate, |_| {});
            scope.adopt(id);
            assert_eq!(bus.subscriber_count(), 1);
        }
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn release_all_empties_scope_without_dropping_it() {
        let bus = EventBus::default();
        let mut scope = ScopedSubscriptions::new(bus.clone());
        let id = bus.subscribe(EventTag::FrameEnd, DeliveryMode::Immediate, |_| {});
        scope.adopt(id);
        scope.release_all();
        assert!(scope.is_empty());
        assert_eq!(bus.subscriber_count(), 0);
    }
}

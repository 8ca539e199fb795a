//! Typed pub/sub with synchronous broadcast and an optional deferred,
//! bounded-ring-buffer delivery path (spec §4.8).
//!
//! Follows the same registration/dispatch shape as the teacher's
//! `events::EventSystem` (immediate + deferred queues, handlers notified
//! only for the event type they registered for, chain-of-responsibility
//! consumption order) generalized from a fixed UI-event set to the full
//! frame-lifecycle catalog and given RAII unsubscription.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use log::warn;
use slotmap::SlotMap;

use crate::ids::SubscriptionId;

use super::types::{EventTag, GraphEvent};

/// Whether a subscriber is notified synchronously inside `publish`, or
/// queued for later delivery via `EventBus::drain_deferred`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Called synchronously, in registration order, from inside `publish`.
    Immediate,
    /// Queued on the bounded deferred ring buffer and delivered by an
    /// explicit `drain_deferred` call.
    Deferred,
}

struct Subscriber {
    tag: EventTag,
    mode: DeliveryMode,
    callback: Box<dyn FnMut(&GraphEvent) + Send>,
}

struct Inner {
    subscribers: SlotMap<slotmap::DefaultKey, Subscriber>,
    order: Vec<slotmap::DefaultKey>,
    deferred: VecDeque<GraphEvent>,
    deferred_capacity: usize,
    warn_fraction: f32,
    warned_high_water: bool,
}

impl Inner {
    fn tag_subscribers(&self, tag: EventTag) -> Vec<slotmap::DefaultKey> {
        self.order
            .iter()
            .copied()
            .filter(|key| {
                self.subscribers
                    .get(*key)
                    .map(|s| s.tag == tag)
                    .unwrap_or(false)
            })
            .collect()
    }

    fn push_deferred(&mut self, event: GraphEvent) {
        if self.deferred.len() >= self.deferred_capacity {
            self.deferred.pop_front();
        }
        self.deferred.push_back(event);

        let high_water = (self.deferred_capacity as f32 * self.warn_fraction) as usize;
        if self.deferred.len() >= high_water {
            if !self.warned_high_water {
                warn!(
                    "event bus deferred queue at {}/{} entries (>= {:.0}% high-water mark)",
                    self.deferred.len(),
                    self.deferred_capacity,
                    self.warn_fraction * 100.0
                );
                self.warned_high_water = true;
            }
        } else {
            self.warned_high_water = false;
        }
    }
}

/// The event bus. Cheap to clone: internally reference-counted, matching
/// the spec's "owned by the graph, destroyed with it" singleton note
/// (spec §9, Global state).
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Mutex<Inner>>,
}

impl EventBus {
    /// Create a new bus with the given deferred-queue capacity and
    /// overflow-warning fraction (default 0.8 per spec §4.8).
    pub fn new(deferred_capacity: usize, warn_fraction: f32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                subscribers: SlotMap::new(),
                order: Vec::new(),
                deferred: VecDeque::with_capacity(deferred_capacity),
                deferred_capacity,
                warn_fraction: warn_fraction.clamp(0.0, 1.0),
                warned_high_water: false,
            })),
        }
    }

    /// Subscribe to one event tag with the given delivery mode. Returns a
    /// handle that `unsubscribe` accepts.
    pub fn subscribe<F>(&self, tag: EventTag, mode: DeliveryMode, callback: F) -> SubscriptionId
    where
        F: FnMut(&GraphEvent) + Send + 'static,
    {
        let mut inner = self.inner.lock().unwrap();
        let key = inner.subscribers.insert(Subscriber {
            tag,
            mode,
            callback: Box::new(callback),
        });
        inner.order.push(key);
        SubscriptionId::new(key)
    }

    /// Remove a subscription. Safe to call twice; the second call is a
    /// no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut inner = self.inner.lock().unwrap();
        if inner.subscribers.remove(id.key()).is_some() {
            inner.order.retain(|k| *k != id.key());
        }
    }

    /// Broadcast an event. `Immediate` subscribers are called synchronously
    /// in registration order; `Deferred` subscribers have the event pushed
    /// onto the bounded ring buffer instead.
    pub fn publish(&self, event: GraphEvent) {
        let tag = event.tag();
        let keys = {
            let inner = self.inner.lock().unwrap();
            inner.tag_subscribers(tag)
        };

        let mut any_deferred = false;
        for key in keys {
            let mode = {
                let inner = self.inner.lock().unwrap();
                inner.subscribers.get(key).map(|s| s.mode)
            };
            match mode {
                Some(DeliveryMode::Immediate) => {
                    let mut inner = self.inner.lock().unwrap();
                    if let Some(sub) = inner.subscribers.get_mut(key) {
                        (sub.callback)(&event);
                    }
                }
                Some(DeliveryMode::Deferred) => any_deferred = true,
                None => {}
            }
        }

        if any_deferred {
            let mut inner = self.inner.lock().unwrap();
            inner.push_deferred(event);
        }
    }

    /// Deliver all currently queued deferred events to their subscribers,
    /// draining the ring buffer. Call once per frame at a well-defined
    /// point (typically just before `FrameEnd`).
    pub fn drain_deferred(&self) {
        let drained: Vec<GraphEvent> = {
            let mut inner = self.inner.lock().unwrap();
            inner.deferred.drain(..).collect()
        };
        for event in drained {
            let tag = event.tag();
            let keys = {
                let inner = self.inner.lock().unwrap();
                inner.tag_subscribers(tag)
            };
            for key in keys {
                let mut inner = self.inner.lock().unwrap();
                if let Some(sub) = inner.subscribers.get_mut(key) {
                    if sub.mode == DeliveryMode::Deferred {
                        (sub.callback)(&event);
                    }
                }
            }
        }
    }

    /// Number of currently registered subscriptions, across all tags.
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().unwrap().subscribers.len()
    }

    /// Number of events currently queued for deferred delivery.
    pub fn deferred_len(&self) -> usize {
        self.inner.lock().unwrap().deferred.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024, 0.8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn immediate_subscribers_see_events_in_registration_order() {
        let bus = EventBus::default();
        let order = Arc::new(Mutex::new(Vec::new()));

        let o1 = order.clone();
        bus.subscribe(EventTag::FrameStart, DeliveryMode::Immediate, move |_| {
            o1.lock().unwrap().push(1);
        });
        let o2 = order.clone();
        bus.subscribe(EventTag::FrameStart, DeliveryMode::Immediate, move |_| {
            o2.lock().unwrap().push(2);
        });

        bus.publish(GraphEvent::FrameStart {
            frame_number: 0,
            timestamp: 0.0,
        });

        assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn deferred_subscribers_only_fire_on_drain() {
        let bus = EventBus::default();
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();
        bus.subscribe(EventTag::FrameEnd, DeliveryMode::Deferred, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(GraphEvent::FrameEnd {
            frame_number: 0,
            timestamp: 0.0,
            measured_ns: 0.0,
        });
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(bus.deferred_len(), 1);

        bus.drain_deferred();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(bus.deferred_len(), 0);
    }

    #[test]
    fn ring_buffer_drops_oldest_beyond_capacity() {
        let bus = EventBus::new(2, 0.8);
        bus.subscribe(EventTag::NodeDirty, DeliveryMode::Deferred, |_| {});

        for i in 0..5u64 {
            bus.publish(GraphEvent::NodeDirty {
                node: crate::ids::NodeId::new(slotmap::DefaultKey::default()),
            });
            let _ = i;
        }
        assert_eq!(bus.deferred_len(), 2);
    }

    #[test]
    fn unsubscribe_stops_future_delivery() {
        let bus = EventBus::default();
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();
        let id = bus.subscribe(EventTag::ApplicationShuttingDown, DeliveryMode::Immediate, move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        bus.unsubscribe(id);
        bus.publish(GraphEvent::ApplicationShuttingDown);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(bus.subscriber_count(), 0);
    }
}

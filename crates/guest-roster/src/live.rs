//! Snapshot fan-out for store subscribers.
//!
//! # Design Principles
//!
//! - Subscribers are notified after the write is committed
//! - Every notification carries the full collection
//! - Dead subscribers are pruned on the next notification

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tokio::sync::mpsc::{self, UnboundedSender};

use crate::snapshot::GuestSnapshot;
use crate::store::SnapshotSubscription;
use crate::types::EventKey;

/// Tracks snapshot subscribers per event.
#[derive(Debug, Default)]
pub struct SnapshotHub {
    subscribers: RwLock<HashMap<EventKey, Vec<UnboundedSender<GuestSnapshot>>>>,
}

impl SnapshotHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber and queues `current` as its first snapshot.
    pub fn subscribe(&self, event: &EventKey, current: GuestSnapshot) -> SnapshotSubscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        // The receiver is alive, so this cannot fail.
        let _ = sender.send(current);

        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.entry(event.clone()).or_default().push(sender);

        SnapshotSubscription::new(event.clone(), receiver)
    }

    /// Sends a snapshot to every live subscriber of an event.
    pub fn notify(&self, event: &EventKey, snapshot: &GuestSnapshot) {
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(senders) = subscribers.get_mut(event) {
            senders.retain(|sender| sender.send(snapshot.clone()).is_ok());
            if senders.is_empty() {
                subscribers.remove(event);
            }
        }
    }

    /// Registered subscribers for an event. May include dead ones not yet pruned.
    pub fn subscriber_count(&self, event: &EventKey) -> usize {
        let subscribers = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.get(event).map(Vec::len).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GuestKey, GuestRecord};

    fn one_guest(name: &str) -> GuestSnapshot {
        [(GuestKey::from("a"), GuestRecord::new(name))]
            .into_iter()
            .collect()
    }

    #[test]
    fn subscriber_gets_current_snapshot_first() {
        let hub = SnapshotHub::new();
        let event = EventKey::from("e1");

        let mut sub = hub.subscribe(&event, one_guest("Alice"));
        let first = sub.try_recv().unwrap();
        assert_eq!(first.len(), 1);
        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn notify_reaches_every_subscriber_of_the_event() {
        let hub = SnapshotHub::new();
        let event = EventKey::from("e1");
        let mut a = hub.subscribe(&event, GuestSnapshot::empty());
        let mut b = hub.subscribe(&event, GuestSnapshot::empty());
        a.try_recv();
        b.try_recv();

        hub.notify(&event, &one_guest("Alice"));

        assert_eq!(a.try_recv().unwrap().len(), 1);
        assert_eq!(b.try_recv().unwrap().len(), 1);
    }

    #[test]
    fn subscriptions_are_event_scoped() {
        let hub = SnapshotHub::new();
        let mut other = hub.subscribe(&EventKey::from("e2"), GuestSnapshot::empty());
        other.try_recv();

        hub.notify(&EventKey::from("e1"), &one_guest("Alice"));

        assert!(other.try_recv().is_none());
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let hub = SnapshotHub::new();
        let event = EventKey::from("e1");
        let sub = hub.subscribe(&event, GuestSnapshot::empty());
        assert_eq!(hub.subscriber_count(&event), 1);

        drop(sub);
        hub.notify(&event, &GuestSnapshot::empty());

        assert_eq!(hub.subscriber_count(&event), 0);
    }
}

//! Integration tests for the guest roster.
//!
//! - `hierarchy.rs`   - Store writes rebuilt into forests, columns and counts
//! - `sync.rs`        - Sync controller lifecycle and event switching
//! - `timeout.rs`     - First-snapshot timeout policy (paused clock)
//! - `failures.rs`    - Injected store failures
//! - `concurrency.rs` - Shared stores across threads

mod concurrency;
mod failures;
mod timeout;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::reader::GuestReader;
use crate::snapshot::GuestSnapshot;
use crate::store::{GuestStore, SnapshotSubscription, StoreError, StoreResult, UpdateSet};
use crate::sync::SyncView;
use crate::types::{EventKey, GuestKey, GuestPatch, GuestPath, GuestRecord};
use crate::writer::GuestWriter;
use crate::{MemoryGuestStore, Roster};

/// A store whose snapshots are delivered by hand.
///
/// Subscribing queues nothing; the test decides when (and whether) each
/// subscriber hears about a collection. Writes are rejected.
#[derive(Default)]
pub(crate) struct ManualStore {
    subscribers: Mutex<HashMap<EventKey, Vec<mpsc::UnboundedSender<GuestSnapshot>>>>,
}

impl ManualStore {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Sends a snapshot to every live subscriber of `event`. Returns how many
    /// subscribers received it.
    pub(crate) fn deliver(&self, event: &EventKey, snapshot: GuestSnapshot) -> usize {
        let mut subscribers = self.subscribers.lock().unwrap();
        let Some(senders) = subscribers.get_mut(event) else {
            return 0;
        };
        senders.retain(|sender| sender.send(snapshot.clone()).is_ok());
        senders.len()
    }
}

impl GuestStore for ManualStore {
    fn new_key(&self) -> StoreResult<GuestKey> {
        Ok(GuestKey::new())
    }

    fn subscribe(&self, event: &EventKey) -> SnapshotSubscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap()
            .entry(event.clone())
            .or_default()
            .push(sender);
        SnapshotSubscription::new(event.clone(), receiver)
    }

    fn snapshot(&self, _event: &EventKey) -> StoreResult<GuestSnapshot> {
        Ok(GuestSnapshot::empty())
    }

    fn set(&self, _path: &GuestPath, _record: GuestRecord) -> StoreResult<()> {
        Err(StoreError::Rejected("manual store is read-only".to_string()))
    }

    fn update(&self, _event: &EventKey, _entries: UpdateSet) -> StoreResult<()> {
        Err(StoreError::Rejected("manual store is read-only".to_string()))
    }

    fn patch(&self, _path: &GuestPath, _patch: &GuestPatch) -> StoreResult<()> {
        Err(StoreError::Rejected("manual store is read-only".to_string()))
    }

    fn remove(&self, _path: &GuestPath) -> StoreResult<()> {
        Err(StoreError::Rejected("manual store is read-only".to_string()))
    }
}

/// Builds a snapshot from `(key, name, parent)` triples; an empty parent is a root.
pub(crate) fn snapshot_of(entries: &[(&str, &str, &str)]) -> GuestSnapshot {
    entries
        .iter()
        .map(|(key, name, parent)| {
            let mut record = GuestRecord::new(*name);
            if !parent.is_empty() {
                record.parent = Some(GuestKey::from(*parent));
            }
            (GuestKey::from(*key), record)
        })
        .collect()
}

/// Waits until the published view satisfies `pred`.
pub(crate) async fn wait_for_view(
    views: &mut watch::Receiver<SyncView>,
    pred: impl FnMut(&SyncView) -> bool,
) -> SyncView {
    let view = tokio::time::timeout(Duration::from_secs(5), views.wait_for(pred))
        .await
        .expect("view never matched")
        .expect("controller dropped");
    view.clone()
}

/// Lets spawned tasks run.
pub(crate) async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

/// Basic workflow: write a group, read it back as a forest.
#[test]
fn basic_workflow() {
    let roster = Roster::new(Arc::new(MemoryGuestStore::new()));
    let event = EventKey::from("wedding");

    let receipt = roster
        .add_group(
            &event,
            vec![
                GuestRecord::new("Alice"),
                GuestRecord::new("Bob"),
                GuestRecord::new("Carl"),
            ],
        )
        .unwrap()
        .unwrap();
    let solo = roster.create_guest(&event, GuestRecord::new("Dana")).unwrap();

    let forest = roster.forest(&event).unwrap();
    assert_eq!(forest.len(), 2);
    assert_eq!(forest.roots()[0].key, receipt.group_key);
    assert_eq!(forest.roots()[0].children.len(), 2);
    assert_eq!(forest.roots()[1].key, solo);
    assert_eq!(roster.counts(&event).unwrap().total, 4);
}

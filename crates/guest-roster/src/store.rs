//! The Guest Record Store boundary.
//!
//! A store holds one flat guest collection per event and pushes a full
//! snapshot of a collection to its subscribers on every change.
//!
//! # Design Principles
//!
//! - Subscribers receive the current snapshot first, then one per change
//! - Notifications follow the committed write
//! - Multi-path updates are applied as a single write
//! - Writes are never retried here

use tokio::sync::mpsc;

use crate::snapshot::GuestSnapshot;
use crate::types::{EventKey, GuestKey, GuestPatch, GuestPath, GuestRecord};

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Entries of one multi-path update: each record is written at its key.
pub type UpdateSet = Vec<(GuestKey, GuestRecord)>;

/// Errors returned by a guest store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store refused the write.
    #[error("write rejected: {0}")]
    Rejected(String),

    /// The record to patch does not exist.
    #[error("guest not found: {0}")]
    NotFound(GuestPath),

    /// No more keys can be generated in the current millisecond.
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Stored data could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A live feed of snapshots for one event's guest collection.
///
/// Dropping the subscription unsubscribes; the store prunes the sender on
/// its next notification.
#[derive(Debug)]
pub struct SnapshotSubscription {
    event: EventKey,
    receiver: mpsc::UnboundedReceiver<GuestSnapshot>,
}

impl SnapshotSubscription {
    /// Wraps the receiving end of a store's notification channel.
    pub fn new(event: EventKey, receiver: mpsc::UnboundedReceiver<GuestSnapshot>) -> Self {
        Self { event, receiver }
    }

    /// The event this subscription follows.
    pub fn event(&self) -> &EventKey {
        &self.event
    }

    /// Waits for the next snapshot. Returns `None` once the store closes the feed.
    pub async fn recv(&mut self) -> Option<GuestSnapshot> {
        self.receiver.recv().await
    }

    /// Returns the next snapshot if one is already queued.
    pub fn try_recv(&mut self) -> Option<GuestSnapshot> {
        self.receiver.try_recv().ok()
    }

    /// Drains the queue and returns the newest snapshot, if any.
    pub fn latest(&mut self) -> Option<GuestSnapshot> {
        let mut latest = None;
        while let Some(snapshot) = self.try_recv() {
            latest = Some(snapshot);
        }
        latest
    }
}

/// A key-value store of per-event guest collections.
pub trait GuestStore: Send + Sync {
    /// Generates a fresh, unique, time-ordered guest key. Nothing is written.
    fn new_key(&self) -> StoreResult<GuestKey>;

    /// Subscribes to an event's collection.
    ///
    /// The current snapshot is queued immediately (empty if the event has no
    /// guests); every later change queues a new full snapshot.
    fn subscribe(&self, event: &EventKey) -> SnapshotSubscription;

    /// Reads the current snapshot once.
    fn snapshot(&self, event: &EventKey) -> StoreResult<GuestSnapshot>;

    /// Writes a record at a path, replacing any existing record.
    fn set(&self, path: &GuestPath, record: GuestRecord) -> StoreResult<()>;

    /// Writes a record under a freshly generated key and returns the key.
    fn push(&self, event: &EventKey, record: GuestRecord) -> StoreResult<GuestKey> {
        let key = self.new_key()?;
        self.set(&GuestPath::new(event.clone(), key.clone()), record)?;
        Ok(key)
    }

    /// Writes several records in one update. Subscribers see one snapshot.
    fn update(&self, event: &EventKey, entries: UpdateSet) -> StoreResult<()>;

    /// Applies a field-level patch to an existing record.
    fn patch(&self, path: &GuestPath, patch: &GuestPatch) -> StoreResult<()>;

    /// Removes a record. Removing a missing record is not an error.
    fn remove(&self, path: &GuestPath) -> StoreResult<()>;
}

impl<T: GuestStore + ?Sized> GuestStore for std::sync::Arc<T> {
    fn new_key(&self) -> StoreResult<GuestKey> {
        (**self).new_key()
    }

    fn subscribe(&self, event: &EventKey) -> SnapshotSubscription {
        (**self).subscribe(event)
    }

    fn snapshot(&self, event: &EventKey) -> StoreResult<GuestSnapshot> {
        (**self).snapshot(event)
    }

    fn set(&self, path: &GuestPath, record: GuestRecord) -> StoreResult<()> {
        (**self).set(path, record)
    }

    fn push(&self, event: &EventKey, record: GuestRecord) -> StoreResult<GuestKey> {
        (**self).push(event, record)
    }

    fn update(&self, event: &EventKey, entries: UpdateSet) -> StoreResult<()> {
        (**self).update(event, entries)
    }

    fn patch(&self, path: &GuestPath, patch: &GuestPatch) -> StoreResult<()> {
        (**self).patch(path, patch)
    }

    fn remove(&self, path: &GuestPath) -> StoreResult<()> {
        (**self).remove(path)
    }
}

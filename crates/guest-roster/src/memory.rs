//! In-memory guest store.
//!
//! Holds every event's collection in process, notifies subscribers after each
//! committed write and can import or export its whole content as JSON:
//!
//! ```json
//! {
//!   "events": { "<event>": { "name": "...", "date": "...", "location": "...", "options": "name,phone" } },
//!   "guests": { "<event>": { "<guest>": { "name": "...", "parent": "", "arrived": false } } }
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use ulid::Generator;

use crate::live::SnapshotHub;
use crate::snapshot::GuestSnapshot;
use crate::store::{GuestStore, SnapshotSubscription, StoreError, StoreResult, UpdateSet};
use crate::types::{EventConfig, EventKey, GuestKey, GuestPatch, GuestPath, GuestRecord};

type Collection = BTreeMap<GuestKey, GuestRecord>;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDump {
    #[serde(default)]
    events: BTreeMap<EventKey, EventConfig>,
    #[serde(default)]
    guests: BTreeMap<EventKey, serde_json::Value>,
}

/// A process-local [`GuestStore`].
pub struct MemoryGuestStore {
    guests: RwLock<BTreeMap<EventKey, Collection>>,
    events: RwLock<BTreeMap<EventKey, EventConfig>>,
    keys: Mutex<Generator>,
    hub: SnapshotHub,
    failing_writes: AtomicUsize,
}

impl MemoryGuestStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            guests: RwLock::new(BTreeMap::new()),
            events: RwLock::new(BTreeMap::new()),
            keys: Mutex::new(Generator::new()),
            hub: SnapshotHub::new(),
            failing_writes: AtomicUsize::new(0),
        }
    }

    /// Creates a store from an exported JSON document.
    pub fn from_json(value: &serde_json::Value) -> StoreResult<Self> {
        let store = Self::new();
        store.import_json(value)?;
        Ok(store)
    }

    /// Replaces the store content with an exported JSON document.
    ///
    /// Guest collections are decoded leniently: malformed records are
    /// skipped. Current subscribers receive the imported collections.
    pub fn import_json(&self, value: &serde_json::Value) -> StoreResult<()> {
        let dump: StoreDump = if value.is_null() {
            StoreDump::default()
        } else {
            serde_json::from_value(value.clone())?
        };

        let events: BTreeMap<EventKey, EventConfig> = dump
            .events
            .into_iter()
            .map(|(key, mut config)| {
                config.key = key.clone();
                (key, config)
            })
            .collect();

        let collections: BTreeMap<EventKey, Collection> = dump
            .guests
            .iter()
            .map(|(event, raw)| {
                let snapshot = GuestSnapshot::from_json(raw);
                let records = snapshot.iter().map(|(k, r)| (k.clone(), r.clone())).collect();
                (event.clone(), records)
            })
            .collect();

        tracing::debug!(
            events = events.len(),
            collections = collections.len(),
            "importing guest store"
        );

        *self.events.write().unwrap_or_else(PoisonError::into_inner) = events;

        let mut guests = self.guests.write().unwrap_or_else(PoisonError::into_inner);
        let mut touched: BTreeSet<EventKey> = guests.keys().cloned().collect();
        *guests = collections;
        touched.extend(guests.keys().cloned());
        for event in &touched {
            self.hub.notify(event, &snapshot_of(&guests, event));
        }
        Ok(())
    }

    /// Exports the whole store as a JSON document.
    pub fn export_json(&self) -> StoreResult<serde_json::Value> {
        let events = self
            .events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let guests = self.guests.read().unwrap_or_else(PoisonError::into_inner);
        let mut collections = BTreeMap::new();
        for event in guests.keys() {
            collections.insert(event.clone(), snapshot_of(&guests, event).to_json()?);
        }

        Ok(serde_json::to_value(StoreDump {
            events,
            guests: collections,
        })?)
    }

    /// Registers or replaces an event's details.
    pub fn put_event(&self, config: EventConfig) {
        let mut events = self.events.write().unwrap_or_else(PoisonError::into_inner);
        events.insert(config.key.clone(), config);
    }

    /// Looks up an event's details.
    pub fn event(&self, key: &EventKey) -> Option<EventConfig> {
        let events = self.events.read().unwrap_or_else(PoisonError::into_inner);
        events.get(key).cloned()
    }

    /// Every registered event, in key order.
    pub fn events(&self) -> Vec<EventConfig> {
        let events = self.events.read().unwrap_or_else(PoisonError::into_inner);
        events.values().cloned().collect()
    }

    /// Makes the next `count` writes fail with [`StoreError::Rejected`].
    pub fn fail_next_writes(&self, count: usize) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    /// Subscribers currently registered for an event.
    pub fn subscriber_count(&self, event: &EventKey) -> usize {
        self.hub.subscriber_count(event)
    }

    fn check_injected_failure(&self) -> StoreResult<()> {
        let injected = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            tracing::debug!("rejecting write (injected failure)");
            return Err(StoreError::Rejected("injected failure".to_string()));
        }
        Ok(())
    }

    /// Runs a mutation on one event's collection and notifies subscribers.
    ///
    /// Notification happens while the write lock is held, so subscribers see
    /// snapshots in commit order.
    fn write<T>(
        &self,
        event: &EventKey,
        mutate: impl FnOnce(&mut Collection) -> StoreResult<T>,
    ) -> StoreResult<T> {
        self.check_injected_failure()?;

        let mut guests = self.guests.write().unwrap_or_else(PoisonError::into_inner);
        let result = mutate(guests.entry(event.clone()).or_default());
        if guests.get(event).is_some_and(BTreeMap::is_empty) {
            guests.remove(event);
        }
        let result = result?;

        self.hub.notify(event, &snapshot_of(&guests, event));
        Ok(result)
    }
}

impl std::fmt::Debug for MemoryGuestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryGuestStore")
            .field("guests", &self.guests)
            .field("events", &self.events)
            .field("hub", &self.hub)
            .finish_non_exhaustive()
    }
}

impl Default for MemoryGuestStore {
    fn default() -> Self {
        Self::new()
    }
}

fn snapshot_of(guests: &BTreeMap<EventKey, Collection>, event: &EventKey) -> GuestSnapshot {
    guests
        .get(event)
        .map(|records| GuestSnapshot::new(records.clone()))
        .unwrap_or_default()
}

impl GuestStore for MemoryGuestStore {
    fn new_key(&self) -> StoreResult<GuestKey> {
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        keys.generate()
            .map(GuestKey::from)
            .map_err(|err| StoreError::KeyGeneration(err.to_string()))
    }

    fn subscribe(&self, event: &EventKey) -> SnapshotSubscription {
        // Hold the read lock while registering so no write slips in between.
        let guests = self.guests.read().unwrap_or_else(PoisonError::into_inner);
        let current = snapshot_of(&guests, event);
        tracing::debug!(event = %event, guests = current.len(), "new guest subscription");
        self.hub.subscribe(event, current)
    }

    fn snapshot(&self, event: &EventKey) -> StoreResult<GuestSnapshot> {
        let guests = self.guests.read().unwrap_or_else(PoisonError::into_inner);
        Ok(snapshot_of(&guests, event))
    }

    fn set(&self, path: &GuestPath, record: GuestRecord) -> StoreResult<()> {
        self.write(&path.event, |collection| {
            collection.insert(path.guest.clone(), record);
            Ok(())
        })
    }

    fn update(&self, event: &EventKey, entries: UpdateSet) -> StoreResult<()> {
        self.write(event, |collection| {
            collection.extend(entries);
            Ok(())
        })
    }

    fn patch(&self, path: &GuestPath, patch: &GuestPatch) -> StoreResult<()> {
        self.write(&path.event, |collection| {
            let record = collection
                .get_mut(&path.guest)
                .ok_or_else(|| StoreError::NotFound(path.clone()))?;
            patch.apply_to(record);
            Ok(())
        })
    }

    fn remove(&self, path: &GuestPath) -> StoreResult<()> {
        self.write(&path.event, |collection| {
            if collection.remove(&path.guest).is_none() {
                tracing::debug!(path = %path, "remove of missing guest");
            }
            Ok(())
        })
    }
}

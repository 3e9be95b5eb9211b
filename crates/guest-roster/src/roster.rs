//! The roster engine: validated reads and writes over a guest store.

use std::sync::Arc;

use crate::batch::{self, BatchReceipt};
use crate::hierarchy::{build_forest, GuestForest};
use crate::reader::GuestReader;
use crate::snapshot::GuestSnapshot;
use crate::store::{GuestStore, StoreError};
use crate::sync::{SyncController, SyncOptions};
use crate::types::{EventKey, GuestKey, GuestPatch, GuestPath, GuestRecord};
use crate::writer::GuestWriter;
use crate::{RosterError, RosterResult};

/// Guest roster over a shared store.
///
/// The roster keeps no state of its own; every read goes to the store.
pub struct Roster<S: GuestStore> {
    store: Arc<S>,
}

impl<S: GuestStore> Clone for Roster<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: GuestStore> Roster<S> {
    /// Creates a roster over an existing store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

impl<S: GuestStore + 'static> Roster<S> {
    /// Creates a sync controller reading from the same store.
    pub fn sync_controller(&self, options: SyncOptions) -> SyncController<S> {
        SyncController::new(Arc::clone(&self.store), options)
    }
}

fn ensure_named(record: &GuestRecord) -> RosterResult<()> {
    if record.name.trim().is_empty() {
        return Err(RosterError::MissingName);
    }
    Ok(())
}

impl<S: GuestStore> GuestReader for Roster<S> {
    fn snapshot(&self, event: &EventKey) -> RosterResult<GuestSnapshot> {
        Ok(self.store.snapshot(event)?)
    }

    fn forest(&self, event: &EventKey) -> RosterResult<GuestForest> {
        Ok(build_forest(&self.store.snapshot(event)?))
    }
}

impl<S: GuestStore> GuestWriter for Roster<S> {
    fn create_guest(&self, event: &EventKey, mut record: GuestRecord) -> RosterResult<GuestKey> {
        ensure_named(&record)?;
        record.parent = None;

        let key = self.store.push(event, record)?;
        tracing::info!(event = %event, guest = %key, "guest created");
        Ok(key)
    }

    fn add_companion(
        &self,
        event: &EventKey,
        parent: &GuestKey,
        mut record: GuestRecord,
    ) -> RosterResult<GuestKey> {
        ensure_named(&record)?;

        let snapshot = self.store.snapshot(event)?;
        match snapshot.get(parent) {
            Some(root) if root.is_root() => {}
            _ => {
                return Err(RosterError::InvalidParent {
                    event: event.clone(),
                    parent: parent.clone(),
                })
            }
        }

        record.parent = Some(parent.clone());
        let key = self.store.push(event, record)?;
        tracing::info!(event = %event, guest = %key, parent = %parent, "companion added");
        Ok(key)
    }

    fn update_guest(&self, path: &GuestPath, patch: GuestPatch) -> RosterResult<()> {
        if patch.is_empty() {
            return Err(RosterError::EmptyPatch);
        }
        if patch.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(RosterError::MissingName);
        }

        match self.store.patch(path, &patch) {
            Ok(()) => {
                tracing::info!(path = %path, "guest updated");
                Ok(())
            }
            Err(StoreError::NotFound(path)) => Err(RosterError::UnknownGuest(path)),
            Err(err) => Err(err.into()),
        }
    }

    fn remove_guest(&self, path: &GuestPath) -> RosterResult<()> {
        if self.store.snapshot(&path.event)?.get(&path.guest).is_none() {
            return Err(RosterError::UnknownGuest(path.clone()));
        }

        self.store.remove(path)?;
        tracing::info!(path = %path, "guest removed");
        Ok(())
    }

    fn add_group(
        &self,
        event: &EventKey,
        records: Vec<GuestRecord>,
    ) -> RosterResult<Option<BatchReceipt>> {
        records.iter().try_for_each(ensure_named)?;
        Ok(batch::apply_batch(self.store.as_ref(), event, records)?)
    }

    fn import_groups(
        &self,
        event: &EventKey,
        groups: Vec<Vec<GuestRecord>>,
    ) -> RosterResult<Vec<BatchReceipt>> {
        groups.iter().flatten().try_for_each(ensure_named)?;
        Ok(batch::import_groups(self.store.as_ref(), event, groups)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryGuestStore;
    use crate::types::GuestAttribute;

    fn roster() -> Roster<MemoryGuestStore> {
        Roster::new(Arc::new(MemoryGuestStore::new()))
    }

    fn event() -> EventKey {
        EventKey::from("e1")
    }

    #[test]
    fn create_guest_clears_parent() {
        let roster = roster();
        let key = roster
            .create_guest(&event(), GuestRecord::new("Alice").with_parent("x"))
            .unwrap();

        let snapshot = roster.snapshot(&event()).unwrap();
        assert!(snapshot.get(&key).unwrap().is_root());
    }

    #[test]
    fn blank_names_are_rejected() {
        let roster = roster();
        let err = roster.create_guest(&event(), GuestRecord::new("  ")).unwrap_err();
        assert!(matches!(err, RosterError::MissingName));

        let err = roster
            .add_group(&event(), vec![GuestRecord::new("A"), GuestRecord::new("")])
            .unwrap_err();
        assert!(matches!(err, RosterError::MissingName));
        assert!(roster.snapshot(&event()).unwrap().is_empty());
    }

    #[test]
    fn companion_needs_a_root_parent() {
        let roster = roster();
        let root = roster.create_guest(&event(), GuestRecord::new("Alice")).unwrap();
        let companion = roster
            .add_companion(&event(), &root, GuestRecord::new("Bob"))
            .unwrap();

        let err = roster
            .add_companion(&event(), &companion, GuestRecord::new("Carl"))
            .unwrap_err();
        assert!(matches!(err, RosterError::InvalidParent { .. }));

        let err = roster
            .add_companion(&event(), &GuestKey::from("missing"), GuestRecord::new("Dana"))
            .unwrap_err();
        assert!(matches!(err, RosterError::InvalidParent { .. }));

        let forest = roster.forest(&event()).unwrap();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest.roots()[0].children[0].key, companion);
    }

    #[test]
    fn update_and_check_in() {
        let roster = roster();
        let key = roster.create_guest(&event(), GuestRecord::new("Alice")).unwrap();
        let path = GuestPath::new(event(), key.clone());

        roster
            .update_guest(&path, GuestPatch::new().set(GuestAttribute::Email, "a@x.com"))
            .unwrap();
        roster.set_arrived(&path, true).unwrap();

        let snapshot = roster.snapshot(&event()).unwrap();
        let record = snapshot.get(&key).unwrap();
        assert_eq!(record.attribute(GuestAttribute::Email), Some("a@x.com"));
        assert!(record.arrived);
        assert_eq!(roster.counts(&event()).unwrap().arrived, 1);
    }

    #[test]
    fn update_of_unknown_guest_fails() {
        let roster = roster();
        let err = roster
            .set_arrived(&GuestPath::new("e1", "nope"), true)
            .unwrap_err();
        assert!(matches!(err, RosterError::UnknownGuest(_)));

        let err = roster
            .update_guest(&GuestPath::new("e1", "nope"), GuestPatch::new())
            .unwrap_err();
        assert!(matches!(err, RosterError::EmptyPatch));
    }

    #[test]
    fn remove_guest_deletes_only_that_record() {
        let roster = roster();
        let root = roster.create_guest(&event(), GuestRecord::new("Alice")).unwrap();
        roster
            .add_companion(&event(), &root, GuestRecord::new("Bob"))
            .unwrap();

        roster.remove_guest(&GuestPath::new(event(), root.clone())).unwrap();

        let snapshot = roster.snapshot(&event()).unwrap();
        assert_eq!(snapshot.len(), 1);
        let forest = roster.forest(&event()).unwrap();
        assert!(forest.is_empty());
        assert_eq!(forest.orphans().len(), 1);

        let err = roster
            .remove_guest(&GuestPath::new(event(), root))
            .unwrap_err();
        assert!(matches!(err, RosterError::UnknownGuest(_)));
    }

    #[test]
    fn store_failures_propagate() {
        let roster = roster();
        roster.store().fail_next_writes(1);

        let err = roster.create_guest(&event(), GuestRecord::new("Alice")).unwrap_err();
        assert!(matches!(err, RosterError::Store(StoreError::Rejected(_))));
    }
}

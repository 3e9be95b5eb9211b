//! Injected store failures.
//!
//! Covered:
//! - A rejected write changes nothing and notifies nobody
//! - The roster keeps working after a rejected write
//! - A failed group import keeps the groups written before it
//! - A synced view is untouched by failed writes

use std::sync::Arc;

use super::{settle, wait_for_view};
use crate::reader::GuestReader;
use crate::store::{GuestStore, StoreError};
use crate::sync::{SyncOptions, SyncState};
use crate::types::{EventKey, GuestPatch, GuestPath, GuestRecord};
use crate::writer::GuestWriter;
use crate::{MemoryGuestStore, Roster, RosterError};

fn roster() -> Roster<MemoryGuestStore> {
    Roster::new(Arc::new(MemoryGuestStore::new()))
}

#[test]
fn rejected_write_has_no_effect() {
    let roster = roster();
    let event = EventKey::from("e1");
    let mut sub = roster.store().subscribe(&event);
    sub.try_recv();

    roster.store().fail_next_writes(1);
    let err = roster
        .add_group(&event, vec![GuestRecord::new("A"), GuestRecord::new("B")])
        .unwrap_err();

    assert!(matches!(err, RosterError::Store(StoreError::Rejected(_))));
    assert!(roster.snapshot(&event).unwrap().is_empty());
    assert!(sub.try_recv().is_none());
}

#[test]
fn roster_recovers_after_rejection() {
    let roster = roster();
    let event = EventKey::from("e1");
    let key = roster.create_guest(&event, GuestRecord::new("Alice")).unwrap();
    let path = GuestPath::new(event.clone(), key.clone());

    roster.store().fail_next_writes(2);
    assert!(roster.set_arrived(&path, true).is_err());
    assert!(roster.remove_guest(&path).is_err());

    roster
        .update_guest(&path, GuestPatch::new().name("Alice B.").arrived(true))
        .unwrap();
    let snapshot = roster.snapshot(&event).unwrap();
    let record = snapshot.get(&key).unwrap();
    assert_eq!(record.name, "Alice B.");
    assert!(record.arrived);
}

#[test]
fn partial_import_keeps_earlier_groups() {
    let roster = roster();
    let event = EventKey::from("e1");

    // The first group succeeds, the second is rejected, the third never runs.
    let groups = vec![
        vec![GuestRecord::new("G1"), GuestRecord::new("G1+1")],
        vec![GuestRecord::new("G2")],
        vec![GuestRecord::new("G3")],
    ];
    roster.import_groups(&event, Vec::new()).unwrap();
    let first = roster.import_groups(&event, groups[..1].to_vec()).unwrap();
    roster.store().fail_next_writes(1);
    let err = roster.import_groups(&event, groups[1..].to_vec()).unwrap_err();

    assert!(matches!(err, RosterError::Store(StoreError::Rejected(_))));
    let forest = roster.forest(&event).unwrap();
    assert_eq!(forest.len(), 1);
    assert_eq!(forest.roots()[0].key, first[0].group_key);
    assert_eq!(forest.guest_count(), 2);
}

#[tokio::test]
async fn failed_write_leaves_view_untouched() {
    let roster = roster();
    let event = EventKey::from("e1");
    roster.create_guest(&event, GuestRecord::new("Alice")).unwrap();

    let controller = roster.sync_controller(SyncOptions::from_timeout_ms(0));
    let mut views = controller.views();
    controller.activate(event.clone());
    let before = wait_for_view(&mut views, |v| v.state == SyncState::Synced).await;

    roster.store().fail_next_writes(1);
    assert!(roster.create_guest(&event, GuestRecord::new("Bob")).is_err());
    settle().await;

    assert_eq!(controller.current(), before);
}

//! Shared stores across threads.
//!
//! Covered:
//! - Concurrent writers never lose a record
//! - Generated keys stay unique under contention
//! - Subscribers see the final state after concurrent writes
//! - Snapshots taken earlier keep their old content

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use crate::hierarchy::build_forest;
use crate::reader::GuestReader;
use crate::store::GuestStore;
use crate::types::{EventKey, GuestRecord};
use crate::writer::GuestWriter;
use crate::{MemoryGuestStore, Roster};

#[test]
fn concurrent_groups_are_all_written() {
    let roster = Roster::new(Arc::new(MemoryGuestStore::new()));
    let event = EventKey::from("e1");

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let roster = roster.clone();
            let event = event.clone();
            thread::spawn(move || {
                for i in 0..10 {
                    roster
                        .add_group(
                            &event,
                            vec![
                                GuestRecord::new(format!("host {t}-{i}")),
                                GuestRecord::new(format!("guest {t}-{i}")),
                            ],
                        )
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let forest = roster.forest(&event).unwrap();
    assert_eq!(forest.len(), 80);
    assert_eq!(forest.guest_count(), 160);
    assert!(forest.orphans().is_empty());
    assert!(forest.roots().iter().all(|root| root.children.len() == 1));
}

#[test]
fn keys_are_unique_under_contention() {
    let store = Arc::new(MemoryGuestStore::new());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                (0..200)
                    .map(|_| store.new_key().unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut seen = HashSet::new();
    for handle in handles {
        for key in handle.join().unwrap() {
            assert!(seen.insert(key), "duplicate key generated");
        }
    }
    assert_eq!(seen.len(), 1_600);
}

#[test]
fn subscriber_ends_on_final_state() {
    let store = Arc::new(MemoryGuestStore::new());
    let event = EventKey::from("e1");
    let mut sub = store.subscribe(&event);

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let store = Arc::clone(&store);
            let event = event.clone();
            thread::spawn(move || {
                for i in 0..25 {
                    store
                        .push(&event, GuestRecord::new(format!("{t}-{i}")))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let latest = sub.latest().unwrap();
    assert_eq!(latest.len(), 100);
    assert_eq!(latest, store.snapshot(&event).unwrap());
}

#[test]
fn old_snapshots_are_immutable() {
    let roster = Roster::new(Arc::new(MemoryGuestStore::new()));
    let event = EventKey::from("e1");
    roster.create_guest(&event, GuestRecord::new("Alice")).unwrap();

    let before = roster.snapshot(&event).unwrap();
    let forest_before = build_forest(&before);
    roster.create_guest(&event, GuestRecord::new("Bob")).unwrap();

    assert_eq!(before.len(), 1);
    assert_eq!(forest_before.len(), 1);
    assert_eq!(roster.forest(&event).unwrap().len(), 2);
}

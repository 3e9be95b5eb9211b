//! First-snapshot timeout policy.
//!
//! Covered:
//! - No snapshot within the timeout gives `TimedOut` with `loading` cleared
//! - A late snapshot still moves the controller to `Synced`
//! - A zero timeout leaves `loading` set indefinitely
//! - A timeout for a previous event never touches the current one

use std::sync::Arc;
use std::time::Duration;

use super::{snapshot_of, wait_for_view, ManualStore};
use crate::sync::{SyncController, SyncOptions, SyncState};
use crate::types::EventKey;

#[tokio::test(start_paused = true)]
async fn silent_store_times_out() {
    let store = ManualStore::new();
    let controller = SyncController::new(Arc::clone(&store), SyncOptions::from_timeout_ms(1_000));
    let mut views = controller.views();

    controller.activate(EventKey::from("e1"));
    let view = wait_for_view(&mut views, |v| v.state == SyncState::TimedOut).await;

    assert!(!view.loading);
    assert!(view.forest.is_empty());
    assert_eq!(view.event, Some(EventKey::from("e1")));
}

#[tokio::test(start_paused = true)]
async fn late_snapshot_recovers_from_timeout() {
    let store = ManualStore::new();
    let controller = SyncController::new(Arc::clone(&store), SyncOptions::from_timeout_ms(1_000));
    let mut views = controller.views();
    let event = EventKey::from("e1");

    controller.activate(event.clone());
    wait_for_view(&mut views, |v| v.state == SyncState::TimedOut).await;

    store.deliver(&event, snapshot_of(&[("A", "Alice", "")]));
    let view = wait_for_view(&mut views, |v| v.state == SyncState::Synced).await;
    assert_eq!(view.forest.len(), 1);
    assert!(!view.loading);
}

#[tokio::test(start_paused = true)]
async fn zero_timeout_keeps_loading() {
    let store = ManualStore::new();
    let controller = SyncController::new(Arc::clone(&store), SyncOptions::from_timeout_ms(0));

    controller.activate(EventKey::from("e1"));
    tokio::time::sleep(Duration::from_secs(3_600)).await;

    let view = controller.current();
    assert_eq!(view.state, SyncState::Subscribing);
    assert!(view.loading);
}

#[tokio::test(start_paused = true)]
async fn snapshot_before_timeout_wins() {
    let store = ManualStore::new();
    let controller = SyncController::new(Arc::clone(&store), SyncOptions::from_timeout_ms(1_000));
    let mut views = controller.views();
    let event = EventKey::from("e1");

    controller.activate(event.clone());
    tokio::time::sleep(Duration::from_millis(500)).await;
    store.deliver(&event, snapshot_of(&[("A", "Alice", "")]));
    wait_for_view(&mut views, |v| v.state == SyncState::Synced).await;

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(controller.current().state, SyncState::Synced);
}

#[tokio::test(start_paused = true)]
async fn old_event_timeout_is_ignored() {
    let store = ManualStore::new();
    let controller = SyncController::new(Arc::clone(&store), SyncOptions::from_timeout_ms(1_000));
    let e2 = EventKey::from("e2");

    controller.activate(EventKey::from("e1"));
    tokio::time::sleep(Duration::from_millis(900)).await;
    controller.activate(e2.clone());
    store.deliver(&e2, snapshot_of(&[("A", "Alice", "")]));
    tokio::time::sleep(Duration::from_millis(500)).await;

    let view = controller.current();
    assert_eq!(view.event, Some(e2));
    assert_eq!(view.state, SyncState::Synced);
}

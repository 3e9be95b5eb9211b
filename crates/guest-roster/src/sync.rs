//! Keeps the hierarchy of the active event in sync with the store.
//!
//! The controller owns at most one store subscription. Each snapshot it
//! receives is turned into a forest and published as a [`SyncView`] on a
//! `watch` channel.
//!
//! # Design Principles
//!
//! - Switching events cancels the old subscription and bumps the generation
//!   under the same lock that guards publication
//! - A snapshot from an older generation is never published
//! - Updates are push-driven; the controller never polls

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::counts::GuestCounts;
use crate::hierarchy::{build_forest, GuestForest};
use crate::store::{GuestStore, SnapshotSubscription};
use crate::types::EventKey;

/// Default wait for the first snapshot before giving up.
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(10);

/// Subscription lifecycle of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// No active event.
    Idle,
    /// Subscribed, waiting for the first snapshot.
    Subscribing,
    /// At least one snapshot has been published for the active event.
    Synced,
    /// No snapshot arrived within the configured timeout.
    TimedOut,
}

/// What the presentation layer renders.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncView {
    pub event: Option<EventKey>,
    /// Bumped on every activation and deactivation.
    pub generation: u64,
    pub state: SyncState,
    pub loading: bool,
    pub forest: GuestForest,
}

impl SyncView {
    fn idle(generation: u64) -> Self {
        Self {
            event: None,
            generation,
            state: SyncState::Idle,
            loading: false,
            forest: GuestForest::empty(),
        }
    }

    pub fn counts(&self) -> GuestCounts {
        self.forest.counts()
    }
}

/// Controller settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// How long to wait for the first snapshot. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl SyncOptions {
    /// Builds options from a millisecond timeout, where zero disables it.
    pub fn from_timeout_ms(ms: u64) -> Self {
        Self {
            timeout: (ms > 0).then(|| Duration::from_millis(ms)),
        }
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_SYNC_TIMEOUT),
        }
    }
}

struct Inner {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

struct Shared {
    inner: Mutex<Inner>,
    views: watch::Sender<SyncView>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publishes only while `generation` is still current.
    fn publish_if_current(&self, generation: u64, update: impl FnOnce(&mut SyncView)) -> bool {
        let inner = self.lock();
        if inner.generation != generation {
            return false;
        }
        self.views.send_modify(update);
        true
    }
}

/// Owns the subscription lifecycle for the active event.
///
/// Activation spawns a forwarding task, so it must be called from within a
/// Tokio runtime.
pub struct SyncController<S: GuestStore + 'static> {
    store: Arc<S>,
    options: SyncOptions,
    shared: Arc<Shared>,
}

impl<S: GuestStore + 'static> SyncController<S> {
    pub fn new(store: Arc<S>, options: SyncOptions) -> Self {
        let (views, _) = watch::channel(SyncView::idle(0));
        Self {
            store,
            options,
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    generation: 0,
                    task: None,
                }),
                views,
            }),
        }
    }

    /// Subscribes to published views.
    pub fn views(&self) -> watch::Receiver<SyncView> {
        self.shared.views.subscribe()
    }

    /// The latest published view.
    pub fn current(&self) -> SyncView {
        self.shared.views.borrow().clone()
    }

    /// Makes `event` the active event.
    ///
    /// The previous subscription is cancelled, the forest is cleared and
    /// `loading` is set until the first snapshot of the new event arrives.
    pub fn activate(&self, event: EventKey) {
        let mut inner = self.shared.lock();
        if let Some(task) = inner.task.take() {
            task.abort();
        }
        inner.generation += 1;
        let generation = inner.generation;

        self.shared.views.send_replace(SyncView {
            event: Some(event.clone()),
            generation,
            state: SyncState::Subscribing,
            loading: true,
            forest: GuestForest::empty(),
        });

        let subscription = self.store.subscribe(&event);
        tracing::debug!(event = %event, generation, "activating guest sync");

        inner.task = Some(tokio::spawn(forward_snapshots(
            Arc::clone(&self.shared),
            subscription,
            generation,
            self.options.timeout,
        )));
    }

    /// Drops the active subscription and returns to `Idle`.
    pub fn deactivate(&self) {
        let mut inner = self.shared.lock();
        if let Some(task) = inner.task.take() {
            task.abort();
        }
        inner.generation += 1;
        self.shared.views.send_replace(SyncView::idle(inner.generation));
        tracing::debug!(generation = inner.generation, "guest sync deactivated");
    }

    /// The currently active event, if any.
    pub fn active_event(&self) -> Option<EventKey> {
        self.shared.views.borrow().event.clone()
    }
}

impl<S: GuestStore + 'static> Drop for SyncController<S> {
    fn drop(&mut self) {
        let mut inner = self.shared.lock();
        if let Some(task) = inner.task.take() {
            task.abort();
        }
    }
}

/// Receives snapshots for one generation and publishes their forests.
async fn forward_snapshots(
    shared: Arc<Shared>,
    mut subscription: SnapshotSubscription,
    generation: u64,
    timeout: Option<Duration>,
) {
    let event = subscription.event().clone();

    let first = match timeout {
        Some(limit) => match tokio::time::timeout(limit, subscription.recv()).await {
            Ok(first) => first,
            Err(_) => {
                tracing::warn!(event = %event, ?limit, "no guest snapshot before timeout");
                shared.publish_if_current(generation, |view| {
                    view.state = SyncState::TimedOut;
                    view.loading = false;
                });
                subscription.recv().await
            }
        },
        None => subscription.recv().await,
    };

    let mut next = first;
    while let Some(snapshot) = next {
        let forest = build_forest(&snapshot);
        let guests = forest.guest_count();

        let published = shared.publish_if_current(generation, |view| {
            view.forest = forest;
            view.state = SyncState::Synced;
            view.loading = false;
        });
        if !published {
            tracing::debug!(event = %event, generation, "discarding snapshot from cancelled sync");
            return;
        }
        tracing::trace!(event = %event, guests, "published guest forest");

        next = subscription.recv().await;
    }

    tracing::debug!(event = %event, generation, "guest subscription closed");
}

//! # Guest Roster
//!
//! A guest-list engine that turns a flat, live key-value feed of guest records
//! into an ordered two-level hierarchy (guests and their companions) and
//! derives the table columns each event asks for.
//!
//! ## Principles
//!
//! - **The store is the only source of truth** - Nothing is cached locally
//! - **The hierarchy is derived** - Rebuilt from every snapshot, never written back
//! - **Columns are derived** - Recomputed from the event's options on demand
//! - **Bad data degrades, it does not fail** - Missing collections are empty,
//!   orphans are dropped, unknown options get blank columns
//!
//! ## Architecture
//!
//! ```text
//! WRITE:
//!   Roster / apply_batch → GuestStore → subscribers
//!
//! READ:
//!   subscription → snapshot → build_forest → SyncView
//!   EventConfig.options → derive_columns
//! ```
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use guest_roster::{
//!     derive_columns, EventKey, GuestReader, GuestRecord, GuestWriter, MemoryGuestStore, Roster,
//! };
//!
//! let roster = Roster::new(Arc::new(MemoryGuestStore::new()));
//! let event = EventKey::from("wedding");
//!
//! let receipt = roster
//!     .add_group(&event, vec![GuestRecord::new("Alice"), GuestRecord::new("Bob")])
//!     .unwrap()
//!     .unwrap();
//!
//! let forest = roster.forest(&event).unwrap();
//! assert_eq!(forest.len(), 1);
//! assert_eq!(forest.roots()[0].key, receipt.group_key);
//! assert_eq!(forest.roots()[0].children.len(), 1);
//!
//! let columns = derive_columns(Some("name,phone"));
//! assert_eq!(columns[1].title, "Telefone");
//! ```
//!
//! ## Crate Structure
//!
//! - [`types`] - Keys, records, patches and event details
//! - [`snapshot`] - Immutable collection snapshots
//! - [`hierarchy`] - Forest building
//! - [`columns`] - Column schema derivation
//! - [`counts`] - Guest totals
//! - [`store`] - The store boundary
//! - [`live`] - Subscriber fan-out
//! - [`memory`] - In-memory store
//! - [`batch`] - Grouped writes
//! - [`reader`] / [`writer`] - Roster traits
//! - [`sync`] - Subscription lifecycle for the active event

pub mod batch;
pub mod columns;
pub mod counts;
pub mod hierarchy;
pub mod live;
pub mod memory;
pub mod reader;
mod roster;
pub mod snapshot;
pub mod store;
pub mod sync;
pub mod types;
pub mod writer;

#[cfg(test)]
mod tests;

pub use batch::{apply_batch, import_groups, BatchReceipt};
pub use columns::{derive_columns, option_title, ColumnKind, ColumnSpec, GuestAction, StatusFilter};
pub use counts::GuestCounts;
pub use hierarchy::{build_forest, GuestForest, GuestNode};
pub use memory::MemoryGuestStore;
pub use reader::GuestReader;
pub use roster::Roster;
pub use snapshot::GuestSnapshot;
pub use store::{GuestStore, SnapshotSubscription, StoreError, StoreResult};
pub use sync::{SyncController, SyncOptions, SyncState, SyncView};
pub use types::{
    EventConfig, EventKey, GuestAttribute, GuestKey, GuestPatch, GuestPath, GuestRecord,
};
pub use writer::GuestWriter;

/// Errors returned by roster operations.
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A guest must have a non-blank name.
    #[error("guest name must not be empty")]
    MissingName,

    /// A companion must point at an existing root guest.
    #[error("{parent} is not a root guest of event {event}")]
    InvalidParent { event: EventKey, parent: GuestKey },

    /// The guest does not exist.
    #[error("guest not found: {0}")]
    UnknownGuest(GuestPath),

    /// An update must change at least one field.
    #[error("nothing to update")]
    EmptyPatch,
}

/// Result alias for roster operations.
pub type RosterResult<T> = Result<T, RosterError>;

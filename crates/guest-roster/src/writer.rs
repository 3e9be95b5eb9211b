//! Write-side traits for the guest roster.
//!
//! # Design Principles
//!
//! - Every write goes straight to the store; nothing is cached locally
//! - Readers learn about a write through the next snapshot
//! - Failed writes surface to the caller and are never retried

use crate::batch::BatchReceipt;
use crate::types::{EventKey, GuestKey, GuestPatch, GuestPath, GuestRecord};
use crate::RosterResult;

/// A writer for guest data.
pub trait GuestWriter {
    /// Creates a root guest under a fresh key.
    ///
    /// Any `parent` on the record is cleared.
    fn create_guest(&self, event: &EventKey, record: GuestRecord) -> RosterResult<GuestKey>;

    /// Creates a companion of an existing root guest.
    ///
    /// Fails if `parent` is unknown or is itself a companion.
    fn add_companion(
        &self,
        event: &EventKey,
        parent: &GuestKey,
        record: GuestRecord,
    ) -> RosterResult<GuestKey>;

    /// Applies a field-level patch to an existing guest.
    fn update_guest(&self, path: &GuestPath, patch: GuestPatch) -> RosterResult<()>;

    /// Checks a guest in, or undoes a check-in.
    fn set_arrived(&self, path: &GuestPath, arrived: bool) -> RosterResult<()> {
        self.update_guest(path, GuestPatch::new().arrived(arrived))
    }

    /// Removes one guest.
    ///
    /// Irreversible. Companions of a removed root are left in place and stop
    /// showing up until reassigned.
    fn remove_guest(&self, path: &GuestPath) -> RosterResult<()>;

    /// Writes one invitee and their companions as a group.
    fn add_group(
        &self,
        event: &EventKey,
        records: Vec<GuestRecord>,
    ) -> RosterResult<Option<BatchReceipt>>;

    /// Writes several groups in order, stopping at the first failure.
    fn import_groups(
        &self,
        event: &EventKey,
        groups: Vec<Vec<GuestRecord>>,
    ) -> RosterResult<Vec<BatchReceipt>>;
}

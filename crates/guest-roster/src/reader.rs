//! Read-side traits for the guest roster.
//!
//! Reads never write and never notify subscribers.

use crate::counts::GuestCounts;
use crate::hierarchy::GuestForest;
use crate::snapshot::GuestSnapshot;
use crate::types::EventKey;
use crate::RosterResult;

/// A reader for guest data.
pub trait GuestReader {
    /// The current flat collection of an event.
    fn snapshot(&self, event: &EventKey) -> RosterResult<GuestSnapshot>;

    /// The current hierarchy of an event.
    fn forest(&self, event: &EventKey) -> RosterResult<GuestForest>;

    /// Totals over the current hierarchy of an event.
    fn counts(&self, event: &EventKey) -> RosterResult<GuestCounts> {
        Ok(self.forest(event)?.counts())
    }
}

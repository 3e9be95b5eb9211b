//! Grouped guest writes.
//!
//! A group is one invitee followed by their companions. The first entry
//! becomes the root under a freshly generated group key; every following
//! entry gets its own key and points at the group key. The whole group is
//! submitted as one multi-path update.

use serde::Serialize;

use crate::store::{GuestStore, StoreResult, UpdateSet};
use crate::types::{EventKey, GuestKey, GuestRecord};

/// Keys assigned to one applied group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReceipt {
    pub event: EventKey,
    /// Key of the root guest, shared as `parent` by the companions.
    pub group_key: GuestKey,
    /// Companion keys, in input order.
    pub companions: Vec<GuestKey>,
}

impl BatchReceipt {
    /// Every written key, root first.
    pub fn keys(&self) -> impl Iterator<Item = &GuestKey> + '_ {
        std::iter::once(&self.group_key).chain(self.companions.iter())
    }
}

/// Writes one group of guests.
///
/// Any `parent` already present on the input records is overwritten. An empty
/// group writes nothing and returns `None`. Returns once the update is
/// submitted; the new records arrive through subscriptions. Nothing is rolled
/// back if the store fails.
pub fn apply_batch<S>(
    store: &S,
    event: &EventKey,
    records: Vec<GuestRecord>,
) -> StoreResult<Option<BatchReceipt>>
where
    S: GuestStore + ?Sized,
{
    let mut records = records.into_iter();
    let Some(mut root) = records.next() else {
        tracing::debug!(event = %event, "empty guest group, nothing to write");
        return Ok(None);
    };

    let group_key = store.new_key()?;
    root.parent = None;

    let mut entries: UpdateSet = Vec::with_capacity(records.len() + 1);
    entries.push((group_key.clone(), root));

    let mut companions = Vec::with_capacity(records.len());
    for mut companion in records {
        let key = store.new_key()?;
        companion.parent = Some(group_key.clone());
        companions.push(key.clone());
        entries.push((key, companion));
    }

    store.update(event, entries)?;

    tracing::info!(
        event = %event,
        group = %group_key,
        companions = companions.len(),
        "guest group written"
    );

    Ok(Some(BatchReceipt {
        event: event.clone(),
        group_key,
        companions,
    }))
}

/// Writes several groups in order, one update per group.
///
/// Stops at the first failure; groups written before it stay written.
pub fn import_groups<S>(
    store: &S,
    event: &EventKey,
    groups: Vec<Vec<GuestRecord>>,
) -> StoreResult<Vec<BatchReceipt>>
where
    S: GuestStore + ?Sized,
{
    let total = groups.len();
    let mut receipts = Vec::with_capacity(total);

    for (index, group) in groups.into_iter().enumerate() {
        match apply_batch(store, event, group) {
            Ok(Some(receipt)) => receipts.push(receipt),
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(
                    event = %event,
                    group = index,
                    written = receipts.len(),
                    error = %err,
                    "guest import stopped"
                );
                return Err(err);
            }
        }
    }

    tracing::info!(event = %event, groups = receipts.len(), of = total, "guest import finished");
    Ok(receipts)
}

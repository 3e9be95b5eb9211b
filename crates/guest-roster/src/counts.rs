//! Guest totals derived from a built forest.

use serde::Serialize;

use crate::hierarchy::GuestForest;

/// Headline numbers shown with an event: everyone, who arrived, who did not.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GuestCounts {
    pub total: usize,
    pub arrived: usize,
    pub not_arrived: usize,
}

impl GuestCounts {
    /// Counts every node in the forest, companions included. Orphans are not
    /// part of the forest and are not counted.
    pub fn from_forest(forest: &GuestForest) -> Self {
        forest
            .iter_all()
            .fold(Self::default(), |mut counts, node| {
                counts.total += 1;
                if node.record.arrived {
                    counts.arrived += 1;
                } else {
                    counts.not_arrived += 1;
                }
                counts
            })
    }
}

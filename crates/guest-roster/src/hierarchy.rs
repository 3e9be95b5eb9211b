//! Rebuilds the two-level guest hierarchy from a flat snapshot.
//!
//! The store keeps guests flat; a companion only carries its root's key in
//! `parent`. The tree is a projection recomputed from every snapshot and is
//! never written back.
//!
//! Orphans (a `parent` that is not the key of a root in the same snapshot,
//! including a parent that is itself a companion) are dropped from the forest
//! and reported through [`GuestForest::orphans`].

use std::collections::HashMap;
use std::sync::Arc;

use crate::counts::GuestCounts;
use crate::snapshot::GuestSnapshot;
use crate::types::{GuestKey, GuestRecord};

/// A guest together with its companions.
///
/// Companions are nodes with an empty `children` list.
#[derive(Debug, Clone, PartialEq)]
pub struct GuestNode {
    pub key: GuestKey,
    pub record: GuestRecord,
    pub children: Vec<GuestNode>,
}

impl GuestNode {
    fn leaf(key: &GuestKey, record: &GuestRecord) -> Self {
        Self {
            key: key.clone(),
            record: record.clone(),
            children: Vec::new(),
        }
    }

    /// The guest plus every companion.
    pub fn party_size(&self) -> usize {
        1 + self.children.len()
    }

    /// Iterates this node followed by its companions.
    pub fn iter_party(&self) -> impl Iterator<Item = &GuestNode> + '_ {
        std::iter::once(self).chain(self.children.iter())
    }
}

/// The ordered forest built from one snapshot.
///
/// Shared behind an `Arc`; consumers get read-only access.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuestForest {
    roots: Arc<[GuestNode]>,
    orphans: Arc<[GuestKey]>,
}

impl GuestForest {
    /// An empty forest, as published before the first snapshot.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Root guests in snapshot order, each with its companions.
    pub fn roots(&self) -> &[GuestNode] {
        &self.roots
    }

    /// Keys of companions dropped because their parent is not a root.
    pub fn orphans(&self) -> &[GuestKey] {
        &self.orphans
    }

    /// Number of root guests.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Iterates every node in display order: each root followed by its companions.
    pub fn iter_all(&self) -> impl Iterator<Item = &GuestNode> + '_ {
        self.roots.iter().flat_map(GuestNode::iter_party)
    }

    /// Number of guests present in the forest, companions included.
    pub fn guest_count(&self) -> usize {
        self.roots.iter().map(GuestNode::party_size).sum()
    }

    /// Finds a root or companion by key.
    pub fn find(&self, key: &GuestKey) -> Option<&GuestNode> {
        self.iter_all().find(|node| &node.key == key)
    }

    /// Total / arrived / not-arrived counts over the whole forest.
    pub fn counts(&self) -> GuestCounts {
        GuestCounts::from_forest(self)
    }
}

/// Builds the forest for one snapshot.
///
/// Roots keep snapshot order; each root's companions keep snapshot order.
/// Runs in a single pass over the snapshot plus one pass over the roots.
pub fn build_forest(snapshot: &GuestSnapshot) -> GuestForest {
    let mut roots: Vec<(&GuestKey, &GuestRecord)> = Vec::new();
    let mut children_by_parent: HashMap<&GuestKey, Vec<GuestNode>> = HashMap::new();

    for (key, record) in snapshot.iter() {
        match &record.parent {
            None => roots.push((key, record)),
            Some(parent) => children_by_parent
                .entry(parent)
                .or_default()
                .push(GuestNode::leaf(key, record)),
        }
    }

    let nodes: Vec<GuestNode> = roots
        .into_iter()
        .map(|(key, record)| GuestNode {
            key: key.clone(),
            record: record.clone(),
            children: children_by_parent.remove(key).unwrap_or_default(),
        })
        .collect();

    // Whatever is left in the index points at a key that is not a root.
    let mut orphans: Vec<GuestKey> = children_by_parent
        .into_values()
        .flatten()
        .map(|node| node.key)
        .collect();
    orphans.sort();

    if !orphans.is_empty() {
        tracing::debug!(
            orphans = orphans.len(),
            roots = nodes.len(),
            "dropped companions whose parent is not a root guest"
        );
    }

    GuestForest {
        roots: nodes.into(),
        orphans: orphans.into(),
    }
}

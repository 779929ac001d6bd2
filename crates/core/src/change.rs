//! Change records for version transitions
//!
//! A [`ListChange`] records which items of one list were touched by a
//! version transition, bucketed by what happened to them. A
//! [`ListSetChange`] aggregates the per-list changes of one transition
//! across all list types, together with the event kind and the resulting
//! list-set version.
//!
//! Change records are transient: they are built while an operation runs,
//! delivered once through the event channel, and discarded. They are never
//! persisted.

use crate::id::{ItemId, ListTag};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of a list-set event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    /// Content was wholesale replaced; consumers rebuild from the source
    Refresh,
    /// A version transition with item-level detail
    Version,
    /// A commit drained pending changes back into the base
    Update,
}

impl ChangeKind {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Refresh => "Refresh",
            ChangeKind::Version => "Version",
            ChangeKind::Update => "Update",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-list diff record for one version transition
///
/// Buckets are disjoint: an item appears in at most one per transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListChange {
    version: u64,
    added: Vec<ItemId>,
    changed: Vec<ItemId>,
    restored: Vec<ItemId>,
    hidden: Vec<ItemId>,
    deleted: Vec<ItemId>,
}

impl ListChange {
    /// Create an empty change at the given resulting list version
    pub fn new(version: u64) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    /// The list's version after the transition
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Record an item that entered the list
    pub fn record_added(&mut self, id: ItemId) {
        self.added.push(id);
    }

    /// Record an item whose values changed
    pub fn record_changed(&mut self, id: ItemId) {
        self.changed.push(id);
    }

    /// Record an item whose deletion flag cleared (was deleted, now not)
    pub fn record_restored(&mut self, id: ItemId) {
        self.restored.push(id);
    }

    /// Record an item whose deletion flag was set (now deleted, still present)
    pub fn record_hidden(&mut self, id: ItemId) {
        self.hidden.push(id);
    }

    /// Record an item removed from the list outright
    pub fn record_deleted(&mut self, id: ItemId) {
        self.deleted.push(id);
    }

    /// Items that entered the list
    pub fn added(&self) -> &[ItemId] {
        &self.added
    }

    /// Items whose values changed
    pub fn changed(&self) -> &[ItemId] {
        &self.changed
    }

    /// Items whose deletion flag cleared
    pub fn restored(&self) -> &[ItemId] {
        &self.restored
    }

    /// Items whose deletion flag was set
    pub fn hidden(&self) -> &[ItemId] {
        &self.hidden
    }

    /// Items removed from the list outright
    pub fn deleted(&self) -> &[ItemId] {
        &self.deleted
    }

    /// Every touched item id, in bucket order
    pub fn touched(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.added
            .iter()
            .chain(&self.changed)
            .chain(&self.restored)
            .chain(&self.hidden)
            .chain(&self.deleted)
            .copied()
    }

    /// Whether no items were touched
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.changed.is_empty()
            && self.restored.is_empty()
            && self.hidden.is_empty()
            && self.deleted.is_empty()
    }
}

/// Aggregated change record for one list-set version transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSetChange {
    kind: ChangeKind,
    version: u64,
    lists: BTreeMap<ListTag, ListChange>,
}

impl ListSetChange {
    /// Create an empty aggregate of the given kind and resulting version
    pub fn new(kind: ChangeKind, version: u64) -> Self {
        Self {
            kind,
            version,
            lists: BTreeMap::new(),
        }
    }

    /// The event kind
    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    /// The list-set's version after the transition
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Attach a per-list change, dropping it when empty
    pub fn put_list_change(&mut self, tag: ListTag, change: ListChange) {
        if !change.is_empty() {
            self.lists.insert(tag, change);
        }
    }

    /// The change for one list, when any of its items were touched
    pub fn list_change(&self, tag: ListTag) -> Option<&ListChange> {
        self.lists.get(&tag)
    }

    /// Iterate the per-list changes in tag order
    pub fn list_changes(&self) -> impl Iterator<Item = (ListTag, &ListChange)> {
        self.lists.iter().map(|(tag, change)| (*tag, change))
    }

    /// Whether the transition touched no items in any list
    ///
    /// Refresh events carry no item-level detail and are never no-ops.
    pub fn is_empty(&self) -> bool {
        self.kind != ChangeKind::Refresh && self.lists.values().all(ListChange::is_empty)
    }
}

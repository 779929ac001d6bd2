//! Versioned items and their derived state
//!
//! A [`VersionedItem`] owns its current [`ValueSet`] plus a stack of prior
//! value-sets (the history). The bottom of that stack is the *original*
//! value-set: the values at version 0 / the last commit. An item created
//! inside the current uncommitted span has an original stamped above
//! version 0 - it never existed at the committed baseline.
//!
//! [`ItemState`] is always derived from (original vs current, deletion
//! flag); it is never stored independently of the history.

use crate::error::{Error, Result};
use crate::id::{ItemId, ListTag};
use crate::value::ValueSet;
use serde::{Deserialize, Serialize};

/// Pending-change classification of a versioned item
///
/// The state machine:
/// - New → Clean (on commit) or DelNew (on delete before commit)
/// - Clean → Changed (on edit) or Deleted (on delete)
/// - Changed → Clean (on commit or full undo) or Deleted
/// - Deleted/DelNew → removed (on commit) or restored to the prior state
///   (on undo)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemState {
    /// Created since the last commit, not deleted
    New,
    /// Current values equal the committed baseline
    Clean,
    /// Committed item with uncommitted value changes
    Changed,
    /// Committed item flagged deleted
    Deleted,
    /// Created and deleted within the same uncommitted span
    DelNew,
}

impl ItemState {
    /// Whether the item carries a pending (uncommitted) change
    pub fn is_dirty(&self) -> bool {
        !matches!(self, ItemState::Clean)
    }

    /// Whether the item is flagged deleted in either deletion state
    pub fn is_deleted(&self) -> bool {
        matches!(self, ItemState::Deleted | ItemState::DelNew)
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemState::New => "New",
            ItemState::Clean => "Clean",
            ItemState::Changed => "Changed",
            ItemState::Deleted => "Deleted",
            ItemState::DelNew => "DelNew",
        }
    }
}

impl std::fmt::Display for ItemState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An item with a current value-set and a history of prior value-sets
///
/// The id is unique within the owning list; the tag matches the owning
/// list's key. History entries are pushed before a mutation and popped by
/// rewind; commit collapses the stack so the current values become the new
/// original.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedItem {
    id: ItemId,
    tag: ListTag,
    current: ValueSet,
    history: Vec<ValueSet>,
}

impl VersionedItem {
    /// Create a blank item with empty values at version 0
    pub fn new(id: ItemId, tag: ListTag) -> Self {
        Self {
            id,
            tag,
            current: ValueSet::new(),
            history: Vec::new(),
        }
    }

    /// Create an item from an explicit current value-set
    pub fn with_values(id: ItemId, tag: ListTag, values: ValueSet) -> Self {
        Self {
            id,
            tag,
            current: values,
            history: Vec::new(),
        }
    }

    /// The item's id, unique within its owning list
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// The item's type tag
    pub fn tag(&self) -> ListTag {
        self.tag
    }

    /// The item's version: the version stamp of its current values
    pub fn version(&self) -> u64 {
        self.current.version()
    }

    /// Whether the item is currently flagged deleted
    pub fn is_deleted(&self) -> bool {
        self.current.is_deleted()
    }

    /// The current value-set
    pub fn values(&self) -> &ValueSet {
        &self.current
    }

    /// Mutable access to the current value-set
    pub fn values_mut(&mut self) -> &mut ValueSet {
        &mut self.current
    }

    /// The original value-set: the values at version 0 / the last commit
    ///
    /// With history present this is the bottom of the stack; otherwise the
    /// current values are also the original.
    pub fn original(&self) -> &ValueSet {
        self.history.first().unwrap_or(&self.current)
    }

    /// Whether any prior value-sets are stacked
    pub fn has_history(&self) -> bool {
        !self.history.is_empty()
    }

    /// Replace the history stack wholesale
    ///
    /// Used when constructing derived representations (update and diff
    /// entries synthesize a history rather than replaying one).
    pub fn set_history(&mut self, history: Vec<ValueSet>) {
        self.history = history;
    }

    /// Snapshot the current value-set onto the history stack, then stamp
    /// the current values with `version`
    ///
    /// Called exactly once per item per version transition, before the
    /// first mutation of that transition.
    pub fn push_history(&mut self, version: u64) {
        self.history.push(self.current.clone());
        self.current.set_version(version);
    }

    /// Discard the most recent version, restoring the previous value-set
    ///
    /// # Errors
    /// Returns an error if the item has no history.
    pub fn pop_history(&mut self) -> Result<()> {
        match self.history.pop() {
            Some(values) => {
                self.current = values;
                Ok(())
            }
            None => Err(Error::NoHistory {
                tag: self.tag,
                id: self.id,
            }),
        }
    }

    /// Collapse all history: the current values become the new original
    ///
    /// The current values are re-stamped to version 0 and any deletion flag
    /// is kept as-is; used by commit, after which the item is Clean.
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.current.set_version(0);
    }

    /// Derive the item's pending-change state
    ///
    /// State is a pure function of (original vs current values, deletion
    /// flag). An original stamped above version 0 marks an item created in
    /// the current uncommitted span: it classifies New/DelNew no matter how
    /// often it was edited since, so that phased commit routes it to the
    /// INSERT phase.
    pub fn state(&self) -> ItemState {
        if self.original().version() > 0 {
            if self.current.is_deleted() {
                ItemState::DelNew
            } else {
                ItemState::New
            }
        } else if self.current.is_deleted() {
            ItemState::Deleted
        } else if self.current.version() > 0 {
            ItemState::Changed
        } else {
            ItemState::Clean
        }
    }
}

//! Update manager: the pending-change view and phased batch commit
//!
//! An [`UpdateListSet`] contains one entry per Base item whose state is not
//! Clean, each entry re-expressed for committing:
//!
//! - New: the current values only (an "added" representation)
//! - Changed: current values plus the original values as history
//! - Deleted: the deleted current values plus the pre-deletion original
//! - DelNew: a no-history deletion marker stamped version 1
//!
//! Entries order by *update phase* first (Insert < Update < Delete < None),
//! then by the base list's comparator.
//!
//! [`UpdateListSet::commit_update_batch`] drains pending changes back into
//! Base in three strictly ordered phases - INSERT, then UPDATE, then
//! DELETE - under a cooperative `max_items` budget. The DELETE phase walks
//! both the list types and the items within each list in reverse, so
//! entities that reference others are removed before the entities they
//! reference.

use crate::events::Subscription;
use crate::list::ItemComparator;
use crate::set::{ListSetType, VersionedListSet};
use std::cmp::Ordering;
use std::rc::Rc;
use tracing::{debug, info};
use verset_core::{
    ChangeKind, ItemId, ItemState, ListChange, ListSetChange, ListTag, Result, VersionedItem,
};

/// Commit phase an item's pending change belongs to
///
/// The ordering is the commit ordering: inserts run first, then updates,
/// then deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UpdatePhase {
    /// Pending creations (New, DelNew)
    Insert,
    /// Pending value changes (Changed)
    Update,
    /// Pending deletions (Deleted)
    Delete,
    /// No pending change (Clean)
    None,
}

impl UpdatePhase {
    /// The phase an item state commits in
    pub fn of(state: ItemState) -> Self {
        match state {
            ItemState::New | ItemState::DelNew => UpdatePhase::Insert,
            ItemState::Changed => UpdatePhase::Update,
            ItemState::Deleted => UpdatePhase::Delete,
            ItemState::Clean => UpdatePhase::None,
        }
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdatePhase::Insert => "Insert",
            UpdatePhase::Update => "Update",
            UpdatePhase::Delete => "Delete",
            UpdatePhase::None => "None",
        }
    }
}

impl std::fmt::Display for UpdatePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Wrap a base comparator so entries order by phase first
fn phase_comparator(base: Option<ItemComparator>) -> ItemComparator {
    Rc::new(move |a, b| {
        UpdatePhase::of(a.state())
            .cmp(&UpdatePhase::of(b.state()))
            .then_with(|| match &base {
                Some(comparator) => comparator(a, b),
                None => Ordering::Equal,
            })
    })
}

/// A derived Update list-set kept in sync with its Base source
pub struct UpdateListSet {
    set: VersionedListSet,
    events: Subscription,
}

impl UpdateListSet {
    /// Derive an Update list-set from a Base set
    ///
    /// # Errors
    /// Fails when `base` is not a Base set.
    pub fn derive(base: &VersionedListSet) -> Result<Self> {
        base.require_type(ListSetType::Base)?;
        let mut set = base.clone_structure(ListSetType::Update)?;
        for tag in set.tags() {
            let base_comparator = base
                .require_list(tag)?
                .comparator()
                .cloned();
            set.require_list_mut(tag)?
                .set_comparator(Some(phase_comparator(base_comparator)));
        }
        let events = base.subscribe();
        let mut update = Self { set, events };
        update.rebuild(base)?;
        debug!("derived update list-set");
        Ok(update)
    }

    /// The underlying Update-typed list-set
    pub fn set(&self) -> &VersionedListSet {
        &self.set
    }

    /// Whether source events are queued and unapplied
    pub fn has_pending_events(&self) -> bool {
        self.events.has_pending()
    }

    /// Whether any pending changes remain
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Re-express one base item for committing, or None when Clean
    fn rebuild_entry(base_item: &VersionedItem) -> Option<VersionedItem> {
        let state = base_item.state();
        let mut entry = VersionedItem::new(base_item.id(), base_item.tag());
        match state {
            ItemState::Clean => return None,
            ItemState::New => {
                entry.values_mut().copy_from(base_item.values());
                entry.values_mut().set_version(base_item.version());
            }
            ItemState::Changed | ItemState::Deleted => {
                entry.values_mut().copy_from(base_item.values());
                entry.values_mut().set_version(base_item.version());
                let mut original = base_item.original().clone();
                original.set_version(0);
                if state == ItemState::Deleted {
                    // History is the pre-deletion original
                    original.set_deleted(false);
                }
                entry.set_history(vec![original]);
            }
            ItemState::DelNew => {
                // No-history deletion marker
                entry.values_mut().copy_from(base_item.values());
                entry.values_mut().set_deleted(true);
                entry.values_mut().set_version(1);
            }
        }
        Some(entry)
    }

    /// Full rebuild from the Base content
    fn rebuild(&mut self, base: &VersionedListSet) -> Result<()> {
        for tag in self.set.tags() {
            let base_list = base.require_list(tag)?;
            let list = self.set.require_list_mut(tag)?;
            list.clear();
            for base_item in base_list.iter() {
                if let Some(entry) = Self::rebuild_entry(base_item) {
                    list.add(entry)?;
                }
            }
            list.sort();
            list.set_version(u64::from(!list.is_empty()));
        }
        self.set.recompute_version();
        Ok(())
    }

    /// Apply every queued Base event
    ///
    /// Touched items are replayed into equivalent update-entry
    /// transitions; entries whose base item went Clean (or vanished) are
    /// removed. An update list that empties resets to version 0.
    ///
    /// # Errors
    /// Propagates lookup failures for lists missing from the Base set.
    pub fn sync(&mut self, base: &VersionedListSet) -> Result<()> {
        let events = self.events.drain();
        for event in events {
            match event.kind() {
                ChangeKind::Refresh => self.rebuild(base)?,
                ChangeKind::Version | ChangeKind::Update => {
                    for (tag, change) in event.list_changes() {
                        let touched: Vec<ItemId> = change.touched().collect();
                        self.replay(base, tag, &touched)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn replay(&mut self, base: &VersionedListSet, tag: ListTag, touched: &[ItemId]) -> Result<()> {
        let base_list = base.require_list(tag)?;
        let list = self.set.require_list_mut(tag)?;
        for id in touched {
            let entry = base_list.get_item_by_id(*id).and_then(Self::rebuild_entry);
            list.remove_by_id(*id);
            if let Some(entry) = entry {
                list.add(entry)?;
            }
        }
        list.sort();
        list.set_version(u64::from(!list.is_empty()));
        self.set.recompute_version();
        Ok(())
    }

    /// Drain pending changes back into Base, bounded by `max_items`
    ///
    /// Runs the INSERT phase, then UPDATE, then DELETE, advancing only
    /// once the current phase yields no further committable items or the
    /// budget is exhausted. Within DELETE both the list-type order and the
    /// item order reverse to respect dependency direction. Committed
    /// deletions remove the Base item (with paired-registry cleanup);
    /// everything else has its Base history cleared. DelNew removals do
    /// not count against the budget - they never existed in committed
    /// Base.
    ///
    /// Fires one UPDATE event on the Base channel, resynchronizes this
    /// set through the normal replay path, and resets fully drained lists
    /// (and their Base counterparts) to version 0. Returns the number of
    /// budget-counted committed items; call repeatedly to drain fully,
    /// interleaving progress reporting or cancellation checks between
    /// calls. Items already committed stay committed if the caller stops
    /// early.
    ///
    /// # Errors
    /// Fails when `base` is not a Base set or lacks one of this set's
    /// lists.
    pub fn commit_update_batch(
        &mut self,
        base: &mut VersionedListSet,
        max_items: usize,
    ) -> Result<usize> {
        base.require_type(ListSetType::Base)?;
        let mut committed = 0usize;
        let mut changes: Vec<(ListTag, ListChange)> = Vec::new();

        'phases: for phase in [UpdatePhase::Insert, UpdatePhase::Update, UpdatePhase::Delete] {
            let tags = if phase == UpdatePhase::Delete {
                self.set.tags_rev()
            } else {
                self.set.tags()
            };
            for tag in tags {
                let list = self.set.require_list_mut(tag)?;
                let mut ids: Vec<ItemId> = list
                    .iter()
                    .filter(|entry| UpdatePhase::of(entry.state()) == phase)
                    .map(VersionedItem::id)
                    .collect();
                if phase == UpdatePhase::Delete {
                    ids.reverse();
                }
                if ids.is_empty() {
                    continue;
                }
                let mut change = ListChange::new(0);
                for id in ids {
                    if committed >= max_items {
                        Self::put_change(&mut changes, tag, change);
                        break 'phases;
                    }
                    let state = match list.get_item_by_id(id) {
                        Some(entry) => entry.state(),
                        None => continue,
                    };
                    let base_list = base.require_list_mut(tag)?;
                    if state.is_deleted() {
                        base_list.remove_by_id(id);
                        base.cleanup_deleted_item(tag, id);
                        change.record_deleted(id);
                    } else if let Some(base_item) = base_list.get_item_mut(id) {
                        base_item.clear_history();
                        change.record_changed(id);
                    }
                    list.remove_by_id(id);
                    if state != ItemState::DelNew {
                        committed += 1;
                    }
                }
                Self::put_change(&mut changes, tag, change);
            }
        }

        // Fully drained lists fall back to the committed baseline
        for tag in self.set.tags() {
            let list = self.set.require_list_mut(tag)?;
            if list.is_empty() {
                list.set_version(0);
                base.require_list_mut(tag)?.set_version(0);
            }
        }
        base.recompute_version();
        self.set.recompute_version();

        let mut aggregate = ListSetChange::new(ChangeKind::Update, base.version());
        for (tag, change) in changes {
            aggregate.put_list_change(tag, change);
        }
        base.fire_event(aggregate);
        // Replay our own event so the subscription queue stays consistent
        self.sync(base)?;

        info!(committed, remaining = !self.is_empty(), "commit batch");
        Ok(committed)
    }

    fn put_change(changes: &mut Vec<(ListTag, ListChange)>, tag: ListTag, change: ListChange) {
        if !change.is_empty() {
            changes.push((tag, change));
        }
    }
}

impl std::fmt::Debug for UpdateListSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateListSet")
            .field("set", &self.set)
            .finish()
    }
}

//! Base manager: versioned mutation, refresh, rewind, reset and rebase
//!
//! Base list-sets are the authoritative collections; everything else is
//! derived from them. This module provides:
//!
//! - [`BaseTransaction`]: the single-version mutation scope through which a
//!   Base set is edited. All mutations inside one transaction share one
//!   version stamp; committing fires one aggregated VERSION event.
//! - [`refresh`] / [`reset`] / [`undo_last_change`] / [`rewind_to_version`]:
//!   version navigation. Rewind discards recent history item by item and
//!   classifies every touched item as changed, restored (deletion flag
//!   cleared) or hidden (deletion flag set).
//! - [`reset_content`]: wholesale replacement from another Base set.
//! - [`rebase_list_set`]: reconciling a version-0 set against a version-0
//!   snapshot of its source, re-expressing the differences as pending
//!   changes.

use crate::set::{ListSetType, VersionedListSet};
use std::collections::BTreeMap;
use tracing::debug;
use verset_core::{
    ChangeKind, Error, ItemId, ListChange, ListSetChange, ListTag, Result, ValueSet,
};

// =============================================================================
// BaseTransaction
// =============================================================================

/// A single-version mutation scope over a Base list-set
///
/// Every item touched inside the transaction is stamped with the set's
/// version + 1; history is pushed exactly once per item, so repeated
/// amendments within one transaction collapse into one version step.
/// [`BaseTransaction::commit`] advances the touched lists and the set to
/// the new version and fires one aggregated VERSION event. Dropping the
/// transaction without committing leaves stamped items without their
/// event; always commit.
pub struct BaseTransaction<'a> {
    set: &'a mut VersionedListSet,
    version: u64,
    changes: BTreeMap<ListTag, ListChange>,
}

impl<'a> BaseTransaction<'a> {
    /// Open a transaction at the set's next version
    ///
    /// # Errors
    /// Fails when the set is not a Base set.
    pub fn begin(set: &'a mut VersionedListSet) -> Result<Self> {
        set.require_type(ListSetType::Base)?;
        let version = set.version() + 1;
        Ok(Self {
            set,
            version,
            changes: BTreeMap::new(),
        })
    }

    /// The version every mutation in this transaction is stamped with
    pub fn version(&self) -> u64 {
        self.version
    }

    fn change(&mut self, tag: ListTag) -> &mut ListChange {
        let version = self.version;
        self.changes
            .entry(tag)
            .or_insert_with(|| ListChange::new(version))
    }

    /// Create a blank item, stamp it with the transaction version and add
    /// it to its list
    ///
    /// # Errors
    /// Fails when the tag is not registered or the id space is exhausted.
    pub fn create_item(&mut self, tag: ListTag) -> Result<ItemId> {
        self.create(tag, None)
    }

    /// Create an item under an explicit id
    ///
    /// # Errors
    /// Fails additionally when the id is in use or out of range.
    pub fn create_item_with_id(&mut self, tag: ListTag, id: ItemId) -> Result<ItemId> {
        self.create(tag, Some(id))
    }

    fn create(&mut self, tag: ListTag, id: Option<ItemId>) -> Result<ItemId> {
        let version = self.version;
        let list = self.set.require_list_mut(tag)?;
        let mut item = list.new_list_item(id)?;
        item.values_mut().set_version(version);
        let id = item.id();
        list.add(item)?;
        self.change(tag).record_added(id);
        Ok(id)
    }

    /// Amend an item's current values
    ///
    /// On the item's first touch in this transaction its values are
    /// snapshotted onto the history stack and re-stamped.
    ///
    /// # Errors
    /// Fails when the list or item does not exist.
    pub fn amend_item(
        &mut self,
        tag: ListTag,
        id: ItemId,
        amend: impl FnOnce(&mut ValueSet),
    ) -> Result<()> {
        let version = self.version;
        let list = self.set.require_list_mut(tag)?;
        let item = list
            .get_item_mut(id)
            .ok_or(Error::UnknownItem { tag, id })?;
        let first_touch = item.version() < version;
        if first_touch {
            item.push_history(version);
        }
        amend(item.values_mut());
        if first_touch {
            self.change(tag).record_changed(id);
        }
        Ok(())
    }

    /// Flag an item deleted
    ///
    /// The item stays in the list (the deletion is an undoable, versioned
    /// change); it is recorded as hidden for consumers.
    ///
    /// # Errors
    /// Fails when the list or item does not exist.
    pub fn delete_item(&mut self, tag: ListTag, id: ItemId) -> Result<()> {
        let version = self.version;
        let list = self.set.require_list_mut(tag)?;
        let item = list
            .get_item_mut(id)
            .ok_or(Error::UnknownItem { tag, id })?;
        let first_touch = item.version() < version;
        if first_touch {
            item.push_history(version);
        }
        item.values_mut().set_deleted(true);
        if first_touch {
            self.change(tag).record_hidden(id);
        }
        Ok(())
    }

    /// Clear an item's deletion flag
    ///
    /// # Errors
    /// Fails when the list or item does not exist.
    pub fn restore_item(&mut self, tag: ListTag, id: ItemId) -> Result<()> {
        let version = self.version;
        let list = self.set.require_list_mut(tag)?;
        let item = list
            .get_item_mut(id)
            .ok_or(Error::UnknownItem { tag, id })?;
        let first_touch = item.version() < version;
        if first_touch {
            item.push_history(version);
        }
        item.values_mut().set_deleted(false);
        if first_touch {
            self.change(tag).record_restored(id);
        }
        Ok(())
    }

    /// Advance the touched lists and the set to the transaction version
    /// and fire one aggregated VERSION event
    ///
    /// A transaction that touched nothing leaves the version untouched and
    /// fires nothing. Returns the set's resulting version.
    pub fn commit(self) -> u64 {
        if self.changes.values().all(ListChange::is_empty) {
            return self.set.version();
        }
        let mut aggregate = ListSetChange::new(ChangeKind::Version, self.version);
        for (tag, change) in self.changes {
            if let Ok(list) = self.set.require_list_mut(tag) {
                list.set_version(self.version);
            }
            aggregate.put_list_change(tag, change);
        }
        self.set.set_version(self.version);
        debug!(version = self.version, "base transaction committed");
        self.set.fire_event(aggregate);
        self.version
    }
}

// =============================================================================
// Refresh / reset / rewind
// =============================================================================

/// Fire a REFRESH event: consumers rebuild wholesale from the Base content
///
/// Carries no item-level detail and is only valid for a fully committed
/// (version 0) Base set.
///
/// # Errors
/// Fails when the set is not a Base set or not at version 0.
pub fn refresh(set: &VersionedListSet) -> Result<()> {
    set.require_type(ListSetType::Base)?;
    if set.version() != 0 {
        return Err(Error::NotAtBaseVersion(set.version()));
    }
    debug!("base refresh");
    set.fire_event(ListSetChange::new(ChangeKind::Refresh, 0));
    Ok(())
}

/// Rewind a Base set all the way back to version 0
///
/// # Errors
/// Fails when the set is not a Base set.
pub fn reset(set: &mut VersionedListSet) -> Result<()> {
    rewind_to_version(set, 0)
}

/// Rewind a Base set by exactly one version
///
/// # Errors
/// Fails when the set is not a Base set or has no changes to undo.
pub fn undo_last_change(set: &mut VersionedListSet) -> Result<()> {
    set.require_type(ListSetType::Base)?;
    let current = set.version();
    if current == 0 {
        return Err(Error::NothingToUndo);
    }
    rewind_to_version(set, current - 1)
}

/// Rewind a Base set to a prior version
///
/// For every list above the target version, each item stamped above the
/// target either never existed at that point (its original is stamped
/// above the target) and is removed outright, or has history popped until
/// its version is at or below the target. Each surviving item is
/// classified by comparing its deletion flag before and after: unchanged
/// flag - changed; was deleted, now not - restored; was not, now is -
/// hidden. One aggregated VERSION event fires and the set's version
/// becomes the target.
///
/// Rewinding to the current version is a no-op (the empty change is
/// suppressed); rewinding above it is a contract violation.
///
/// # Errors
/// Fails when the set is not a Base set or the target is above the
/// current version.
pub fn rewind_to_version(set: &mut VersionedListSet, target: u64) -> Result<()> {
    set.require_type(ListSetType::Base)?;
    let current = set.version();
    if target > current {
        return Err(Error::VersionAhead { current, target });
    }
    debug!(current, target, "rewind to version");

    let mut aggregate = ListSetChange::new(ChangeKind::Version, target);
    for tag in set.tags() {
        let list = set.require_list_mut(tag)?;
        if list.version() <= target {
            continue;
        }
        let mut change = ListChange::new(target);
        let touched: Vec<ItemId> = list
            .iter()
            .filter(|item| item.version() > target)
            .map(|item| item.id())
            .collect();
        let mut removed: Vec<ItemId> = Vec::new();
        for id in touched {
            let created_after = list
                .get_item_by_id(id)
                .map(|item| item.original().version() > target)
                .unwrap_or(false);
            if created_after {
                // Created after the target: it never existed at that point
                list.remove_by_id(id);
                change.record_deleted(id);
                removed.push(id);
                continue;
            }
            let item = list.get_item_mut(id).ok_or(Error::UnknownItem { tag, id })?;
            let was_deleted = item.is_deleted();
            while item.version() > target {
                item.pop_history()?;
            }
            match (was_deleted, item.is_deleted()) {
                (true, false) => change.record_restored(id),
                (false, true) => change.record_hidden(id),
                _ => change.record_changed(id),
            }
        }
        list.set_version(target);
        for id in removed {
            set.cleanup_deleted_item(tag, id);
        }
        aggregate.put_list_change(tag, change);
    }
    set.set_version(target);
    set.fire_event(aggregate);
    Ok(())
}

// =============================================================================
// Reset-content / rebase
// =============================================================================

/// Wholesale replacement of a Base set's content from another Base set
///
/// Every list's items, the paired registry and all version counters are
/// replaced; a REFRESH event fires so consumers rebuild. Used for reload.
///
/// # Errors
/// Fails when either set is not a Base set or the source lacks one of the
/// target's lists.
pub fn reset_content(target: &mut VersionedListSet, source: &VersionedListSet) -> Result<()> {
    target.require_type(ListSetType::Base)?;
    source.require_type(ListSetType::Base)?;
    debug!(source_version = source.version(), "reset content");

    for tag in target.tags() {
        let source_list = source.require_list(tag)?;
        let items: Vec<_> = source_list.iter().cloned().collect();
        let version = source_list.version();
        let target_list = target.require_list_mut(tag)?;
        target_list.clear();
        for item in items {
            target_list.add(item)?;
        }
        target_list.set_version(version);
    }
    target.clone_paired_items(source);
    target.set_version(source.version());
    target.fire_event(ListSetChange::new(ChangeKind::Refresh, target.version()));
    Ok(())
}

/// Reconcile a version-0 Base set against a version-0 snapshot of its source
///
/// After loading two snapshots of the same data, rebasing re-expresses the
/// target's divergence from `base` as pending changes:
/// - target items absent from `base` are stamped to version 1 (pending
///   creations);
/// - target items whose values differ have their history rebased so the
///   compared-against state is `base`'s content, and are stamped changed;
/// - `base` items absent from the target are re-inserted as synthetic
///   deleted placeholders (pending deletions).
///
/// Returns whether anything diverged; when it did, the target ends at
/// version 1 and one VERSION event fires.
///
/// # Errors
/// Fails when either set is not a Base set, either is not at version 0,
/// or `base` lacks one of the target's lists.
pub fn rebase_list_set(target: &mut VersionedListSet, base: &VersionedListSet) -> Result<bool> {
    target.require_type(ListSetType::Base)?;
    base.require_type(ListSetType::Base)?;
    if target.version() != 0 {
        return Err(Error::NotAtBaseVersion(target.version()));
    }
    if base.version() != 0 {
        return Err(Error::NotAtBaseVersion(base.version()));
    }
    debug!("rebase list-set");

    let mut aggregate = ListSetChange::new(ChangeKind::Version, 1);
    let mut diverged = false;
    for tag in target.tags() {
        let base_list = base.require_list(tag)?;
        let mut snapshot: BTreeMap<ItemId, ValueSet> = base_list
            .iter()
            .map(|item| (item.id(), item.values().clone()))
            .collect();

        let mut change = ListChange::new(1);
        let target_list = target.require_list_mut(tag)?;
        for id in target_list.ids() {
            let item = target_list
                .get_item_mut(id)
                .ok_or(Error::UnknownItem { tag, id })?;
            match snapshot.remove(&id) {
                None => {
                    // Unknown to the base snapshot: a pending creation
                    item.values_mut().set_version(1);
                    change.record_added(id);
                }
                Some(mut base_values) => {
                    if !item.values().values_equal(&base_values) {
                        base_values.set_version(0);
                        item.set_history(vec![base_values]);
                        item.values_mut().set_version(1);
                        change.record_changed(id);
                    }
                }
            }
        }

        // Items the base snapshot still holds no longer exist in the
        // target: re-insert them as pending deletions.
        for (id, base_values) in snapshot {
            let mut original = base_values.clone();
            original.set_version(0);
            let mut item = target_list.key().new_item(id);
            item.values_mut().copy_from(&base_values);
            item.values_mut().set_deleted(true);
            item.values_mut().set_version(1);
            item.set_history(vec![original]);
            target_list.add(item)?;
            change.record_hidden(id);
        }

        if !change.is_empty() {
            target_list.set_version(1);
            diverged = true;
        }
        aggregate.put_list_change(tag, change);
    }

    target.rebase_paired_items(base);
    if diverged {
        target.set_version(1);
        target.fire_event(aggregate);
    }
    Ok(diverged)
}

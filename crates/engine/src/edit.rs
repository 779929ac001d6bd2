//! Edit manager: a derived, independently-editable working copy
//!
//! An [`EditListSet`] mirrors the non-deleted content of a Base list-set
//! as independent version-0 copies - same ids, equal values, never aliased
//! with the Base items. It subscribes to the Base set's change channel at
//! derivation time and replays queued events inside
//! [`EditListSet::sync`]: REFRESH rebuilds wholesale, VERSION and UPDATE
//! events are applied incrementally.
//!
//! Synchronization is one-directional. The edit side never mutates Base;
//! Base mutating underneath (undo, commit) is propagated, not contested -
//! on conflict the Base values win.

use crate::events::Subscription;
use crate::set::{ListSetType, VersionedListSet};
use std::rc::Rc;
use tracing::debug;
use verset_core::{ChangeKind, ItemId, ListSetChange, ListTag, Result};

/// A derived Edit list-set kept in sync with its Base source
pub struct EditListSet {
    set: VersionedListSet,
    events: Subscription,
}

impl EditListSet {
    /// Derive an Edit list-set from a Base set
    ///
    /// The new set shares the Base set's declared keys and comparators,
    /// holds independent copies of every non-deleted item, and starts
    /// subscribed to the Base set's events.
    ///
    /// # Errors
    /// Fails when `base` is not a Base set.
    pub fn derive(base: &VersionedListSet) -> Result<Self> {
        base.require_type(ListSetType::Base)?;
        let set = base.clone_structure(ListSetType::Edit)?;
        let events = base.subscribe();
        let mut edit = Self { set, events };
        edit.rebuild(base)?;
        debug!("derived edit list-set");
        Ok(edit)
    }

    /// The underlying Edit-typed list-set
    pub fn set(&self) -> &VersionedListSet {
        &self.set
    }

    /// The underlying list-set, mutably
    ///
    /// Edit-side changes live here; they never propagate back to Base.
    pub fn set_mut(&mut self) -> &mut VersionedListSet {
        &mut self.set
    }

    /// Whether source events are queued and unapplied
    pub fn has_pending_events(&self) -> bool {
        self.events.has_pending()
    }

    /// Apply every queued Base event
    ///
    /// # Errors
    /// Propagates lookup failures, which indicate a Base set whose
    /// declared lists changed after derivation.
    pub fn sync(&mut self, base: &VersionedListSet) -> Result<()> {
        let events: Vec<Rc<ListSetChange>> = self.events.drain();
        for event in events {
            match event.kind() {
                ChangeKind::Refresh => self.rebuild(base)?,
                ChangeKind::Version | ChangeKind::Update => self.apply(base, &event)?,
            }
        }
        Ok(())
    }

    /// Full rebuild: clear and copy every non-deleted Base item
    fn rebuild(&mut self, base: &VersionedListSet) -> Result<()> {
        self.set.reset_paired_items();
        for tag in self.set.tags() {
            let base_list = base.require_list(tag)?;
            let ids: Vec<ItemId> = {
                let list = self.set.require_list_mut(tag)?;
                list.clear();
                let mut ids = Vec::new();
                for item in base_list.iter() {
                    if item.is_deleted() {
                        continue;
                    }
                    let mut copy = list.key().new_item(item.id());
                    copy.values_mut().copy_from(item.values());
                    ids.push(copy.id());
                    list.add(copy)?;
                }
                list.set_version(0);
                ids
            };
            for id in ids {
                self.set.resolve_links(tag, id)?;
            }
        }
        self.set.set_version(0);
        Ok(())
    }

    /// Incremental sync from one VERSION or UPDATE change
    fn apply(&mut self, base: &VersionedListSet, event: &ListSetChange) -> Result<()> {
        for (tag, change) in event.list_changes() {
            // Items gone or hidden underneath: drop the edit copy
            for id in change.deleted().iter().chain(change.hidden()) {
                self.remove_copy(tag, *id)?;
            }
            // Items added, changed or restored underneath: copy the base
            // values over whatever the edit side had
            for id in change
                .added()
                .iter()
                .chain(change.changed())
                .chain(change.restored())
            {
                self.refresh_copy(base, tag, *id)?;
            }
        }
        Ok(())
    }

    fn remove_copy(&mut self, tag: ListTag, id: ItemId) -> Result<()> {
        let list = self.set.require_list_mut(tag)?;
        if list.remove_by_id(id).is_some() {
            self.set.cleanup_deleted_item(tag, id);
        }
        Ok(())
    }

    fn refresh_copy(&mut self, base: &VersionedListSet, tag: ListTag, id: ItemId) -> Result<()> {
        let base_item = base.require_list(tag)?.get_item_by_id(id).cloned();
        match base_item {
            // Vanished or deleted before we synced: treat as removal
            None => self.remove_copy(tag, id),
            Some(item) if item.is_deleted() => self.remove_copy(tag, id),
            Some(item) => {
                let list = self.set.require_list_mut(tag)?;
                match list.get_item_mut(id) {
                    Some(copy) => {
                        copy.clear_history();
                        copy.values_mut().copy_from(item.values());
                    }
                    None => {
                        let mut copy = list.key().new_item(id);
                        copy.values_mut().copy_from(item.values());
                        list.add(copy)?;
                    }
                }
                self.set.resolve_links(tag, id)
            }
        }
    }
}

impl std::fmt::Debug for EditListSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditListSet").field("set", &self.set).finish()
    }
}

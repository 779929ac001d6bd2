//! Versioned list-sets: typed collections of versioned lists
//!
//! A [`VersionedListSet`] owns one [`VersionedList`] per declared
//! [`ListKey`], a paired-item registry, and the event channel its derived
//! structures subscribe to. The set type records the set's role:
//!
//! - Base: the authoritative, directly-mutated collection
//! - Edit: a derived, independently-editable working copy
//! - Update: a derived view of pending (uncommitted) changes only
//! - Diff: a one-shot structural comparison of two base snapshots
//!
//! Lists are iterated in **declaration order**. That order is load-bearing:
//! it encodes the dependency direction between item types, and the DELETE
//! commit phase walks it in reverse so referencing items are removed before
//! the items they reference.

use crate::events::{EventChannel, Subscription};
use crate::list::VersionedList;
use crate::pairs::PairedRegistry;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::trace;
use verset_core::{
    Error, ItemId, ListKey, ListSetChange, ListTag, Result, TypedId, Value, VersionedItem,
};

/// Role of a list-set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListSetType {
    /// The authoritative, directly-mutated collection
    Base,
    /// A derived, independently-editable working copy
    Edit,
    /// A derived view of pending changes only
    Update,
    /// A one-shot structural comparison
    Diff,
}

impl ListSetType {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ListSetType::Base => "Base",
            ListSetType::Edit => "Edit",
            ListSetType::Update => "Update",
            ListSetType::Diff => "Diff",
        }
    }
}

impl std::fmt::Display for ListSetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named collection of versioned lists, one per list key
pub struct VersionedListSet {
    set_type: ListSetType,
    version: u64,
    lists: FxHashMap<ListTag, VersionedList>,
    declared: Vec<ListTag>,
    paired: PairedRegistry,
    channel: EventChannel,
}

impl VersionedListSet {
    /// Create an empty list-set of the given type
    pub fn new(set_type: ListSetType) -> Self {
        Self {
            set_type,
            version: 0,
            lists: FxHashMap::default(),
            declared: Vec::new(),
            paired: PairedRegistry::new(),
            channel: EventChannel::new(),
        }
    }

    /// The set's role
    pub fn set_type(&self) -> ListSetType {
        self.set_type
    }

    /// The set's version counter
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Set the set's version counter
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Guard that this set has the required role
    ///
    /// # Errors
    /// Returns [`Error::WrongSetType`] otherwise.
    pub fn require_type(&self, expected: ListSetType) -> Result<()> {
        if self.set_type == expected {
            Ok(())
        } else {
            Err(Error::WrongSetType {
                expected: expected.as_str(),
                actual: self.set_type.as_str(),
            })
        }
    }

    /// Register a new list under a key
    ///
    /// # Errors
    /// Fails when the tag is outside the packing range or already
    /// registered.
    pub fn declare_list(&mut self, key: ListKey) -> Result<()> {
        let tag = key.tag();
        if !tag.is_valid() {
            return Err(Error::TagOutOfRange(tag.as_byte()));
        }
        if self.lists.contains_key(&tag) {
            return Err(Error::DuplicateTag(tag));
        }
        trace!(set = %self.set_type, list = %key, "declare list");
        self.lists.insert(tag, VersionedList::new(key));
        self.declared.push(tag);
        Ok(())
    }

    /// The list registered under a tag
    pub fn get_list(&self, tag: ListTag) -> Option<&VersionedList> {
        self.lists.get(&tag)
    }

    /// The list registered under a tag, mutably
    pub fn get_list_mut(&mut self, tag: ListTag) -> Option<&mut VersionedList> {
        self.lists.get_mut(&tag)
    }

    /// The list registered under a tag, or an error
    ///
    /// # Errors
    /// Returns [`Error::UnknownList`] when the tag is not registered.
    pub fn require_list(&self, tag: ListTag) -> Result<&VersionedList> {
        self.lists.get(&tag).ok_or(Error::UnknownList(tag))
    }

    /// The list registered under a tag mutably, or an error
    ///
    /// # Errors
    /// Returns [`Error::UnknownList`] when the tag is not registered.
    pub fn require_list_mut(&mut self, tag: ListTag) -> Result<&mut VersionedList> {
        self.lists.get_mut(&tag).ok_or(Error::UnknownList(tag))
    }

    /// Registered tags in declaration order
    pub fn tags(&self) -> Vec<ListTag> {
        self.declared.clone()
    }

    /// Registered tags in reverse declaration order
    ///
    /// This is the dependency-respecting order for deletions: item types
    /// declared later may reference types declared earlier, so they are
    /// removed first.
    pub fn tags_rev(&self) -> Vec<ListTag> {
        self.declared.iter().rev().copied().collect()
    }

    /// True iff every registered list is empty
    pub fn is_empty(&self) -> bool {
        self.lists.values().all(VersionedList::is_empty)
    }

    /// Pack a tag and a local id into a composite item id
    ///
    /// # Errors
    /// Fails when the tag is not registered in this set or a component is
    /// out of packing range.
    pub fn build_item_id(&self, tag: ListTag, id: ItemId) -> Result<TypedId> {
        if !self.lists.contains_key(&tag) {
            return Err(Error::UnknownList(tag));
        }
        TypedId::build(tag, id)
    }

    /// Look up an item through its composite id
    pub fn item_by_typed_id(&self, id: TypedId) -> Option<&VersionedItem> {
        self.lists.get(&id.tag())?.get_item_by_id(id.item_id())
    }

    /// Recompute the set version from its constituent lists
    ///
    /// Base and Edit sets carry the maximum of their lists' versions;
    /// Update and Diff sets carry 1 while any pending content exists.
    pub fn recompute_version(&mut self) {
        self.version = match self.set_type {
            ListSetType::Base | ListSetType::Edit => self
                .lists
                .values()
                .map(VersionedList::version)
                .max()
                .unwrap_or(0),
            ListSetType::Update | ListSetType::Diff => u64::from(!self.is_empty()),
        };
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Register a subscriber on this set's change channel
    pub fn subscribe(&self) -> Subscription {
        self.channel.subscribe()
    }

    /// Deliver a change to subscribers, suppressing no-op events
    ///
    /// A VERSION or UPDATE event that carries no item-level content is not
    /// delivered; REFRESH events always are.
    pub fn fire_event(&self, change: ListSetChange) {
        if change.is_empty() {
            trace!(set = %self.set_type, kind = %change.kind(), "suppressing no-op event");
            return;
        }
        self.channel.publish(change);
    }

    // =========================================================================
    // Paired-item registry
    // =========================================================================

    /// The paired-item registry
    pub fn paired(&self) -> &PairedRegistry {
        &self.paired
    }

    /// The paired-item registry, mutably
    pub fn paired_mut(&mut self) -> &mut PairedRegistry {
        &mut self.paired
    }

    /// Drop every paired-registry entry referencing a removed item
    pub fn cleanup_deleted_item(&mut self, tag: ListTag, id: ItemId) {
        if let Ok(typed) = TypedId::build(tag, id) {
            self.paired.cleanup_item(typed);
        }
    }

    /// Drop every paired-registry entry (full reload)
    pub fn reset_paired_items(&mut self) {
        self.paired.reset();
    }

    /// Replace the paired registry with another set's
    pub fn clone_paired_items(&mut self, source: &VersionedListSet) {
        self.paired.clone_from_registry(&source.paired);
    }

    /// Merge another set's paired registry after a rebase
    pub fn rebase_paired_items(&mut self, source: &VersionedListSet) {
        self.paired.rebase_from(&source.paired);
    }

    /// Resolve an item's reference fields into this set's registry
    ///
    /// Paired-link values are registered so later reads resolve in O(1).
    /// Plain links need no registration: they already carry the composite
    /// id and resolve through [`VersionedListSet::item_by_typed_id`].
    pub fn resolve_links(&mut self, tag: ListTag, id: ItemId) -> Result<()> {
        let item = self
            .require_list(tag)?
            .get_item_by_id(id)
            .ok_or(Error::UnknownItem { tag, id })?;
        let paired_ids: Vec<_> = item
            .values()
            .fields()
            .filter_map(|(_, value)| match value {
                Value::Paired(paired) => Some(*paired),
                _ => None,
            })
            .collect();
        for paired in paired_ids {
            self.paired.resolve(paired);
        }
        Ok(())
    }

    // =========================================================================
    // Derivation support
    // =========================================================================

    /// Create an empty set of another type with the same declared keys
    ///
    /// Comparators are shared; items are not copied.
    ///
    /// # Errors
    /// Propagates declaration failures, which cannot occur for a
    /// well-formed source set.
    pub fn clone_structure(&self, set_type: ListSetType) -> Result<Self> {
        let mut derived = Self::new(set_type);
        for tag in &self.declared {
            let list = &self.lists[tag];
            derived.declare_list(list.key().clone())?;
            derived
                .require_list_mut(*tag)?
                .set_comparator(list.comparator().cloned());
        }
        Ok(derived)
    }
}

impl std::fmt::Debug for VersionedListSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionedListSet")
            .field("set_type", &self.set_type)
            .field("version", &self.version)
            .field("lists", &self.declared.len())
            .field("paired", &self.paired.len())
            .finish()
    }
}

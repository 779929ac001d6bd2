//! Versioned lists: ordered, id-indexed collections of one item type
//!
//! A [`VersionedList`] owns the items of one [`ListKey`] within a list-set.
//! Items are indexed by id for O(1) lookup and carried in an explicit
//! order sequence: insertion order by default, or whatever the assignable
//! comparator last produced. The list has its own version counter - the
//! version of the most recent transition that touched it.

use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::rc::Rc;
use verset_core::{Error, ItemId, ListKey, Result, VersionedItem, MAX_ITEM_ID};

/// Assignable ordering for the items of one list
pub type ItemComparator = Rc<dyn Fn(&VersionedItem, &VersionedItem) -> Ordering>;

/// An ordered, id-indexed collection of versioned items of one type
pub struct VersionedList {
    key: ListKey,
    items: FxHashMap<ItemId, VersionedItem>,
    order: Vec<ItemId>,
    comparator: Option<ItemComparator>,
    version: u64,
    next_id: u32,
}

impl VersionedList {
    /// Create an empty list for the given key
    pub fn new(key: ListKey) -> Self {
        Self {
            key,
            items: FxHashMap::default(),
            order: Vec::new(),
            comparator: None,
            version: 0,
            next_id: 1,
        }
    }

    /// The list's type descriptor
    pub fn key(&self) -> &ListKey {
        &self.key
    }

    /// The list's version counter
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Set the list's version counter
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// The assigned comparator, when one is set
    pub fn comparator(&self) -> Option<&ItemComparator> {
        self.comparator.as_ref()
    }

    /// Assign or clear the comparator
    ///
    /// Assigning does not re-sort; call [`VersionedList::sort`].
    pub fn set_comparator(&mut self, comparator: Option<ItemComparator>) {
        self.comparator = comparator;
    }

    /// Construct a fresh item of the list's type without adding it
    ///
    /// With no id supplied the next unused id is allocated; a supplied id
    /// must not be in use.
    ///
    /// # Errors
    /// Returns an error on a duplicate or out-of-range explicit id, or when
    /// the id space is exhausted.
    pub fn new_list_item(&mut self, id: Option<ItemId>) -> Result<VersionedItem> {
        let id = match id {
            Some(id) => {
                if !id.is_valid() {
                    return Err(Error::IdOutOfRange(id.as_u32()));
                }
                if self.items.contains_key(&id) {
                    return Err(Error::DuplicateItemId {
                        tag: self.key.tag(),
                        id,
                    });
                }
                id
            }
            None => {
                while self.items.contains_key(&ItemId::new(self.next_id)) {
                    self.next_id += 1;
                }
                if self.next_id > MAX_ITEM_ID {
                    return Err(Error::IdSpaceExhausted(self.key.tag()));
                }
                ItemId::new(self.next_id)
            }
        };
        Ok(self.key.new_item(id))
    }

    /// Add an item to the list
    ///
    /// # Errors
    /// Returns an error if the item's id is already in use.
    pub fn add(&mut self, item: VersionedItem) -> Result<()> {
        debug_assert_eq!(item.tag(), self.key.tag());
        let id = item.id();
        if self.items.contains_key(&id) {
            return Err(Error::DuplicateItemId {
                tag: self.key.tag(),
                id,
            });
        }
        if id.as_u32() >= self.next_id {
            self.next_id = id.as_u32() + 1;
        }
        self.items.insert(id, item);
        self.order.push(id);
        Ok(())
    }

    /// Remove an item by id, returning it when present
    pub fn remove_by_id(&mut self, id: ItemId) -> Option<VersionedItem> {
        let removed = self.items.remove(&id)?;
        self.order.retain(|entry| *entry != id);
        Some(removed)
    }

    /// Look up an item by id
    pub fn get_item_by_id(&self, id: ItemId) -> Option<&VersionedItem> {
        self.items.get(&id)
    }

    /// Look up an item mutably by id
    pub fn get_item_mut(&mut self, id: ItemId) -> Option<&mut VersionedItem> {
        self.items.get_mut(&id)
    }

    /// Whether an item with the id is present
    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list holds no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate items in list order
    pub fn iter(&self) -> impl Iterator<Item = &VersionedItem> {
        self.order.iter().map(|id| &self.items[id])
    }

    /// Iterate items in reverse list order
    pub fn iter_rev(&self) -> impl Iterator<Item = &VersionedItem> {
        self.order.iter().rev().map(|id| &self.items[id])
    }

    /// Item ids in list order
    pub fn ids(&self) -> Vec<ItemId> {
        self.order.clone()
    }

    /// Re-sort the order sequence with the assigned comparator
    ///
    /// With no comparator assigned the insertion order stands.
    pub fn sort(&mut self) {
        if let Some(comparator) = self.comparator.clone() {
            let items = &self.items;
            self.order.sort_by(|a, b| comparator(&items[a], &items[b]));
        }
    }

    /// Drop every item, leaving key, comparator and version in place
    pub fn clear(&mut self) {
        self.items.clear();
        self.order.clear();
        self.next_id = 1;
    }
}

impl std::fmt::Debug for VersionedList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionedList")
            .field("key", &self.key.to_string())
            .field("len", &self.items.len())
            .field("version", &self.version)
            .finish()
    }
}

//! List keys: type descriptors for item lists
//!
//! A [`ListKey`] describes one item type: its packing tag, display name,
//! optional uniqueness namespace, the fields subject to unique/singular
//! enforcement, and a factory that constructs a blank item stamped with
//! this key. Containers are keyed by these values - there is no reflective
//! type lookup anywhere in the engine.

use crate::id::{ItemId, ListTag};
use crate::item::VersionedItem;
use crate::value::FieldId;
use std::fmt;

/// Factory signature for constructing a blank item of a list type
pub type ItemFactory = fn(&ListKey, ItemId) -> VersionedItem;

fn blank_item(key: &ListKey, id: ItemId) -> VersionedItem {
    VersionedItem::new(id, key.tag())
}

/// Immutable type descriptor for one list of items
///
/// Equality and hashing are by tag alone; two keys with the same tag
/// describe the same list type within a list-set.
#[derive(Debug, Clone)]
pub struct ListKey {
    tag: ListTag,
    name: String,
    name_space: Option<String>,
    name_field: Option<FieldId>,
    unique_fields: Vec<FieldId>,
    singular_fields: Vec<FieldId>,
    factory: ItemFactory,
}

impl ListKey {
    /// Create a key with the default (blank item) factory
    pub fn new(tag: ListTag, name: impl Into<String>) -> Self {
        Self {
            tag,
            name: name.into(),
            name_space: None,
            name_field: None,
            unique_fields: Vec::new(),
            singular_fields: Vec::new(),
            factory: blank_item,
        }
    }

    /// Set the uniqueness namespace this type shares names within
    pub fn with_name_space(mut self, name_space: impl Into<String>) -> Self {
        self.name_space = Some(name_space.into());
        self
    }

    /// Designate the field carrying the item's display name
    pub fn with_name_field(mut self, field: FieldId) -> Self {
        self.name_field = Some(field);
        self
    }

    /// Designate a field requiring unique values across the list
    pub fn with_unique_field(mut self, field: FieldId) -> Self {
        self.unique_fields.push(field);
        self
    }

    /// Designate a field of which at most one item may hold a set value
    pub fn with_singular_field(mut self, field: FieldId) -> Self {
        self.singular_fields.push(field);
        self
    }

    /// Replace the item factory
    pub fn with_factory(mut self, factory: ItemFactory) -> Self {
        self.factory = factory;
        self
    }

    /// The packing tag
    pub fn tag(&self) -> ListTag {
        self.tag
    }

    /// The display name of this item type
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The uniqueness namespace, when one is declared
    ///
    /// Types sharing a namespace share one name-uniqueness domain; a type
    /// without a namespace is scoped by its own name.
    pub fn name_space(&self) -> Option<&str> {
        self.name_space.as_deref()
    }

    /// The field carrying the item's display name, when one is declared
    pub fn name_field(&self) -> Option<FieldId> {
        self.name_field
    }

    /// Fields requiring unique values
    pub fn unique_fields(&self) -> &[FieldId] {
        &self.unique_fields
    }

    /// Fields of which at most one item may hold a set value
    pub fn singular_fields(&self) -> &[FieldId] {
        &self.singular_fields
    }

    /// Construct a blank item of this type via the factory
    pub fn new_item(&self, id: ItemId) -> VersionedItem {
        (self.factory)(self, id)
    }
}

impl PartialEq for ListKey {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
    }
}

impl Eq for ListKey {}

impl std::hash::Hash for ListKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.tag.hash(state);
    }
}

impl fmt::Display for ListKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.tag)
    }
}

//! Packed identifier types
//!
//! This module defines the identifier scheme used across the engine:
//! - ListTag: type discriminator for one list of items
//! - ItemId: local id, unique within its owning list
//! - TypedId: a ListTag and an ItemId packed into one u32
//! - PairedId: two TypedIds packed into one u64
//!
//! ## Packing Layout
//!
//! These layouts are part of the public contract and MUST NOT change:
//!
//! ```text
//! TypedId  (u32): [ tag: 8 bits ][ item id: 24 bits ]
//! PairedId (u64): [ secondary TypedId: 32 bits ][ primary TypedId: 32 bits ]
//! ```
//!
//! Tag 0 and item id 0 are reserved and invalid, which keeps a zeroed
//! identifier recognizably bogus.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of bits a local item id occupies inside a TypedId
pub const ITEM_ID_BITS: u32 = 24;

/// Highest valid local item id
pub const MAX_ITEM_ID: u32 = (1 << ITEM_ID_BITS) - 1;

/// Type discriminator for one list of items
///
/// A ListTag identifies an item type within a list-set. Tags are small
/// integers so they can be packed into the high bits of a [`TypedId`];
/// the valid range is 1..=255, with 0 reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListTag(u8);

impl ListTag {
    /// Create a new tag from its byte value
    pub const fn new(tag: u8) -> Self {
        Self(tag)
    }

    /// The raw byte value
    pub const fn as_byte(&self) -> u8 {
        self.0
    }

    /// Whether the tag lies in the valid packing range (1..=255)
    pub const fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for ListTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Local item id, unique within its owning list
///
/// Ids are allocated by the owning list (next unused id) or supplied
/// explicitly by the caller; the valid range is 1..=[`MAX_ITEM_ID`] so an
/// id always fits the low 24 bits of a [`TypedId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(u32);

impl ItemId {
    /// Create a new item id from its raw value
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// The raw id value
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Whether the id lies in the valid packing range
    pub const fn is_valid(&self) -> bool {
        self.0 != 0 && self.0 <= MAX_ITEM_ID
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A ListTag and an ItemId packed into a single u32
///
/// TypedIds identify an item across lists: the tag selects the list, the
/// low bits select the item. Link fields store TypedIds rather than
/// references, and resolve them through the owning list-set on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypedId(u32);

impl TypedId {
    /// Pack a tag and a local id into a TypedId
    ///
    /// # Errors
    /// Returns an error if the tag or the id is outside its packing range.
    pub fn build(tag: ListTag, id: ItemId) -> Result<Self> {
        if !tag.is_valid() {
            return Err(Error::TagOutOfRange(tag.as_byte()));
        }
        if !id.is_valid() {
            return Err(Error::IdOutOfRange(id.as_u32()));
        }
        Ok(Self(((tag.as_byte() as u32) << ITEM_ID_BITS) | id.as_u32()))
    }

    /// Reconstruct a TypedId from its raw packed value
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw packed value
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// The tag packed into the high bits
    pub const fn tag(&self) -> ListTag {
        ListTag::new((self.0 >> ITEM_ID_BITS) as u8)
    }

    /// The local id packed into the low bits
    pub const fn item_id(&self) -> ItemId {
        ItemId::new(self.0 & MAX_ITEM_ID)
    }
}

impl fmt::Display for TypedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tag(), self.item_id())
    }
}

/// Two TypedIds packed into a single u64
///
/// A PairedId keys a composite cross-reference over two items: the
/// secondary item occupies the high 32 bits, the primary item the low 32.
/// The owning list-set's paired registry maps PairedIds to resolved
/// references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairedId(u64);

impl PairedId {
    /// Pack a primary and a secondary TypedId into a PairedId
    pub const fn build(primary: TypedId, secondary: TypedId) -> Self {
        Self(((secondary.as_u32() as u64) << 32) | primary.as_u32() as u64)
    }

    /// Reconstruct a PairedId from its raw packed value
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw packed value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// The primary item (low 32 bits)
    pub const fn primary(&self) -> TypedId {
        TypedId::from_raw(self.0 as u32)
    }

    /// The secondary item (high 32 bits)
    pub const fn secondary(&self) -> TypedId {
        TypedId::from_raw((self.0 >> 32) as u32)
    }
}

impl fmt::Display for PairedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.primary(), self.secondary())
    }
}

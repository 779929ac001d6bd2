//! Core types for the verset versioned list-set engine
//!
//! This crate defines the foundational types used throughout the system:
//! - ListTag / ItemId / TypedId / PairedId: packed identifier types
//! - FieldId / Value / ValueSet: the field-value model items are made of
//! - VersionedItem / ItemState: an item with history and a derived state
//! - ListKey: type descriptor for one list of items
//! - ListChange / ListSetChange: per-version-transition diff records
//! - Error: error type hierarchy
//!
//! The collections that hold these types (versioned lists, list-sets and
//! their managers) live in `verset-engine`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod change;
pub mod error;
pub mod id;
pub mod item;
pub mod key;
pub mod value;

// Re-export commonly used types at the crate root
pub use change::{ChangeKind, ListChange, ListSetChange};
pub use error::{Error, Result};
pub use id::{ItemId, ListTag, PairedId, TypedId, MAX_ITEM_ID};
pub use item::{ItemState, VersionedItem};
pub use key::ListKey;
pub use value::{FieldId, Value, ValueKey, ValueSet};

/// Version counter used by value-sets, lists and list-sets.
///
/// Version 0 is the committed baseline; every uncommitted change span is
/// stamped with a version greater than the one before it.
pub type Version = u64;

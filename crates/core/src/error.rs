//! Error types for the versioned list-set engine
//!
//! Every failure in this crate is a programmer-contract violation rather
//! than a recoverable runtime condition: there is no I/O, so a returned
//! error means the caller broke an invariant (duplicate registration,
//! rewinding forwards, operating on the wrong list-set type, ...).
//! Errors propagate synchronously and are never retried.

use crate::id::{ItemId, ListTag};
use thiserror::Error;

/// Result type alias for list-set operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the versioned list-set engine
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A list tag was registered twice in the same list-set
    #[error("List tag already registered: {0}")]
    DuplicateTag(ListTag),

    /// A list tag falls outside the valid packing range
    #[error("List tag out of packing range: {0}")]
    TagOutOfRange(u8),

    /// No list is registered under the tag
    #[error("No list registered for tag: {0}")]
    UnknownList(ListTag),

    /// An item id was supplied that is already in use within its list
    #[error("Duplicate item id {id} in list {tag}")]
    DuplicateItemId {
        /// Tag of the owning list
        tag: ListTag,
        /// The conflicting item id
        id: ItemId,
    },

    /// An item id falls outside the valid packing range
    #[error("Item id out of packing range: {0}")]
    IdOutOfRange(u32),

    /// The item id space for a list is exhausted
    #[error("Item id space exhausted for list {0}")]
    IdSpaceExhausted(ListTag),

    /// No item exists under the id
    #[error("No item {id} in list {tag}")]
    UnknownItem {
        /// Tag of the owning list
        tag: ListTag,
        /// The missing item id
        id: ItemId,
    },

    /// A rewind was requested to a version above the current one
    #[error("Rewind target {target} is above current version {current}")]
    VersionAhead {
        /// Current list-set version
        current: u64,
        /// Requested target version
        target: u64,
    },

    /// An operation was applied to a list-set of the wrong type
    #[error("Wrong list-set type: expected {expected}, got {actual}")]
    WrongSetType {
        /// The required list-set type name
        expected: &'static str,
        /// The actual list-set type name
        actual: &'static str,
    },

    /// An operation required a fully committed (version 0) list-set
    #[error("List-set must be at version 0, currently at {0}")]
    NotAtBaseVersion(u64),

    /// An undo was requested on a list-set with no changes to undo
    #[error("No changes to undo")]
    NothingToUndo,

    /// An item history operation had no history to operate on
    #[error("No history for item {id} in list {tag}")]
    NoHistory {
        /// Tag of the owning list
        tag: ListTag,
        /// The item id
        id: ItemId,
    },

    /// A strict uniqueness index rejected a duplicate value insert
    #[error("Duplicate value for unique field: {0}")]
    DuplicateValue(String),

    /// A strict name index rejected a duplicate name insert
    #[error("Duplicate name: {0}")]
    DuplicateName(String),
}

//! Versioned lists, list-sets and managers
//!
//! This crate implements the collections of the verset engine and the
//! managers that operate on them:
//! - VersionedList: an ordered, id-indexed collection of one item type
//! - VersionedListSet: a typed collection of lists with a paired-item
//!   registry and an event channel
//! - base: refresh / reset / undo / rewind / rebase plus the
//!   BaseTransaction mutation scope
//! - diff: structural comparison of two base snapshots
//! - edit: a derived, independently-editable working copy
//! - update: the pending-change view and phased batch commit
//! - maps: name / unique-value / singular uniqueness indices
//!
//! The model is single-threaded and synchronous throughout: every derived
//! structure holds a [`Subscription`] to its source's event channel and
//! applies queued changes inside its `sync` entry point.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod base;
pub mod diff;
pub mod edit;
pub mod events;
pub mod list;
pub mod maps;
pub mod pairs;
pub mod set;
pub mod update;

pub use base::BaseTransaction;
pub use edit::EditListSet;
pub use events::{EventChannel, Subscription};
pub use list::{ItemComparator, VersionedList};
pub use maps::{MapMode, NameMap, SingularMap, UniqueValueMap};
pub use pairs::{PairedRef, PairedRegistry};
pub use set::{ListSetType, VersionedListSet};
pub use update::{UpdateListSet, UpdatePhase};

//! Verset - a versioned list-set engine
//!
//! Verset is an in-memory optimistic-concurrency object model: it tracks
//! per-item edit history, derives synchronized views of a dataset (an
//! editable copy, a pending-changes copy, a structural diff), supports
//! multi-step undo/rewind, and commits pending changes back into the
//! authoritative collection in dependency-respecting phases.
//!
//! # Quick Start
//!
//! ```
//! use verset::{
//!     base::BaseTransaction, FieldId, ListKey, ListSetType, ListTag, Value,
//!     VersionedListSet,
//! };
//!
//! const ACCOUNT: ListTag = ListTag::new(1);
//! const NAME: FieldId = FieldId::new(1);
//!
//! # fn main() -> verset::Result<()> {
//! // Declare a base list-set with one list type
//! let mut base = VersionedListSet::new(ListSetType::Base);
//! base.declare_list(ListKey::new(ACCOUNT, "Account"))?;
//!
//! // Mutate it through a versioned transaction
//! let mut txn = BaseTransaction::begin(&mut base)?;
//! let id = txn.create_item(ACCOUNT)?;
//! txn.amend_item(ACCOUNT, id, |values| {
//!     values.set_field(NAME, Value::String("Cash".into()));
//! })?;
//! txn.commit();
//! assert_eq!(base.version(), 1);
//!
//! // Undo it again
//! verset::base::undo_last_change(&mut base)?;
//! assert!(base.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! The `verset-core` crate holds the pure data model (ids, values,
//! versioned items, list keys, change records); `verset-engine` holds the
//! collections and managers. Both are re-exported here.

// Re-export the public API of the member crates
pub use verset_core::*;
pub use verset_engine::*;

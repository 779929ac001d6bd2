//! Paired-item registry: resolved composite cross-references
//!
//! Some fields reference a *pair* of items rather than a single link; the
//! value is a [`PairedId`] packing both constituent [`TypedId`]s. The
//! owning list-set keeps one [`PairedRegistry`] mapping each paired id to
//! its resolved [`PairedRef`], so that reads resolve in O(1) without
//! holding cross-set references.
//!
//! Registry entries never own items. When an item is removed, every entry
//! referencing its id must be dropped via [`PairedRegistry::cleanup_item`]
//! to prevent stale cross-references.

use rustc_hash::FxHashMap;
use verset_core::{PairedId, TypedId};

/// A resolved composite cross-reference over two items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairedRef {
    id: PairedId,
    primary: TypedId,
    secondary: TypedId,
}

impl PairedRef {
    /// Resolve a paired id into its constituents
    pub fn new(id: PairedId) -> Self {
        Self {
            id,
            primary: id.primary(),
            secondary: id.secondary(),
        }
    }

    /// The composite identifier
    pub fn id(&self) -> PairedId {
        self.id
    }

    /// The primary constituent item
    pub fn primary(&self) -> TypedId {
        self.primary
    }

    /// The secondary constituent item
    pub fn secondary(&self) -> TypedId {
        self.secondary
    }
}

/// Registry of resolved paired references for one list-set
#[derive(Debug, Clone, Default)]
pub struct PairedRegistry {
    refs: FxHashMap<PairedId, PairedRef>,
}

impl PairedRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a paired id, registering it on first sight
    pub fn resolve(&mut self, id: PairedId) -> PairedRef {
        *self.refs.entry(id).or_insert_with(|| PairedRef::new(id))
    }

    /// Look up an already-resolved reference
    pub fn lookup(&self, id: PairedId) -> Option<&PairedRef> {
        self.refs.get(&id)
    }

    /// Number of registered references
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    /// Whether no references are registered
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Drop every entry referencing the given item
    ///
    /// Called when an item is removed from its list, so no registry entry
    /// outlives either of its constituents.
    pub fn cleanup_item(&mut self, item: TypedId) {
        self.refs
            .retain(|_, entry| entry.primary() != item && entry.secondary() != item);
    }

    /// Drop every entry (full reload)
    pub fn reset(&mut self) {
        self.refs.clear();
    }

    /// Replace this registry's content with another's
    pub fn clone_from_registry(&mut self, source: &PairedRegistry) {
        self.refs = source.refs.clone();
    }

    /// Merge entries from a source registry after a rebase
    ///
    /// Iterates the source registry's entries and registers those this
    /// registry does not know yet; existing entries are left untouched.
    pub fn rebase_from(&mut self, source: &PairedRegistry) {
        for (id, entry) in &source.refs {
            self.refs.entry(*id).or_insert(*entry);
        }
    }
}

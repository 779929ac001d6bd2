//! Uniqueness indices: name, unique-value and singular maps
//!
//! Auxiliary lookup structures enforcing business-key uniqueness over one
//! list-set. Each index is scoped to exactly one list-set instance - never
//! process-wide - and is kept current through the same change events the
//! other derived structures consume: REFRESH rebuilds by replaying all
//! items; in [`MapMode::Session`] VERSION and UPDATE events replay
//! incrementally.
//!
//! A session index additionally keeps a multiplicity counter during bulk
//! load so `is_valid_*` can detect load-time duplicates (valid iff the
//! count is exactly 1). A strict index errors on a duplicate insert
//! instead.
//!
//! The expected, non-exceptional failure mode is a uniqueness conflict
//! queried in advance: `is_valid_*` / `is_available_*` return `false`
//! rather than erroring, letting validation code pre-empt a contract
//! violation before attempting the mutation.

use crate::events::Subscription;
use crate::set::VersionedListSet;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;
use verset_core::{
    ChangeKind, Error, FieldId, ItemId, ListKey, ListTag, Result, TypedId, Value, ValueKey,
    VersionedItem,
};

/// Currency mode of a uniqueness index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapMode {
    /// Bulk-load tolerant: duplicates are counted, queried via `is_valid_*`,
    /// and VERSION events replay incrementally
    Session,
    /// Duplicate inserts error immediately; only REFRESH rebuilds
    Strict,
}

fn scope_of(key: &ListKey) -> String {
    key.name_space().unwrap_or_else(|| key.name()).to_string()
}

// =============================================================================
// NameMap
// =============================================================================

/// Index of display names, scoped by uniqueness namespace
///
/// List types sharing a namespace share one name domain; a type without a
/// namespace is its own domain.
pub struct NameMap {
    mode: MapMode,
    names: FxHashMap<(String, String), TypedId>,
    counts: FxHashMap<(String, String), u32>,
    by_item: FxHashMap<TypedId, (String, String)>,
    events: Subscription,
}

impl NameMap {
    /// Derive a name index over a list-set
    ///
    /// # Errors
    /// In strict mode, fails on a duplicate name during the initial build.
    pub fn derive(set: &VersionedListSet, mode: MapMode) -> Result<Self> {
        let events = set.subscribe();
        let mut map = Self {
            mode,
            names: FxHashMap::default(),
            counts: FxHashMap::default(),
            by_item: FxHashMap::default(),
            events,
        };
        map.rebuild(set)?;
        debug!(?mode, "derived name map");
        Ok(map)
    }

    fn rebuild(&mut self, set: &VersionedListSet) -> Result<()> {
        self.names.clear();
        self.counts.clear();
        self.by_item.clear();
        for tag in set.tags() {
            let list = set.require_list(tag)?;
            for item in list.iter() {
                self.insert_item(list.key(), item)?;
            }
        }
        Ok(())
    }

    fn name_of(key: &ListKey, item: &VersionedItem) -> Option<String> {
        let field = key.name_field()?;
        if item.is_deleted() {
            return None;
        }
        item.values()
            .field(field)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn insert_item(&mut self, key: &ListKey, item: &VersionedItem) -> Result<()> {
        let Some(name) = Self::name_of(key, item) else {
            return Ok(());
        };
        let typed = TypedId::build(key.tag(), item.id())?;
        let entry = (scope_of(key), name);
        let count = self.counts.entry(entry.clone()).or_insert(0);
        *count += 1;
        if *count > 1 && self.mode == MapMode::Strict {
            return Err(Error::DuplicateName(entry.1));
        }
        self.names.entry(entry.clone()).or_insert(typed);
        self.by_item.insert(typed, entry);
        Ok(())
    }

    fn remove_item(&mut self, tag: ListTag, id: ItemId) -> Result<()> {
        let typed = TypedId::build(tag, id)?;
        if let Some(entry) = self.by_item.remove(&typed) {
            if let Some(count) = self.counts.get_mut(&entry) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    self.counts.remove(&entry);
                }
            }
            if self.names.get(&entry) == Some(&typed) {
                self.names.remove(&entry);
            }
        }
        Ok(())
    }

    /// Apply every queued change event
    ///
    /// # Errors
    /// In strict mode, fails on a duplicate name during a rebuild.
    pub fn sync(&mut self, set: &VersionedListSet) -> Result<()> {
        let events = self.events.drain();
        for event in events {
            match event.kind() {
                ChangeKind::Refresh => self.rebuild(set)?,
                ChangeKind::Version | ChangeKind::Update => {
                    if self.mode != MapMode::Session {
                        continue;
                    }
                    for (tag, change) in event.list_changes() {
                        let list = set.require_list(tag)?;
                        for id in change.touched() {
                            self.remove_item(tag, id)?;
                            if let Some(item) = list.get_item_by_id(id) {
                                self.insert_item(list.key(), item)?;
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Whether the item's own name is held exactly once
    ///
    /// Detects load-time duplicates: with two items loaded under one name,
    /// both report invalid.
    pub fn is_valid_name(&self, key: &ListKey, item: &VersionedItem) -> bool {
        match Self::name_of(key, item) {
            Some(name) => {
                let entry = (scope_of(key), name);
                self.counts.get(&entry).copied().unwrap_or(0) == 1
            }
            None => false,
        }
    }

    /// Whether a candidate name could be taken by the item
    ///
    /// True when the candidate is the item's own current name (a no-op
    /// rename) or nobody holds it.
    pub fn is_available_name(&self, key: &ListKey, item: &VersionedItem, candidate: &str) -> bool {
        if Self::name_of(key, item).as_deref() == Some(candidate) {
            return true;
        }
        !self
            .names
            .contains_key(&(scope_of(key), candidate.to_string()))
    }

    /// The item holding a name, when exactly known
    pub fn item_for_name(&self, key: &ListKey, name: &str) -> Option<TypedId> {
        self.names
            .get(&(scope_of(key), name.to_string()))
            .copied()
    }

    /// Generate an unused name from a base
    ///
    /// Returns the base itself when free, otherwise the base with the
    /// smallest free counter appended.
    pub fn unique_name(&self, key: &ListKey, base: &str) -> String {
        let scope = scope_of(key);
        if !self.names.contains_key(&(scope.clone(), base.to_string())) {
            return base.to_string();
        }
        let mut counter = 1u32;
        loop {
            let candidate = format!("{base}{counter}");
            if !self.names.contains_key(&(scope.clone(), candidate.clone())) {
                return candidate;
            }
            counter += 1;
        }
    }
}

// =============================================================================
// UniqueValueMap
// =============================================================================

/// Index of designated unique-field values
#[derive(Debug)]
pub struct UniqueValueMap {
    mode: MapMode,
    values: FxHashMap<(ListTag, FieldId, ValueKey), TypedId>,
    counts: FxHashMap<(ListTag, FieldId, ValueKey), u32>,
    by_item: FxHashMap<(TypedId, FieldId), ValueKey>,
    events: Subscription,
}

impl UniqueValueMap {
    /// Derive a unique-value index over a list-set
    ///
    /// Every field a list key designates unique is indexed.
    ///
    /// # Errors
    /// In strict mode, fails on a duplicate value during the initial
    /// build.
    pub fn derive(set: &VersionedListSet, mode: MapMode) -> Result<Self> {
        let events = set.subscribe();
        let mut map = Self {
            mode,
            values: FxHashMap::default(),
            counts: FxHashMap::default(),
            by_item: FxHashMap::default(),
            events,
        };
        map.rebuild(set)?;
        debug!(?mode, "derived unique-value map");
        Ok(map)
    }

    fn rebuild(&mut self, set: &VersionedListSet) -> Result<()> {
        self.values.clear();
        self.counts.clear();
        self.by_item.clear();
        for tag in set.tags() {
            let list = set.require_list(tag)?;
            for item in list.iter() {
                self.insert_item(list.key(), item)?;
            }
        }
        Ok(())
    }

    fn insert_item(&mut self, key: &ListKey, item: &VersionedItem) -> Result<()> {
        if item.is_deleted() {
            return Ok(());
        }
        let typed = TypedId::build(key.tag(), item.id())?;
        for field in key.unique_fields() {
            let Some(value) = item.values().field(*field) else {
                continue;
            };
            let value_key = value.lookup_key();
            let entry = (key.tag(), *field, value_key.clone());
            let count = self.counts.entry(entry.clone()).or_insert(0);
            *count += 1;
            if *count > 1 && self.mode == MapMode::Strict {
                return Err(Error::DuplicateValue(format!(
                    "{} {field}",
                    key.name()
                )));
            }
            self.values.entry(entry).or_insert(typed);
            self.by_item.insert((typed, *field), value_key);
        }
        Ok(())
    }

    fn remove_item(&mut self, key: &ListKey, id: ItemId) -> Result<()> {
        let typed = TypedId::build(key.tag(), id)?;
        for field in key.unique_fields() {
            if let Some(value_key) = self.by_item.remove(&(typed, *field)) {
                let entry = (key.tag(), *field, value_key);
                if let Some(count) = self.counts.get_mut(&entry) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        self.counts.remove(&entry);
                    }
                }
                if self.values.get(&entry) == Some(&typed) {
                    self.values.remove(&entry);
                }
            }
        }
        Ok(())
    }

    /// Apply every queued change event
    ///
    /// # Errors
    /// In strict mode, fails on a duplicate value during a rebuild.
    pub fn sync(&mut self, set: &VersionedListSet) -> Result<()> {
        let events = self.events.drain();
        for event in events {
            match event.kind() {
                ChangeKind::Refresh => self.rebuild(set)?,
                ChangeKind::Version | ChangeKind::Update => {
                    if self.mode != MapMode::Session {
                        continue;
                    }
                    for (tag, change) in event.list_changes() {
                        let list = set.require_list(tag)?;
                        for id in change.touched() {
                            self.remove_item(list.key(), id)?;
                            if let Some(item) = list.get_item_by_id(id) {
                                self.insert_item(list.key(), item)?;
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Whether the item's own value for a field is held exactly once
    pub fn is_valid_value(&self, key: &ListKey, item: &VersionedItem, field: FieldId) -> bool {
        match item.values().field(field) {
            Some(value) => {
                let entry = (key.tag(), field, value.lookup_key());
                self.counts.get(&entry).copied().unwrap_or(0) == 1
            }
            None => false,
        }
    }

    /// Whether a candidate value could be taken by the item
    pub fn is_available_value(
        &self,
        key: &ListKey,
        item: &VersionedItem,
        field: FieldId,
        candidate: &Value,
    ) -> bool {
        if item.values().field(field) == Some(candidate) {
            return true;
        }
        !self
            .values
            .contains_key(&(key.tag(), field, candidate.lookup_key()))
    }

    /// The item holding a value, when exactly known
    pub fn item_for_value(&self, tag: ListTag, field: FieldId, value: &Value) -> Option<TypedId> {
        self.values
            .get(&(tag, field, value.lookup_key()))
            .copied()
    }

    /// Generate an unused integer value for a field
    pub fn unique_value(&self, tag: ListTag, field: FieldId) -> Value {
        let mut candidate = 1i64;
        loop {
            let value = Value::Int(candidate);
            if !self
                .values
                .contains_key(&(tag, field, value.lookup_key()))
            {
                return value;
            }
            candidate += 1;
        }
    }
}

// =============================================================================
// SingularMap
// =============================================================================

/// Index of singular flags: at most one item per field may hold `true`
pub struct SingularMap {
    mode: MapMode,
    holders: FxHashMap<(ListTag, FieldId), TypedId>,
    counts: FxHashMap<(ListTag, FieldId), u32>,
    held: FxHashSet<(TypedId, FieldId)>,
    events: Subscription,
}

impl SingularMap {
    /// Derive a singular-flag index over a list-set
    ///
    /// # Errors
    /// In strict mode, fails when two items hold the same singular flag
    /// during the initial build.
    pub fn derive(set: &VersionedListSet, mode: MapMode) -> Result<Self> {
        let events = set.subscribe();
        let mut map = Self {
            mode,
            holders: FxHashMap::default(),
            counts: FxHashMap::default(),
            held: FxHashSet::default(),
            events,
        };
        map.rebuild(set)?;
        debug!(?mode, "derived singular map");
        Ok(map)
    }

    fn holds(item: &VersionedItem, field: FieldId) -> bool {
        !item.is_deleted()
            && item
                .values()
                .field(field)
                .and_then(Value::as_bool)
                .unwrap_or(false)
    }

    fn rebuild(&mut self, set: &VersionedListSet) -> Result<()> {
        self.holders.clear();
        self.counts.clear();
        self.held.clear();
        for tag in set.tags() {
            let list = set.require_list(tag)?;
            for item in list.iter() {
                self.insert_item(list.key(), item)?;
            }
        }
        Ok(())
    }

    fn insert_item(&mut self, key: &ListKey, item: &VersionedItem) -> Result<()> {
        let typed = TypedId::build(key.tag(), item.id())?;
        for field in key.singular_fields() {
            if !Self::holds(item, *field) {
                continue;
            }
            let entry = (key.tag(), *field);
            let count = self.counts.entry(entry).or_insert(0);
            *count += 1;
            if *count > 1 && self.mode == MapMode::Strict {
                return Err(Error::DuplicateValue(format!(
                    "singular {} {field}",
                    key.name()
                )));
            }
            self.holders.entry(entry).or_insert(typed);
            self.held.insert((typed, *field));
        }
        Ok(())
    }

    fn remove_item(&mut self, key: &ListKey, id: ItemId) -> Result<()> {
        let typed = TypedId::build(key.tag(), id)?;
        for field in key.singular_fields() {
            if !self.held.remove(&(typed, *field)) {
                continue;
            }
            let entry = (key.tag(), *field);
            if let Some(count) = self.counts.get_mut(&entry) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    self.counts.remove(&entry);
                }
            }
            if self.holders.get(&entry) == Some(&typed) {
                self.holders.remove(&entry);
            }
        }
        Ok(())
    }

    /// Apply every queued change event
    ///
    /// # Errors
    /// In strict mode, fails on a duplicate flag during a rebuild.
    pub fn sync(&mut self, set: &VersionedListSet) -> Result<()> {
        let events = self.events.drain();
        for event in events {
            match event.kind() {
                ChangeKind::Refresh => self.rebuild(set)?,
                ChangeKind::Version | ChangeKind::Update => {
                    if self.mode != MapMode::Session {
                        continue;
                    }
                    for (tag, change) in event.list_changes() {
                        let list = set.require_list(tag)?;
                        for id in change.touched() {
                            self.remove_item(list.key(), id)?;
                            if let Some(item) = list.get_item_by_id(id) {
                                self.insert_item(list.key(), item)?;
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// The item currently holding a singular flag
    pub fn holder(&self, tag: ListTag, field: FieldId) -> Option<TypedId> {
        self.holders.get(&(tag, field)).copied()
    }

    /// Whether the item's own flag is held exactly once
    pub fn is_valid_flag(&self, key: &ListKey, item: &VersionedItem, field: FieldId) -> bool {
        Self::holds(item, field) && self.counts.get(&(key.tag(), field)).copied().unwrap_or(0) == 1
    }

    /// Whether the item could take a singular flag
    ///
    /// True when the item already holds it or nobody does.
    pub fn is_available_flag(&self, key: &ListKey, item: &VersionedItem, field: FieldId) -> bool {
        match self.holder(key.tag(), field) {
            None => true,
            Some(holder) => TypedId::build(key.tag(), item.id())
                .map(|typed| typed == holder)
                .unwrap_or(false),
        }
    }
}

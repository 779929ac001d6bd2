//! Field-value model for versioned items
//!
//! This module defines:
//! - FieldId: identifier for one field of an item type
//! - Value: unified enum for all field data types
//! - ValueKey: total-ordered lookup form of a Value, for uniqueness indices
//! - ValueSet: one version of an item's values (field map + version stamp
//!   + deletion flag)
//!
//! ## Type Rules
//!
//! - No implicit type coercions
//! - `Int(1) != Float(1.0)` - different variants are NEVER equal
//! - Float uses IEEE-754 equality: `NaN != NaN`, `-0.0 == 0.0`
//!
//! Cross-item references are values too: a `Link` carries a packed
//! [`TypedId`], a `Paired` carries a packed [`PairedId`]. Neither holds a
//! direct reference; resolution goes through the owning list-set.

use crate::id::{PairedId, TypedId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier for one field of an item type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldId(u16);

impl FieldId {
    /// Create a new field id
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// The raw id value
    pub const fn as_u16(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Canonical value type for item fields
///
/// Different variants are never equal, even when they hold the same
/// "value": `Int(1) != Float(1.0)`, `Bytes(b"x") != String("x")`.
/// Float equality follows IEEE-754 semantics (`NaN != NaN`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point (IEEE-754)
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Reference to an item in another list of the same list-set
    Link(TypedId),
    /// Composite reference to a pair of items
    Paired(PairedId),
}

// Custom PartialEq implementation for IEEE-754 float semantics
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            // IEEE-754: NaN != NaN, -0.0 == 0.0
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Link(a), Value::Link(b)) => a == b,
            (Value::Paired(a), Value::Paired(b)) => a == b,
            // Different variants are never equal
            _ => false,
        }
    }
}

impl Value {
    /// Get the variant name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Bytes(_) => "Bytes",
            Value::Link(_) => "Link",
            Value::Paired(_) => "Paired",
        }
    }

    /// Check if this is a null value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as bool if this is a Bool value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is an Int value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as &str if this is a String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the link target if this is a Link value
    pub fn as_link(&self) -> Option<TypedId> {
        match self {
            Value::Link(id) => Some(*id),
            _ => None,
        }
    }

    /// Get the paired id if this is a Paired value
    pub fn as_paired(&self) -> Option<PairedId> {
        match self {
            Value::Paired(id) => Some(*id),
            _ => None,
        }
    }

    /// Total-ordered lookup form of this value, for use as an index key
    ///
    /// Floats are keyed by their IEEE-754 bit pattern, so `NaN` values are
    /// admitted as map keys even though `Value` equality rejects them.
    pub fn lookup_key(&self) -> ValueKey {
        match self {
            Value::Null => ValueKey::Null,
            Value::Bool(b) => ValueKey::Bool(*b),
            Value::Int(i) => ValueKey::Int(*i),
            Value::Float(f) => ValueKey::Float(f.to_bits()),
            Value::String(s) => ValueKey::String(s.clone()),
            Value::Bytes(b) => ValueKey::Bytes(b.clone()),
            Value::Link(id) => ValueKey::Link(*id),
            Value::Paired(id) => ValueKey::Paired(*id),
        }
    }
}

/// Total-ordered, hashable lookup form of a [`Value`]
///
/// Uniqueness indices key their maps by ValueKey rather than Value so that
/// float fields (which are not `Eq`) can still participate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValueKey {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Float value, keyed by bit pattern
    Float(u64),
    /// String value
    String(String),
    /// Bytes value
    Bytes(Vec<u8>),
    /// Link value
    Link(TypedId),
    /// Paired value
    Paired(PairedId),
}

/// One version of an item's values
///
/// A ValueSet is the unit of history: the current values of an item, the
/// entries on its history stack, and the original (last committed) values
/// are all ValueSets. Each carries the version it was stamped with and a
/// deletion flag; both participate in value equality, the version does not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ValueSet {
    fields: BTreeMap<FieldId, Value>,
    version: u64,
    deleted: bool,
}

impl ValueSet {
    /// Create an empty value-set at version 0
    pub fn new() -> Self {
        Self::default()
    }

    /// The version this value-set was stamped with
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Stamp this value-set with a version
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Whether this value-set is flagged deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Set or clear the deletion flag
    pub fn set_deleted(&mut self, deleted: bool) {
        self.deleted = deleted;
    }

    /// Get a field value, if set
    pub fn field(&self, id: FieldId) -> Option<&Value> {
        self.fields.get(&id)
    }

    /// Set a field value
    pub fn set_field(&mut self, id: FieldId, value: Value) {
        self.fields.insert(id, value);
    }

    /// Clear a field value
    pub fn clear_field(&mut self, id: FieldId) {
        self.fields.remove(&id);
    }

    /// Iterate the set fields in field-id order
    pub fn fields(&self) -> impl Iterator<Item = (FieldId, &Value)> {
        self.fields.iter().map(|(id, v)| (*id, v))
    }

    /// Number of set fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no fields are set
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Overwrite this value-set's fields and deletion flag from another
    ///
    /// The version stamp is left untouched; callers stamp explicitly.
    pub fn copy_from(&mut self, other: &ValueSet) {
        self.fields = other.fields.clone();
        self.deleted = other.deleted;
    }

    /// Value equality: fields and deletion flag, ignoring the version stamp
    pub fn values_equal(&self, other: &ValueSet) -> bool {
        self.deleted == other.deleted && self.fields == other.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::{ItemId, ListTag};

    fn link(tag: u8, id: u32) -> TypedId {
        TypedId::build(ListTag::new(tag), ItemId::new(id)).unwrap()
    }

    #[test]
    fn test_value_cross_variant_never_equal() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_ne!(Value::Bytes(b"x".to_vec()), Value::String("x".into()));
        assert_ne!(Value::Null, Value::Bool(false));
    }

    #[test]
    fn test_value_float_ieee754() {
        assert_ne!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_eq!(Value::Float(-0.0), Value::Float(0.0));
    }

    #[test]
    fn test_value_link_equality() {
        assert_eq!(Value::Link(link(1, 2)), Value::Link(link(1, 2)));
        assert_ne!(Value::Link(link(1, 2)), Value::Link(link(1, 3)));
    }

    #[test]
    fn test_lookup_key_distinguishes_variants() {
        assert_ne!(Value::Int(1).lookup_key(), Value::Float(1.0).lookup_key());
        assert_ne!(
            Value::String("x".into()).lookup_key(),
            Value::Bytes(b"x".to_vec()).lookup_key()
        );
    }

    #[test]
    fn test_lookup_key_admits_nan() {
        // NaN != NaN as a Value, but keys identically for index maps
        assert_eq!(
            Value::Float(f64::NAN).lookup_key(),
            Value::Float(f64::NAN).lookup_key()
        );
    }

    #[test]
    fn test_value_set_field_access() {
        let mut values = ValueSet::new();
        let name = FieldId::new(1);
        assert!(values.field(name).is_none());

        values.set_field(name, Value::String("Cash".into()));
        assert_eq!(values.field(name), Some(&Value::String("Cash".into())));
        assert_eq!(values.len(), 1);

        values.clear_field(name);
        assert!(values.field(name).is_none());
        assert!(values.is_empty());
    }

    #[test]
    fn test_value_set_copy_from_ignores_version() {
        let mut source = ValueSet::new();
        source.set_field(FieldId::new(1), Value::Int(7));
        source.set_deleted(true);
        source.set_version(9);

        let mut target = ValueSet::new();
        target.set_version(2);
        target.copy_from(&source);

        assert_eq!(target.field(FieldId::new(1)), Some(&Value::Int(7)));
        assert!(target.is_deleted());
        assert_eq!(target.version(), 2);
    }

    #[test]
    fn test_values_equal_ignores_version() {
        let mut a = ValueSet::new();
        a.set_field(FieldId::new(1), Value::Int(7));
        let mut b = a.clone();
        b.set_version(5);
        assert!(a.values_equal(&b));
    }

    #[test]
    fn test_values_equal_sees_deletion_flag() {
        let a = ValueSet::new();
        let mut b = ValueSet::new();
        b.set_deleted(true);
        assert!(!a.values_equal(&b));
    }

    #[test]
    fn test_value_set_serialization_roundtrip() {
        let mut values = ValueSet::new();
        values.set_field(FieldId::new(1), Value::String("Cash".into()));
        values.set_field(FieldId::new(2), Value::Link(link(2, 4)));
        values.set_version(3);

        let json = serde_json::to_string(&values).unwrap();
        let restored: ValueSet = serde_json::from_str(&json).unwrap();
        assert_eq!(values, restored);
    }
}

//! Uniqueness indices over a live list-set

use crate::common::*;
use verset::base::BaseTransaction;
use verset::{Error, MapMode, NameMap, UniqueValueMap, Value, VersionedItem};

#[test]
fn session_map_detects_bulk_load_duplicates() {
    // Two items bulk-loaded with the same unique value V
    let mut set = new_base();
    let first = add_account(&mut set, "First", 42);
    let second = add_account(&mut set, "Second", 42);

    let map = UniqueValueMap::derive(&set, MapMode::Session).unwrap();
    let list = set.require_list(ACCOUNT).unwrap();

    // Count for V is 2, not 1: both items report invalid
    for id in [first, second] {
        let item = list.get_item_by_id(id).unwrap();
        assert!(!map.is_valid_value(list.key(), item, BALANCE));
    }

    // A third item proposing V is refused up front
    let probe = VersionedItem::new(verset::ItemId::new(9), ACCOUNT);
    assert!(!map.is_available_value(&account_key(), &probe, BALANCE, &Value::Int(42)));
    assert!(map.is_available_value(&account_key(), &probe, BALANCE, &Value::Int(43)));
}

#[test]
fn strict_map_errors_on_duplicate_insert() {
    let mut set = new_base();
    add_account(&mut set, "First", 42);
    add_account(&mut set, "Second", 42);
    assert!(matches!(
        UniqueValueMap::derive(&set, MapMode::Strict).unwrap_err(),
        Error::DuplicateValue(_)
    ));
}

#[test]
fn name_map_spans_the_shared_namespace() {
    // Accounts and categories share the "ledger" namespace
    let mut set = new_base();
    add_account(&mut set, "Food", 1);
    let mut txn = BaseTransaction::begin(&mut set).unwrap();
    let category = txn.create_item(CATEGORY).unwrap();
    txn.amend_item(CATEGORY, category, |values| {
        values.set_field(NAME, Value::String("Food".into()));
    })
    .unwrap();
    txn.commit();

    let map = NameMap::derive(&set, MapMode::Session).unwrap();
    let accounts = set.require_list(ACCOUNT).unwrap();
    let item = accounts.iter().next().unwrap();
    assert!(!map.is_valid_name(accounts.key(), item));

    // Name generation walks the whole namespace
    assert_eq!(map.unique_name(&category_key(), "Food"), "Food1");
}

#[test]
fn name_map_follows_session_changes() {
    let mut set = new_base();
    let cash = add_account(&mut set, "Cash", 1);
    let mut map = NameMap::derive(&set, MapMode::Session).unwrap();
    assert!(map.item_for_name(&account_key(), "Cash").is_some());

    let mut txn = BaseTransaction::begin(&mut set).unwrap();
    txn.amend_item(ACCOUNT, cash, |values| {
        values.set_field(NAME, Value::String("Wallet".into()));
    })
    .unwrap();
    txn.commit();
    map.sync(&set).unwrap();

    assert!(map.item_for_name(&account_key(), "Cash").is_none());
    let expected = set.build_item_id(ACCOUNT, cash).unwrap();
    assert_eq!(map.item_for_name(&account_key(), "Wallet"), Some(expected));
}

#[test]
fn indices_rebuild_on_refresh() {
    let mut set = new_base();
    add_account(&mut set, "Cash", 1);
    mark_committed(&mut set);

    let mut map = NameMap::derive(&set, MapMode::Strict).unwrap();
    verset::base::refresh(&set).unwrap();
    map.sync(&set).unwrap();
    assert!(map.item_for_name(&account_key(), "Cash").is_some());
    // Transfers declare no name field and never enter the index
    assert!(map.item_for_name(&transfer_key(), "Cash").is_none());
}

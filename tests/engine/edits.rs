//! Edit list-set derivation and synchronization

use crate::common::*;
use verset::base::{self, BaseTransaction};
use verset::{EditListSet, Value};

#[test]
fn edit_mirrors_every_non_deleted_base_item_exactly_once() {
    let mut set = new_base();
    let cash = add_account(&mut set, "Cash", 10);
    let savings = add_account(&mut set, "Savings", 20);
    add_transfer(&mut set, cash, savings);
    let stale = add_account(&mut set, "Stale", 0);
    let mut txn = BaseTransaction::begin(&mut set).unwrap();
    txn.delete_item(ACCOUNT, stale).unwrap();
    txn.commit();

    let edit = EditListSet::derive(&set).unwrap();
    for tag in set.tags() {
        let base_list = set.require_list(tag).unwrap();
        let edit_list = edit.set().require_list(tag).unwrap();
        let live = base_list.iter().filter(|item| !item.is_deleted()).count();
        assert_eq!(edit_list.len(), live, "list {tag}");
        for item in base_list.iter().filter(|item| !item.is_deleted()) {
            let copy = edit_list.get_item_by_id(item.id()).unwrap();
            assert!(copy.values().values_equal(item.values()));
            assert_eq!(copy.version(), 0);
        }
    }
}

#[test]
fn edit_changes_stay_local_until_base_overrides() {
    let mut set = new_base();
    let cash = add_account(&mut set, "Cash", 10);
    let mut edit = EditListSet::derive(&set).unwrap();

    // A local working-copy change never reaches Base
    edit.set_mut()
        .require_list_mut(ACCOUNT)
        .unwrap()
        .get_item_mut(cash)
        .unwrap()
        .values_mut()
        .set_field(BALANCE, Value::Int(77));
    assert_eq!(
        set.require_list(ACCOUNT)
            .unwrap()
            .get_item_by_id(cash)
            .unwrap()
            .values()
            .field(BALANCE),
        Some(&Value::Int(10))
    );

    // A base-side change overwrites the local value on sync
    let mut txn = BaseTransaction::begin(&mut set).unwrap();
    txn.amend_item(ACCOUNT, cash, |values| {
        values.set_field(BALANCE, Value::Int(100));
    })
    .unwrap();
    txn.commit();
    edit.sync(&set).unwrap();
    assert_eq!(
        edit.set()
            .require_list(ACCOUNT)
            .unwrap()
            .get_item_by_id(cash)
            .unwrap()
            .values()
            .field(BALANCE),
        Some(&Value::Int(100))
    );
}

#[test]
fn edit_follows_base_through_rewinds() {
    let mut set = new_base();
    let cash = add_account(&mut set, "Cash", 10);
    let savings = add_account(&mut set, "Savings", 20);
    let mut txn = BaseTransaction::begin(&mut set).unwrap();
    txn.delete_item(ACCOUNT, cash).unwrap();
    txn.commit();

    let mut edit = EditListSet::derive(&set).unwrap();
    assert!(!edit.set().require_list(ACCOUNT).unwrap().contains(cash));

    // Undo the deletion: the edit copy reappears
    base::undo_last_change(&mut set).unwrap();
    edit.sync(&set).unwrap();
    assert!(edit.set().require_list(ACCOUNT).unwrap().contains(cash));

    // Rewind past Savings' creation: its copy disappears
    base::rewind_to_version(&mut set, 1).unwrap();
    edit.sync(&set).unwrap();
    let list = edit.set().require_list(ACCOUNT).unwrap();
    assert!(list.contains(cash));
    assert!(!list.contains(savings));
}

#[test]
fn edit_rebuilds_on_refresh() {
    let mut set = new_base();
    add_account(&mut set, "Cash", 10);
    mark_committed(&mut set);

    let mut edit = EditListSet::derive(&set).unwrap();
    {
        let list = edit.set_mut().require_list_mut(ACCOUNT).unwrap();
        let extra = list.new_list_item(None).unwrap();
        list.add(extra).unwrap();
        assert_eq!(list.len(), 2);
    }

    base::refresh(&set).unwrap();
    edit.sync(&set).unwrap();
    assert_eq!(edit.set().require_list(ACCOUNT).unwrap().len(), 1);
}

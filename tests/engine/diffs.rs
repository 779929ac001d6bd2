//! Structural diffs between base snapshots

use crate::common::*;
use verset::diff::derive_differences;
use verset::{ItemId, ListSetType, Value};

#[test]
fn diff_of_identical_sets_registers_no_lists() {
    let mut set = new_base();
    add_account(&mut set, "Cash", 10);
    let diff = derive_differences(&set, &set).unwrap();
    assert_eq!(diff.set_type(), ListSetType::Diff);
    assert!(diff.tags().is_empty());
    assert_eq!(diff.version(), 0);
    assert!(diff.is_empty());
}

#[test]
fn diff_captures_added_changed_and_deleted() {
    let mut new_set = new_base();
    add_account(&mut new_set, "Cash", 10);
    add_account(&mut new_set, "Savings", 500);

    let mut old_set = new_base();
    add_account(&mut old_set, "Cash", 25);
    let mut txn = verset::base::BaseTransaction::begin(&mut old_set).unwrap();
    let loan = txn
        .create_item_with_id(ACCOUNT, ItemId::new(9))
        .unwrap();
    txn.amend_item(ACCOUNT, loan, |values| {
        values.set_field(NAME, Value::String("Loan".into()));
        values.set_field(BALANCE, Value::Int(-100));
    })
    .unwrap();
    txn.commit();

    let diff = derive_differences(&new_set, &old_set).unwrap();
    assert_eq!(diff.version(), 1);
    let list = diff.require_list(ACCOUNT).unwrap();
    assert_eq!(list.len(), 3);

    // Changed entry: new values current, old values as history
    let cash = list.get_item_by_id(ItemId::new(1)).unwrap();
    assert_eq!(cash.values().field(BALANCE), Some(&Value::Int(10)));
    assert_eq!(cash.original().field(BALANCE), Some(&Value::Int(25)));

    // Added entry: appears with no prior value
    let savings = list.get_item_by_id(ItemId::new(2)).unwrap();
    assert!(!savings.has_history());

    // Deleted entry: existed and was removed
    let loan = list.get_item_by_id(ItemId::new(9)).unwrap();
    assert!(loan.is_deleted());
    assert!(!loan.original().is_deleted());
}

#[test]
fn diff_lists_use_the_new_sets_comparator() {
    let mut new_set = new_base();
    add_account(&mut new_set, "Zebra", 1);
    add_account(&mut new_set, "Apple", 2);
    let old_set = new_base();

    let diff = derive_differences(&new_set, &old_set).unwrap();
    let names: Vec<String> = diff
        .require_list(ACCOUNT)
        .unwrap()
        .iter()
        .map(|item| {
            item.values()
                .field(NAME)
                .and_then(Value::as_str)
                .unwrap()
                .to_string()
        })
        .collect();
    assert_eq!(names, ["Apple", "Zebra"]);
}

#[test]
fn applying_diff_entries_onto_old_reconstructs_new() {
    let mut new_set = new_base();
    let cash = add_account(&mut new_set, "Cash", 10);
    let savings = add_account(&mut new_set, "Savings", 500);
    add_transfer(&mut new_set, cash, savings);

    let mut old_set = new_base();
    add_account(&mut old_set, "Cash", 25);
    add_account(&mut old_set, "Shares", 7);

    let diff = derive_differences(&new_set, &old_set).unwrap();

    // Replay added/changed/deleted entries onto old's content
    let mut rebuilt = new_base();
    for tag in old_set.tags() {
        let source = old_set.require_list(tag).unwrap();
        let target = rebuilt.require_list_mut(tag).unwrap();
        for item in source.iter() {
            target.add(item.clone()).unwrap();
        }
    }
    for tag in diff.tags() {
        let entries = diff.require_list(tag).unwrap();
        let target = rebuilt.require_list_mut(tag).unwrap();
        for entry in entries.iter() {
            if entry.is_deleted() {
                target.remove_by_id(entry.id());
            } else if target.contains(entry.id()) {
                target
                    .get_item_mut(entry.id())
                    .unwrap()
                    .values_mut()
                    .copy_from(entry.values());
            } else {
                let mut item = target.key().new_item(entry.id());
                item.values_mut().copy_from(entry.values());
                target.add(item).unwrap();
            }
        }
    }

    // Every list's value content now matches the new set's
    for tag in new_set.tags() {
        let expected = new_set.require_list(tag).unwrap();
        let actual = rebuilt.require_list(tag).unwrap();
        assert_eq!(actual.len(), expected.len(), "list {tag}");
        for item in expected.iter() {
            let mirror = actual.get_item_by_id(item.id()).unwrap();
            assert!(mirror.values().values_equal(item.values()));
        }
    }
}

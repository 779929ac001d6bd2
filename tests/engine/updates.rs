//! Update list-set membership and phased batch commit

use crate::common::*;
use verset::base::BaseTransaction;
use verset::{EditListSet, ItemState, UpdateListSet, Value};

#[test]
fn update_membership_tracks_dirty_states() {
    let mut set = new_base();
    let clean = add_account(&mut set, "Clean", 1);
    mark_committed(&mut set);

    let fresh = add_account(&mut set, "Fresh", 2);
    let mut txn = BaseTransaction::begin(&mut set).unwrap();
    txn.amend_item(ACCOUNT, clean, |values| {
        values.set_field(BALANCE, Value::Int(9));
    })
    .unwrap();
    txn.commit();

    let update = UpdateListSet::derive(&set).unwrap();
    let list = update.set().require_list(ACCOUNT).unwrap();
    // Exactly the non-clean base items appear
    let base_list = set.require_list(ACCOUNT).unwrap();
    for item in base_list.iter() {
        assert_eq!(
            list.contains(item.id()),
            item.state() != ItemState::Clean,
            "item {}",
            item.id()
        );
    }
    assert!(list.contains(fresh));

    // The changed entry's history equals the base item's original values
    let entry = list.get_item_by_id(clean).unwrap();
    let base_item = base_list.get_item_by_id(clean).unwrap();
    assert_eq!(entry.original().field(BALANCE), base_item.original().field(BALANCE));
    assert_eq!(entry.values().field(BALANCE), Some(&Value::Int(9)));
}

#[test]
fn commit_runs_insert_update_delete_in_order() {
    // One NEW account, one CHANGED account, one DELETED transfer that
    // references the CHANGED account: the transfer must go last.
    let mut set = new_base();
    let checking = add_account(&mut set, "Checking", 10);
    let savings = add_account(&mut set, "Savings", 20);
    let transfer = add_transfer(&mut set, checking, savings);
    mark_committed(&mut set);

    let fresh = add_account(&mut set, "Fresh", 1);
    let mut txn = BaseTransaction::begin(&mut set).unwrap();
    txn.amend_item(ACCOUNT, checking, |values| {
        values.set_field(BALANCE, Value::Int(11));
    })
    .unwrap();
    txn.delete_item(TRANSFER, transfer).unwrap();
    txn.commit();

    let mut update = UpdateListSet::derive(&set).unwrap();
    let committed = update.commit_update_batch(&mut set, 10).unwrap();
    assert_eq!(committed, 3);
    assert!(update.is_empty());

    // The deletion went through: base no longer holds the transfer
    assert!(!set.require_list(TRANSFER).unwrap().contains(transfer));

    // The insert and the update committed clean
    for id in [fresh, checking] {
        let item = set
            .require_list(ACCOUNT)
            .unwrap()
            .get_item_by_id(id)
            .unwrap();
        assert_eq!(item.state(), ItemState::Clean);
    }
    assert_eq!(set.version(), 0);
}

#[test]
fn commit_budget_interleaves_with_other_work() {
    let mut set = new_base();
    mark_committed(&mut set);
    for step in 0..5 {
        add_account(&mut set, &format!("Account{step}"), step);
    }

    let mut update = UpdateListSet::derive(&set).unwrap();
    let mut total = 0;
    let mut calls = 0;
    while !update.is_empty() {
        total += update.commit_update_batch(&mut set, 2).unwrap();
        calls += 1;
        assert!(calls < 10, "commit failed to make progress");
    }
    assert_eq!(total, 5);
    assert_eq!(calls, 3);
    assert_eq!(set.version(), 0);
}

#[test]
fn commit_keeps_derived_views_in_step() {
    let mut set = new_base();
    mark_committed(&mut set);
    let mut txn = BaseTransaction::begin(&mut set).unwrap();
    let ghost = txn.create_item(ACCOUNT).unwrap();
    txn.delete_item(ACCOUNT, ghost).unwrap();
    let real = txn.create_item(ACCOUNT).unwrap();
    txn.commit();

    let mut edit = EditListSet::derive(&set).unwrap();
    let mut update = UpdateListSet::derive(&set).unwrap();
    update.commit_update_batch(&mut set, 10).unwrap();
    edit.sync(&set).unwrap();

    // The DelNew marker vanished everywhere; the real item survives
    assert!(!set.require_list(ACCOUNT).unwrap().contains(ghost));
    assert!(!edit.set().require_list(ACCOUNT).unwrap().contains(ghost));
    assert!(edit.set().require_list(ACCOUNT).unwrap().contains(real));
    assert!(update.is_empty());
}

#[test]
fn interrupted_commit_keeps_partial_progress() {
    let mut set = new_base();
    mark_committed(&mut set);
    add_account(&mut set, "A", 1);
    add_account(&mut set, "B", 2);

    let mut update = UpdateListSet::derive(&set).unwrap();
    assert_eq!(update.commit_update_batch(&mut set, 1).unwrap(), 1);

    // Caller aborts here: the committed item stays committed
    let committed = set
        .require_list(ACCOUNT)
        .unwrap()
        .iter()
        .filter(|item| item.state() == ItemState::Clean)
        .count();
    assert_eq!(committed, 1);
    assert!(!update.is_empty());
    assert!(set.version() > 0);
}

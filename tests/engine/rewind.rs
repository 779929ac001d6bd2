//! Rewind and undo behavior across whole list-sets

use crate::common::*;
use verset::base::{self, BaseTransaction};
use verset::{ChangeKind, Error, Value};

#[test]
fn rewind_is_idempotent_at_every_version() {
    // Build five versions, then check rewind(v) twice for every v <= current
    let mut set = new_base();
    for step in 0..5 {
        add_account(&mut set, &format!("Account{step}"), step);
    }
    assert_eq!(set.version(), 5);

    for target in (0..=set.version()).rev() {
        base::rewind_to_version(&mut set, target).unwrap();
        assert_eq!(set.version(), target);

        // Second rewind to the same version observes an empty change
        let sub = set.subscribe();
        base::rewind_to_version(&mut set, target).unwrap();
        assert_eq!(set.version(), target);
        assert!(!sub.has_pending());
    }
    assert!(set.is_empty());
}

#[test]
fn rewind_reverts_values_and_classifies_restored() {
    // Account added (v1), edited (v2), deleted (v3): rewinding to v1 must
    // clear the deletion flag, revert the edit, and classify the item as
    // restored because step 3 had deleted it.
    let mut set = new_base();
    let id = add_account(&mut set, "Cash", 10);

    let mut txn = BaseTransaction::begin(&mut set).unwrap();
    txn.amend_item(ACCOUNT, id, |values| {
        values.set_field(BALANCE, Value::Int(99));
    })
    .unwrap();
    txn.commit();

    let mut txn = BaseTransaction::begin(&mut set).unwrap();
    txn.delete_item(ACCOUNT, id).unwrap();
    txn.commit();
    assert_eq!(set.version(), 3);

    let sub = set.subscribe();
    base::rewind_to_version(&mut set, 1).unwrap();

    let item = set
        .require_list(ACCOUNT)
        .unwrap()
        .get_item_by_id(id)
        .unwrap();
    assert!(!item.is_deleted());
    assert_eq!(item.values().field(BALANCE), Some(&Value::Int(10)));
    assert_eq!(item.version(), 1);

    let events = sub.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind(), ChangeKind::Version);
    let change = events[0].list_change(ACCOUNT).unwrap();
    assert_eq!(change.restored(), &[id]);
    assert!(change.changed().is_empty());
    assert!(change.hidden().is_empty());
}

#[test]
fn rewind_only_touches_lists_above_target() {
    let mut set = new_base();
    let cash = add_account(&mut set, "Cash", 10);
    let savings = add_account(&mut set, "Savings", 20);
    add_transfer(&mut set, cash, savings);
    assert_eq!(set.version(), 3);

    // The transfer list sits at version 3; the account list at 2
    let sub = set.subscribe();
    base::rewind_to_version(&mut set, 2).unwrap();
    let events = sub.drain();
    assert_eq!(events.len(), 1);
    assert!(events[0].list_change(ACCOUNT).is_none());
    assert_eq!(events[0].list_change(TRANSFER).unwrap().deleted().len(), 1);
    assert_eq!(set.require_list(ACCOUNT).unwrap().version(), 2);
    assert_eq!(set.require_list(TRANSFER).unwrap().version(), 2);
}

#[test]
fn undo_steps_back_one_version_at_a_time() {
    let mut set = new_base();
    add_account(&mut set, "Cash", 10);
    add_account(&mut set, "Savings", 20);
    add_account(&mut set, "Shares", 30);

    base::undo_last_change(&mut set).unwrap();
    assert_eq!(set.version(), 2);
    assert_eq!(set.require_list(ACCOUNT).unwrap().len(), 2);

    base::reset(&mut set).unwrap();
    assert_eq!(set.version(), 0);
    assert!(set.is_empty());
    assert_eq!(
        base::undo_last_change(&mut set).unwrap_err(),
        Error::NothingToUndo
    );
}

#[test]
fn refresh_rejects_uncommitted_sets() {
    let mut set = new_base();
    assert!(base::refresh(&set).is_ok());
    add_account(&mut set, "Cash", 10);
    assert_eq!(base::refresh(&set).unwrap_err(), Error::NotAtBaseVersion(1));
}

#[test]
fn reset_content_reloads_from_snapshot() {
    let mut snapshot = new_base();
    add_account(&mut snapshot, "Cash", 10);
    add_account(&mut snapshot, "Savings", 20);

    let mut live = new_base();
    add_account(&mut live, "Stale", 1);
    let sub = live.subscribe();

    base::reset_content(&mut live, &snapshot).unwrap();
    assert_eq!(live.require_list(ACCOUNT).unwrap().len(), 2);
    assert_eq!(live.version(), snapshot.version());
    let events = sub.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind(), ChangeKind::Refresh);
}

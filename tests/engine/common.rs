//! Shared fixtures for the engine integration tests
//!
//! Models a small finance data set: accounts and categories (sharing one
//! name namespace) and transfers that link accounts. Transfers are
//! declared after accounts, so the dependency-respecting delete order
//! removes transfers first.

use std::rc::Rc;
use verset::base::BaseTransaction;
use verset::{FieldId, ItemId, ListKey, ListSetType, ListTag, Value, VersionedListSet};

pub const ACCOUNT: ListTag = ListTag::new(1);
pub const CATEGORY: ListTag = ListTag::new(2);
pub const TRANSFER: ListTag = ListTag::new(3);

pub const NAME: FieldId = FieldId::new(1);
pub const BALANCE: FieldId = FieldId::new(2);
pub const SOURCE: FieldId = FieldId::new(3);
pub const TARGET: FieldId = FieldId::new(4);

/// Initialize test logging once per process
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn account_key() -> ListKey {
    ListKey::new(ACCOUNT, "Account")
        .with_name_space("ledger")
        .with_name_field(NAME)
        .with_unique_field(BALANCE)
}

pub fn category_key() -> ListKey {
    ListKey::new(CATEGORY, "Category")
        .with_name_space("ledger")
        .with_name_field(NAME)
}

pub fn transfer_key() -> ListKey {
    ListKey::new(TRANSFER, "Transfer")
}

/// A base list-set with the account / category / transfer lists declared
pub fn new_base() -> VersionedListSet {
    init_tracing();
    let mut set = VersionedListSet::new(ListSetType::Base);
    set.declare_list(account_key()).unwrap();
    set.declare_list(category_key()).unwrap();
    set.declare_list(transfer_key()).unwrap();
    set.get_list_mut(ACCOUNT)
        .unwrap()
        .set_comparator(Some(Rc::new(|a, b| {
            a.values()
                .field(NAME)
                .and_then(Value::as_str)
                .cmp(&b.values().field(NAME).and_then(Value::as_str))
        })));
    set
}

/// Add a named account in its own transaction; returns its id
pub fn add_account(set: &mut VersionedListSet, name: &str, balance: i64) -> ItemId {
    let mut txn = BaseTransaction::begin(set).unwrap();
    let id = txn.create_item(ACCOUNT).unwrap();
    txn.amend_item(ACCOUNT, id, |values| {
        values.set_field(NAME, Value::String(name.into()));
        values.set_field(BALANCE, Value::Int(balance));
    })
    .unwrap();
    txn.commit();
    id
}

/// Add a transfer linking two accounts in its own transaction
pub fn add_transfer(set: &mut VersionedListSet, source: ItemId, target: ItemId) -> ItemId {
    let source_ref = set.build_item_id(ACCOUNT, source).unwrap();
    let target_ref = set.build_item_id(ACCOUNT, target).unwrap();
    let mut txn = BaseTransaction::begin(set).unwrap();
    let id = txn.create_item(TRANSFER).unwrap();
    txn.amend_item(TRANSFER, id, |values| {
        values.set_field(SOURCE, Value::Link(source_ref));
        values.set_field(TARGET, Value::Link(target_ref));
    })
    .unwrap();
    txn.commit();
    id
}

/// Collapse all history so the current content is the committed baseline
pub fn mark_committed(set: &mut VersionedListSet) {
    for tag in set.tags() {
        let list = set.require_list_mut(tag).unwrap();
        for id in list.ids() {
            list.get_item_mut(id).unwrap().clear_history();
        }
        list.set_version(0);
    }
    set.set_version(0);
}

//! Diff manager: structural comparison of two base snapshots
//!
//! [`derive_differences`] builds a one-shot Diff list-set describing how a
//! `new` snapshot diverges from an `old` one. Unchanged items are omitted
//! entirely, and item types with no differences are not registered into the
//! result at all - comparing a snapshot against itself yields a list-set
//! with no lists.

use crate::set::{ListSetType, VersionedListSet};
use tracing::debug;
use verset_core::{ListTag, Result, VersionedItem};

/// Compare two Base snapshots into a new Diff list-set
///
/// Per item type present in either set:
/// - items only in `new` become *added* entries: current values stamped
///   version 1 with no history (they appear with no prior value);
/// - items only in `old` become *deleted* entries: the old values flagged
///   deleted, with an undeleted clone as history ("this existed and was
///   removed");
/// - items in both with unequal values become *changed* entries: `new`'s
///   values as current, `old`'s as history.
///
/// Each resulting list is sorted with `new`'s comparator, falling back to
/// `old`'s when only the old set has the type. The result is at version 1
/// iff any list holds differences.
///
/// # Errors
/// Fails when either set is not a Base set.
pub fn derive_differences(
    new_set: &VersionedListSet,
    old_set: &VersionedListSet,
) -> Result<VersionedListSet> {
    new_set.require_type(ListSetType::Base)?;
    old_set.require_type(ListSetType::Base)?;

    let mut tags: Vec<ListTag> = new_set.tags();
    for tag in old_set.tags() {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    let mut result = VersionedListSet::new(ListSetType::Diff);
    for tag in tags {
        let new_list = new_set.get_list(tag);
        let old_list = old_set.get_list(tag);

        let mut entries: Vec<VersionedItem> = Vec::new();
        if let Some(new_list) = new_list {
            for item in new_list.iter() {
                let counterpart =
                    old_list.and_then(|old_list| old_list.get_item_by_id(item.id()));
                match counterpart {
                    None => {
                        // Added: appears with no prior value
                        let mut entry = new_list.key().new_item(item.id());
                        entry.values_mut().copy_from(item.values());
                        entry.values_mut().set_version(1);
                        entries.push(entry);
                    }
                    Some(old_item) => {
                        if !item.values().values_equal(old_item.values()) {
                            let mut entry = new_list.key().new_item(item.id());
                            entry.values_mut().copy_from(item.values());
                            entry.values_mut().set_version(1);
                            let mut history = old_item.values().clone();
                            history.set_version(0);
                            entry.set_history(vec![history]);
                            entries.push(entry);
                        }
                    }
                }
            }
        }
        if let Some(old_list) = old_list {
            for item in old_list.iter() {
                let in_new = new_list
                    .map(|new_list| new_list.contains(item.id()))
                    .unwrap_or(false);
                if !in_new {
                    // Deleted: existed and was removed
                    let mut entry = old_list.key().new_item(item.id());
                    entry.values_mut().copy_from(item.values());
                    entry.values_mut().set_deleted(true);
                    entry.values_mut().set_version(1);
                    let mut history = item.values().clone();
                    history.set_deleted(false);
                    history.set_version(0);
                    entry.set_history(vec![history]);
                    entries.push(entry);
                }
            }
        }

        if entries.is_empty() {
            continue;
        }
        let source = match new_list.or(old_list) {
            Some(list) => list,
            None => continue,
        };
        result.declare_list(source.key().clone())?;
        let list = result.require_list_mut(tag)?;
        list.set_comparator(source.comparator().cloned());
        for entry in entries {
            list.add(entry)?;
        }
        list.sort();
        list.set_version(1);
    }

    result.recompute_version();
    debug!(
        lists = result.tags().len(),
        version = result.version(),
        "derived differences"
    );
    Ok(result)
}

//! Attribute comparison between the stored and the directory view of a user.
//!
//! The comparison is driven by the directory's attribute set: every attribute
//! present in `fetched` is checked against `stored`, and attributes present only
//! in `stored` are ignored. An attribute removed from the directory is therefore
//! never reported as a change. Values are compared as exact strings.

use ldapsync_core::{AttributeChange, AttributeMap};

/// Whether any directory attribute differs from its stored value.
///
/// An attribute missing from `stored` differs from any fetched value, including
/// the empty string.
pub fn is_changed(stored: &AttributeMap, fetched: &AttributeMap) -> bool {
    fetched
        .iter()
        .any(|(name, new)| stored.get(name) != Some(new))
}

/// Every directory attribute whose value differs from the stored one, in
/// attribute name order.
///
/// Non-empty exactly when [`is_changed`] returns true.
pub fn attribute_changes(stored: &AttributeMap, fetched: &AttributeMap) -> Vec<AttributeChange> {
    fetched
        .iter()
        .filter_map(|(name, new)| {
            let old = stored.get(name);
            (old != Some(new)).then(|| AttributeChange {
                attribute: name.clone(),
                old: old.cloned(),
                new: new.clone(),
            })
        })
        .collect()
}

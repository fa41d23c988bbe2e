//! Domain types shared by the sync engine and its connectors.
//!
//! Every value here is scoped to a single sync run; nothing is cached between
//! runs.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Key identifying a user in both the directory and the relational store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Attribute data
// ---------------------------------------------------------------------------

/// Attribute name to value. A missing key is not the same as an empty value.
pub type AttributeMap = BTreeMap<String, String>;

/// Every user currently persisted, keyed by identifier.
pub type StoredUserSet = BTreeMap<UserId, AttributeMap>;

/// One attribute whose directory value differs from the stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeChange {
    pub attribute: String,
    /// `None` when the store has no value for the attribute.
    pub old: Option<String>,
    pub new: String,
}

/// A user whose directory attributes must be written back to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub user: UserId,
    /// The full attribute map as fetched from the directory.
    pub attributes: AttributeMap,
    pub changes: Vec<AttributeChange>,
}

/// Batch of records submitted to the store in one call.
pub type ChangeSet = Vec<ChangeRecord>;

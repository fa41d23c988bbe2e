//! Capability traits for the two external systems a sync run talks to.
//!
//! A connector is cheap to hold and opens a fresh session per run. Sessions are
//! closed explicitly by the caller so that async teardown (LDAP unbind, SQL
//! terminate) can run on every exit path.

use async_trait::async_trait;

use crate::error::ConnectorError;
use crate::types::{AttributeMap, ChangeRecord, StoredUserSet, UserId};

/// The authoritative directory holding current user attributes.
#[async_trait]
pub trait AttributeSource: Send + Sync {
    type Session: DirectorySession;

    async fn open(&self) -> Result<Self::Session, ConnectorError>;
}

/// An open directory connection.
#[async_trait]
pub trait DirectorySession: Send + Sized {
    /// Fetch the current attributes of a single user.
    async fn search(&mut self, user: &UserId) -> Result<AttributeMap, ConnectorError>;

    async fn close(self);
}

/// The relational table holding the last synced attributes.
#[async_trait]
pub trait RecordStore: Send + Sync {
    type Session: StoreSession;

    async fn open(&self) -> Result<Self::Session, ConnectorError>;
}

/// An open record store connection.
#[async_trait]
pub trait StoreSession: Send + Sized {
    /// Load every known user with its stored attributes.
    async fn fetch_all(&mut self) -> Result<StoredUserSet, ConnectorError>;

    /// Persist a batch of changed users in one call. Never called with an
    /// empty batch.
    ///
    /// Returns how many records matched a stored user and were updated.
    async fn apply_batch(&mut self, changes: &[ChangeRecord]) -> Result<usize, ConnectorError>;

    async fn close(self);
}

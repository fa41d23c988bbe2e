//! Error types for ldapsync-engine.

use thiserror::Error;

use ldapsync_core::ConnectorError;

/// Terminal failure of a sync run.
///
/// Per-user directory lookup failures are not represented here: they are
/// isolated to the user and reported through `RunSummary::failed_lookups`.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The record store connection could not be opened.
    #[error("cannot establish database connection: {0}")]
    StoreOpen(#[source] ConnectorError),

    /// Loading the stored users failed.
    #[error("cannot fetch users from database: {0}")]
    StoreFetch(#[source] ConnectorError),

    /// The directory connection could not be opened.
    #[error("cannot establish LDAP connection: {0}")]
    DirectoryOpen(#[source] ConnectorError),

    /// The store rejected the batch update. It is not retried.
    #[error("failed to perform database update: {0}")]
    BatchUpdate(#[source] ConnectorError),
}

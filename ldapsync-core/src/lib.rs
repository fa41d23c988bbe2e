//! ldapsync core library: domain types, connector traits, configuration, errors.
//!
//! - [`types`]: user identifiers, attribute maps and change records
//! - [`connector`]: the [`AttributeSource`] and [`RecordStore`] capabilities
//! - [`config`]: `SYNC_*` environment configuration
//! - [`error`]: [`ConfigError`] and [`ConnectorError`]

pub mod config;
pub mod connector;
pub mod error;
pub mod types;

pub use config::{ConfigArgs, DirectoryConfig, LogFormat, StoreConfig, SyncConfig};
pub use connector::{AttributeSource, DirectorySession, RecordStore, StoreSession};
pub use error::{ConfigError, ConnectorError};
pub use types::{
    AttributeChange, AttributeMap, ChangeRecord, ChangeSet, StoredUserSet, UserId,
};

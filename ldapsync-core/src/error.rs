//! Error types for ldapsync-core.

use thiserror::Error;

use crate::types::UserId;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Invalid startup configuration. Always fatal: no sync run is attempted.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `SYNC_INTERVAL` could not be parsed as a duration.
    #[error("cannot parse {key}={value:?} as a duration: {source}")]
    MalformedInterval {
        key: &'static str,
        value: String,
        #[source]
        source: humantime::DurationError,
    },

    /// `SYNC_INTERVAL` parsed, but is zero or negative.
    #[error("non-positive {key} value {value:?}")]
    NonPositiveInterval { key: &'static str, value: String },

    /// A table or column name that cannot be used as a SQL identifier.
    #[error("invalid SQL identifier {value:?}")]
    InvalidIdentifier { value: String },

    #[error("invalid {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Failure reported by a directory or record store connector.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The connection could not be opened or authenticated.
    #[error("connection failed: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A query or update on an open connection failed.
    #[error("query failed: {message}")]
    Query {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("user {user} not found in directory")]
    NotFound { user: UserId },

    #[error("user {user} matched {count} directory entries")]
    Ambiguous { user: UserId, count: usize },
}

impl ConnectorError {
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            source: None,
        }
    }

    pub fn connection_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
            source: None,
        }
    }

    pub fn query_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Query {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

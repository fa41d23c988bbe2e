use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{Connection, Row};
use tracing::{debug, info, warn};

use ldapsync_core::{
    AttributeMap, ChangeRecord, ConnectorError, RecordStore, StoreConfig, StoreSession,
    StoredUserSet, UserId,
};

use crate::queries;

/// Record store connector. Every [`open`] call establishes a dedicated
/// connection for one sync run.
///
/// [`open`]: RecordStore::open
#[derive(Debug, Clone)]
pub struct PostgresStore {
    config: Arc<StoreConfig>,
}

/// An open PostgreSQL connection owned by a single sync run.
pub struct PostgresSession {
    conn: PgConnection,
    config: Arc<StoreConfig>,
}

impl PostgresStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

#[async_trait]
impl RecordStore for PostgresStore {
    type Session = PostgresSession;

    async fn open(&self) -> Result<PostgresSession, ConnectorError> {
        let options = PgConnectOptions::from_str(&self.config.url)
            .map_err(|e| ConnectorError::connection_failed_with_source("invalid database URL", e))?;

        debug!(
            host = options.get_host(),
            port = options.get_port(),
            "connecting to database"
        );

        let timeout = self.config.connect_timeout;
        let conn = tokio::time::timeout(timeout, PgConnection::connect_with(&options))
            .await
            .map_err(|_| {
                ConnectorError::connection_failed(format!(
                    "timed out after {timeout:?} connecting to database"
                ))
            })?
            .map_err(|e| {
                ConnectorError::connection_failed_with_source("failed to connect to database", e)
            })?;

        info!("database connection established");
        Ok(PostgresSession {
            conn,
            config: self.config.clone(),
        })
    }
}

#[async_trait]
impl StoreSession for PostgresSession {
    async fn fetch_all(&mut self) -> Result<StoredUserSet, ConnectorError> {
        let sql = queries::select_users(&self.config);
        let rows = sqlx::query(&sql)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|e| ConnectorError::query_failed_with_source("failed to select users", e))?;

        let mut users = StoredUserSet::new();
        for row in rows {
            let key: Option<String> = row.try_get(0).map_err(decode_err)?;
            let Some(key) = key else {
                warn!(column = %self.config.key_column, "skipping row with NULL key");
                continue;
            };

            let mut attrs = AttributeMap::new();
            for (idx, column) in self.config.columns.iter().enumerate() {
                // NULL stays absent; it is not the empty string.
                let value: Option<String> = row.try_get(idx + 1).map_err(decode_err)?;
                if let Some(value) = value {
                    attrs.insert(column.clone(), value);
                }
            }

            let user = UserId::from(key);
            if users.contains_key(&user) {
                warn!(user = %user, "duplicate key in user table, keeping last row");
            }
            users.insert(user, attrs);
        }

        Ok(users)
    }

    async fn apply_batch(&mut self, changes: &[ChangeRecord]) -> Result<usize, ConnectorError> {
        let config = self.config.clone();
        let mut updated = 0;
        let mut tx = self
            .conn
            .begin()
            .await
            .map_err(|e| ConnectorError::query_failed_with_source("failed to begin transaction", e))?;

        for record in changes {
            let columns: Vec<&str> = config
                .columns
                .iter()
                .map(String::as_str)
                .filter(|column| {
                    *column != config.key_column && record.attributes.contains_key(*column)
                })
                .collect();
            if columns.is_empty() {
                debug!(user = %record.user, "no configured column to update");
                continue;
            }

            let sql = queries::update_user(&config, &columns);
            let mut query = sqlx::query(&sql);
            for column in &columns {
                query = query.bind(record.attributes.get(*column).map(String::as_str));
            }
            let result = query
                .bind(record.user.as_str())
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    ConnectorError::query_failed_with_source(
                        format!("failed to update user {}", record.user),
                        e,
                    )
                })?;

            if result.rows_affected() == 0 {
                warn!(user = %record.user, "update matched no database row");
            } else {
                updated += 1;
            }
        }

        tx.commit()
            .await
            .map_err(|e| ConnectorError::query_failed_with_source("failed to commit update", e))?;
        Ok(updated)
    }

    async fn close(self) {
        if let Err(e) = self.conn.close().await {
            warn!(error = %e, "error closing database connection");
        }
    }
}

fn decode_err(e: sqlx::Error) -> ConnectorError {
    ConnectorError::query_failed_with_source("failed to decode user row", e)
}

//! PostgreSQL implementation of the [`RecordStore`](ldapsync_core::RecordStore)
//! capability, built on `sqlx`.

mod connector;
mod queries;

pub use connector::{PostgresSession, PostgresStore};

//! # ldapsync-engine
//!
//! Attribute diffing and sync orchestration.
//!
//! Build a [`SyncRun`] over a [`RecordStore`](ldapsync_core::RecordStore) and an
//! [`AttributeSource`](ldapsync_core::AttributeSource) and call
//! [`SyncRun::execute`] to perform one pass.

pub mod diff;
pub mod error;
pub mod pipeline;

pub use error::SyncError;
pub use pipeline::{RunSummary, SyncRun};

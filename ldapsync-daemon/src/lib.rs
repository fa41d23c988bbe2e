//! Sync daemon runtime: scheduler loop, shutdown signals and logging setup.

mod error;
mod logging;
mod runtime;

pub use error::DaemonError;
pub use logging::init_tracing;
pub use runtime::{drive, preview_blocking, run, start_blocking, RunOptions, Schedule};

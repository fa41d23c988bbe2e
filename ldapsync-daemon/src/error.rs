use thiserror::Error;

/// Error surface for the sync daemon runtime.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("failed to build tokio runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("failed to install shutdown signal handler: {0}")]
    Signal(#[source] std::io::Error),
}

//! Error types for process management

use std::io;
use thiserror::Error;

/// Process management errors
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Failed to spawn process (missing binary, permission denied, ...)
    #[error("Failed to spawn process: {0}")]
    SpawnFailed(#[source] io::Error),

    /// Process did not finish within its bounded wait
    #[error("Process timed out after {millis}ms")]
    Timeout { millis: u64 },

    /// The caller cancelled the run before the process finished
    #[error("Process run cancelled")]
    Cancelled,

    /// Reading or writing a stdio pipe failed, or waiting on the child failed
    #[error("Process I/O failed: {0}")]
    Io(#[from] io::Error),

    /// Failed to kill process
    #[error("Failed to kill process: {0}")]
    KillFailed(String),

    /// Invalid configuration
    #[error("Invalid process configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for process operations
pub type Result<T> = std::result::Result<T, ProcessError>;

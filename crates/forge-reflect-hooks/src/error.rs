//! Error types for the dispatcher
//!
//! These errors only travel along internal paths: configuration loading, the
//! build guard and the tool invoker. The public dispatcher surface never
//! returns them; every failure is logged and collapsed into "no action".
//!
//! # Examples
//!
//! ```ignore
//! match runner.try_run(&request, &cancel).await {
//!     Ok(text) => println!("tool said: {}", text),
//!     Err(DispatchError::NonZeroExit { tool, code }) => eprintln!("{} exited {:?}", tool, code),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use forge_reflect_process::ProcessError;
use thiserror::Error;

/// Errors that can occur inside the dispatcher
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Invalid dispatcher configuration
    ///
    /// Common causes:
    /// - Empty or duplicate tool names
    /// - Zero timeouts
    /// - Empty build command
    #[error("Invalid dispatcher configuration: {0}")]
    InvalidConfiguration(String),

    /// Spawning, feeding or waiting on a subprocess failed (includes timeouts
    /// and cancellation)
    #[error("Process error: {0}")]
    Process(#[from] ProcessError),

    /// A tool or the build ran but exited non-zero
    #[error("'{tool}' exited with status {code:?}")]
    NonZeroExit { tool: String, code: Option<i32> },

    /// The build program could not be found on PATH
    #[error("Build tool unavailable: {0}")]
    BuildToolUnavailable(String),

    /// YAML parsing failure while loading `config.yaml`
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_yaml::Error),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error while encoding a tool payload
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type for dispatcher internals
pub type Result<T> = std::result::Result<T, DispatchError>;

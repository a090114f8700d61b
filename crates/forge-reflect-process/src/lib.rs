//! # forge-reflect-process
//!
//! **Purpose**: Subprocess lifecycle for the forge-reflect dispatcher
//!
//! Spawns short-lived helper processes, feeds them a single stdin payload,
//! collects their output and makes sure none of them outlive the episode that
//! started them.
//!
//! ## Features
//!
//! - **Process Spawning**: Async process creation with piped or discarded stdio
//! - **Stdin Payloads**: Write one payload, then close stdin so the child sees EOF
//! - **Bounded Waits**: Per-process timeout; the child is killed on expiry
//! - **Cancellation**: A `CancellationToken` aborts the run and kills the child
//! - **Process Tree Kill**: Kill process groups on Unix (SIGTERM then SIGKILL)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use forge_reflect_process::{ProcessConfig, ProcessManager};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ProcessManager::new();
//!
//! let config = ProcessConfig::new("/opt/tools/reflect")
//!     .env("FORGE_MODULE_ROOT", "/opt/tools")
//!     .pipe_stdin(true)
//!     .timeout_ms(5_000);
//!
//! let output = manager
//!     .run(config, Some(br#"{"cwd":"/tmp"}"#), &CancellationToken::new())
//!     .await?;
//! println!("{}", output.stdout_lossy());
//! # Ok(())
//! # }
//! ```

pub mod child;
pub mod config;
pub mod error;
pub mod manager;
pub mod output;

pub use child::ManagedChild;
pub use config::ProcessConfig;
pub use error::{ProcessError, Result};
pub use manager::ProcessManager;
pub use output::ProcessOutput;

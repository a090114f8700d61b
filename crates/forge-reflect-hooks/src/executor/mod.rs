//! Tool invocation
//!
//! Runs one analysis tool as a subprocess and returns its stdout. Every
//! failure collapses to empty text at this boundary.

pub mod runner;

pub use runner::SubprocessToolRunner;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::types::InvocationRequest;

/// Trait for running analysis tools
///
/// Implementations must never fail outward: a spawn error, a non-zero exit, a
/// timeout or a cancellation all yield an empty string.
///
/// # Examples
///
/// ```ignore
/// let runner = SubprocessToolRunner::new(root, &config);
/// let request = InvocationRequest {
///     kind: ToolKind::HardCheck,
///     path: tools.path(ToolKind::HardCheck).to_path_buf(),
///     input: Some(r#"{"cwd":"/work","transcript_path":""}"#.to_string()),
/// };
/// let text = runner.run(request, &CancellationToken::new()).await;
/// ```
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run the tool and return its captured stdout, untrimmed
    async fn run(&self, request: InvocationRequest, cancel: &CancellationToken) -> String;
}

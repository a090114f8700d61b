//! Subprocess tool runner

use std::time::{Duration, Instant};

use async_trait::async_trait;
use forge_reflect_process::{ProcessConfig, ProcessManager};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    config::DispatcherConfig,
    error::{DispatchError, Result},
    locator::ModuleRoot,
    types::InvocationRequest,
};

/// Runs tools as child processes with a bounded wait
///
/// Each child gets the module root in its environment, is placed in its own
/// process group and is killed together with its descendants on timeout or
/// cancellation.
#[derive(Debug, Clone)]
pub struct SubprocessToolRunner {
    module_root: ModuleRoot,
    env_var: String,
    timeout: Duration,
    max_output_bytes: u64,
    manager: ProcessManager,
}

impl SubprocessToolRunner {
    pub fn new(module_root: ModuleRoot, config: &DispatcherConfig) -> Self {
        Self {
            module_root,
            env_var: config.module_root_env.clone(),
            timeout: config.invoke_timeout(),
            max_output_bytes: config.max_output_bytes,
            manager: ProcessManager::new(),
        }
    }

    /// Run a tool, keeping the failure
    ///
    /// # Errors
    ///
    /// `Process` when spawning, feeding or waiting fails (including timeout and
    /// cancellation); `NonZeroExit` when the tool exits unsuccessfully.
    pub async fn try_run(
        &self,
        request: &InvocationRequest,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let config = ProcessConfig::new(&request.path)
            .env(
                self.env_var.as_str(),
                self.module_root.as_path().to_string_lossy(),
            )
            .pipe_stdin(request.input.is_some())
            .new_process_group(true)
            .timeout(self.timeout)
            .max_output_bytes(self.max_output_bytes);

        let output = self
            .manager
            .run(config, request.input.as_deref().map(str::as_bytes), cancel)
            .await?;

        if !output.stderr.is_empty() {
            debug!(
                tool = %request.kind,
                stderr = %output.stderr_lossy().trim_end(),
                "Tool wrote to stderr"
            );
        }

        if !output.success() {
            return Err(DispatchError::NonZeroExit {
                tool: request.kind.to_string(),
                code: output.code(),
            });
        }

        Ok(output.stdout_lossy())
    }
}

#[async_trait]
impl super::ToolRunner for SubprocessToolRunner {
    async fn run(&self, request: InvocationRequest, cancel: &CancellationToken) -> String {
        let start = Instant::now();
        debug!(
            tool = %request.kind,
            path = %request.path.display(),
            has_input = request.input.is_some(),
            "Invoking tool"
        );

        match self.try_run(&request, cancel).await {
            Ok(text) => {
                debug!(
                    tool = %request.kind,
                    output_length = text.len(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Tool finished"
                );
                text
            }
            Err(e) => {
                warn!(
                    tool = %request.kind,
                    path = %request.path.display(),
                    error = %e,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Tool invocation failed"
                );
                String::new()
            }
        }
    }
}

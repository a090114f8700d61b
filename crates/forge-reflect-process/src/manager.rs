//! Process manager - lifecycle orchestration

use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    child::ManagedChild,
    config::ProcessConfig,
    error::{ProcessError, Result},
    output::ProcessOutput,
};

/// Manages process lifecycle
#[derive(Debug, Clone, Copy)]
pub struct ProcessManager;

impl ProcessManager {
    /// Create new process manager
    pub fn new() -> Self {
        Self
    }

    /// Spawn a managed process
    ///
    /// The child is always `kill_on_drop`, so dropping the returned handle (or
    /// a future that owns it) never leaves the process running.
    ///
    /// # Examples
    /// ```no_run
    /// use forge_reflect_process::{ProcessManager, ProcessConfig};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let manager = ProcessManager::new();
    /// let config = ProcessConfig::new("echo").args(["hello"]);
    /// let child = manager.spawn(config).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn spawn(&self, config: ProcessConfig) -> Result<ManagedChild> {
        debug!(
            command = %config.display_name(),
            args = ?config.args,
            "Spawning process"
        );

        if config.command.as_os_str().is_empty() {
            return Err(ProcessError::InvalidConfig(
                "command cannot be empty".to_string(),
            ));
        }

        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args);

        if let Some(ref dir) = config.working_dir {
            cmd.current_dir(dir);
        }

        for (key, value) in &config.env {
            cmd.env(key, value);
        }

        cmd.stdin(if config.pipe_stdin {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        cmd.stdout(if config.capture_stdout {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        cmd.stderr(if config.capture_stderr {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        cmd.kill_on_drop(true);

        #[cfg(unix)]
        {
            if config.new_process_group {
                cmd.process_group(0);
            }
        }

        let child = cmd.spawn().map_err(ProcessError::SpawnFailed)?;
        let pid = child.id().unwrap_or(0);

        info!(pid = %pid, command = %config.display_name(), "Process spawned");

        Ok(ManagedChild::new(child, config))
    }

    /// Spawn a process, feed it `input`, and wait for it to finish
    ///
    /// Honours the configured timeout and the cancellation token; in either
    /// case the child is killed before the error is returned. A non-zero exit
    /// is not an error here: inspect [`ProcessOutput::success`].
    ///
    /// # Examples
    /// ```no_run
    /// use forge_reflect_process::{ProcessManager, ProcessConfig};
    /// use tokio_util::sync::CancellationToken;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let manager = ProcessManager::new();
    /// let config = ProcessConfig::new("cat").pipe_stdin(true).timeout_ms(1_000);
    /// let output = manager
    ///     .run(config, Some(b"ping"), &CancellationToken::new())
    ///     .await?;
    /// assert_eq!(output.stdout_lossy(), "ping");
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run(
        &self,
        config: ProcessConfig,
        input: Option<&[u8]>,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutput> {
        if cancel.is_cancelled() {
            return Err(ProcessError::Cancelled);
        }

        let mut child = self.spawn(config).await?;
        child.communicate(input, cancel).await
    }

    /// Gracefully shutdown a process
    pub async fn shutdown(&self, mut child: ManagedChild) -> Result<()> {
        child.shutdown().await
    }
}

impl Default for ProcessManager {
    fn default() -> Self {
        Self::new()
    }
}

//! Managed child process wrapper

use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    config::ProcessConfig,
    error::{ProcessError, Result},
    output::ProcessOutput,
};

/// Grace period between SIGTERM and SIGKILL for a process group
const SIGKILL_TIMEOUT_MS: u64 = 200;

/// Upper bound on reaping a child we just killed
const REAP_TIMEOUT: Duration = Duration::from_secs(5);

/// How a `communicate` call ended before its output is inspected
enum RunOutcome {
    Finished(io::Result<ProcessOutput>),
    TimedOut(u64),
    Cancelled,
}

/// Wrapper around tokio::process::Child with lifecycle management
pub struct ManagedChild {
    /// Underlying tokio child process
    child: Child,
    /// Process configuration
    config: ProcessConfig,
    /// Process ID
    pid: u32,
}

impl ManagedChild {
    /// Create new managed child
    pub(crate) fn new(child: Child, config: ProcessConfig) -> Self {
        let pid = child.id().unwrap_or(0);
        Self { child, config, pid }
    }

    /// Get process ID
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Check if process is still running
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Wait for process to exit, bounded by the configured timeout
    pub async fn wait(&mut self) -> Result<std::process::ExitStatus> {
        match self.config.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.child.wait())
                .await
                .map_err(|_| ProcessError::Timeout {
                    millis: timeout.as_millis() as u64,
                })?
                .map_err(Into::into),
            None => self.child.wait().await.map_err(Into::into),
        }
    }

    /// Feed `input` to stdin, drain stdout/stderr and wait for exit
    ///
    /// Stdin is closed right after the payload is written (or immediately
    /// when there is no payload) so the child sees EOF. If the configured
    /// timeout expires or `cancel` fires first, the child is killed and
    /// reaped before the error is returned.
    pub async fn communicate(
        &mut self,
        input: Option<&[u8]>,
        cancel: &CancellationToken,
    ) -> Result<ProcessOutput> {
        let stdin = self.child.stdin.take();
        let stdout = self.child.stdout.take();
        let stderr = self.child.stderr.take();
        let timeout = self.config.timeout;
        let limit = self.config.max_output_bytes;

        let outcome = {
            let finished = collect(&mut self.child, stdin, input, stdout, stderr, limit);
            tokio::pin!(finished);

            let deadline = async move {
                match timeout {
                    Some(limit) => sleep(limit).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                result = &mut finished => RunOutcome::Finished(result),
                _ = deadline => RunOutcome::TimedOut(
                    timeout.map_or(0, |limit| limit.as_millis() as u64),
                ),
                _ = cancel.cancelled() => RunOutcome::Cancelled,
            }
        };

        match outcome {
            RunOutcome::Finished(result) => {
                let output = result?;
                debug!(
                    pid = %self.pid,
                    exit_code = ?output.code(),
                    stdout_len = output.stdout.len(),
                    "Process finished"
                );
                Ok(output)
            }
            RunOutcome::TimedOut(millis) => {
                warn!(pid = %self.pid, timeout_ms = millis, "Process exceeded its timeout");
                self.terminate().await;
                Err(ProcessError::Timeout { millis })
            }
            RunOutcome::Cancelled => {
                debug!(pid = %self.pid, "Process run cancelled");
                self.terminate().await;
                Err(ProcessError::Cancelled)
            }
        }
    }

    /// Kill the child (SIGKILL) if it is still running
    pub async fn kill(&mut self) -> Result<()> {
        if !self.is_running() {
            return Ok(());
        }
        self.child
            .kill()
            .await
            .map_err(|e| ProcessError::KillFailed(e.to_string()))
    }

    /// Gracefully shutdown process
    ///
    /// Kills the process (or its group) and waits for it to exit.
    pub async fn shutdown(&mut self) -> Result<()> {
        if !self.is_running() {
            return Ok(());
        }

        debug!(pid = %self.pid, "Shutting down process");
        self.kill_tree().await?;

        match tokio::time::timeout(REAP_TIMEOUT, self.child.wait()).await {
            Ok(Ok(_)) => {
                debug!(pid = %self.pid, "Process shut down");
                Ok(())
            }
            Ok(Err(e)) => {
                warn!(pid = %self.pid, error = %e, "Error waiting for process");
                Err(ProcessError::KillFailed(e.to_string()))
            }
            Err(_) => {
                warn!(pid = %self.pid, "Timeout waiting for process to exit");
                Err(ProcessError::Timeout {
                    millis: REAP_TIMEOUT.as_millis() as u64,
                })
            }
        }
    }

    /// Kill process tree (process and all descendants)
    ///
    /// Only children spawned with `new_process_group(true)` lead their own
    /// group on Unix; anything else falls back to killing the single process.
    pub async fn kill_tree(&mut self) -> Result<()> {
        if !self.config.new_process_group || self.pid == 0 {
            return self.kill().await;
        }
        debug!(pid = %self.pid, "Killing process tree");
        self.kill_group().await
    }

    #[cfg(unix)]
    async fn kill_group(&mut self) -> Result<()> {
        use nix::errno::Errno;
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        let pgid = Pid::from_raw(self.pid as i32);

        match killpg(pgid, Signal::SIGTERM) {
            Ok(()) => debug!(pid = %self.pid, "Sent SIGTERM to process group"),
            Err(Errno::ESRCH) => return Ok(()),
            Err(e) => {
                warn!(pid = %self.pid, error = %e, "Failed to send SIGTERM, killing process only");
                return self.kill().await;
            }
        }

        sleep(Duration::from_millis(SIGKILL_TIMEOUT_MS)).await;

        match killpg(pgid, Signal::SIGKILL) {
            Ok(()) => debug!(pid = %self.pid, "Sent SIGKILL to process group"),
            Err(Errno::ESRCH) => {}
            Err(e) => {
                warn!(pid = %self.pid, error = %e, "Failed to send SIGKILL, killing process only");
                self.kill().await?;
            }
        }

        Ok(())
    }

    #[cfg(not(unix))]
    async fn kill_group(&mut self) -> Result<()> {
        self.kill().await
    }

    /// Kill and reap after a timeout or cancellation; failures are only logged
    async fn terminate(&mut self) {
        if let Err(e) = self.kill_tree().await {
            warn!(pid = %self.pid, error = %e, "Failed to kill process");
        }
        if tokio::time::timeout(REAP_TIMEOUT, self.child.wait())
            .await
            .is_err()
        {
            warn!(pid = %self.pid, "Killed process did not exit in time");
        }
    }
}

/// Drive all three pipes concurrently, then reap the child
async fn collect(
    child: &mut Child,
    stdin: Option<ChildStdin>,
    input: Option<&[u8]>,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    limit: u64,
) -> io::Result<ProcessOutput> {
    let (fed, stdout, stderr) = tokio::join!(
        feed_stdin(stdin, input),
        read_pipe(stdout, limit),
        read_pipe(stderr, limit)
    );
    fed?;
    let status = child.wait().await?;

    Ok(ProcessOutput {
        status,
        stdout: stdout?,
        stderr: stderr?,
    })
}

async fn feed_stdin(stdin: Option<ChildStdin>, input: Option<&[u8]>) -> io::Result<()> {
    let (Some(mut pipe), Some(bytes)) = (stdin, input) else {
        return Ok(());
    };

    match pipe.write_all(bytes).await {
        // The child may exit without reading its input.
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

/// Keep at most `limit` bytes, then drain the rest so the child never blocks
/// on a full pipe
async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>, limit: u64) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let Some(mut pipe) = pipe else {
        return Ok(buf);
    };

    (&mut pipe).take(limit).read_to_end(&mut buf).await?;
    let discarded = tokio::io::copy(&mut pipe, &mut tokio::io::sink()).await?;
    if discarded > 0 {
        debug!(kept = buf.len(), discarded, "Output exceeded capture limit, truncated");
    }
    Ok(buf)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::ProcessManager;

    #[tokio::test]
    async fn test_is_running() {
        let manager = ProcessManager::new();
        let config = ProcessConfig::new("sleep").args(["1"]);

        let mut child = manager.spawn(config).await.unwrap();
        assert!(child.is_running());

        child.wait().await.unwrap();
        assert!(!child.is_running());
    }

    #[tokio::test]
    async fn test_shutdown() {
        let manager = ProcessManager::new();
        let config = ProcessConfig::new("sleep").args(["10"]);

        let mut child = manager.spawn(config).await.unwrap();
        assert!(child.is_running());

        child.shutdown().await.unwrap();
        assert!(!child.is_running());
    }

    #[tokio::test]
    async fn test_shutdown_process_group() {
        let manager = ProcessManager::new();
        let config = ProcessConfig::new("sh")
            .args(["-c", "sleep 10 & wait"])
            .new_process_group(true);

        let mut child = manager.spawn(config).await.unwrap();
        child.shutdown().await.unwrap();
        assert!(!child.is_running());
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let manager = ProcessManager::new();
        let config = ProcessConfig::new("sleep").args(["10"]).timeout_ms(50);

        let mut child = manager.spawn(config).await.unwrap();
        let result = child.wait().await;
        assert!(matches!(result, Err(ProcessError::Timeout { millis: 50 })));
        child.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_communicate_cancelled_kills_child() {
        let manager = ProcessManager::new();
        let config = ProcessConfig::new("sleep")
            .args(["10"])
            .new_process_group(true);

        let mut child = manager.spawn(config).await.unwrap();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let result = child.communicate(None, &cancel).await;
        assert!(matches!(result, Err(ProcessError::Cancelled)));
        assert!(!child.is_running());
    }

    #[tokio::test]
    async fn test_communicate_ignores_unread_stdin() {
        let manager = ProcessManager::new();
        let config = ProcessConfig::new("true").pipe_stdin(true);

        let mut child = manager.spawn(config).await.unwrap();
        let payload = vec![b'x'; 1 << 20];
        let output = child
            .communicate(Some(&payload), &CancellationToken::new())
            .await
            .unwrap();
        assert!(output.success());
        assert!(output.stdout.is_empty());
    }

    #[tokio::test]
    async fn test_communicate_caps_output() {
        let manager = ProcessManager::new();
        let config = ProcessConfig::new("sh")
            .args(["-c", "head -c 200000 /dev/zero; echo done >&2"])
            .max_output_bytes(1_000);

        let mut child = manager.spawn(config).await.unwrap();
        let output = child
            .communicate(None, &CancellationToken::new())
            .await
            .unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.len(), 1_000);
        assert_eq!(output.stderr_lossy(), "done\n");
    }

    #[tokio::test]
    async fn test_communicate_captures_stderr() {
        let manager = ProcessManager::new();
        let config = ProcessConfig::new("sh").args(["-c", "echo oops >&2"]);

        let mut child = manager.spawn(config).await.unwrap();
        let output = child
            .communicate(None, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(output.stderr_lossy(), "oops\n");
        assert!(output.stdout.is_empty());
    }
}

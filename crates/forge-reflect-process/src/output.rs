//! Captured result of a finished process

use std::process::ExitStatus;

/// Exit status plus whatever was captured from stdout/stderr
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Exit status of the child
    pub status: ExitStatus,
    /// Raw stdout bytes (empty when not captured)
    pub stdout: Vec<u8>,
    /// Raw stderr bytes (empty when not captured)
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    /// Whether the child exited with status zero
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Exit code, if the child was not killed by a signal
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    /// Stdout decoded as UTF-8, replacing invalid sequences
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Stderr decoded as UTF-8, replacing invalid sequences
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

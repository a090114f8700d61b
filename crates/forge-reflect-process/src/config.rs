//! Process configuration

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Default cap on bytes kept from each of stdout and stderr
pub const DEFAULT_MAX_OUTPUT_BYTES: u64 = 1024 * 1024;

/// Configuration for spawning a process
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    /// Executable to run (bare name resolved on PATH, or a path)
    pub command: PathBuf,
    /// Command arguments
    pub args: Vec<String>,
    /// Working directory (None = inherit)
    pub working_dir: Option<PathBuf>,
    /// Environment variables (added to parent env)
    pub env: HashMap<String, String>,
    /// Bounded wait for the whole run (None = wait forever)
    pub timeout: Option<Duration>,
    /// Pipe stdin; when false the child gets /dev/null
    pub pipe_stdin: bool,
    /// Capture stdout
    pub capture_stdout: bool,
    /// Capture stderr
    pub capture_stderr: bool,
    /// Start the child as leader of a new process group (Unix only)
    pub new_process_group: bool,
    /// Bytes kept per captured stream; the rest is read and discarded
    pub max_output_bytes: u64,
}

impl ProcessConfig {
    /// Create new process configuration
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            args: vec![],
            working_dir: None,
            env: HashMap::new(),
            timeout: None,
            pipe_stdin: false,
            capture_stdout: true,
            capture_stderr: true,
            new_process_group: false,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }

    /// Set command arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set working directory
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Add environment variable
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set timeout in milliseconds
    pub fn timeout_ms(mut self, millis: u64) -> Self {
        self.timeout = Some(Duration::from_millis(millis));
        self
    }

    /// Set timeout duration
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Enable/disable stdin piping
    pub fn pipe_stdin(mut self, pipe: bool) -> Self {
        self.pipe_stdin = pipe;
        self
    }

    /// Enable/disable stdout capture
    pub fn capture_stdout(mut self, capture: bool) -> Self {
        self.capture_stdout = capture;
        self
    }

    /// Enable/disable stderr capture
    pub fn capture_stderr(mut self, capture: bool) -> Self {
        self.capture_stderr = capture;
        self
    }

    /// Run the child in its own process group so the whole tree can be killed
    pub fn new_process_group(mut self, enabled: bool) -> Self {
        self.new_process_group = enabled;
        self
    }

    /// Cap the bytes kept from stdout and from stderr
    pub fn max_output_bytes(mut self, limit: u64) -> Self {
        self.max_output_bytes = limit;
        self
    }

    /// Silence the child entirely: no stdin, stdout or stderr
    pub fn quiet(self) -> Self {
        self.pipe_stdin(false)
            .capture_stdout(false)
            .capture_stderr(false)
    }

    /// Human-readable command name for logs
    pub fn display_name(&self) -> String {
        self.command.display().to_string()
    }
}

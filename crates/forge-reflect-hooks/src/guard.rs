//! Build-on-demand guard
//!
//! Makes sure the analysis tools exist before the first episode uses them.
//! A missing binary triggers exactly one quiet build; the outcome is a plain
//! boolean that the dispatcher caches for its lifetime.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use forge_reflect_process::{ProcessConfig, ProcessManager};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::DispatcherConfig,
    error::{DispatchError, Result},
    locator::{ModuleRoot, ToolSet},
};

/// Decides whether the tools are usable, building them if needed
#[async_trait]
pub trait BuildGuard: Send + Sync {
    /// True when all three tools are present and executable after at most one
    /// build attempt
    async fn ensure_ready(&self, tools: &ToolSet) -> bool;
}

/// Guard that runs `cargo build --release` (or a configured equivalent)
/// against the module root
#[derive(Debug, Clone)]
pub struct CargoBuildGuard {
    root: ModuleRoot,
    command: String,
    args: Vec<String>,
    timeout: Duration,
    manager: ProcessManager,
}

impl CargoBuildGuard {
    pub fn new(root: ModuleRoot, config: &DispatcherConfig) -> Self {
        let manifest_path = root.manifest_path();
        let args = config.resolved_build_args(&manifest_path.to_string_lossy());
        Self {
            root,
            command: config.build_command.clone(),
            args,
            timeout: config.build_timeout(),
            manager: ProcessManager::new(),
        }
    }

    /// Run the build once
    ///
    /// # Errors
    ///
    /// `BuildToolUnavailable` when the program is not on `PATH`, `Process` for
    /// spawn failures and timeouts, `NonZeroExit` when the build fails.
    pub async fn build(&self) -> Result<()> {
        let program = self.resolve_program()?;

        let config = ProcessConfig::new(program)
            .args(&self.args)
            .working_dir(self.root.as_path())
            .timeout(self.timeout)
            .new_process_group(true)
            .quiet();

        let output = self
            .manager
            .run(config, None, &CancellationToken::new())
            .await?;

        if !output.success() {
            return Err(DispatchError::NonZeroExit {
                tool: self.command.clone(),
                code: output.code(),
            });
        }
        Ok(())
    }

    fn resolve_program(&self) -> Result<PathBuf> {
        which::which(&self.command)
            .map_err(|e| DispatchError::BuildToolUnavailable(format!("{}: {}", self.command, e)))
    }
}

#[async_trait]
impl BuildGuard for CargoBuildGuard {
    async fn ensure_ready(&self, tools: &ToolSet) -> bool {
        if tools.probe() {
            debug!(bin_dir = %tools.bin_dir().display(), "Tools already built");
            return true;
        }

        info!(
            module_root = %self.root,
            command = %self.command,
            "Tools missing, building"
        );
        let start = Instant::now();

        match self.build().await {
            Ok(()) => {
                info!(
                    module_root = %self.root,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Tool build finished"
                );
                true
            }
            Err(e) => {
                warn!(
                    module_root = %self.root,
                    error = %e,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Tool build failed, dispatcher disabled"
                );
                false
            }
        }
    }
}

//! Dispatcher settings
//!
//! Every field has a compiled default, so an absent `config.yaml`, an absent
//! `dispatcher:` section, or a section that sets only a few keys all produce
//! a complete configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Token in `build_args` replaced by `<module root>/Cargo.toml`
pub const MANIFEST_PATH_TOKEN: &str = "{manifest_path}";

/// All configurable values for the dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Build output directory holding the tools, relative to the module root
    pub bin_dir: String,

    /// Binary name of the digest tool
    pub digest_tool: String,

    /// Binary name of the hard check
    pub hard_check_tool: String,

    /// Binary name of the soft check
    pub soft_check_tool: String,

    /// Environment variable carrying the module root to every tool
    pub module_root_env: String,

    /// Bounded wait for a single tool invocation
    pub invoke_timeout_ms: u64,

    /// Bounded wait for the one-shot build
    pub build_timeout_ms: u64,

    /// Bytes of tool stdout kept per invocation
    pub max_output_bytes: u64,

    /// Build program
    pub build_command: String,

    /// Build arguments; `{manifest_path}` is substituted
    pub build_args: Vec<String>,

    /// Prefix for block notifications
    pub notification_prefix: String,

    /// Trigger tag sent with the compaction payload
    pub compaction_trigger: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            bin_dir: "target/release".to_string(),
            digest_tool: "surface".to_string(),
            hard_check_tool: "insight".to_string(),
            soft_check_tool: "reflect".to_string(),
            module_root_env: "FORGE_MODULE_ROOT".to_string(),
            invoke_timeout_ms: 5_000,
            build_timeout_ms: 600_000,
            max_output_bytes: 1_048_576,
            build_command: "cargo".to_string(),
            build_args: vec![
                "build".to_string(),
                "--release".to_string(),
                "--manifest-path".to_string(),
                MANIFEST_PATH_TOKEN.to_string(),
            ],
            notification_prefix: "forge-reflect: ".to_string(),
            compaction_trigger: "auto".to_string(),
        }
    }
}

impl DispatcherConfig {
    pub fn invoke_timeout(&self) -> Duration {
        Duration::from_millis(self.invoke_timeout_ms)
    }

    pub fn build_timeout(&self) -> Duration {
        Duration::from_millis(self.build_timeout_ms)
    }

    /// Build arguments with the manifest path substituted
    pub fn resolved_build_args(&self, manifest_path: &str) -> Vec<String> {
        self.build_args
            .iter()
            .map(|arg| arg.replace(MANIFEST_PATH_TOKEN, manifest_path))
            .collect()
    }
}

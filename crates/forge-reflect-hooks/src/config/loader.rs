//! Configuration loader for the dispatcher
//!
//! The dispatcher shares `config.yaml` with the analysis tools. The tools
//! ignore keys they do not know, so dispatcher settings live in their own
//! `dispatcher:` section of the same file at the module root.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::config::{ConfigValidator, DispatcherConfig};
use crate::error::Result;

/// File name looked up under the module root
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Top-level YAML key holding dispatcher settings
pub const CONFIG_SECTION: &str = "dispatcher";

/// Configuration loader for the dispatcher
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load settings from `<module_root>/config.yaml`
    ///
    /// A missing file or a file without a `dispatcher:` section yields the
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns `IoError` if the file cannot be read, `SerializationError` if
    /// it is not valid YAML or the section has the wrong shape, and
    /// `InvalidConfiguration` if the values fail validation.
    pub fn load(module_root: &Path) -> Result<DispatcherConfig> {
        let path = module_root.join(CONFIG_FILE_NAME);
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(DispatcherConfig::default());
        }

        let content = fs::read_to_string(&path)?;
        let config = Self::parse_yaml(&content)?;
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Load settings, falling back to defaults on any error
    ///
    /// Configuration problems must not stop the host session, so errors are
    /// logged and discarded.
    pub fn load_or_default(module_root: &Path) -> DispatcherConfig {
        match Self::load(module_root) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    module_root = %module_root.display(),
                    error = %e,
                    "Dispatcher config unusable, using defaults"
                );
                DispatcherConfig::default()
            }
        }
    }

    /// Parse YAML configuration content
    ///
    /// Expected YAML format:
    /// ```yaml
    /// insight_marker: "★ Insight"      # read by the tools, ignored here
    /// dispatcher:
    ///   bin_dir: target/release
    ///   invoke_timeout_ms: 3000
    ///   notification_prefix: "forge-reflect: "
    /// ```
    pub fn parse_yaml(content: &str) -> Result<DispatcherConfig> {
        let value: serde_yaml::Value = serde_yaml::from_str(content)?;

        match value.get(CONFIG_SECTION) {
            None | Some(serde_yaml::Value::Null) => Ok(DispatcherConfig::default()),
            Some(section) => Ok(serde_yaml::from_value(section.clone())?),
        }
    }
}

//! Configuration validation for the dispatcher
//!
//! Rejects settings that would make every episode fail in a confusing way.

use crate::config::DispatcherConfig;
use crate::error::{DispatchError, Result};

/// Configuration validator for the dispatcher
///
/// Checks that:
/// - Tool names are non-empty and distinct
/// - The build output directory and environment variable are set
/// - Timeouts are greater than zero
/// - A build command is configured
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a full configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` describing the first problem found.
    pub fn validate(config: &DispatcherConfig) -> Result<()> {
        Self::validate_tool_names(config)?;

        if config.bin_dir.trim().is_empty() {
            return Err(DispatchError::InvalidConfiguration(
                "bin_dir cannot be empty".to_string(),
            ));
        }

        if config.module_root_env.trim().is_empty() || config.module_root_env.contains('=') {
            return Err(DispatchError::InvalidConfiguration(format!(
                "Invalid module_root_env: '{}'",
                config.module_root_env
            )));
        }

        if config.invoke_timeout_ms == 0 {
            return Err(DispatchError::InvalidConfiguration(
                "invoke_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if config.build_timeout_ms == 0 {
            return Err(DispatchError::InvalidConfiguration(
                "build_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if config.max_output_bytes == 0 {
            return Err(DispatchError::InvalidConfiguration(
                "max_output_bytes must be greater than 0".to_string(),
            ));
        }

        if config.build_command.trim().is_empty() {
            return Err(DispatchError::InvalidConfiguration(
                "build_command cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_tool_names(config: &DispatcherConfig) -> Result<()> {
        let names = [
            ("digest_tool", &config.digest_tool),
            ("hard_check_tool", &config.hard_check_tool),
            ("soft_check_tool", &config.soft_check_tool),
        ];

        for (key, name) in names {
            if name.trim().is_empty() {
                return Err(DispatchError::InvalidConfiguration(format!(
                    "{} cannot be empty",
                    key
                )));
            }
            if name.contains('/') || name.contains('\\') {
                return Err(DispatchError::InvalidConfiguration(format!(
                    "{} must be a file name, not a path: '{}'",
                    key, name
                )));
            }
        }

        for (i, (key, name)) in names.iter().enumerate() {
            if let Some((other, _)) = names[i + 1..].iter().find(|(_, n)| n == name) {
                return Err(DispatchError::InvalidConfiguration(format!(
                    "{} and {} both name '{}'",
                    key, other, name
                )));
            }
        }

        Ok(())
    }
}

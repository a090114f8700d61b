//! Verdict interpretation
//!
//! Tool stdout is untrusted: it may be empty, free text, a JSON scalar, or a
//! JSON object with any mix of fields. Only a JSON object decodes to a
//! [`Verdict`]; everything else means "no verdict".

use serde_json::Value;
use tracing::debug;

use crate::types::Verdict;

/// Decodes tool output into an optional verdict
pub struct VerdictInterpreter;

impl VerdictInterpreter {
    /// Parse captured stdout
    ///
    /// Never fails: empty, non-JSON and non-object output all yield `None`.
    pub fn parse(text: &str) -> Option<Verdict> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        let value: Value = match serde_json::from_str(trimmed) {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, output_length = trimmed.len(), "Tool output is not JSON");
                return None;
            }
        };

        if !value.is_object() {
            debug!("Tool output is JSON but not an object");
            return None;
        }

        match serde_json::from_value::<Verdict>(value) {
            Ok(verdict) => Some(verdict),
            Err(e) => {
                debug!(error = %e, "Tool output did not decode as a verdict");
                None
            }
        }
    }
}

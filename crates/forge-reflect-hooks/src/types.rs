//! Core data types for the dispatcher
//!
//! This module defines the values that flow through one episode: the tool
//! being invoked, the JSON payloads written to its stdin, the verdict decoded
//! from its stdout, and the single outward action handed back to the host.
//!
//! # Examples
//!
//! ```ignore
//! use forge_reflect_hooks::*;
//!
//! let verdict = VerdictInterpreter::parse(r#"{"decision":"block","reason":"no learnings"}"#)
//!     .expect("valid verdict");
//! assert!(verdict.is_block());
//!
//! let action = OutwardAction::notify(format!("forge-reflect: {}", verdict.reason()), Severity::Warn);
//! assert_eq!(
//!     serde_json::to_value(action.to_host_request().unwrap()).unwrap()["type"],
//!     "tui.toast.show",
//! );
//! ```

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One of the three external analysis tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolKind {
    /// Produces the session-start digest (`surface`)
    Digest,
    /// Hard rule check whose block always wins (`insight`)
    HardCheck,
    /// Advisory heuristic, consulted when the hard check is silent (`reflect`)
    SoftCheck,
}

impl ToolKind {
    /// All tools in probe order
    pub const ALL: [ToolKind; 3] = [ToolKind::Digest, ToolKind::HardCheck, ToolKind::SoftCheck];

    /// Stable label used in logs
    pub fn label(self) -> &'static str {
        match self {
            ToolKind::Digest => "digest",
            ToolKind::HardCheck => "hard-check",
            ToolKind::SoftCheck => "soft-check",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single tool invocation, built fresh per call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    /// Which tool is being consulted
    pub kind: ToolKind,

    /// Resolved executable path
    pub path: PathBuf,

    /// Optional stdin payload (normally JSON)
    pub input: Option<String>,
}

/// Stdin payload for the idle (stop) checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdlePayload {
    /// Working directory of the session
    pub cwd: String,

    /// Session transcript location; sent empty until the host exposes one
    pub transcript_path: String,
}

impl IdlePayload {
    pub fn new(cwd: impl Into<String>) -> Self {
        Self {
            cwd: cwd.into(),
            transcript_path: String::new(),
        }
    }
}

/// Stdin payload for the pre-compaction reflection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactingPayload {
    /// Working directory of the session
    pub cwd: String,

    /// Why compaction is happening ("auto" for host-initiated compaction)
    pub trigger: String,
}

/// Decision field of a verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Block,
    /// Any other value; treated like `Allow`
    Other,
}

/// Structured verdict a tool may print on stdout
///
/// Every field is optional and decoded leniently, so one odd field never
/// discards the rest of the verdict. An unexpected decision string becomes
/// [`Decision::Other`]. A non-string `reason` is rendered as JSON text, while
/// a non-string `additionalContext` counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// `allow`, `block`, or anything else
    #[serde(default, deserialize_with = "lenient_decision")]
    pub decision: Option<Decision>,

    /// Human-readable reason, shown when the verdict blocks
    #[serde(default, deserialize_with = "lenient_text")]
    pub reason: Option<String>,

    /// Context to inject before compaction
    #[serde(
        default,
        rename = "additionalContext",
        deserialize_with = "string_only"
    )]
    pub additional_context: Option<String>,
}

impl Verdict {
    /// Whether this verdict asks the host to stop and reflect
    pub fn is_block(&self) -> bool {
        self.decision == Some(Decision::Block)
    }

    /// Reason text, empty when the tool gave none
    pub fn reason(&self) -> &str {
        self.reason.as_deref().unwrap_or_default()
    }

    /// Additional context, if present and non-empty
    pub fn context(&self) -> Option<&str> {
        self.additional_context
            .as_deref()
            .filter(|text| !text.is_empty())
    }
}

fn lenient_decision<'de, D>(deserializer: D) -> std::result::Result<Option<Decision>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.map(|value| match value.as_str() {
        Some("block") => Decision::Block,
        Some("allow") => Decision::Allow,
        _ => Decision::Other,
    }))
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}

fn string_only<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text),
        _ => None,
    })
}

/// Toast severity understood by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warn,
}

/// The single result of handling one event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutwardAction {
    /// Nothing reaches the user
    #[default]
    None,

    /// Show a toast
    ShowNotification { message: String, severity: Severity },

    /// Append text to the host's pre-compaction context
    InjectContext(String),
}

impl OutwardAction {
    /// Shorthand for a toast
    pub fn notify(message: impl Into<String>, severity: Severity) -> Self {
        OutwardAction::ShowNotification {
            message: message.into(),
            severity,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, OutwardAction::None)
    }

    /// Request the host should receive for this action
    ///
    /// Only notifications travel as requests; injected context is applied to
    /// [`CompactionOutput`] instead.
    pub fn to_host_request(&self) -> Option<HostRequest> {
        match self {
            OutwardAction::ShowNotification { message, severity } => Some(HostRequest::ShowToast {
                toast: Toast {
                    message: message.clone(),
                    level: *severity,
                },
            }),
            OutwardAction::None | OutwardAction::InjectContext(_) => None,
        }
    }
}

/// Toast body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub message: String,
    pub level: Severity,
}

/// Requests sent back to the host application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HostRequest {
    #[serde(rename = "tui.toast.show")]
    ShowToast { toast: Toast },
}

/// Host-owned collection of context strings used before compaction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactionOutput {
    pub context: Vec<String>,
}

impl CompactionOutput {
    /// Append injected context; returns whether anything was appended
    pub fn absorb(&mut self, action: OutwardAction) -> bool {
        match action {
            OutwardAction::InjectContext(text) => {
                self.context.push(text);
                true
            }
            OutwardAction::None | OutwardAction::ShowNotification { .. } => false,
        }
    }
}

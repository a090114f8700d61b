//! forge-reflect session dispatcher
//!
//! Bridges an interactive coding host's session lifecycle to three external
//! analysis tools and turns their output into at most one outward action per
//! event.
//!
//! # Overview
//!
//! The host reports three events. Each one starts an episode:
//!
//! - **session created**: run the digest tool and show its output as an info toast
//! - **session idle**: run the hard check, then (only if it did not block) the
//!   soft check; a blocking verdict becomes a warning toast
//! - **session compacting**: run the soft check and append its
//!   `additionalContext` to the host's compaction context
//!
//! Before the first episode the dispatcher makes sure the tools exist,
//! building them once if necessary. If that fails every episode is a no-op.
//!
//! # Architecture
//!
//! 1. **Locator** (`locator`): resolves tool paths under the module root
//! 2. **Build guard** (`guard`): one-shot readiness check and build
//! 3. **Executor** (`executor`): runs a tool with a bounded wait
//! 4. **Verdict interpreter** (`verdict`): decodes tool stdout
//! 5. **Dispatcher** (`dispatcher`): routes events and picks the action
//! 6. **Configuration** (`config`): `dispatcher:` section of `config.yaml`
//!
//! # Quick Start
//!
//! ```ignore
//! use forge_reflect_hooks::{CompactionOutput, SessionDispatcher, SessionEvent};
//!
//! let dispatcher = SessionDispatcher::from_host(worktree, &directory);
//!
//! let action = dispatcher
//!     .dispatch(SessionEvent::Idle { cwd: directory.clone() })
//!     .await;
//! if let Some(request) = action.to_host_request() {
//!     host.send(serde_json::to_value(request)?);
//! }
//!
//! let mut output = CompactionOutput::default();
//! dispatcher.apply_compaction(&directory, &mut output).await;
//! ```
//!
//! # Error Handling
//!
//! Nothing surfaces to the host. Internals return `Result<T>` (an alias for
//! `std::result::Result<T, DispatchError>`); the dispatcher logs failures with
//! `tracing` and degrades to [`OutwardAction::None`].
//!
//! # Thread Safety
//!
//! [`SessionDispatcher`] is `Send + Sync` and can be shared behind an `Arc`.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod executor;
pub mod guard;
pub mod locator;
pub mod types;
pub mod verdict;

// Re-export public types
pub use config::{ConfigLoader, ConfigValidator, DispatcherConfig};
pub use dispatcher::{EventDispatcher, SessionDispatcher};
pub use error::{DispatchError, Result};
pub use events::SessionEvent;
pub use executor::{SubprocessToolRunner, ToolRunner};
pub use guard::{BuildGuard, CargoBuildGuard};
pub use locator::{ModuleRoot, ToolSet};
pub use types::{
    CompactingPayload, CompactionOutput, Decision, HostRequest, IdlePayload, InvocationRequest,
    OutwardAction, Severity, Toast, ToolKind, Verdict,
};
pub use verdict::VerdictInterpreter;

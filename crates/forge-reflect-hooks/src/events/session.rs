//! Session events understood by the dispatcher

use std::fmt;

/// Host name of the session-start event
pub const CREATED: &str = "session.created";

/// Host name of the turn-finished event
pub const IDLE: &str = "session.idle";

/// Host name of the pre-compaction event
pub const COMPACTING: &str = "experimental.session.compacting";

/// A lifecycle event that triggers one episode
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    /// A session started
    Created,

    /// The agent finished a turn in `cwd`
    Idle { cwd: String },

    /// The host is about to compact the conversation in `cwd`
    Compacting { cwd: String },
}

impl SessionEvent {
    /// Map a host event name to an event
    ///
    /// Returns `None` for names the dispatcher does not handle.
    pub fn from_host(event_type: &str, cwd: impl Into<String>) -> Option<Self> {
        match event_type {
            CREATED => Some(SessionEvent::Created),
            IDLE => Some(SessionEvent::Idle { cwd: cwd.into() }),
            COMPACTING => Some(SessionEvent::Compacting { cwd: cwd.into() }),
            _ => None,
        }
    }

    /// Host name of this event
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::Created => CREATED,
            SessionEvent::Idle { .. } => IDLE,
            SessionEvent::Compacting { .. } => COMPACTING,
        }
    }
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

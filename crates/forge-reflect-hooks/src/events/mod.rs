//! Host lifecycle events
//!
//! The host reports session events by name. Only three of them matter to the
//! dispatcher; they parse into [`SessionEvent`] and everything else is ignored.

pub mod session;

pub use session::{SessionEvent, COMPACTING, CREATED, IDLE};

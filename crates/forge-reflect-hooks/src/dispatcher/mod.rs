//! Event dispatcher for session lifecycle events

pub mod event;

pub use event::SessionDispatcher;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::events::SessionEvent;
use crate::types::OutwardAction;

/// Trait for dispatching session events to the analysis tools
///
/// The EventDispatcher is responsible for:
/// 1. Ensuring the tools are ready, once per instance
/// 2. Routing each event to its handler
/// 3. Turning tool output into at most one outward action
///
/// Dispatch never fails. Unavailable tools, failed invocations and malformed
/// output all resolve to [`OutwardAction::None`].
///
/// # Examples
///
/// ```ignore
/// let dispatcher = SessionDispatcher::from_host(Some("/work"), "/work");
/// let action = dispatcher
///     .dispatch_event(SessionEvent::Idle { cwd: "/work".into() }, &CancellationToken::new())
///     .await;
/// if let Some(request) = action.to_host_request() {
///     host.send(request);
/// }
/// ```
#[async_trait]
pub trait EventDispatcher: Send + Sync {
    /// Handle one event; resolves to `None` if `cancel` fires at any point
    async fn dispatch_event(&self, event: SessionEvent, cancel: &CancellationToken)
        -> OutwardAction;
}

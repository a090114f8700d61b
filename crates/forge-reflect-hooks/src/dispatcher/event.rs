//! Session event routing

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::{ConfigLoader, DispatcherConfig},
    error::Result,
    events::SessionEvent,
    executor::{SubprocessToolRunner, ToolRunner},
    guard::{BuildGuard, CargoBuildGuard},
    locator::{ModuleRoot, ToolSet},
    types::{
        CompactingPayload, CompactionOutput, IdlePayload, InvocationRequest, OutwardAction,
        Severity, ToolKind,
    },
    verdict::VerdictInterpreter,
};

/// Dispatcher bound to one module root
///
/// Readiness is decided by the build guard on the first episode and cached
/// for the life of the instance. The guard runs as its own task, so every
/// episode shares one guard run and an episode that is cancelled or dropped
/// while waiting does not abandon it. Dispatching therefore needs a tokio
/// runtime. The dispatcher is `Send + Sync` and can be shared behind an `Arc`.
pub struct SessionDispatcher {
    root: ModuleRoot,
    tools: ToolSet,
    config: DispatcherConfig,
    guard: Arc<dyn BuildGuard>,
    runner: Arc<dyn ToolRunner>,
    readiness: OnceLock<watch::Receiver<Option<bool>>>,
}

impl SessionDispatcher {
    /// Create a dispatcher that builds with cargo and runs real subprocesses
    pub fn new(root: ModuleRoot, config: DispatcherConfig) -> Self {
        let guard = Arc::new(CargoBuildGuard::new(root.clone(), &config));
        let runner = Arc::new(SubprocessToolRunner::new(root.clone(), &config));
        Self::with_components(root, config, guard, runner)
    }

    /// Create a dispatcher from what the host reports about the session
    ///
    /// The module root is the worktree when there is one, otherwise the
    /// directory. Settings come from `config.yaml` at that root; an unusable
    /// file is logged and replaced by defaults.
    pub fn from_host(worktree: Option<&str>, directory: &str) -> Self {
        let root = ModuleRoot::from_host(worktree, directory);
        let config = ConfigLoader::load_or_default(root.as_path());
        Self::new(root, config)
    }

    /// Create a dispatcher with explicit guard and runner
    pub fn with_components(
        root: ModuleRoot,
        config: DispatcherConfig,
        guard: Arc<dyn BuildGuard>,
        runner: Arc<dyn ToolRunner>,
    ) -> Self {
        let tools = ToolSet::resolve(&root, &config);
        debug!(
            module_root = %root,
            bin_dir = %tools.bin_dir().display(),
            "Dispatcher created"
        );
        Self {
            root,
            tools,
            config,
            guard,
            runner,
            readiness: OnceLock::new(),
        }
    }

    pub fn module_root(&self) -> &ModuleRoot {
        &self.root
    }

    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Cached readiness, `None` until the guard has finished
    pub fn readiness(&self) -> Option<bool> {
        self.readiness.get().and_then(|rx| *rx.borrow())
    }

    /// Whether the tools are usable, consulting the guard on first call only
    pub async fn is_ready(&self) -> bool {
        let mut rx = self.readiness_watch();
        let decided = rx.wait_for(Option::is_some).await.map(|ready| *ready);
        match decided {
            Ok(ready) => ready.unwrap_or(false),
            Err(_) => {
                warn!(module_root = %self.root, "Readiness check ended without a result");
                false
            }
        }
    }

    /// Receiver for the guard's verdict, starting the guard task on first use
    fn readiness_watch(&self) -> watch::Receiver<Option<bool>> {
        self.readiness
            .get_or_init(|| {
                let (tx, rx) = watch::channel(None);
                let guard = Arc::clone(&self.guard);
                let tools = self.tools.clone();
                let root = self.root.clone();
                tokio::spawn(async move {
                    let ready = guard.ensure_ready(&tools).await;
                    info!(module_root = %root, ready, "Tool readiness decided");
                    let _ = tx.send(Some(ready));
                });
                rx
            })
            .clone()
    }

    /// Handle one event with a fresh cancellation token
    pub async fn dispatch(&self, event: SessionEvent) -> OutwardAction {
        self.dispatch_with_cancel(event, &CancellationToken::new())
            .await
    }

    /// Handle one event by its host name
    ///
    /// Unrecognised names produce no event and therefore no action.
    pub async fn dispatch_named(&self, event_type: &str, cwd: &str) -> OutwardAction {
        match SessionEvent::from_host(event_type, cwd) {
            Some(event) => self.dispatch(event).await,
            None => {
                debug!(event_type, "Ignoring unhandled host event");
                OutwardAction::None
            }
        }
    }

    /// Handle one event; resolves to `None` if `cancel` fires at any point
    pub async fn dispatch_with_cancel(
        &self,
        event: SessionEvent,
        cancel: &CancellationToken,
    ) -> OutwardAction {
        if cancel.is_cancelled() {
            debug!(event = %event, "Episode cancelled before start");
            return OutwardAction::None;
        }

        let ready = tokio::select! {
            ready = self.is_ready() => ready,
            _ = cancel.cancelled() => {
                debug!(event = %event, "Episode cancelled while waiting for readiness");
                return OutwardAction::None;
            }
        };
        if !ready {
            debug!(event = %event, "Tools unavailable, skipping event");
            return OutwardAction::None;
        }

        debug!(event = %event, "Dispatching event");
        let action = match &event {
            SessionEvent::Created => self.on_created(cancel).await,
            SessionEvent::Idle { cwd } => self.on_idle(cwd, cancel).await,
            SessionEvent::Compacting { cwd } => self.on_compacting(cwd, cancel).await,
        };

        if cancel.is_cancelled() {
            debug!(event = %event, "Episode cancelled, dropping result");
            return OutwardAction::None;
        }

        if !action.is_none() {
            info!(event = %event, action = ?action, "Event produced action");
        }
        action
    }

    /// Run the compacting handler and append any injected context to `output`
    ///
    /// Returns whether context was appended.
    pub async fn apply_compaction(&self, cwd: &str, output: &mut CompactionOutput) -> bool {
        let action = self
            .dispatch(SessionEvent::Compacting {
                cwd: cwd.to_string(),
            })
            .await;
        output.absorb(action)
    }

    async fn on_created(&self, cancel: &CancellationToken) -> OutwardAction {
        let text = self.invoke(ToolKind::Digest, None, cancel).await;
        let digest = text.trim();
        if digest.is_empty() {
            return OutwardAction::None;
        }
        OutwardAction::notify(digest, Severity::Info)
    }

    async fn on_idle(&self, cwd: &str, cancel: &CancellationToken) -> OutwardAction {
        let Some(payload) = encode_or_log(&IdlePayload::new(cwd)) else {
            return OutwardAction::None;
        };

        for kind in [ToolKind::HardCheck, ToolKind::SoftCheck] {
            if cancel.is_cancelled() {
                return OutwardAction::None;
            }

            let text = self.invoke(kind, Some(payload.clone()), cancel).await;
            if let Some(verdict) = VerdictInterpreter::parse(&text) {
                if verdict.is_block() {
                    debug!(tool = %kind, "Check blocked");
                    return OutwardAction::notify(
                        format!("{}{}", self.config.notification_prefix, verdict.reason()),
                        Severity::Warn,
                    );
                }
            }
        }

        OutwardAction::None
    }

    async fn on_compacting(&self, cwd: &str, cancel: &CancellationToken) -> OutwardAction {
        let payload = CompactingPayload {
            cwd: cwd.to_string(),
            trigger: self.config.compaction_trigger.clone(),
        };
        let Some(payload) = encode_or_log(&payload) else {
            return OutwardAction::None;
        };

        let text = self.invoke(ToolKind::SoftCheck, Some(payload), cancel).await;
        VerdictInterpreter::parse(&text)
            .and_then(|verdict| verdict.context().map(str::to_string))
            .map_or(OutwardAction::None, OutwardAction::InjectContext)
    }

    async fn invoke(
        &self,
        kind: ToolKind,
        input: Option<String>,
        cancel: &CancellationToken,
    ) -> String {
        let request = InvocationRequest {
            kind,
            path: self.tools.path(kind).to_path_buf(),
            input,
        };
        self.runner.run(request, cancel).await
    }
}

#[async_trait]
impl super::EventDispatcher for SessionDispatcher {
    async fn dispatch_event(
        &self,
        event: SessionEvent,
        cancel: &CancellationToken,
    ) -> OutwardAction {
        self.dispatch_with_cancel(event, cancel).await
    }
}

/// Serialize a stdin payload as compact JSON
fn encode<T: Serialize>(payload: &T) -> Result<String> {
    Ok(serde_json::to_string(payload)?)
}

fn encode_or_log<T: Serialize>(payload: &T) -> Option<String> {
    match encode(payload) {
        Ok(json) => Some(json),
        Err(e) => {
            warn!(error = %e, "Failed to encode tool payload");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    use super::*;
    use crate::dispatcher::EventDispatcher;
    use crate::error::DispatchError;

    struct CountingGuard {
        ready: bool,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl CountingGuard {
        fn new(ready: bool) -> Arc<Self> {
            Self::slow(ready, Duration::from_millis(10))
        }

        fn slow(ready: bool, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                ready,
                delay,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BuildGuard for CountingGuard {
        async fn ensure_ready(&self, _tools: &ToolSet) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.ready
        }
    }

    #[derive(Default)]
    struct ScriptedRunner {
        outputs: HashMap<ToolKind, String>,
        cancel_during: Option<ToolKind>,
        requests: Mutex<Vec<InvocationRequest>>,
    }

    impl ScriptedRunner {
        fn with(outputs: &[(ToolKind, &str)]) -> Self {
            Self {
                outputs: outputs
                    .iter()
                    .map(|(kind, text)| (*kind, text.to_string()))
                    .collect(),
                ..Self::default()
            }
        }

        fn invoked(&self) -> Vec<ToolKind> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.kind)
                .collect()
        }

        fn inputs(&self) -> Vec<Option<String>> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.input.clone())
                .collect()
        }
    }

    #[async_trait]
    impl ToolRunner for ScriptedRunner {
        async fn run(&self, request: InvocationRequest, cancel: &CancellationToken) -> String {
            let kind = request.kind;
            self.requests.lock().unwrap().push(request);
            if self.cancel_during == Some(kind) {
                cancel.cancel();
            }
            self.outputs.get(&kind).cloned().unwrap_or_default()
        }
    }

    fn dispatcher(guard: Arc<CountingGuard>, runner: Arc<ScriptedRunner>) -> SessionDispatcher {
        dispatcher_with_config(guard, runner, DispatcherConfig::default())
    }

    fn dispatcher_with_config(
        guard: Arc<CountingGuard>,
        runner: Arc<ScriptedRunner>,
        config: DispatcherConfig,
    ) -> SessionDispatcher {
        SessionDispatcher::with_components(ModuleRoot::new("/work"), config, guard, runner)
    }

    fn idle() -> SessionEvent {
        SessionEvent::Idle {
            cwd: "/work".to_string(),
        }
    }

    fn compacting() -> SessionEvent {
        SessionEvent::Compacting {
            cwd: "/work".to_string(),
        }
    }

    #[tokio::test]
    async fn test_readiness_computed_once() {
        let guard = CountingGuard::new(true);
        let runner = Arc::new(ScriptedRunner::default());
        let dispatcher = dispatcher(guard.clone(), runner);

        assert_eq!(dispatcher.readiness(), None);
        dispatcher.dispatch(SessionEvent::Created).await;
        dispatcher.dispatch(idle()).await;
        dispatcher.dispatch(compacting()).await;

        assert_eq!(guard.calls(), 1);
        assert_eq!(dispatcher.readiness(), Some(true));
    }

    #[tokio::test]
    async fn test_concurrent_first_episodes_share_guard_run() {
        let guard = CountingGuard::new(true);
        let runner = Arc::new(ScriptedRunner::default());
        let dispatcher = dispatcher(guard.clone(), runner);

        tokio::join!(
            dispatcher.dispatch(SessionEvent::Created),
            dispatcher.dispatch(idle())
        );
        assert_eq!(guard.calls(), 1);
    }

    #[tokio::test]
    async fn test_cancel_while_guard_runs_returns_promptly() {
        let guard = CountingGuard::slow(true, Duration::from_secs(1));
        let runner = Arc::new(ScriptedRunner::with(&[(ToolKind::Digest, "digest")]));
        let dispatcher = dispatcher(guard.clone(), runner.clone());

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let action = dispatcher
            .dispatch_with_cancel(SessionEvent::Created, &cancel)
            .await;

        assert!(action.is_none());
        assert!(start.elapsed() < Duration::from_millis(800));
        assert!(runner.invoked().is_empty());
        assert_eq!(dispatcher.readiness(), None);

        // The guard run carries on for later episodes
        assert_eq!(
            dispatcher.dispatch(SessionEvent::Created).await,
            OutwardAction::notify("digest", Severity::Info)
        );
        assert_eq!(guard.calls(), 1);
    }

    #[tokio::test]
    async fn test_dropped_first_episode_keeps_guard_run() {
        let guard = CountingGuard::slow(true, Duration::from_millis(300));
        let runner = Arc::new(ScriptedRunner::with(&[(ToolKind::Digest, "digest")]));
        let dispatcher = dispatcher(guard.clone(), runner);

        let first = tokio::time::timeout(
            Duration::from_millis(50),
            dispatcher.dispatch(SessionEvent::Created),
        )
        .await;
        assert!(first.is_err());

        assert_eq!(
            dispatcher.dispatch(SessionEvent::Created).await,
            OutwardAction::notify("digest", Severity::Info)
        );
        assert_eq!(guard.calls(), 1);
        assert_eq!(dispatcher.readiness(), Some(true));
    }

    #[test]
    fn test_encode_reports_json_error() {
        let payload: HashMap<(u8, u8), u8> = HashMap::from([((1, 2), 3)]);
        assert!(matches!(encode(&payload), Err(DispatchError::JsonError(_))));
        assert!(encode_or_log(&payload).is_none());
        assert_eq!(
            encode(&IdlePayload::new("/work")).unwrap(),
            r#"{"cwd":"/work","transcript_path":""}"#
        );
    }

    #[tokio::test]
    async fn test_not_ready_invokes_nothing() {
        let guard = CountingGuard::new(false);
        let runner = Arc::new(ScriptedRunner::with(&[
            (ToolKind::Digest, "digest"),
            (ToolKind::HardCheck, r#"{"decision":"block","reason":"X"}"#),
            (ToolKind::SoftCheck, r#"{"additionalContext":"note"}"#),
        ]));
        let dispatcher = dispatcher(guard.clone(), runner.clone());

        assert!(dispatcher.dispatch(SessionEvent::Created).await.is_none());
        assert!(dispatcher.dispatch(idle()).await.is_none());
        assert!(dispatcher.dispatch(compacting()).await.is_none());

        assert!(runner.invoked().is_empty());
        assert_eq!(guard.calls(), 1);
        assert_eq!(dispatcher.readiness(), Some(false));
    }

    #[tokio::test]
    async fn test_created_trims_digest() {
        let runner = Arc::new(ScriptedRunner::with(&[(ToolKind::Digest, "  hello\n")]));
        let dispatcher = dispatcher(CountingGuard::new(true), runner.clone());

        assert_eq!(
            dispatcher.dispatch(SessionEvent::Created).await,
            OutwardAction::notify("hello", Severity::Info)
        );
        assert_eq!(runner.invoked(), vec![ToolKind::Digest]);
        assert_eq!(runner.inputs(), vec![None]);
    }

    #[tokio::test]
    async fn test_created_blank_digest_is_none() {
        for output in ["", "   \n\t"] {
            let runner = Arc::new(ScriptedRunner::with(&[(ToolKind::Digest, output)]));
            let dispatcher = dispatcher(CountingGuard::new(true), runner);
            assert!(dispatcher.dispatch(SessionEvent::Created).await.is_none());
        }
    }

    #[tokio::test]
    async fn test_idle_hard_block_short_circuits() {
        let runner = Arc::new(ScriptedRunner::with(&[
            (ToolKind::HardCheck, r#"{"decision":"block","reason":"X"}"#),
            (ToolKind::SoftCheck, r#"{"decision":"block","reason":"Y"}"#),
        ]));
        let dispatcher = dispatcher(CountingGuard::new(true), runner.clone());

        assert_eq!(
            dispatcher.dispatch(idle()).await,
            OutwardAction::notify("forge-reflect: X", Severity::Warn)
        );
        assert_eq!(runner.invoked(), vec![ToolKind::HardCheck]);
    }

    #[tokio::test]
    async fn test_idle_soft_block_after_silent_hard_check() {
        let runner = Arc::new(ScriptedRunner::with(&[(
            ToolKind::SoftCheck,
            r#"{"decision":"block","reason":"Y"}"#,
        )]));
        let dispatcher = dispatcher(CountingGuard::new(true), runner.clone());

        assert_eq!(
            dispatcher.dispatch(idle()).await,
            OutwardAction::notify("forge-reflect: Y", Severity::Warn)
        );
        assert_eq!(
            runner.invoked(),
            vec![ToolKind::HardCheck, ToolKind::SoftCheck]
        );
    }

    #[tokio::test]
    async fn test_idle_sends_same_payload_to_both_checks() {
        let runner = Arc::new(ScriptedRunner::default());
        let dispatcher = dispatcher(CountingGuard::new(true), runner.clone());

        dispatcher.dispatch(idle()).await;

        let expected = serde_json::json!({ "cwd": "/work", "transcript_path": "" });
        let inputs = runner.inputs();
        assert_eq!(inputs.len(), 2);
        for input in inputs {
            let value: serde_json::Value = serde_json::from_str(&input.unwrap()).unwrap();
            assert_eq!(value, expected);
        }
    }

    #[tokio::test]
    async fn test_idle_without_block_is_none() {
        let cases = [
            ("", ""),
            (r#"{"decision":"allow","reason":"fine"}"#, r#"{"decision":"approve"}"#),
            ("not json", "{broken"),
            ("42", "[]"),
        ];

        for (hard, soft) in cases {
            let runner = Arc::new(ScriptedRunner::with(&[
                (ToolKind::HardCheck, hard),
                (ToolKind::SoftCheck, soft),
            ]));
            let dispatcher = dispatcher(CountingGuard::new(true), runner.clone());
            assert!(dispatcher.dispatch(idle()).await.is_none());
            assert_eq!(runner.invoked().len(), 2);
        }
    }

    #[tokio::test]
    async fn test_idle_block_without_reason() {
        let runner = Arc::new(ScriptedRunner::with(&[(
            ToolKind::HardCheck,
            r#"{"decision":"block"}"#,
        )]));
        let dispatcher = dispatcher(CountingGuard::new(true), runner);

        assert_eq!(
            dispatcher.dispatch(idle()).await,
            OutwardAction::notify("forge-reflect: ", Severity::Warn)
        );
    }

    #[tokio::test]
    async fn test_idle_uses_configured_prefix() {
        let runner = Arc::new(ScriptedRunner::with(&[(
            ToolKind::HardCheck,
            r#"{"decision":"block","reason":"capture it"}"#,
        )]));
        let config = DispatcherConfig {
            notification_prefix: "reflect> ".to_string(),
            ..DispatcherConfig::default()
        };
        let dispatcher = dispatcher_with_config(CountingGuard::new(true), runner, config);

        assert_eq!(
            dispatcher.dispatch(idle()).await,
            OutwardAction::notify("reflect> capture it", Severity::Warn)
        );
    }

    #[tokio::test]
    async fn test_compacting_injects_context_regardless_of_decision() {
        for output in [
            r#"{"additionalContext":"note"}"#,
            r#"{"decision":"block","reason":"r","additionalContext":"note"}"#,
            r#"{"decision":"allow","additionalContext":"note"}"#,
        ] {
            let runner = Arc::new(ScriptedRunner::with(&[(ToolKind::SoftCheck, output)]));
            let dispatcher = dispatcher(CountingGuard::new(true), runner.clone());

            assert_eq!(
                dispatcher.dispatch(compacting()).await,
                OutwardAction::InjectContext("note".to_string())
            );
            assert_eq!(runner.invoked(), vec![ToolKind::SoftCheck]);
        }
    }

    #[tokio::test]
    async fn test_compacting_payload_carries_trigger() {
        let runner = Arc::new(ScriptedRunner::default());
        let dispatcher = dispatcher(CountingGuard::new(true), runner.clone());

        dispatcher.dispatch(compacting()).await;

        let input = runner.inputs().remove(0).unwrap();
        let value: serde_json::Value = serde_json::from_str(&input).unwrap();
        assert_eq!(value, serde_json::json!({ "cwd": "/work", "trigger": "auto" }));
    }

    #[tokio::test]
    async fn test_compacting_without_context_is_none() {
        for output in [
            "",
            r#"{"decision":"block","reason":"r"}"#,
            r#"{"additionalContext":""}"#,
            r#"{"additionalContext":false}"#,
            r#"{"additionalContext":0}"#,
        ] {
            let runner = Arc::new(ScriptedRunner::with(&[(ToolKind::SoftCheck, output)]));
            let dispatcher = dispatcher(CountingGuard::new(true), runner);
            assert!(dispatcher.dispatch(compacting()).await.is_none());
        }
    }

    #[tokio::test]
    async fn test_apply_compaction_appends_context() {
        let runner = Arc::new(ScriptedRunner::with(&[(
            ToolKind::SoftCheck,
            r#"{"additionalContext":"note"}"#,
        )]));
        let dispatcher = dispatcher(CountingGuard::new(true), runner);

        let mut output = CompactionOutput {
            context: vec!["existing".to_string()],
        };
        assert!(dispatcher.apply_compaction("/work", &mut output).await);
        assert_eq!(output.context, vec!["existing", "note"]);
    }

    #[tokio::test]
    async fn test_apply_compaction_leaves_output_untouched_when_not_ready() {
        let runner = Arc::new(ScriptedRunner::with(&[(
            ToolKind::SoftCheck,
            r#"{"additionalContext":"note"}"#,
        )]));
        let dispatcher = dispatcher(CountingGuard::new(false), runner);

        let mut output = CompactionOutput::default();
        assert!(!dispatcher.apply_compaction("/work", &mut output).await);
        assert!(output.context.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_before_start_skips_guard() {
        let guard = CountingGuard::new(true);
        let runner = Arc::new(ScriptedRunner::with(&[(ToolKind::Digest, "digest")]));
        let dispatcher = dispatcher(guard.clone(), runner.clone());

        let cancel = CancellationToken::new();
        cancel.cancel();

        assert!(dispatcher
            .dispatch_with_cancel(SessionEvent::Created, &cancel)
            .await
            .is_none());
        assert_eq!(guard.calls(), 0);
        assert!(runner.invoked().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_during_hard_check_stops_episode() {
        let runner = Arc::new(ScriptedRunner {
            cancel_during: Some(ToolKind::HardCheck),
            ..ScriptedRunner::with(&[
                (ToolKind::HardCheck, r#"{"decision":"block","reason":"X"}"#),
                (ToolKind::SoftCheck, r#"{"decision":"block","reason":"Y"}"#),
            ])
        });
        let dispatcher = dispatcher(CountingGuard::new(true), runner.clone());

        let cancel = CancellationToken::new();
        assert!(dispatcher
            .dispatch_with_cancel(idle(), &cancel)
            .await
            .is_none());
        assert_eq!(runner.invoked(), vec![ToolKind::HardCheck]);
    }

    #[tokio::test]
    async fn test_cancelled_after_silent_hard_check_skips_soft_check() {
        let runner = Arc::new(ScriptedRunner {
            cancel_during: Some(ToolKind::HardCheck),
            ..ScriptedRunner::with(&[(
                ToolKind::SoftCheck,
                r#"{"decision":"block","reason":"Y"}"#,
            )])
        });
        let dispatcher = dispatcher(CountingGuard::new(true), runner.clone());

        assert!(dispatcher
            .dispatch_with_cancel(idle(), &CancellationToken::new())
            .await
            .is_none());
        assert_eq!(runner.invoked(), vec![ToolKind::HardCheck]);
    }

    #[tokio::test]
    async fn test_dispatch_named_routes_and_ignores_unknown() {
        let runner = Arc::new(ScriptedRunner::with(&[(ToolKind::Digest, "hi")]));
        let dispatcher = dispatcher(CountingGuard::new(true), runner.clone());

        assert!(dispatcher
            .dispatch_named("session.deleted", "/work")
            .await
            .is_none());
        assert!(runner.invoked().is_empty());

        assert_eq!(
            dispatcher.dispatch_named("session.created", "/work").await,
            OutwardAction::notify("hi", Severity::Info)
        );
    }

    #[tokio::test]
    async fn test_trait_object_dispatch() {
        let runner = Arc::new(ScriptedRunner::with(&[(ToolKind::Digest, "hi")]));
        let dispatcher: Arc<dyn EventDispatcher> =
            Arc::new(dispatcher(CountingGuard::new(true), runner));

        let action = dispatcher
            .dispatch_event(SessionEvent::Created, &CancellationToken::new())
            .await;
        assert_eq!(action, OutwardAction::notify("hi", Severity::Info));
    }

    #[test]
    fn test_tools_resolved_under_root() {
        let dispatcher = dispatcher(
            CountingGuard::new(true),
            Arc::new(ScriptedRunner::default()),
        );
        assert_eq!(
            dispatcher.tools().path(ToolKind::HardCheck),
            std::path::Path::new("/work/target/release/insight")
        );
    }
}

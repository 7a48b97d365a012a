//! Engine - orchestration shared by every front end
//!
//! The Engine owns the TEA state, the message channel, the shutdown signal
//! and the operation client, and broadcasts [`EngineEvent`]s derived from
//! what each processed message changed.

use std::sync::Arc;

use chrono::{DateTime, Local};
use tokio::sync::{broadcast, mpsc, watch};

use crate::config::Settings;
use crate::engine_event::EngineEvent;
use crate::message::Message;
use crate::process;
use crate::signals;
use crate::state::{AppState, OperationOverview, PollingPhase, View};
use opsdeck_client::{HttpTransport, OperationClient, Transport};
use opsdeck_core::prelude::*;
use opsdeck_core::{DeviceId, DevicePair, OperationKind, Phase};

/// Lightweight snapshot of state for change detection.
///
/// Captured before message processing, compared after to detect
/// what changed and emit appropriate EngineEvents.
#[derive(Debug, Clone)]
struct StateSnapshot {
    view: View,
    /// Indexed like `OperationKind::ALL`
    operations: Vec<OperationOverview>,
    /// Indexed like `OperationKind::ALL`
    rejected: Vec<u64>,
    polling: PollingPhase,
    timer_generation: u64,
    last_update: Option<DateTime<Local>>,
    devices: DevicePair,
}

impl StateSnapshot {
    fn capture(state: &AppState) -> Self {
        Self {
            view: state.view,
            operations: OperationKind::ALL
                .into_iter()
                .map(|kind| state.operations.overview(kind))
                .collect(),
            rejected: OperationKind::ALL
                .into_iter()
                .map(|kind| state.rejected_count(kind))
                .collect(),
            polling: state.monitor.polling,
            timer_generation: state.monitor.timer_generation,
            last_update: state.monitor.last_update,
            devices: state.devices.snapshot_pair(),
        }
    }
}

/// Orchestration engine for opsdeck.
///
/// Generic over the transport so tests can drive it with a scripted one;
/// production code uses [`Engine::new`] with HTTP.
pub struct Engine<T = HttpTransport> {
    /// TEA application state (the Model)
    pub state: AppState,

    /// Sender half of the unified message channel.
    /// Clone this to give to input sources (signal handler, console).
    pub msg_tx: mpsc::Sender<Message>,

    /// Receiver half of the unified message channel.
    pub msg_rx: mpsc::Receiver<Message>,

    /// Sender for the shutdown signal. Send `true` to initiate shutdown.
    pub shutdown_tx: watch::Sender<bool>,

    /// Receiver for the shutdown signal. Clone for background tasks.
    pub shutdown_rx: watch::Receiver<bool>,

    client: Arc<OperationClient<T>>,

    /// Event broadcaster for external consumers.
    event_tx: broadcast::Sender<EngineEvent>,
}

impl Engine<HttpTransport> {
    /// Create an Engine talking HTTP to `settings.backend.base_url`.
    ///
    /// Also spawns the OS signal handler (it exits on [`Engine::shutdown`]),
    /// so this must run inside a tokio runtime. Fails only if the backend URL is unusable.
    pub fn new(settings: Settings) -> Result<Self> {
        let base_url = settings.backend.url()?;
        info!("Backend: {}", base_url);
        let transport = HttpTransport::new(base_url)?;

        let engine = Self::with_transport(settings, transport);
        signals::spawn_signal_handler(engine.msg_tx.clone(), engine.shutdown_rx.clone());
        Ok(engine)
    }
}

impl<T> Engine<T>
where
    T: Transport + Sync + 'static,
{
    /// Create an Engine over an arbitrary transport.
    pub fn with_transport(settings: Settings, transport: T) -> Self {
        let state = AppState::with_settings(settings);
        let (msg_tx, msg_rx) = mpsc::channel::<Message>(256);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (event_tx, _) = broadcast::channel(256);

        Self {
            state,
            msg_tx,
            msg_rx,
            shutdown_tx,
            shutdown_rx,
            client: Arc::new(OperationClient::new(transport)),
            event_tx,
        }
    }

    /// Subscribe to engine events.
    ///
    /// If the subscriber falls behind (buffer full), older events are
    /// dropped. Use `broadcast::error::RecvError::Lagged` to detect this.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_tx.subscribe()
    }

    /// Activate the initial view.
    pub fn start(&mut self) {
        self.process_message(Message::Start);
    }

    /// Process a single message through the TEA update cycle and emit
    /// events for whatever it changed.
    pub fn process_message(&mut self, msg: Message) {
        let pre = StateSnapshot::capture(&self.state);

        process::process_message(
            &mut self.state,
            msg,
            &self.msg_tx,
            &self.client,
            &self.shutdown_rx,
        );

        let post = StateSnapshot::capture(&self.state);
        self.emit_events(&pre, &post);
    }

    /// Drain and process all pending messages from the channel.
    ///
    /// Returns the number of messages processed.
    pub fn drain_pending_messages(&mut self) -> usize {
        let mut count = 0;
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.process_message(msg);
            count += 1;
        }
        count
    }

    /// Wait for the next message from background tasks or input sources.
    pub async fn recv_message(&mut self) -> Option<Message> {
        self.msg_rx.recv().await
    }

    /// Get a clone of the message sender for spawning input sources.
    pub fn msg_sender(&self) -> mpsc::Sender<Message> {
        self.msg_tx.clone()
    }

    /// Get a clone of the shutdown receiver for background tasks.
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    pub fn client(&self) -> &Arc<OperationClient<T>> {
        &self.client
    }

    /// Check if the application should quit.
    pub fn should_quit(&self) -> bool {
        self.state.should_quit()
    }

    /// Stop polling and signal every background task to exit.
    pub async fn shutdown(&mut self) {
        if !self.state.should_quit() {
            self.process_message(Message::Quit);
        }

        self.emit(EngineEvent::Shutdown);
        let _ = self.shutdown_tx.send(true);

        // Let timer tasks observe the signal before the runtime winds down.
        tokio::task::yield_now().await;
        info!("Engine shut down");
    }

    fn emit_events(&self, pre: &StateSnapshot, post: &StateSnapshot) {
        if pre.view != post.view {
            self.emit(EngineEvent::ViewChanged {
                from: pre.view,
                to: post.view,
            });
        }

        let restarted = pre.timer_generation != post.timer_generation;
        if pre.polling == PollingPhase::Polling
            && (post.polling == PollingPhase::Stopped || restarted)
        {
            self.emit(EngineEvent::PollingStopped);
        }
        if post.polling == PollingPhase::Polling
            && (pre.polling == PollingPhase::Stopped || restarted)
        {
            self.emit(EngineEvent::PollingStarted {
                generation: post.timer_generation,
                period_ms: self.state.monitor.poll_interval.as_millis() as u64,
            });
        }

        for (i, kind) in OperationKind::ALL.into_iter().enumerate() {
            if post.rejected[i] > pre.rejected[i] {
                self.emit(EngineEvent::DispatchRejected { kind });
            }
            self.emit_operation_events(kind, &pre.operations[i], &post.operations[i]);
        }

        if pre.last_update != post.last_update {
            let critical_findings = self
                .state
                .operations
                .telemetry
                .last_result()
                .map(|report| report.critical_findings())
                .unwrap_or_default();
            self.emit(EngineEvent::TelemetryUpdated { critical_findings });
        }

        for device in DeviceId::ALL {
            if pre.devices.get(device) != post.devices.get(device) {
                self.emit(EngineEvent::DeviceUpdated { device });
            }
        }
    }

    fn emit_operation_events(
        &self,
        kind: OperationKind,
        before: &OperationOverview,
        after: &OperationOverview,
    ) {
        if before.revision == after.revision {
            return;
        }

        // Completions arrive as their own messages, so within one cycle an
        // epoch change is either a new dispatch or an abandon.
        if before.epoch != after.epoch {
            if after.phase == Phase::Loading {
                self.emit(EngineEvent::OperationStarted {
                    kind,
                    epoch: after.epoch,
                });
            } else {
                self.emit(EngineEvent::OperationAbandoned { kind });
            }
            return;
        }

        if after.phase == Phase::Success {
            self.emit(EngineEvent::OperationSucceeded {
                kind,
                epoch: after.epoch,
            });
            if kind.history_capacity().is_some() {
                self.emit(EngineEvent::HistoryUpdated {
                    kind,
                    len: self.state.histories.len(kind),
                });
            }
        } else if let Some(error) = &after.last_error {
            self.emit(EngineEvent::OperationFailed {
                kind,
                error: error.clone(),
            });
        }
    }

    /// send() returns Err only if there are no receivers -- that's fine.
    fn emit(&self, event: EngineEvent) {
        trace!("Engine event: {}", event.event_type());
        let _ = self.event_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsdeck_client::test_utils::{fixtures, FakeTransport};
    use opsdeck_core::OperationError;

    const MONITOR_PATH: &str = "/system_security_monitor";

    fn drain(events: &mut broadcast::Receiver<EngineEvent>) -> Vec<EngineEvent> {
        let mut out = Vec::new();
        while let Ok(event) = events.try_recv() {
            out.push(event);
        }
        out
    }

    fn test_engine() -> (Engine<FakeTransport>, FakeTransport) {
        let fake = FakeTransport::new();
        let engine = Engine::with_transport(Settings::default(), fake.clone());
        (engine, fake)
    }

    #[tokio::test]
    async fn test_engine_new_rejects_bad_backend_url() {
        let mut settings = Settings::default();
        settings.backend.base_url = "ftp://example.com".into();
        assert!(Engine::new(settings).is_err());
    }

    #[tokio::test]
    async fn test_engine_new_creates_valid_state() {
        let engine = Engine::new(Settings::default()).unwrap();
        assert!(!engine.should_quit());
        assert_eq!(engine.state.view, View::Monitor);
    }

    #[tokio::test]
    async fn test_engine_drain_empty_channel() {
        let (mut engine, _) = test_engine();
        assert_eq!(engine.drain_pending_messages(), 0);
    }

    #[tokio::test]
    async fn test_engine_start_polls_immediately() {
        let (mut engine, fake) = test_engine();
        fake.respond_json(MONITOR_PATH, 200, fixtures::report(33.0));
        let mut events = engine.subscribe();

        engine.start();
        let started = drain(&mut events);
        assert!(started.contains(&EngineEvent::PollingStarted {
            generation: 1,
            period_ms: 5000,
        }));
        assert!(started
            .iter()
            .any(|e| matches!(e, EngineEvent::OperationStarted { kind: OperationKind::TelemetryPoll, .. })));

        let msg = engine.recv_message().await.unwrap();
        engine.process_message(msg);

        let applied = drain(&mut events);
        assert!(applied.iter().any(|e| matches!(
            e,
            EngineEvent::OperationSucceeded { kind: OperationKind::TelemetryPoll, .. }
        )));
        assert!(applied.contains(&EngineEvent::TelemetryUpdated {
            critical_findings: vec![],
        }));
        assert_eq!(fake.call_count(MONITOR_PATH), 1);
    }

    #[tokio::test]
    async fn test_engine_reports_rejected_dispatch() {
        let (mut engine, fake) = test_engine();
        let _gate = fake.hold("/api/test-connections");
        let mut events = engine.subscribe();

        engine.process_message(Message::TestConnections);
        engine.process_message(Message::TestConnections);

        let emitted = drain(&mut events);
        assert!(emitted.contains(&EngineEvent::DispatchRejected {
            kind: OperationKind::ConnectionTest,
        }));
    }

    #[tokio::test]
    async fn test_engine_reports_validation_failure() {
        let (mut engine, fake) = test_engine();
        let mut events = engine.subscribe();

        engine.process_message(Message::ExecuteCommand);

        let emitted = drain(&mut events);
        assert_eq!(
            emitted,
            vec![EngineEvent::OperationFailed {
                kind: OperationKind::ExecuteCommand,
                error: OperationError::validation("Please enter a command"),
            }]
        );
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_engine_reports_history_and_device_edits() {
        let (mut engine, fake) = test_engine();
        fake.respond_json(
            "/api/execute-command",
            200,
            fixtures::command("pwd", "device1", "/home/ops\n"),
        );
        let mut events = engine.subscribe();

        engine.process_message(Message::EditDevice {
            device: DeviceId::Device2,
            field: opsdeck_core::DeviceField::Host,
            value: "10.1.1.2".into(),
        });
        assert_eq!(
            drain(&mut events),
            vec![EngineEvent::DeviceUpdated {
                device: DeviceId::Device2
            }]
        );

        engine.process_message(Message::SetCommand("pwd".into()));
        engine.process_message(Message::ExecuteCommand);
        let msg = engine.recv_message().await.unwrap();
        engine.process_message(msg);

        let emitted = drain(&mut events);
        assert!(emitted.contains(&EngineEvent::HistoryUpdated {
            kind: OperationKind::ExecuteCommand,
            len: 1,
        }));
    }

    #[tokio::test]
    async fn test_leaving_monitor_abandons_poll() {
        let (mut engine, fake) = test_engine();
        let _gate = fake.hold(MONITOR_PATH);
        engine.start();
        let mut events = engine.subscribe();

        engine.process_message(Message::SwitchView(View::Files));

        let emitted = drain(&mut events);
        assert!(emitted.contains(&EngineEvent::PollingStopped));
        assert!(emitted.contains(&EngineEvent::OperationAbandoned {
            kind: OperationKind::TelemetryPoll,
        }));
    }

    #[tokio::test]
    async fn test_engine_process_quit_message() {
        let (mut engine, _) = test_engine();
        engine.process_message(Message::Quit);
        assert!(engine.should_quit());
    }

    #[tokio::test]
    async fn test_engine_shutdown() {
        let (mut engine, _) = test_engine();
        let mut events = engine.subscribe();
        let shutdown_rx = engine.shutdown_receiver();

        engine.shutdown().await;

        assert!(engine.should_quit());
        assert!(*shutdown_rx.borrow());
        assert!(drain(&mut events).contains(&EngineEvent::Shutdown));
    }
}

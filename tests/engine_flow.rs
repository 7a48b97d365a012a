//! End-to-end engine tests against the scripted transport.
//!
//! These drive `Engine` exactly as the console does (messages in, background
//! completions back through the channel) without touching the network.

use opsdeck_app::config::Settings;
use opsdeck_app::state::View;
use opsdeck_app::{Engine, Message};
use opsdeck_client::test_utils::{fixtures, FakeTransport};
use opsdeck_core::{DeviceField, DeviceId, OperationError, OperationKind, Phase};

const MONITOR: &str = "/system_security_monitor";
const CONNECTIONS: &str = "/api/test-connections";
const LIST: &str = "/api/list-files";
const EXEC: &str = "/api/execute-command";

fn engine() -> (Engine<FakeTransport>, FakeTransport) {
    let fake = FakeTransport::new();
    let mut settings = Settings::default();
    settings.devices.device1.username = "ops".into();
    settings.devices.device1.host = "10.0.0.1".into();
    settings.devices.device2.username = "ops".into();
    settings.devices.device2.host = "10.0.0.2".into();
    (Engine::with_transport(settings, fake.clone()), fake)
}

/// Process exactly one message from background tasks.
async fn pump(engine: &mut Engine<FakeTransport>) {
    let msg = engine.recv_message().await.expect("channel open");
    engine.process_message(msg);
}

/// Let spawned dispatch tasks reach the transport.
async fn wait_for_calls(fake: &FakeTransport, path: &str, count: usize) {
    for _ in 0..100 {
        if fake.call_count(path) >= count {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("expected {} call(s) to {}", count, path);
}

#[tokio::test]
async fn test_start_applies_first_report() {
    let (mut engine, fake) = engine();
    fake.respond_json(MONITOR, 200, fixtures::report(42.0));

    engine.start();
    assert!(engine.state.monitor.awaiting_first_report);
    pump(&mut engine).await;

    let report = engine.state.operations.telemetry.last_result().unwrap();
    assert_eq!(report.resource_monitoring.cpu_usage, 42.0);
    assert!(!engine.state.monitor.awaiting_first_report);
    assert!(engine.state.monitor.last_update.is_some());
}

#[tokio::test]
async fn test_superseded_poll_is_discarded_even_if_it_resolves_last() {
    let (mut engine, fake) = engine();
    let first = fake.hold(MONITOR);
    let second = fake.hold(MONITOR);

    engine.start();
    wait_for_calls(&fake, MONITOR, 1).await;
    engine.process_message(Message::RefreshTelemetry);
    wait_for_calls(&fake, MONITOR, 2).await;

    second.release_json(200, fixtures::report(20.0));
    pump(&mut engine).await;
    first.release_json(200, fixtures::report(10.0));
    pump(&mut engine).await;

    let telemetry = &engine.state.operations.telemetry;
    assert_eq!(telemetry.phase(), Phase::Success);
    assert_eq!(telemetry.last_result().unwrap().resource_monitoring.cpu_usage, 20.0);
}

#[tokio::test]
async fn test_leaving_monitor_discards_in_flight_poll() {
    let (mut engine, fake) = engine();
    let gate = fake.hold(MONITOR);

    engine.start();
    wait_for_calls(&fake, MONITOR, 1).await;
    engine.process_message(Message::SwitchView(View::Commands));

    gate.release_json(200, fixtures::report(77.0));
    pump(&mut engine).await;

    assert!(engine.state.operations.telemetry.last_result().is_none());
    assert_eq!(engine.state.operations.telemetry.phase(), Phase::Idle);
    assert!(!engine.state.monitor.is_polling());
}

#[tokio::test]
async fn test_request_uses_config_snapshot_from_dispatch_time() {
    let (mut engine, fake) = engine();
    engine.process_message(Message::SwitchView(View::Files));
    let gate = fake.hold(LIST);

    engine.process_message(Message::ListFiles);
    wait_for_calls(&fake, LIST, 1).await;
    engine.process_message(Message::EditDevice {
        device: DeviceId::Device1,
        field: DeviceField::Host,
        value: "10.9.9.9".into(),
    });
    gate.release_json(200, fixtures::listing(&["/home/ops/a.txt"], &[]));
    pump(&mut engine).await;

    let call = fake
        .calls()
        .into_iter()
        .find(|c| c.path == LIST)
        .unwrap();
    assert_eq!(call.body.unwrap()["device1"]["host"], "10.0.0.1");
    assert_eq!(engine.state.devices.get(DeviceId::Device1).host, "10.9.9.9");
    assert_eq!(engine.state.operations.files.phase(), Phase::Success);
}

#[tokio::test]
async fn test_connection_test_rejects_overlap_then_accepts_after_completion() {
    let (mut engine, fake) = engine();
    engine.process_message(Message::SwitchView(View::Connection));
    let gate = fake.hold(CONNECTIONS);

    engine.process_message(Message::TestConnections);
    engine.process_message(Message::TestConnections);
    wait_for_calls(&fake, CONNECTIONS, 1).await;
    assert_eq!(engine.state.rejected_count(OperationKind::ConnectionTest), 1);

    gate.release_json(200, fixtures::connection_test("success", "timeout"));
    pump(&mut engine).await;
    assert_eq!(fake.call_count(CONNECTIONS), 1);

    fake.respond_json(CONNECTIONS, 200, fixtures::connection_test("success", "success"));
    engine.process_message(Message::TestConnections);
    pump(&mut engine).await;

    assert_eq!(fake.call_count(CONNECTIONS), 2);
    assert_eq!(engine.state.histories.connection.len(), 2);
}

#[tokio::test]
async fn test_command_errors_are_classified() {
    let (mut engine, fake) = engine();
    engine.process_message(Message::SwitchView(View::Commands));
    engine.process_message(Message::SetCommand("uptime".into()));

    fake.respond_json(EXEC, 500, serde_json::json!({"error": "boom"}));
    engine.process_message(Message::ExecuteCommand);
    pump(&mut engine).await;
    assert_eq!(
        engine.state.operations.command.last_error(),
        Some(&OperationError::HttpStatus { code: 500 })
    );

    fake.respond_raw(EXEC, 200, "<html>not json</html>");
    engine.process_message(Message::ExecuteCommand);
    pump(&mut engine).await;
    assert!(matches!(
        engine.state.operations.command.last_error(),
        Some(OperationError::Protocol { .. })
    ));

    fake.fail(EXEC, OperationError::network("connection refused"));
    engine.process_message(Message::ExecuteCommand);
    pump(&mut engine).await;
    assert!(matches!(
        engine.state.operations.command.last_error(),
        Some(OperationError::Network { .. })
    ));

    assert!(engine.state.histories.command.is_empty());
}

#[tokio::test]
async fn test_rerun_command_against_device2() {
    let (mut engine, fake) = engine();
    engine.process_message(Message::SwitchView(View::Commands));
    fake.always_respond_json(EXEC, 200, fixtures::command("hostname", "device2", "edge-02\n"));

    engine.process_message(Message::SetCommandTarget(DeviceId::Device2));
    engine.process_message(Message::SetCommand("  hostname  ".into()));
    engine.process_message(Message::ExecuteCommand);
    pump(&mut engine).await;

    engine.process_message(Message::SetCommandTarget(DeviceId::Device1));
    engine.process_message(Message::RerunCommand { index: 0 });
    pump(&mut engine).await;

    let bodies: Vec<_> = fake
        .calls()
        .into_iter()
        .filter(|c| c.path == EXEC)
        .map(|c| c.body.unwrap())
        .collect();
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0]["command"], "hostname");
    assert_eq!(bodies[1]["device"], "device2");
    assert_eq!(bodies[1]["device2"]["host"], "10.0.0.2");
    assert_eq!(engine.state.histories.command.len(), 2);
}

#[tokio::test]
async fn test_shutdown_stops_polling() {
    let (mut engine, fake) = engine();
    fake.always_respond_json(MONITOR, 200, fixtures::report(5.0));
    engine.start();
    assert!(engine.state.monitor.is_polling());

    engine.shutdown().await;

    assert!(engine.should_quit());
    assert!(!engine.state.monitor.is_polling());
}

//! Headless console runner - main event loop without a UI
//!
//! Reads line commands from stdin on a blocking thread and feeds them to the
//! engine; every engine event is translated into a [`HeadlessEvent`] on
//! stdout.

use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};

use opsdeck_app::config::Settings;
use opsdeck_app::state::AppState;
use opsdeck_app::{Engine, EngineEvent, Message};
use opsdeck_core::prelude::*;

use super::commands::{parse_command, ConsoleCommand, HELP};
use super::HeadlessEvent;

/// Run the interactive console until `quit`, EOF on stdin, or a signal.
pub async fn run_console(settings: Settings) -> Result<()> {
    info!("═══════════════════════════════════════════════════════");
    info!("opsdeck console starting");
    info!("Backend: {}", settings.backend.base_url);
    info!("═══════════════════════════════════════════════════════");

    let mut engine = Engine::new(settings)?;
    let mut events = engine.subscribe();

    let (console_tx, console_rx) = mpsc::channel::<ConsoleCommand>(32);
    std::thread::spawn(move || {
        read_stdin_blocking(console_tx);
    });

    HeadlessEvent::ready(&engine.state).emit();
    engine.start();
    forward_events(&mut events, &engine.state);

    console_event_loop(&mut engine, &mut events, console_rx).await;

    engine.shutdown().await;
    forward_events(&mut events, &engine.state);

    info!("opsdeck console exiting");
    Ok(())
}

/// Main console event loop
async fn console_event_loop(
    engine: &mut Engine,
    events: &mut broadcast::Receiver<EngineEvent>,
    mut console_rx: mpsc::Receiver<ConsoleCommand>,
) {
    let mut stdin_open = true;

    loop {
        if engine.should_quit() {
            info!("Quit requested");
            break;
        }

        tokio::select! {
            msg = engine.msg_rx.recv() => match msg {
                Some(msg) => engine.process_message(msg),
                None => {
                    info!("Message channel closed");
                    break;
                }
            },

            cmd = console_rx.recv(), if stdin_open => match cmd {
                Some(ConsoleCommand::Send(messages)) => {
                    for msg in messages {
                        engine.process_message(msg);
                    }
                }
                Some(ConsoleCommand::Status) => HeadlessEvent::status(&engine.state).emit(),
                Some(ConsoleCommand::Help) => eprintln!("{}", HELP),
                None => {
                    info!("Stdin closed, quitting");
                    stdin_open = false;
                    engine.process_message(Message::Quit);
                }
            },
        }

        forward_events(events, &engine.state);
    }
}

/// Print every engine event queued since the last call.
fn forward_events(events: &mut broadcast::Receiver<EngineEvent>, state: &AppState) {
    loop {
        match events.try_recv() {
            Ok(event) => {
                if let Some(headless) = HeadlessEvent::from_engine_event(&event, state) {
                    headless.emit();
                }
            }
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                warn!("Headless output lagged, {} events dropped", skipped);
            }
            Err(_) => break,
        }
    }
}

/// Read console commands from stdin (blocking)
fn read_stdin_blocking(console_tx: mpsc::Sender<ConsoleCommand>) {
    use std::io::BufRead;

    let stdin = std::io::stdin();
    let reader = stdin.lock();

    for line in reader.lines() {
        match line {
            Ok(line) => match parse_command(&line) {
                Ok(Some(command)) => {
                    let quitting = matches!(
                        &command,
                        ConsoleCommand::Send(messages) if matches!(messages.last(), Some(Message::Quit))
                    );
                    if console_tx.blocking_send(command).is_err() || quitting {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("Rejected console input {:?}: {}", line, e);
                    HeadlessEvent::error(e, false).emit();
                }
            },
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        }
    }

    info!("Stdin reader exiting");
}

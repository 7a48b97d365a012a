//! One-shot subcommands: run a single operation, print it, exit.

use tracing::info;

use opsdeck_app::config::Settings;
use opsdeck_app::{Engine, Message};
use opsdeck_client::Transport;
use opsdeck_core::prelude::*;
use opsdeck_core::{DeviceId, OperationKind, Phase, TransferDirection};

use super::HeadlessEvent;

/// A single operation requested from the command line.
#[derive(Debug, Clone)]
pub enum OneShot {
    Health,
    Test,
    List,
    Exec {
        device: DeviceId,
        command: String,
    },
    Transfer {
        source: String,
        dest: String,
        direction: TransferDirection,
    },
}

impl OneShot {
    fn kind(&self) -> Option<OperationKind> {
        match self {
            OneShot::Health => None,
            OneShot::Test => Some(OperationKind::ConnectionTest),
            OneShot::List => Some(OperationKind::ListFiles),
            OneShot::Exec { .. } => Some(OperationKind::ExecuteCommand),
            OneShot::Transfer { .. } => Some(OperationKind::TransferFile),
        }
    }

    /// Messages that fill the forms and trigger the operation.
    fn messages(&self) -> Vec<Message> {
        match self {
            OneShot::Health => Vec::new(),
            OneShot::Test => vec![Message::TestConnections],
            OneShot::List => vec![Message::ListFiles],
            OneShot::Exec { device, command } => vec![
                Message::SetCommandTarget(*device),
                Message::SetCommand(command.clone()),
                Message::ExecuteCommand,
            ],
            OneShot::Transfer {
                source,
                dest,
                direction,
            } => vec![
                Message::SetTransferSource(source.clone()),
                Message::SetTransferDest(dest.clone()),
                Message::SetTransferDirection(*direction),
                Message::StartTransfer,
            ],
        }
    }
}

/// Run `op` against the configured backend. Returns `Ok(false)` if the
/// operation itself failed.
pub async fn run_oneshot(settings: Settings, op: OneShot) -> Result<bool> {
    let mut engine = Engine::new(settings)?;
    let succeeded = execute(&mut engine, &op).await;
    engine.shutdown().await;
    Ok(succeeded)
}

/// Drive one operation to completion on `engine` and print the outcome.
pub async fn execute<T>(engine: &mut Engine<T>, op: &OneShot) -> bool
where
    T: Transport + Sync + 'static,
{
    let Some(kind) = op.kind() else {
        return match engine.client().health().await {
            Ok(health) => {
                HeadlessEvent::health(health).emit();
                true
            }
            Err(e) => {
                HeadlessEvent::error(format!("Health check failed: {}", e), false).emit();
                false
            }
        };
    };

    info!("Running one-shot {}", kind);
    for msg in op.messages() {
        engine.process_message(msg);
    }

    while engine.state.operations.is_loading(kind) && !engine.should_quit() {
        match engine.msg_rx.recv().await {
            Some(msg) => engine.process_message(msg),
            None => break,
        }
    }

    let overview = engine.state.operations.overview(kind);
    match (overview.phase, overview.last_error) {
        (Phase::Success, _) => {
            HeadlessEvent::operation_succeeded(&engine.state, kind, overview.epoch.value()).emit();
            true
        }
        (_, Some(error)) => {
            HeadlessEvent::operation_failed(kind, &error).emit();
            false
        }
        (phase, None) => {
            HeadlessEvent::error(format!("{} ended in {:?}", kind, phase), false).emit();
            false
        }
    }
}

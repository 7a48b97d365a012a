//! Action handlers: UpdateAction dispatch and background task spawning

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::handler::UpdateAction;
use crate::message::Message;
use opsdeck_client::{OperationClient, Transport};

pub(crate) mod dispatch;
pub(crate) mod polling;

/// Execute an action by spawning a background task
pub fn handle_action<T>(
    action: UpdateAction,
    msg_tx: mpsc::Sender<Message>,
    client: Arc<OperationClient<T>>,
    shutdown_rx: watch::Receiver<bool>,
) where
    T: Transport + Sync + 'static,
{
    match action {
        UpdateAction::Dispatch { epoch, request } => {
            dispatch::spawn_dispatch(epoch, request, client, msg_tx);
        }

        UpdateAction::StartTelemetryTimer {
            generation,
            period,
            stop_rx,
        } => {
            polling::spawn_telemetry_timer(generation, period, stop_rx, shutdown_rx, msg_tx);
        }
    }
}

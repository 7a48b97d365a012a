//! Periodic telemetry timer.
//!
//! The timer only emits [`Message::TelemetryTick`]; it never issues requests
//! itself. The first tick fires one full period after start because the
//! handler already polls immediately on activation.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::message::Message;
use opsdeck_core::prelude::*;

/// Spawn the timer task.
///
/// Exits when `stop_rx` flips to `true` or its sender is dropped, when the
/// engine shuts down, or when the message channel closes.
pub(crate) fn spawn_telemetry_timer(
    generation: u64,
    period: Duration,
    mut stop_rx: watch::Receiver<bool>,
    mut shutdown_rx: watch::Receiver<bool>,
    msg_tx: mpsc::Sender<Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if msg_tx.send(Message::TelemetryTick { generation }).await.is_err() {
                        // Engine shutting down.
                        break;
                    }
                }

                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        debug!("Telemetry timer {} stopped", generation);
                        break;
                    }
                }

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        debug!("Telemetry timer {} exiting on shutdown", generation);
                        break;
                    }
                }
            }
        }
    })
}

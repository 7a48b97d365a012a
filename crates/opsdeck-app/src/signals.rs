//! SIGINT/SIGTERM (Ctrl+C on Windows) become `Message::Quit`.

use std::future::Future;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::message::Message;
use opsdeck_core::prelude::*;

/// Listen for a termination signal until the engine shuts down.
pub fn spawn_signal_handler(
    tx: mpsc::Sender<Message>,
    shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(relay_quit(wait_for_signal(), tx, shutdown_rx))
}

/// Send one `Quit` when `signal` fires. Returns early on engine shutdown.
async fn relay_quit<F>(
    signal: F,
    tx: mpsc::Sender<Message>,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    F: Future<Output = Result<&'static str>>,
{
    tokio::select! {
        received = signal => match received {
            Ok(name) => {
                info!("Received {}, quitting", name);
                if tx.send(Message::Quit).await.is_err() {
                    debug!("Message channel closed before quit could be delivered");
                }
            }
            Err(e) => error!("Signal handler error: {}", e),
        },
        _ = async { shutdown_rx.wait_for(|stopped| *stopped).await.map(|_| ()) } => {
            debug!("Signal handler stopped");
        }
    }
}

/// Resolves with the name of the first termination signal received.
async fn wait_for_signal() -> Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())
            .map_err(|e| Error::signal(format!("Failed to create SIGINT handler: {}", e)))?;
        let mut sigterm = signal(SignalKind::terminate())
            .map_err(|e| Error::signal(format!("Failed to create SIGTERM handler: {}", e)))?;

        tokio::select! {
            _ = sigint.recv() => Ok("SIGINT"),
            _ = sigterm.recv() => Ok("SIGTERM"),
        }
    }

    #[cfg(windows)]
    {
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| Error::signal(format!("Failed to listen for Ctrl+C: {}", e)))?;
        Ok("Ctrl+C")
    }
}

//! Handler module - TEA update function and event handlers
//!
//! Organized into submodules:
//! - `update`: Main update() function and message dispatch
//! - `operations`: Dispatch gating and response application per kind
//! - `monitor`: Telemetry polling controller transitions
//! - `forms`: Device config and form edits

pub(crate) mod forms;
pub(crate) mod monitor;
pub(crate) mod operations;
pub(crate) mod update;


use std::time::Duration;

use tokio::sync::watch;

use crate::message::Message;
use opsdeck_core::{Epoch, OperationRequest};

// Re-export main entry point
pub use update::update;

/// Actions that the event loop should perform after update
#[derive(Debug, Clone)]
pub enum UpdateAction {
    /// Send one request to the backend and report back with
    /// `Message::OperationCompleted` carrying the same epoch.
    Dispatch {
        epoch: Epoch,
        request: OperationRequest,
    },

    /// Start the periodic telemetry timer.
    ///
    /// The handler creates the stop channel and keeps the sender in
    /// `MonitorState`, so a stop issued before the task is scheduled is
    /// still observed. Ticks are tagged with `generation`.
    StartTelemetryTimer {
        generation: u64,
        period: Duration,
        stop_rx: watch::Receiver<bool>,
    },
}

/// Result of processing a message
#[derive(Debug, Default)]
pub struct UpdateResult {
    /// Optional follow-up message to process
    pub message: Option<Message>,
    /// Optional action for the event loop to perform
    pub action: Option<UpdateAction>,
}

impl UpdateResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn message(msg: Message) -> Self {
        Self {
            message: Some(msg),
            action: None,
        }
    }

    pub fn action(action: UpdateAction) -> Self {
        Self {
            message: None,
            action: Some(action),
        }
    }
}

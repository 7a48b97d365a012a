//! Domain events emitted by the Engine for external consumers
//!
//! Events are derived by diffing state before and after each message
//! processing cycle and broadcast via `Engine::subscribe()`. The headless
//! console prints them as NDJSON.

use opsdeck_core::{DeviceId, Epoch, OperationError, OperationKind};

use crate::state::View;

/// Domain events emitted by the Engine.
///
/// Subscribers see one batch per processed message, so a follow-up chain
/// (e.g. view switch then immediate poll) arrives together.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    // ─────────────────────────────────────────────────────────
    // Navigation
    // ─────────────────────────────────────────────────────────
    ViewChanged { from: View, to: View },

    // ─────────────────────────────────────────────────────────
    // Operation Lifecycle
    // ─────────────────────────────────────────────────────────
    /// A request was sent; `epoch` identifies it
    OperationStarted { kind: OperationKind, epoch: Epoch },

    /// The current request returned a result
    OperationSucceeded { kind: OperationKind, epoch: Epoch },

    /// The current request failed, or a dispatch failed local validation
    OperationFailed {
        kind: OperationKind,
        error: OperationError,
    },

    /// An in-flight request was abandoned; its response will be ignored
    OperationAbandoned { kind: OperationKind },

    /// A dispatch was refused because the kind was already loading
    DispatchRejected { kind: OperationKind },

    /// A history log gained an entry
    HistoryUpdated { kind: OperationKind, len: usize },

    // ─────────────────────────────────────────────────────────
    // Monitor
    // ─────────────────────────────────────────────────────────
    PollingStarted { generation: u64, period_ms: u64 },

    PollingStopped,

    /// A telemetry report was applied
    TelemetryUpdated { critical_findings: Vec<String> },

    // ─────────────────────────────────────────────────────────
    // Devices
    // ─────────────────────────────────────────────────────────
    DeviceUpdated { device: DeviceId },

    // ─────────────────────────────────────────────────────────
    // Engine Lifecycle
    // ─────────────────────────────────────────────────────────
    /// Engine is shutting down
    Shutdown,
}

impl EngineEvent {
    /// Returns a short string label for this event type (for logging/debugging).
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ViewChanged { .. } => "view_changed",
            Self::OperationStarted { .. } => "operation_started",
            Self::OperationSucceeded { .. } => "operation_succeeded",
            Self::OperationFailed { .. } => "operation_failed",
            Self::OperationAbandoned { .. } => "operation_abandoned",
            Self::DispatchRejected { .. } => "dispatch_rejected",
            Self::HistoryUpdated { .. } => "history_updated",
            Self::PollingStarted { .. } => "polling_started",
            Self::PollingStopped => "polling_stopped",
            Self::TelemetryUpdated { .. } => "telemetry_updated",
            Self::DeviceUpdated { .. } => "device_updated",
            Self::Shutdown => "shutdown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_event_type_labels() {
        assert_eq!(EngineEvent::Shutdown.event_type(), "shutdown");
        assert_eq!(
            EngineEvent::OperationStarted {
                kind: OperationKind::ListFiles,
                epoch: Epoch::default(),
            }
            .event_type(),
            "operation_started"
        );
        assert_eq!(
            EngineEvent::OperationFailed {
                kind: OperationKind::TransferFile,
                error: OperationError::HttpStatus { code: 502 },
            }
            .event_type(),
            "operation_failed"
        );
        assert_eq!(EngineEvent::PollingStopped.event_type(), "polling_stopped");
    }

    #[test]
    fn test_engine_event_clone() {
        let event = EngineEvent::TelemetryUpdated {
            critical_findings: vec!["Found 2 suspicious processes".into()],
        };
        assert_eq!(event.clone(), event);
    }
}

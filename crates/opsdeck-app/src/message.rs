//! Message types for the application (TEA pattern)

use opsdeck_core::{
    DeviceField, DeviceId, Epoch, OperationError, OperationKind, OperationOutcome,
    TransferDirection,
};

use crate::state::View;

/// All possible messages/actions in the application
#[derive(Debug, Clone)]
pub enum Message {
    /// Activate the initial view (starts polling if it is the monitor)
    Start,

    /// Stop polling and exit
    Quit,

    /// Show another view; entering or leaving the monitor drives polling
    SwitchView(View),

    // ─────────────────────────────────────────────────────────
    // Monitor
    // ─────────────────────────────────────────────────────────
    /// Enable or disable periodic telemetry refresh
    SetAutoRefresh(bool),

    /// Poll telemetry now, superseding any in-flight poll
    RefreshTelemetry,

    /// Periodic timer fired
    TelemetryTick { generation: u64 },

    // ─────────────────────────────────────────────────────────
    // Device Configuration
    // ─────────────────────────────────────────────────────────
    EditDevice {
        device: DeviceId,
        field: DeviceField,
        value: String,
    },

    // ─────────────────────────────────────────────────────────
    // Operation Triggers
    // ─────────────────────────────────────────────────────────
    TestConnections,
    ListFiles,
    /// Transfer using the current transfer form
    StartTransfer,
    /// Execute the current command form
    ExecuteCommand,
    /// Re-run a command history entry (0 = newest) as originally issued
    RerunCommand { index: usize },
    /// Re-run a transfer history entry (0 = newest) as originally issued
    RerunTransfer { index: usize },

    // ─────────────────────────────────────────────────────────
    // Forms
    // ─────────────────────────────────────────────────────────
    SetTransferSource(String),
    SetTransferDest(String),
    SetTransferDirection(TransferDirection),
    SwapTransferDirection,
    SetCommand(String),
    SetCommandTarget(DeviceId),
    /// Fill the command form from a preset
    UsePreset(usize),
    /// Fill the command form from a history entry
    UseHistoryCommand(usize),
    ToggleFileSelection { device: DeviceId, path: String },

    // ─────────────────────────────────────────────────────────
    // Completions (from background tasks)
    // ─────────────────────────────────────────────────────────
    OperationCompleted {
        kind: OperationKind,
        epoch: Epoch,
        result: Result<OperationOutcome, OperationError>,
    },
}

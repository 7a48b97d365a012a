//! Main update function - handles state transitions (TEA pattern)

use crate::message::Message;
use crate::state::AppState;

use super::{forms, monitor, operations, UpdateResult};

/// Process a message and update state.
///
/// Returns an optional follow-up message and/or an action for the event loop.
pub fn update(state: &mut AppState, message: Message) -> UpdateResult {
    match message {
        Message::Start => monitor::handle_start(state),

        Message::Quit => monitor::handle_quit(state),

        Message::SwitchView(view) => monitor::handle_switch_view(state, view),

        // ─────────────────────────────────────────────────────────
        // Monitor
        // ─────────────────────────────────────────────────────────
        Message::SetAutoRefresh(enabled) => monitor::handle_set_auto_refresh(state, enabled),
        Message::RefreshTelemetry => monitor::handle_refresh(state),
        Message::TelemetryTick { generation } => monitor::handle_tick(state, generation),

        // ─────────────────────────────────────────────────────────
        // Device Configuration
        // ─────────────────────────────────────────────────────────
        Message::EditDevice {
            device,
            field,
            value,
        } => forms::handle_edit_device(state, device, field, value),

        // ─────────────────────────────────────────────────────────
        // Operation Triggers
        // ─────────────────────────────────────────────────────────
        Message::TestConnections => {
            let request = operations::connection_test_request(state);
            operations::dispatch(state, request)
        }
        Message::ListFiles => {
            let request = operations::list_files_request(state);
            operations::dispatch(state, request)
        }
        Message::StartTransfer => {
            let request = operations::transfer_request(state);
            operations::dispatch(state, request)
        }
        Message::ExecuteCommand => {
            let request = operations::command_request(state);
            operations::dispatch(state, request)
        }
        Message::RerunCommand { index } => operations::rerun_command(state, index),
        Message::RerunTransfer { index } => operations::rerun_transfer(state, index),

        // ─────────────────────────────────────────────────────────
        // Forms
        // ─────────────────────────────────────────────────────────
        Message::SetTransferSource(path) => forms::handle_set_transfer_source(state, path),
        Message::SetTransferDest(path) => forms::handle_set_transfer_dest(state, path),
        Message::SetTransferDirection(direction) => {
            forms::handle_set_transfer_direction(state, direction)
        }
        Message::SwapTransferDirection => forms::handle_swap_transfer(state),
        Message::SetCommand(command) => forms::handle_set_command(state, command),
        Message::SetCommandTarget(target) => forms::handle_set_command_target(state, target),
        Message::UsePreset(index) => forms::handle_use_preset(state, index),
        Message::UseHistoryCommand(index) => forms::handle_use_history_command(state, index),
        Message::ToggleFileSelection { device, path } => {
            forms::handle_toggle_file_selection(state, device, path)
        }

        // ─────────────────────────────────────────────────────────
        // Completions
        // ─────────────────────────────────────────────────────────
        Message::OperationCompleted {
            kind,
            epoch,
            result,
        } => operations::handle_completed(state, kind, epoch, result),
    }
}

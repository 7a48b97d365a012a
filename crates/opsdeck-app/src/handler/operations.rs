//! Operation dispatch and response application
//!
//! Every request goes through [`dispatch`]: the kind's reentry rule is
//! checked first, then local validation, and only then does the kind move to
//! `Loading` and receive an epoch. Responses are applied through
//! [`handle_completed`], which drops anything whose epoch is no longer
//! current.

use chrono::Local;
use opsdeck_core::prelude::*;
use opsdeck_core::{
    Epoch, HistoryEntry, OperationError, OperationKind, OperationOutcome, OperationRequest,
    Reentry,
};

use super::{UpdateAction, UpdateResult};
use crate::state::{AppState, Operations};

/// Gate and start a request.
pub(crate) fn dispatch(state: &mut AppState, request: OperationRequest) -> UpdateResult {
    let kind = request.kind();

    if kind.reentry() == Reentry::Reject && state.operations.is_loading(kind) {
        warn!("Ignoring {} request: one is already in flight", kind);
        *state.rejected_dispatches.entry(kind).or_default() += 1;
        return UpdateResult::none();
    }

    if let Err(error) = request.validate() {
        info!("{} not sent: {}", kind, error);
        reject_locally(&mut state.operations, kind, error);
        return UpdateResult::none();
    }

    let Some(epoch) = begin(&mut state.operations, kind) else {
        // Only reachable for Reject kinds, which were handled above.
        return UpdateResult::none();
    };

    debug!("Starting {} {}", kind, epoch);
    UpdateResult::action(UpdateAction::Dispatch { epoch, request })
}

fn begin(ops: &mut Operations, kind: OperationKind) -> Option<Epoch> {
    match kind {
        OperationKind::ConnectionTest => ops.connection.begin(),
        OperationKind::ListFiles => ops.files.begin(),
        OperationKind::TransferFile => ops.transfer.begin(),
        OperationKind::ExecuteCommand => ops.command.begin(),
        OperationKind::TelemetryPoll => ops.telemetry.begin(),
    }
}

fn reject_locally(ops: &mut Operations, kind: OperationKind, error: OperationError) {
    match kind {
        OperationKind::ConnectionTest => ops.connection.reject_locally(error),
        OperationKind::ListFiles => ops.files.reject_locally(error),
        OperationKind::TransferFile => ops.transfer.reject_locally(error),
        OperationKind::ExecuteCommand => ops.command.reject_locally(error),
        OperationKind::TelemetryPoll => ops.telemetry.reject_locally(error),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request builders
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) fn connection_test_request(state: &AppState) -> OperationRequest {
    OperationRequest::ConnectionTest {
        devices: state.devices.snapshot_pair(),
    }
}

pub(crate) fn list_files_request(state: &AppState) -> OperationRequest {
    OperationRequest::ListFiles {
        devices: state.devices.snapshot_pair(),
    }
}

pub(crate) fn transfer_request(state: &AppState) -> OperationRequest {
    let form = &state.transfer_form;
    OperationRequest::TransferFile {
        devices: state.devices.snapshot_pair(),
        source_path: form.source_path.clone(),
        dest_path: form.dest_path.clone(),
        direction: form.direction,
    }
}

pub(crate) fn command_request(state: &AppState) -> OperationRequest {
    OperationRequest::ExecuteCommand {
        devices: state.devices.snapshot_pair(),
        target: state.command_form.target,
        command: state.command_form.command.clone(),
    }
}

/// Re-issue a command history entry with its original command and target.
pub(crate) fn rerun_command(state: &mut AppState, index: usize) -> UpdateResult {
    let Some(entry) = state.histories.command.get(index) else {
        warn!("No command history entry at {}", index);
        return UpdateResult::none();
    };
    let request = OperationRequest::ExecuteCommand {
        devices: state.devices.snapshot_pair(),
        target: entry.result.device,
        command: entry.result.command.clone(),
    };
    dispatch(state, request)
}

/// Re-issue a transfer history entry with its original paths and direction.
pub(crate) fn rerun_transfer(state: &mut AppState, index: usize) -> UpdateResult {
    let Some(entry) = state.histories.transfer.get(index) else {
        warn!("No transfer history entry at {}", index);
        return UpdateResult::none();
    };
    let details = &entry.result.transfer_details;
    let request = OperationRequest::TransferFile {
        devices: state.devices.snapshot_pair(),
        source_path: details.source_path.clone(),
        dest_path: details.destination_path.clone(),
        direction: entry.result.direction,
    };
    dispatch(state, request)
}

// ─────────────────────────────────────────────────────────────────────────────
// Completion
// ─────────────────────────────────────────────────────────────────────────────

pub(crate) fn handle_completed(
    state: &mut AppState,
    kind: OperationKind,
    epoch: Epoch,
    result: std::result::Result<OperationOutcome, OperationError>,
) -> UpdateResult {
    let applied = match result {
        Ok(outcome) => apply_success(state, epoch, outcome),
        Err(error) => apply_failure(state, kind, epoch, error),
    };

    if !applied {
        debug!("Discarding stale {} response {}", kind, epoch);
    }
    UpdateResult::none()
}

fn apply_success(state: &mut AppState, epoch: Epoch, outcome: OperationOutcome) -> bool {
    let ops = &mut state.operations;
    match outcome {
        OperationOutcome::ConnectionTest(result) => {
            let applied = ops.connection.succeed(epoch, result.clone());
            if applied {
                state.histories.connection.push(HistoryEntry::new(result));
            }
            applied
        }
        OperationOutcome::ListFiles(listing) => {
            let applied = ops.files.succeed(epoch, listing);
            if applied {
                state.file_selection.clear();
            }
            applied
        }
        OperationOutcome::TransferFile(result) => {
            let applied = ops.transfer.succeed(epoch, result.clone());
            if applied {
                info!("Transferred {}", result.label());
                state.histories.transfer.push(HistoryEntry::new(result));
            }
            applied
        }
        OperationOutcome::ExecuteCommand(result) => {
            let applied = ops.command.succeed(epoch, result.clone());
            if applied {
                state.histories.command.push(HistoryEntry::new(result));
            }
            applied
        }
        OperationOutcome::TelemetryPoll(report) => {
            let findings = report.critical_findings();
            let applied = ops.telemetry.succeed(epoch, report);
            if applied {
                state.monitor.last_update = Some(Local::now());
                state.monitor.awaiting_first_report = false;
                if findings.is_empty() {
                    debug!("Telemetry updated, no critical findings");
                } else {
                    warn!("Security alert: {}", findings.join("; "));
                }
            }
            applied
        }
    }
}

fn apply_failure(
    state: &mut AppState,
    kind: OperationKind,
    epoch: Epoch,
    error: OperationError,
) -> bool {
    let ops = &mut state.operations;
    let message = error.to_string();
    let applied = match kind {
        OperationKind::ConnectionTest => ops.connection.fail(epoch, error),
        OperationKind::ListFiles => ops.files.fail(epoch, error),
        OperationKind::TransferFile => ops.transfer.fail(epoch, error),
        OperationKind::ExecuteCommand => ops.command.fail(epoch, error),
        OperationKind::TelemetryPoll => {
            let applied = ops.telemetry.fail(epoch, error);
            if applied {
                state.monitor.awaiting_first_report = false;
            }
            applied
        }
    };
    if applied {
        warn!("{} failed: {}", kind, message);
    }
    applied
}

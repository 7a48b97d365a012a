//! Device config and form edits

use opsdeck_core::prelude::*;
use opsdeck_core::{DeviceField, DeviceId, TransferDirection};

use super::UpdateResult;
use crate::state::{AppState, COMMAND_PRESETS};

/// Edits land in the live store; requests already in flight keep the
/// snapshot they were built with.
pub(crate) fn handle_edit_device(
    state: &mut AppState,
    device: DeviceId,
    field: DeviceField,
    value: String,
) -> UpdateResult {
    if field == DeviceField::Password {
        debug!("{} password updated", device);
    } else {
        debug!("{} {:?} = {:?}", device, field, value);
    }
    state.devices.set_field(device, field, value);
    UpdateResult::none()
}

pub(crate) fn handle_set_transfer_source(state: &mut AppState, path: String) -> UpdateResult {
    state.transfer_form.source_path = path;
    UpdateResult::none()
}

pub(crate) fn handle_set_transfer_dest(state: &mut AppState, path: String) -> UpdateResult {
    state.transfer_form.dest_path = path;
    UpdateResult::none()
}

pub(crate) fn handle_set_transfer_direction(
    state: &mut AppState,
    direction: TransferDirection,
) -> UpdateResult {
    state.transfer_form.direction = direction;
    UpdateResult::none()
}

pub(crate) fn handle_swap_transfer(state: &mut AppState) -> UpdateResult {
    state.transfer_form.swap();
    debug!("Transfer direction now {}", state.transfer_form.direction);
    UpdateResult::none()
}

pub(crate) fn handle_set_command(state: &mut AppState, command: String) -> UpdateResult {
    state.command_form.command = command;
    UpdateResult::none()
}

pub(crate) fn handle_set_command_target(state: &mut AppState, target: DeviceId) -> UpdateResult {
    state.command_form.target = target;
    UpdateResult::none()
}

pub(crate) fn handle_use_preset(state: &mut AppState, index: usize) -> UpdateResult {
    match COMMAND_PRESETS.get(index) {
        Some(preset) => state.command_form.command = (*preset).to_string(),
        None => warn!("No command preset at {}", index),
    }
    UpdateResult::none()
}

/// Copy a past command (and its target) into the form without running it.
pub(crate) fn handle_use_history_command(state: &mut AppState, index: usize) -> UpdateResult {
    match state.histories.command.get(index) {
        Some(entry) => {
            state.command_form.command = entry.result.command.clone();
            state.command_form.target = entry.result.device;
        }
        None => warn!("No command history entry at {}", index),
    }
    UpdateResult::none()
}

pub(crate) fn handle_toggle_file_selection(
    state: &mut AppState,
    device: DeviceId,
    path: String,
) -> UpdateResult {
    let selected = state.file_selection.get_mut(device).toggle(path);
    trace!(
        "{} selection now has {} file(s) (last toggle {})",
        device,
        state.file_selection.get(device).len(),
        if selected { "on" } else { "off" }
    );
    UpdateResult::none()
}

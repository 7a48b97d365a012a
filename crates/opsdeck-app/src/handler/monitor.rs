//! Telemetry polling controller
//!
//! `Polling` holds exactly while the monitor view is shown and auto-refresh
//! is on. Entering the monitor always polls once immediately; the periodic
//! timer only runs when auto-refresh is also on. Leaving `Polling` stops the
//! timer and abandons any in-flight poll so its response is discarded.

use tokio::sync::watch;

use opsdeck_core::prelude::*;
use opsdeck_core::OperationRequest;

use super::operations::dispatch;
use super::{UpdateAction, UpdateResult};
use crate::message::Message;
use crate::state::{AppPhase, AppState, PollingPhase, View};

pub(crate) fn handle_switch_view(state: &mut AppState, view: View) -> UpdateResult {
    if state.view == view {
        return UpdateResult::none();
    }

    let previous = std::mem::replace(&mut state.view, view);
    info!("View: {} -> {}", previous, view);

    if previous == View::Monitor {
        stop_polling(state);
        return UpdateResult::none();
    }

    if view == View::Monitor {
        return activate_monitor(state);
    }

    UpdateResult::none()
}

pub(crate) fn handle_start(state: &mut AppState) -> UpdateResult {
    info!("Starting in {} view", state.view);
    if state.view == View::Monitor && !state.monitor.is_polling() {
        return activate_monitor(state);
    }
    UpdateResult::none()
}

fn activate_monitor(state: &mut AppState) -> UpdateResult {
    if state.wants_polling() {
        return start_polling(state);
    }
    UpdateResult::message(Message::RefreshTelemetry)
}

pub(crate) fn handle_set_auto_refresh(state: &mut AppState, enabled: bool) -> UpdateResult {
    if state.monitor.auto_refresh == enabled {
        return UpdateResult::none();
    }
    state.monitor.auto_refresh = enabled;
    info!(
        "Auto-refresh {}",
        if enabled { "enabled" } else { "disabled" }
    );

    if enabled && state.wants_polling() {
        return start_polling(state);
    }
    if !enabled && state.monitor.is_polling() {
        stop_polling(state);
    }
    UpdateResult::none()
}

/// Poll now. Supersedes a poll already in flight.
pub(crate) fn handle_refresh(state: &mut AppState) -> UpdateResult {
    if state.phase == AppPhase::Quitting {
        return UpdateResult::none();
    }
    dispatch(state, OperationRequest::TelemetryPoll)
}

pub(crate) fn handle_tick(state: &mut AppState, generation: u64) -> UpdateResult {
    if !state.monitor.is_polling() || generation != state.monitor.timer_generation {
        trace!("Ignoring telemetry tick from timer generation {}", generation);
        return UpdateResult::none();
    }
    handle_refresh(state)
}

pub(crate) fn handle_quit(state: &mut AppState) -> UpdateResult {
    stop_polling(state);
    state.phase = AppPhase::Quitting;
    UpdateResult::none()
}

/// Enter `Polling`: start a fresh timer and poll once right away.
fn start_polling(state: &mut AppState) -> UpdateResult {
    if state.monitor.is_polling() {
        return UpdateResult::none();
    }

    let (stop_tx, stop_rx) = watch::channel(false);
    state.monitor.timer_generation += 1;
    state.monitor.timer_shutdown = Some(stop_tx);
    state.monitor.polling = PollingPhase::Polling;

    let generation = state.monitor.timer_generation;
    let period = state.monitor.poll_interval;
    info!(
        "Telemetry polling started (every {}ms, timer {})",
        period.as_millis(),
        generation
    );

    UpdateResult {
        message: Some(Message::RefreshTelemetry),
        action: Some(UpdateAction::StartTelemetryTimer {
            generation,
            period,
            stop_rx,
        }),
    }
}

/// Leave `Polling` (if in it) and abandon any in-flight poll.
pub(crate) fn stop_polling(state: &mut AppState) {
    if let Some(stop_tx) = state.monitor.timer_shutdown.take() {
        let _ = stop_tx.send(true);
    }
    if state.monitor.is_polling() {
        state.monitor.polling = PollingPhase::Stopped;
        info!("Telemetry polling stopped");
    }
    if state.operations.telemetry.is_loading() {
        debug!(
            "Abandoning in-flight telemetry poll {}",
            state.operations.telemetry.epoch()
        );
        state.operations.telemetry.abandon();
    }
}

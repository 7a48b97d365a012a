//! Application state (Model in TEA pattern)

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::watch;

use opsdeck_core::{
    swap_direction, CommandResult, ConnectionTestResult, DeviceId, DeviceStore, Epoch,
    FileListing, FileSelection, HistoryLog, MonitoringReport, OperationError, OperationKind,
    OperationState, Phase, TransferDirection, TransferResult,
};

use crate::config::Settings;

/// Commonly used commands offered as one-step presets.
pub const COMMAND_PRESETS: [&str; 8] = [
    "ls -la",
    "pwd",
    "whoami",
    "df -h",
    "free -h",
    "ps aux",
    "netstat -tulpn",
    "uname -a",
];

// ─────────────────────────────────────────────────────────────────────────────
// Views
// ─────────────────────────────────────────────────────────────────────────────

/// Operator-facing screens. Only [`View::Monitor`] drives background polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    Monitor,
    Connection,
    Files,
    Transfer,
    Commands,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            View::Monitor => "monitor",
            View::Connection => "connection",
            View::Files => "files",
            View::Transfer => "transfer",
            View::Commands => "commands",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monitor" | "dashboard" => Ok(View::Monitor),
            "connection" | "connections" | "test" => Ok(View::Connection),
            "files" | "explorer" => Ok(View::Files),
            "transfer" => Ok(View::Transfer),
            "commands" | "command" | "exec" => Ok(View::Commands),
            other => Err(format!("unknown view '{}'", other)),
        }
    }
}

/// Application-level lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppPhase {
    #[default]
    Running,
    Quitting,
}

// ─────────────────────────────────────────────────────────────────────────────
// Monitor
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollingPhase {
    #[default]
    Stopped,
    Polling,
}

/// Periodic telemetry polling controller state.
///
/// `Polling` holds exactly while the monitor view is active and
/// auto-refresh is on. Every start bumps `timer_generation`; ticks from an
/// older timer are ignored.
#[derive(Debug)]
pub struct MonitorState {
    pub auto_refresh: bool,
    pub poll_interval: Duration,
    pub polling: PollingPhase,
    pub timer_generation: u64,
    /// Stops the running timer task. `Some` only while `Polling`.
    pub(crate) timer_shutdown: Option<watch::Sender<bool>>,
    /// Local time the last report was applied.
    pub last_update: Option<DateTime<Local>>,
    /// True until the first report or error arrives.
    pub awaiting_first_report: bool,
}

impl MonitorState {
    pub fn new(auto_refresh: bool, poll_interval: Duration) -> Self {
        Self {
            auto_refresh,
            poll_interval,
            polling: PollingPhase::Stopped,
            timer_generation: 0,
            timer_shutdown: None,
            last_update: None,
            awaiting_first_report: true,
        }
    }

    pub fn is_polling(&self) -> bool {
        self.polling == PollingPhase::Polling
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Forms
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferForm {
    pub source_path: String,
    pub dest_path: String,
    pub direction: TransferDirection,
}

impl TransferForm {
    /// Reverse the direction and exchange the two paths.
    pub fn swap(&mut self) {
        let (direction, source_path, dest_path) = swap_direction(
            self.direction,
            std::mem::take(&mut self.source_path),
            std::mem::take(&mut self.dest_path),
        );
        self.direction = direction;
        self.source_path = source_path;
        self.dest_path = dest_path;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandForm {
    pub command: String,
    pub target: DeviceId,
}

/// Selected listed paths, per device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSelections {
    pub device1: FileSelection,
    pub device2: FileSelection,
}

impl FileSelections {
    pub fn get(&self, id: DeviceId) -> &FileSelection {
        match id {
            DeviceId::Device1 => &self.device1,
            DeviceId::Device2 => &self.device2,
        }
    }

    pub fn get_mut(&mut self, id: DeviceId) -> &mut FileSelection {
        match id {
            DeviceId::Device1 => &mut self.device1,
            DeviceId::Device2 => &mut self.device2,
        }
    }

    pub fn clear(&mut self) {
        self.device1.clear();
        self.device2.clear();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Operations & history
// ─────────────────────────────────────────────────────────────────────────────

/// Kind-independent view of one [`OperationState`].
#[derive(Debug, Clone, PartialEq)]
pub struct OperationOverview {
    pub phase: Phase,
    pub epoch: Epoch,
    pub revision: u64,
    pub last_error: Option<OperationError>,
}

impl<R> From<&OperationState<R>> for OperationOverview {
    fn from(op: &OperationState<R>) -> Self {
        Self {
            phase: op.phase(),
            epoch: op.epoch(),
            revision: op.revision(),
            last_error: op.last_error().cloned(),
        }
    }
}

/// One lifecycle per operation kind.
#[derive(Debug)]
pub struct Operations {
    pub connection: OperationState<ConnectionTestResult>,
    pub files: OperationState<FileListing>,
    pub transfer: OperationState<TransferResult>,
    pub command: OperationState<CommandResult>,
    pub telemetry: OperationState<Box<MonitoringReport>>,
}

impl Default for Operations {
    fn default() -> Self {
        Self {
            connection: OperationState::new(OperationKind::ConnectionTest),
            files: OperationState::new(OperationKind::ListFiles),
            transfer: OperationState::new(OperationKind::TransferFile),
            command: OperationState::new(OperationKind::ExecuteCommand),
            telemetry: OperationState::new(OperationKind::TelemetryPoll),
        }
    }
}

impl Operations {
    pub fn overview(&self, kind: OperationKind) -> OperationOverview {
        match kind {
            OperationKind::ConnectionTest => (&self.connection).into(),
            OperationKind::ListFiles => (&self.files).into(),
            OperationKind::TransferFile => (&self.transfer).into(),
            OperationKind::ExecuteCommand => (&self.command).into(),
            OperationKind::TelemetryPoll => (&self.telemetry).into(),
        }
    }

    pub fn is_loading(&self, kind: OperationKind) -> bool {
        self.overview(kind).phase == Phase::Loading
    }
}

/// History logs for the kinds that keep one.
#[derive(Debug)]
pub struct Histories {
    pub connection: HistoryLog<ConnectionTestResult>,
    pub transfer: HistoryLog<TransferResult>,
    pub command: HistoryLog<CommandResult>,
}

impl Default for Histories {
    fn default() -> Self {
        let capacity = |kind: OperationKind| kind.history_capacity().unwrap_or_default();
        Self {
            connection: HistoryLog::new(capacity(OperationKind::ConnectionTest)),
            transfer: HistoryLog::new(capacity(OperationKind::TransferFile)),
            command: HistoryLog::new(capacity(OperationKind::ExecuteCommand)),
        }
    }
}

impl Histories {
    /// Entry count for `kind`; 0 for kinds without history.
    pub fn len(&self, kind: OperationKind) -> usize {
        match kind {
            OperationKind::ConnectionTest => self.connection.len(),
            OperationKind::TransferFile => self.transfer.len(),
            OperationKind::ExecuteCommand => self.command.len(),
            OperationKind::ListFiles | OperationKind::TelemetryPoll => 0,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
/// Complete application state (the Model in TEA)
#[derive(Debug)]
pub struct AppState {
    /// Currently displayed view
    pub view: View,

    pub phase: AppPhase,

    /// Application settings from config file
    pub settings: Settings,

    /// Live device configs edited by the operator
    pub devices: DeviceStore,

    pub operations: Operations,

    pub histories: Histories,

    pub monitor: MonitorState,

    pub transfer_form: TransferForm,

    pub command_form: CommandForm,

    pub file_selection: FileSelections,

    /// Dispatches refused because the kind was already loading
    pub rejected_dispatches: HashMap<OperationKind, u64>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let monitor = MonitorState::new(
            settings.monitor.auto_refresh,
            settings.monitor.poll_interval(),
        );
        Self {
            view: View::default(),
            phase: AppPhase::Running,
            devices: settings.devices.to_store(),
            operations: Operations::default(),
            histories: Histories::default(),
            monitor,
            transfer_form: TransferForm::default(),
            command_form: CommandForm::default(),
            file_selection: FileSelections::default(),
            rejected_dispatches: HashMap::new(),
            settings,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.phase == AppPhase::Quitting
    }

    /// Whether the periodic telemetry timer should be running.
    pub fn wants_polling(&self) -> bool {
        self.phase == AppPhase::Running && self.view == View::Monitor && self.monitor.auto_refresh
    }

    pub fn rejected_count(&self, kind: OperationKind) -> u64 {
        self.rejected_dispatches.get(&kind).copied().unwrap_or_default()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

//! Headless mode - NDJSON event output
//!
//! The console reads line commands on stdin and writes one JSON object per
//! line to stdout. Every object has an `"event"` field naming its type and a
//! `timestamp` in milliseconds. Logs go to the log file, never stdout.
//!
//! # Example Output
//!
//! ```json
//! {"event":"ready","backend":"http://localhost:5000","view":"monitor","auto_refresh":true,"timestamp":1704700001000}
//! {"event":"polling_started","period_ms":5000,"timestamp":1704700001002}
//! {"event":"operation_started","kind":"telemetry_poll","epoch":1,"timestamp":1704700001003}
//! ```

pub mod commands;
pub mod oneshot;
pub mod runner;

use chrono::Utc;
use serde::Serialize;
use std::io::{self, Write};
use tracing::error;

use opsdeck_app::state::{AppState, PollingPhase, View};
use opsdeck_app::EngineEvent;
use opsdeck_core::telemetry::ResourceProcess;
use opsdeck_core::{
    DeviceId, FileCategory, HealthStatus, OperationError, OperationKind, Phase, ResourceGauge,
    Severity,
};

/// Events emitted in headless mode
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HeadlessEvent {
    /// Console is ready for commands
    Ready {
        backend: String,
        view: View,
        auto_refresh: bool,
        timestamp: i64,
    },

    ViewChanged {
        from: View,
        to: View,
        timestamp: i64,
    },

    OperationStarted {
        kind: OperationKind,
        epoch: u64,
        timestamp: i64,
    },

    /// `result` is the typed result as JSON; omitted for telemetry, which
    /// has its own event.
    OperationSucceeded {
        kind: OperationKind,
        epoch: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<serde_json::Value>,
        /// ListFiles only
        #[serde(skip_serializing_if = "Option::is_none")]
        files: Option<Vec<ListedFile>>,
        /// ConnectionTest only
        #[serde(skip_serializing_if = "Option::is_none")]
        connections: Option<Vec<ConnectionSummary>>,
        timestamp: i64,
    },

    OperationFailed {
        kind: OperationKind,
        category: String,
        message: String,
        timestamp: i64,
    },

    OperationAbandoned {
        kind: OperationKind,
        timestamp: i64,
    },

    DispatchRejected {
        kind: OperationKind,
        timestamp: i64,
    },

    HistoryChanged {
        kind: OperationKind,
        len: usize,
        timestamp: i64,
    },

    PollingStarted {
        period_ms: u64,
        timestamp: i64,
    },

    PollingStopped {
        timestamp: i64,
    },

    TelemetryUpdated {
        hostname: String,
        gauges: Vec<ResourceGauge>,
        load_average: String,
        critical_findings: Vec<String>,
        high_resource_processes: Vec<ProcessUsage>,
        timestamp: i64,
    },

    DeviceUpdated {
        device: DeviceId,
        timestamp: i64,
    },

    Health {
        status: String,
        service: String,
        backend_timestamp: String,
        timestamp: i64,
    },

    Status(Box<StatusSummary>),

    Error {
        message: String,
        fatal: bool,
        timestamp: i64,
    },

    Shutdown {
        timestamp: i64,
    },
}

/// Snapshot printed by the `status` command.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSummary {
    pub view: View,
    pub polling: PollingPhase,
    pub auto_refresh: bool,
    pub last_update: Option<String>,
    pub operations: Vec<OperationStatus>,
    pub devices: Vec<DeviceSummary>,
    pub transfer_direction: String,
    pub command_target: DeviceId,
    /// Newest first, as `"<device>: <command>"`
    pub command_history: Vec<String>,
    /// Newest first, as `"<file> (<size>)"`
    pub transfer_history: Vec<String>,
    pub connection_history: usize,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OperationStatus {
    pub kind: OperationKind,
    pub phase: Phase,
    pub epoch: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Device config without the credential.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceSummary {
    pub device: DeviceId,
    pub username: String,
    pub host: String,
    pub directory: String,
    pub selected_files: Vec<String>,
}

/// A listed path with its category and selection mark.
#[derive(Debug, Clone, Serialize)]
pub struct ListedFile {
    pub device: DeviceId,
    pub path: String,
    pub category: FileCategory,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionSummary {
    pub device: DeviceId,
    pub status: String,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessUsage {
    pub pid: u32,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_percent: Option<f64>,
    pub cpu_severity: Severity,
    pub memory_severity: Severity,
}

impl From<&ResourceProcess> for ProcessUsage {
    fn from(process: &ResourceProcess) -> Self {
        Self {
            pid: process.pid,
            name: process.name.clone(),
            cpu_percent: process.cpu_percent,
            memory_percent: process.memory_percent,
            cpu_severity: process.cpu_severity(),
            memory_severity: process.memory_severity(),
        }
    }
}

impl HeadlessEvent {
    /// Emit this event to stdout as JSON
    pub fn emit(&self) {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize headless event: {}", e);
                return;
            }
        };

        // Write to stdout with newline (NDJSON format)
        let mut stdout = io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", json) {
            error!("Failed to write headless event to stdout: {}", e);
            return;
        }

        if let Err(e) = stdout.flush() {
            error!("Failed to flush headless stdout: {}", e);
        }
    }

    /// Get current timestamp in milliseconds
    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }

    // ─────────────────────────────────────────────────────────
    // Convenience constructors
    // ─────────────────────────────────────────────────────────

    pub fn ready(state: &AppState) -> Self {
        Self::Ready {
            backend: state.settings.backend.base_url.clone(),
            view: state.view,
            auto_refresh: state.monitor.auto_refresh,
            timestamp: Self::now(),
        }
    }

    pub fn error(message: impl Into<String>, fatal: bool) -> Self {
        Self::Error {
            message: message.into(),
            fatal,
            timestamp: Self::now(),
        }
    }

    pub fn operation_failed(kind: OperationKind, error: &OperationError) -> Self {
        Self::OperationFailed {
            kind,
            category: error.category().to_string(),
            message: error.to_string(),
            timestamp: Self::now(),
        }
    }

    pub fn health(health: HealthStatus) -> Self {
        Self::Health {
            status: health.status,
            service: health.service,
            backend_timestamp: health.timestamp,
            timestamp: Self::now(),
        }
    }

    /// Latest result of `kind` as JSON, if it has one worth printing.
    pub fn operation_succeeded(state: &AppState, kind: OperationKind, epoch: u64) -> Self {
        let ops = &state.operations;
        let result = match kind {
            OperationKind::ConnectionTest => to_json(ops.connection.last_result()),
            OperationKind::ListFiles => to_json(ops.files.last_result()),
            OperationKind::TransferFile => to_json(ops.transfer.last_result()),
            OperationKind::ExecuteCommand => to_json(ops.command.last_result()),
            OperationKind::TelemetryPoll => None,
        };
        let files = match kind {
            OperationKind::ListFiles => ops.files.last_result().map(|listing| {
                DeviceId::ALL
                    .into_iter()
                    .flat_map(move |device| {
                        let selection = state.file_selection.get(device);
                        listing.data.get(device).iter().map(move |path| ListedFile {
                            device,
                            path: path.clone(),
                            category: FileCategory::from_path(path),
                            selected: selection.contains(path),
                        })
                    })
                    .collect()
            }),
            _ => None,
        };
        let connections = match kind {
            OperationKind::ConnectionTest => ops.connection.last_result().map(|result| {
                DeviceId::ALL
                    .into_iter()
                    .map(|device| {
                        let test = result.connection_tests.get(device);
                        ConnectionSummary {
                            device,
                            status: test.status.to_string(),
                            message: test.message.trim_end().to_string(),
                            severity: test.status.severity(),
                        }
                    })
                    .collect()
            }),
            _ => None,
        };
        Self::OperationSucceeded {
            kind,
            epoch,
            result,
            files,
            connections,
            timestamp: Self::now(),
        }
    }

    /// Translate an engine event, reading details from the current state.
    pub fn from_engine_event(event: &EngineEvent, state: &AppState) -> Option<Self> {
        let timestamp = Self::now();
        let translated = match event {
            EngineEvent::ViewChanged { from, to } => Self::ViewChanged {
                from: *from,
                to: *to,
                timestamp,
            },
            EngineEvent::OperationStarted { kind, epoch } => Self::OperationStarted {
                kind: *kind,
                epoch: epoch.value(),
                timestamp,
            },
            EngineEvent::OperationSucceeded { kind, epoch } => {
                Self::operation_succeeded(state, *kind, epoch.value())
            }
            EngineEvent::OperationFailed { kind, error } => Self::operation_failed(*kind, error),
            EngineEvent::OperationAbandoned { kind } => Self::OperationAbandoned {
                kind: *kind,
                timestamp,
            },
            EngineEvent::DispatchRejected { kind } => Self::DispatchRejected {
                kind: *kind,
                timestamp,
            },
            EngineEvent::HistoryUpdated { kind, len } => Self::HistoryChanged {
                kind: *kind,
                len: *len,
                timestamp,
            },
            EngineEvent::PollingStarted { period_ms, .. } => Self::PollingStarted {
                period_ms: *period_ms,
                timestamp,
            },
            EngineEvent::PollingStopped => Self::PollingStopped { timestamp },
            EngineEvent::TelemetryUpdated { critical_findings } => {
                let report = state.operations.telemetry.last_result()?;
                Self::TelemetryUpdated {
                    hostname: report.system_info.hostname.clone(),
                    gauges: report.gauges(),
                    load_average: report.load_average_display(),
                    critical_findings: critical_findings.clone(),
                    high_resource_processes: report
                        .process_scan
                        .high_resource_processes
                        .iter()
                        .map(ProcessUsage::from)
                        .collect(),
                    timestamp,
                }
            }
            EngineEvent::DeviceUpdated { device } => Self::DeviceUpdated {
                device: *device,
                timestamp,
            },
            EngineEvent::Shutdown => Self::Shutdown { timestamp },
        };
        Some(translated)
    }

    pub fn status(state: &AppState) -> Self {
        let operations = OperationKind::ALL
            .into_iter()
            .map(|kind| {
                let overview = state.operations.overview(kind);
                OperationStatus {
                    kind,
                    phase: overview.phase,
                    epoch: overview.epoch.value(),
                    error: overview.last_error.map(|e| e.to_string()),
                }
            })
            .collect();

        let devices = DeviceId::ALL
            .into_iter()
            .map(|device| {
                let config = state.devices.get(device);
                DeviceSummary {
                    device,
                    username: config.username.clone(),
                    host: config.host.clone(),
                    directory: config.directory.clone(),
                    selected_files: state
                        .file_selection
                        .get(device)
                        .iter()
                        .map(str::to_string)
                        .collect(),
                }
            })
            .collect();

        Self::Status(Box::new(StatusSummary {
            view: state.view,
            polling: state.monitor.polling,
            auto_refresh: state.monitor.auto_refresh,
            last_update: state.monitor.last_update.map(|t| t.to_rfc3339()),
            operations,
            devices,
            transfer_direction: state.transfer_form.direction.to_string(),
            command_target: state.command_form.target,
            command_history: state
                .histories
                .command
                .list()
                .map(|entry| format!("{}: {}", entry.result.device, entry.result.command))
                .collect(),
            transfer_history: state
                .histories
                .transfer
                .list()
                .map(|entry| entry.result.label())
                .collect(),
            connection_history: state.histories.connection.len(),
            timestamp: Self::now(),
        }))
    }
}

fn to_json<T: Serialize>(value: Option<&T>) -> Option<serde_json::Value> {
    value.and_then(|v| serde_json::to_value(v).ok())
}

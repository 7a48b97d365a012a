//! Backend request and result shapes.
//!
//! Field names here are the backend's JSON contract and must not be renamed.
//! [`OperationRequest`] and [`OperationOutcome`] are the tagged per-kind
//! bundles that cross the orchestration boundary; presentation code only
//! ever sees these typed variants, never raw JSON.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::device::{DeviceConfig, DeviceId, DevicePair};
use crate::error::OperationError;
use crate::operation::OperationKind;
use crate::telemetry::MonitoringReport;

// ─────────────────────────────────────────────────────────────────
// Transfer direction
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum TransferDirection {
    #[default]
    #[serde(rename = "device1_to_device2")]
    Device1ToDevice2,
    #[serde(rename = "device2_to_device1")]
    Device2ToDevice1,
}

impl TransferDirection {
    pub fn reversed(&self) -> Self {
        match self {
            TransferDirection::Device1ToDevice2 => TransferDirection::Device2ToDevice1,
            TransferDirection::Device2ToDevice1 => TransferDirection::Device1ToDevice2,
        }
    }

    pub fn source(&self) -> DeviceId {
        match self {
            TransferDirection::Device1ToDevice2 => DeviceId::Device1,
            TransferDirection::Device2ToDevice1 => DeviceId::Device2,
        }
    }

    pub fn destination(&self) -> DeviceId {
        self.source().other()
    }

    /// Direction whose source is `device`.
    pub fn from_source(device: DeviceId) -> Self {
        match device {
            DeviceId::Device1 => TransferDirection::Device1ToDevice2,
            DeviceId::Device2 => TransferDirection::Device2ToDevice1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferDirection::Device1ToDevice2 => "device1_to_device2",
            TransferDirection::Device2ToDevice1 => "device2_to_device1",
        }
    }
}

impl fmt::Display for TransferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransferDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "device1_to_device2" | "d1" | "1" | "device1" => Ok(TransferDirection::Device1ToDevice2),
            "device2_to_device1" | "d2" | "2" | "device2" => Ok(TransferDirection::Device2ToDevice1),
            other => Err(format!("unknown transfer direction '{}'", other)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Request bodies
// ─────────────────────────────────────────────────────────────────

/// Body of `POST /api/transfer-file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferBody<'a> {
    pub device1: &'a DeviceConfig,
    pub device2: &'a DeviceConfig,
    pub source_path: &'a str,
    pub dest_path: &'a str,
    pub direction: TransferDirection,
}

/// Body of `POST /api/execute-command`.
///
/// The backend looks the target up under the key named by `device`, so a
/// `device2` target carries the `device2` snapshot as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandBody<'a> {
    pub device: DeviceId,
    pub command: &'a str,
    pub device1: &'a DeviceConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device2: Option<&'a DeviceConfig>,
}

// ─────────────────────────────────────────────────────────────────
// Results
// ─────────────────────────────────────────────────────────────────

/// Reachability verdict for one device.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum ConnectionStatus {
    Connected,
    Failed,
    Timeout,
    Unknown(String),
}

impl From<String> for ConnectionStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "connected" => ConnectionStatus::Connected,
            "failed" => ConnectionStatus::Failed,
            "timeout" => ConnectionStatus::Timeout,
            _ => ConnectionStatus::Unknown(s),
        }
    }
}

impl From<ConnectionStatus> for String {
    fn from(status: ConnectionStatus) -> Self {
        match status {
            ConnectionStatus::Connected => "connected".to_string(),
            ConnectionStatus::Failed => "failed".to_string(),
            ConnectionStatus::Timeout => "timeout".to_string(),
            ConnectionStatus::Unknown(s) => s,
        }
    }
}

impl ConnectionStatus {
    pub fn severity(&self) -> crate::view::Severity {
        use crate::view::Severity;
        match self {
            ConnectionStatus::Connected => Severity::Normal,
            ConnectionStatus::Failed => Severity::Critical,
            ConnectionStatus::Timeout | ConnectionStatus::Unknown(_) => Severity::Warning,
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Connected => f.write_str("connected"),
            ConnectionStatus::Failed => f.write_str("failed"),
            ConnectionStatus::Timeout => f.write_str("timeout"),
            ConnectionStatus::Unknown(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceConnection {
    pub status: ConnectionStatus,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConnectionTests {
    pub device1: DeviceConnection,
    pub device2: DeviceConnection,
}

impl ConnectionTests {
    pub fn get(&self, id: DeviceId) -> &DeviceConnection {
        match id {
            DeviceId::Device1 => &self.device1,
            DeviceId::Device2 => &self.device2,
        }
    }
}

/// Result of `POST /api/test-connections`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ConnectionTestResult {
    pub connection_tests: ConnectionTests,
    pub status: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct DeviceFiles {
    #[serde(default)]
    pub device1: Vec<String>,
    #[serde(default)]
    pub device2: Vec<String>,
}

impl DeviceFiles {
    pub fn get(&self, id: DeviceId) -> &[String] {
        match id {
            DeviceId::Device1 => &self.device1,
            DeviceId::Device2 => &self.device2,
        }
    }
}

/// Result of `POST /api/list-files`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FileListing {
    pub data: DeviceFiles,
    pub status: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TransferDetails {
    pub source_path: String,
    pub destination_path: String,
    #[serde(default)]
    pub file_size: u64,
    pub success: bool,
    #[serde(default)]
    pub transfer_time: f64,
}

/// Result of `POST /api/transfer-file`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TransferResult {
    pub direction: TransferDirection,
    pub status: String,
    pub timestamp: String,
    pub transfer_details: TransferDetails,
}

impl TransferResult {
    /// History label: source file name plus its rendered size.
    pub fn label(&self) -> String {
        format!(
            "{} ({})",
            crate::view::file_name(&self.transfer_details.source_path),
            crate::view::byte_size(self.transfer_details.file_size)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CommandOutput {
    pub exit_code: i32,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
}

/// Result of `POST /api/execute-command`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CommandResult {
    pub command: String,
    pub device: DeviceId,
    pub result: CommandOutput,
    pub status: String,
    pub timestamp: String,
}

/// Result of `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub service: String,
}

// ─────────────────────────────────────────────────────────────────
// Tagged request / outcome
// ─────────────────────────────────────────────────────────────────

/// Arguments plus owned device snapshots for one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationRequest {
    ConnectionTest {
        devices: DevicePair,
    },
    ListFiles {
        devices: DevicePair,
    },
    TransferFile {
        devices: DevicePair,
        source_path: String,
        dest_path: String,
        direction: TransferDirection,
    },
    ExecuteCommand {
        devices: DevicePair,
        target: DeviceId,
        command: String,
    },
    TelemetryPoll,
}

impl OperationRequest {
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationRequest::ConnectionTest { .. } => OperationKind::ConnectionTest,
            OperationRequest::ListFiles { .. } => OperationKind::ListFiles,
            OperationRequest::TransferFile { .. } => OperationKind::TransferFile,
            OperationRequest::ExecuteCommand { .. } => OperationKind::ExecuteCommand,
            OperationRequest::TelemetryPoll => OperationKind::TelemetryPoll,
        }
    }

    /// Local preconditions. A failure here means the backend must not be
    /// contacted.
    pub fn validate(&self) -> Result<(), OperationError> {
        match self {
            OperationRequest::ExecuteCommand { command, .. } if command.trim().is_empty() => {
                Err(OperationError::validation("Please enter a command"))
            }
            OperationRequest::TransferFile {
                source_path,
                dest_path,
                ..
            } if source_path.is_empty() || dest_path.is_empty() => Err(
                OperationError::validation("Please provide both source and destination paths"),
            ),
            _ => Ok(()),
        }
    }

    /// JSON body for the request, or `None` for GET requests.
    pub fn body(&self) -> serde_json::Result<Option<serde_json::Value>> {
        let value = match self {
            OperationRequest::ConnectionTest { devices } | OperationRequest::ListFiles { devices } => {
                serde_json::to_value(devices)?
            }
            OperationRequest::TransferFile {
                devices,
                source_path,
                dest_path,
                direction,
            } => serde_json::to_value(TransferBody {
                device1: &devices.device1,
                device2: &devices.device2,
                source_path,
                dest_path,
                direction: *direction,
            })?,
            OperationRequest::ExecuteCommand {
                devices,
                target,
                command,
            } => serde_json::to_value(CommandBody {
                device: *target,
                command: command.trim(),
                device1: &devices.device1,
                device2: match target {
                    DeviceId::Device2 => Some(&devices.device2),
                    DeviceId::Device1 => None,
                },
            })?,
            OperationRequest::TelemetryPoll => return Ok(None),
        };
        Ok(Some(value))
    }
}

/// Typed result of one successful dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutcome {
    ConnectionTest(ConnectionTestResult),
    ListFiles(FileListing),
    TransferFile(TransferResult),
    ExecuteCommand(CommandResult),
    TelemetryPoll(Box<MonitoringReport>),
}

impl OperationOutcome {
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationOutcome::ConnectionTest(_) => OperationKind::ConnectionTest,
            OperationOutcome::ListFiles(_) => OperationKind::ListFiles,
            OperationOutcome::TransferFile(_) => OperationKind::TransferFile,
            OperationOutcome::ExecuteCommand(_) => OperationKind::ExecuteCommand,
            OperationOutcome::TelemetryPoll(_) => OperationKind::TelemetryPoll,
        }
    }

    /// Parse a 2xx body into the typed result for `kind`.
    pub fn parse(kind: OperationKind, body: &str) -> Result<Self, OperationError> {
        let protocol = |e: serde_json::Error| OperationError::protocol(e.to_string());
        let outcome = match kind {
            OperationKind::ConnectionTest => {
                OperationOutcome::ConnectionTest(serde_json::from_str(body).map_err(protocol)?)
            }
            OperationKind::ListFiles => {
                OperationOutcome::ListFiles(serde_json::from_str(body).map_err(protocol)?)
            }
            OperationKind::TransferFile => {
                OperationOutcome::TransferFile(serde_json::from_str(body).map_err(protocol)?)
            }
            OperationKind::ExecuteCommand => {
                OperationOutcome::ExecuteCommand(serde_json::from_str(body).map_err(protocol)?)
            }
            OperationKind::TelemetryPoll => {
                OperationOutcome::TelemetryPoll(Box::new(serde_json::from_str(body).map_err(protocol)?))
            }
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pair() -> DevicePair {
        DevicePair {
            device1: DeviceConfig::new("u1", "p1", "h1", "/d1"),
            device2: DeviceConfig::new("u2", "p2", "h2", "/d2"),
        }
    }

    #[test]
    fn test_direction_wire_names() {
        assert_eq!(
            serde_json::to_value(TransferDirection::Device1ToDevice2).unwrap(),
            json!("device1_to_device2")
        );
        let d: TransferDirection = serde_json::from_value(json!("device2_to_device1")).unwrap();
        assert_eq!(d, TransferDirection::Device2ToDevice1);
        assert_eq!(d.source(), DeviceId::Device2);
        assert_eq!(d.destination(), DeviceId::Device1);
    }

    #[test]
    fn test_validate_rejects_blank_command() {
        for command in ["", "   ", "\t\n"] {
            let req = OperationRequest::ExecuteCommand {
                devices: pair(),
                target: DeviceId::Device1,
                command: command.to_string(),
            };
            let err = req.validate().unwrap_err();
            assert!(err.is_local());
        }
    }

    #[test]
    fn test_validate_rejects_missing_transfer_paths() {
        for (src, dst) in [("", "/b"), ("/a", ""), ("", "")] {
            let req = OperationRequest::TransferFile {
                devices: pair(),
                source_path: src.into(),
                dest_path: dst.into(),
                direction: TransferDirection::Device1ToDevice2,
            };
            assert!(req.validate().is_err());
        }
    }

    #[test]
    fn test_validate_accepts_argument_free_kinds() {
        assert!(OperationRequest::ConnectionTest { devices: pair() }.validate().is_ok());
        assert!(OperationRequest::ListFiles { devices: pair() }.validate().is_ok());
        assert!(OperationRequest::TelemetryPoll.validate().is_ok());
    }

    #[test]
    fn test_connection_test_body() {
        let body = OperationRequest::ConnectionTest { devices: pair() }
            .body()
            .unwrap()
            .unwrap();
        assert_eq!(body["device1"]["host"], "h1");
        assert_eq!(body["device2"]["username"], "u2");
    }

    #[test]
    fn test_transfer_body_field_names() {
        let body = OperationRequest::TransferFile {
            devices: pair(),
            source_path: "/a/f.txt".into(),
            dest_path: "/b/f.txt".into(),
            direction: TransferDirection::Device2ToDevice1,
        }
        .body()
        .unwrap()
        .unwrap();
        assert_eq!(body["source_path"], "/a/f.txt");
        assert_eq!(body["dest_path"], "/b/f.txt");
        assert_eq!(body["direction"], "device2_to_device1");
        assert_eq!(body["device1"]["password"], "p1");
    }

    #[test]
    fn test_command_body_for_device1_omits_device2() {
        let body = OperationRequest::ExecuteCommand {
            devices: pair(),
            target: DeviceId::Device1,
            command: "  ls -la  ".into(),
        }
        .body()
        .unwrap()
        .unwrap();
        assert_eq!(body["device"], "device1");
        assert_eq!(body["command"], "ls -la");
        assert_eq!(body["device1"]["host"], "h1");
        assert!(body.get("device2").is_none());
    }

    #[test]
    fn test_command_body_for_device2_carries_its_snapshot() {
        let body = OperationRequest::ExecuteCommand {
            devices: pair(),
            target: DeviceId::Device2,
            command: "pwd".into(),
        }
        .body()
        .unwrap()
        .unwrap();
        assert_eq!(body["device"], "device2");
        assert_eq!(body["device2"]["host"], "h2");
        assert_eq!(body["device1"]["host"], "h1");
    }

    #[test]
    fn test_telemetry_has_no_body() {
        assert_eq!(OperationRequest::TelemetryPoll.body().unwrap(), None);
    }

    #[test]
    fn test_parse_connection_test_result() {
        let body = json!({
            "connection_tests": {
                "device1": {"status": "connected", "message": "Connection successful\n"},
                "device2": {"status": "failed", "message": "Authentication failed."}
            },
            "status": "completed",
            "timestamp": "2025-01-01T00:00:00"
        })
        .to_string();

        let outcome = OperationOutcome::parse(OperationKind::ConnectionTest, &body).unwrap();
        let OperationOutcome::ConnectionTest(result) = outcome else {
            panic!("wrong variant");
        };
        assert_eq!(result.connection_tests.device1.status, ConnectionStatus::Connected);
        assert_eq!(result.connection_tests.device2.status, ConnectionStatus::Failed);
    }

    #[test]
    fn test_unknown_connection_status_is_preserved() {
        let status: ConnectionStatus = serde_json::from_value(json!("degraded")).unwrap();
        assert_eq!(status, ConnectionStatus::Unknown("degraded".into()));
        assert_eq!(serde_json::to_value(&status).unwrap(), json!("degraded"));
    }

    #[test]
    fn test_connection_status_severity() {
        use crate::view::Severity;
        assert_eq!(ConnectionStatus::Connected.severity(), Severity::Normal);
        assert_eq!(ConnectionStatus::Timeout.severity(), Severity::Warning);
        assert_eq!(ConnectionStatus::Failed.severity(), Severity::Critical);
        assert_eq!(ConnectionStatus::Unknown("x".into()).severity(), Severity::Warning);
    }

    #[test]
    fn test_parse_transfer_result_and_label() {
        let body = json!({
            "direction": "device1_to_device2",
            "status": "success",
            "timestamp": "2025-01-01T00:00:00",
            "transfer_details": {
                "source_path": "/a/f.txt",
                "destination_path": "/b/f.txt",
                "file_size": 2048,
                "success": true,
                "transfer_time": 0.12
            }
        })
        .to_string();

        let OperationOutcome::TransferFile(result) =
            OperationOutcome::parse(OperationKind::TransferFile, &body).unwrap()
        else {
            panic!("wrong variant");
        };
        assert_eq!(result.label(), "f.txt (2 KB)");
    }

    #[test]
    fn test_parse_command_result() {
        let body = json!({
            "command": "whoami",
            "device": "device2",
            "result": {"exit_code": 0, "stdout": "root\n", "stderr": ""},
            "status": "success",
            "timestamp": "2025-01-01T00:00:00"
        })
        .to_string();

        let OperationOutcome::ExecuteCommand(result) =
            OperationOutcome::parse(OperationKind::ExecuteCommand, &body).unwrap()
        else {
            panic!("wrong variant");
        };
        assert_eq!(result.device, DeviceId::Device2);
        assert_eq!(result.result.stdout, "root\n");
    }

    #[test]
    fn test_malformed_body_is_protocol_error() {
        let err = OperationOutcome::parse(OperationKind::ListFiles, "{\"status\": \"success\"}")
            .unwrap_err();
        assert_eq!(err.category(), "protocol");

        let err = OperationOutcome::parse(OperationKind::ListFiles, "<html>").unwrap_err();
        assert!(matches!(err, OperationError::Protocol { .. }));
    }
}

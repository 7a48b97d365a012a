//! Security/resource telemetry report returned by `GET /system_security_monitor`.
//!
//! The six top-level sections are required. Everything nested below them is
//! optional on the wire: the collector drops a field when its probe fails, so
//! each nested struct falls back to defaults rather than rejecting the report.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::view::{
    byte_size, status_severity, Severity, Thresholds, DISK_THRESHOLDS, PROCESS_CPU_THRESHOLDS,
    PROCESS_MEMORY_THRESHOLDS, RESOURCE_THRESHOLDS,
};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MonitoringReport {
    pub system_info: SystemInfo,
    pub resource_monitoring: ResourceMonitoring,
    pub process_scan: ProcessScan,
    pub process_anomalies: Vec<ProcessAnomaly>,
    pub system_integrity: SystemIntegrity,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemInfo {
    pub hostname: String,
    pub system: String,
    pub release: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ResourceMonitoring {
    pub cpu_usage: f64,
    pub memory_usage: f64,
    /// Keyed by mount point.
    pub disk_usage: BTreeMap<String, DiskUsage>,
    /// 1, 5 and 15 minute averages.
    pub load_average: Vec<f64>,
    pub network_connections: u64,
    pub anomalies: Vec<String>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DiskUsage {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProcessScan {
    pub total_processes: u64,
    pub suspicious_processes: Vec<SuspiciousProcess>,
    pub high_resource_processes: Vec<ResourceProcess>,
    pub network_processes: Vec<NetworkProcess>,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SuspiciousProcess {
    pub pid: u32,
    pub name: String,
    pub cmdline: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ResourceProcess {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: Option<f64>,
    pub memory_percent: Option<f64>,
}

impl ResourceProcess {
    pub fn cpu_severity(&self) -> Severity {
        status_severity(self.cpu_percent.unwrap_or_default(), PROCESS_CPU_THRESHOLDS)
    }

    pub fn memory_severity(&self) -> Severity {
        status_severity(
            self.memory_percent.unwrap_or_default(),
            PROCESS_MEMORY_THRESHOLDS,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkProcess {
    pub pid: u32,
    pub name: String,
    pub connections: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProcessAnomaly {
    /// `high_resource_usage`, `new_process` or `suspicious_process`.
    #[serde(rename = "type")]
    pub kind: String,
    pub pid: u32,
    pub name: String,
    pub cmdline: Option<Vec<String>>,
    pub timestamp: Option<String>,
    pub cpu_percent: Option<f64>,
    pub memory_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemIntegrity {
    pub file_integrity: serde_json::Map<String, serde_json::Value>,
    /// Keyed by absolute path.
    pub system_files: BTreeMap<String, SystemFile>,
    pub permissions: Permissions,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SystemFile {
    pub size: u64,
    pub mtime: f64,
    /// Octal mode, e.g. `"644"`.
    pub permissions: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Permissions {
    pub world_writable: Vec<String>,
}

/// One usage bar: what is measured, how full it is, and its coloring.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceGauge {
    pub label: String,
    pub percent: f64,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ResourceGauge {
    pub fn new(label: impl Into<String>, percent: f64, thresholds: Thresholds) -> Self {
        Self {
            label: label.into(),
            percent,
            severity: status_severity(percent, thresholds),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl MonitoringReport {
    /// Alert summary lines; empty when nothing needs attention.
    pub fn critical_findings(&self) -> Vec<String> {
        let mut findings = Vec::new();

        if !self.process_anomalies.is_empty() {
            findings.push(format!(
                "Found {} process anomalies",
                self.process_anomalies.len()
            ));
        }

        let suspicious = self.process_scan.suspicious_processes.len();
        if suspicious > 0 {
            findings.push(format!("Found {} suspicious processes", suspicious));
        }

        if !self.resource_monitoring.anomalies.is_empty() {
            findings.push(format!(
                "Resource anomalies: {}",
                self.resource_monitoring.anomalies.join(", ")
            ));
        }

        findings
    }

    /// CPU and memory gauges followed by one gauge per mount point.
    pub fn gauges(&self) -> Vec<ResourceGauge> {
        let res = &self.resource_monitoring;
        let mut gauges = vec![
            ResourceGauge::new("CPU", res.cpu_usage, RESOURCE_THRESHOLDS),
            ResourceGauge::new("Memory", res.memory_usage, RESOURCE_THRESHOLDS),
        ];

        gauges.extend(res.disk_usage.iter().map(|(mount, disk)| {
            ResourceGauge::new(mount.as_str(), disk.percent, DISK_THRESHOLDS).with_detail(format!(
                "Used: {} | Free: {} | Total: {}",
                byte_size(disk.used),
                byte_size(disk.free),
                byte_size(disk.total)
            ))
        }));

        gauges
    }

    /// Load averages with two decimals, comma separated.
    pub fn load_average_display(&self) -> String {
        self.resource_monitoring
            .load_average
            .iter()
            .map(|load| format!("{:.2}", load))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

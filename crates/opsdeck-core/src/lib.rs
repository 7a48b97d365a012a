//! # opsdeck-core - Core Domain Types
//!
//! Foundation crate for opsdeck. Provides device configuration, operation
//! kinds and their request lifecycle, backend wire shapes, the telemetry
//! report model, bounded history, presentation rules, and error handling.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, chrono, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Devices (`device`)
//! - [`DeviceId`] - One of the two named targets (`device1`, `device2`)
//! - [`DeviceConfig`] - Identity, credential, host and working directory
//! - [`DeviceStore`] - Live configs; hands out owned snapshots at dispatch time
//!
//! ### Operations (`operation`)
//! - [`OperationKind`] - The five request types
//! - [`OperationState`] - Per-kind phase, latest result/error, epoch guard
//! - [`Epoch`], [`EpochCounter`] - Stale-response detection
//!
//! ### Wire Contract (`wire`, `telemetry`)
//! - [`OperationRequest`] / [`OperationOutcome`] - Tagged per-kind request and result
//! - [`MonitoringReport`] - Security/resource telemetry snapshot
//!
//! ### History (`history`)
//! - [`HistoryLog`] - Newest-first bounded log
//!
//! ### Presentation Rules (`view`)
//! - [`status_severity()`], [`swap_direction()`], [`byte_size()`]
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Infrastructure errors with `fatal` vs `recoverable` classification
//! - [`OperationError`] - Validation / network / HTTP status / protocol failures
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use opsdeck_core::prelude::*;
//! ```

pub mod device;
pub mod error;
pub mod history;
pub mod logging;
pub mod operation;
pub mod telemetry;
pub mod view;
pub mod wire;

/// Prelude for common imports used throughout all opsdeck crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use device::{DeviceConfig, DeviceField, DeviceId, DevicePair, DeviceStore};
pub use error::{Error, OperationError, Result, ResultExt};
pub use history::{HistoryEntry, HistoryLog};
pub use operation::{Epoch, EpochCounter, OperationKind, OperationState, Phase, Reentry};
pub use telemetry::{DiskUsage, MonitoringReport, ProcessAnomaly, ResourceGauge, SystemInfo};
pub use view::{
    byte_size, file_name, status_severity, swap_direction, FileCategory, FileSelection, Severity,
    Thresholds, DISK_THRESHOLDS, RESOURCE_THRESHOLDS,
};
pub use wire::{
    CommandOutput, CommandResult, ConnectionStatus, ConnectionTestResult, DeviceConnection,
    DeviceFiles, FileListing, HealthStatus, OperationOutcome, OperationRequest, TransferDetails,
    TransferDirection, TransferResult,
};

//! Operation kinds and the per-kind request lifecycle.
//!
//! Every operation kind owns one [`OperationState`]. A dispatch moves it
//! `Idle|Success|Error → Loading` and stamps the request with a fresh
//! [`Epoch`]; the response is applied only if its epoch is still current.
//!
//! Manually triggered kinds reject a second dispatch while `Loading`.
//! [`OperationKind::TelemetryPoll`] instead supersedes the in-flight request:
//! the epoch advances and the older response is dropped when it arrives.

use std::fmt;

use serde::Serialize;

use crate::error::OperationError;

// ── OperationKind ────────────────────────────────────────────────────────────

/// The five request types the console can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    ConnectionTest,
    ListFiles,
    TransferFile,
    ExecuteCommand,
    TelemetryPoll,
}

/// What happens when a kind is dispatched while already `Loading`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reentry {
    /// The new dispatch is a no-op until the outstanding one resolves.
    Reject,
    /// The new dispatch wins; the outstanding response becomes stale.
    Supersede,
}

impl OperationKind {
    pub const ALL: [OperationKind; 5] = [
        OperationKind::ConnectionTest,
        OperationKind::ListFiles,
        OperationKind::TransferFile,
        OperationKind::ExecuteCommand,
        OperationKind::TelemetryPoll,
    ];

    /// Maximum number of history entries kept, or `None` when the kind keeps
    /// only its latest result.
    pub fn history_capacity(&self) -> Option<usize> {
        match self {
            OperationKind::ExecuteCommand => Some(20),
            OperationKind::ConnectionTest | OperationKind::TransferFile => Some(10),
            OperationKind::ListFiles | OperationKind::TelemetryPoll => None,
        }
    }

    pub fn reentry(&self) -> Reentry {
        match self {
            OperationKind::TelemetryPoll => Reentry::Supersede,
            _ => Reentry::Reject,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OperationKind::ConnectionTest => "connection test",
            OperationKind::ListFiles => "file listing",
            OperationKind::TransferFile => "file transfer",
            OperationKind::ExecuteCommand => "command execution",
            OperationKind::TelemetryPoll => "telemetry poll",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Epoch ────────────────────────────────────────────────────────────────────

/// Identity of one dispatched request within its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Epoch(u64);

impl Epoch {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic per-kind counter. Only a response carrying the current value
/// may touch state.
#[derive(Debug, Clone, Default)]
pub struct EpochCounter {
    current: u64,
}

impl EpochCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the epoch for a new request. All earlier epochs become stale.
    pub fn advance(&mut self) -> Epoch {
        self.current += 1;
        Epoch(self.current)
    }

    /// Make every outstanding epoch stale without issuing a request.
    pub fn invalidate(&mut self) {
        self.current += 1;
    }

    pub fn is_current(&self, epoch: Epoch) -> bool {
        epoch.0 == self.current
    }

    pub fn current(&self) -> Epoch {
        Epoch(self.current)
    }
}

// ── OperationState ───────────────────────────────────────────────────────────

/// Lifecycle phase of one operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Latest-result state for one operation kind.
#[derive(Debug, Clone)]
pub struct OperationState<R> {
    kind: OperationKind,
    phase: Phase,
    /// Phase to fall back to if the in-flight request is abandoned.
    settled_phase: Phase,
    last_result: Option<R>,
    last_error: Option<OperationError>,
    epochs: EpochCounter,
    /// Bumped on every mutation; lets observers detect changes cheaply.
    revision: u64,
}

impl<R> OperationState<R> {
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            phase: Phase::Idle,
            settled_phase: Phase::Idle,
            last_result: None,
            last_error: None,
            epochs: EpochCounter::new(),
            revision: 0,
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn last_result(&self) -> Option<&R> {
        self.last_result.as_ref()
    }

    pub fn last_error(&self) -> Option<&OperationError> {
        self.last_error.as_ref()
    }

    pub fn epoch(&self) -> Epoch {
        self.epochs.current()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Transition to `Loading` for a new request.
    ///
    /// Returns the epoch the request must carry, or `None` if the kind
    /// rejects overlapping dispatches and one is already outstanding. A
    /// rejected call leaves the state untouched.
    pub fn begin(&mut self) -> Option<Epoch> {
        if self.phase == Phase::Loading {
            match self.kind.reentry() {
                Reentry::Reject => return None,
                Reentry::Supersede => {}
            }
        } else {
            self.settled_phase = self.phase;
        }
        self.phase = Phase::Loading;
        self.last_error = None;
        self.revision += 1;
        Some(self.epochs.advance())
    }

    /// Record a local failure that never reached the network.
    ///
    /// Used for validation errors: nothing is in flight, so no epoch is
    /// consumed and an outstanding request (if any) is not disturbed.
    pub fn reject_locally(&mut self, error: OperationError) {
        if self.phase != Phase::Loading {
            self.phase = Phase::Error;
        }
        self.last_error = Some(error);
        self.revision += 1;
    }

    /// Apply a successful response. Returns `false` (and changes nothing)
    /// when the response is stale.
    pub fn succeed(&mut self, epoch: Epoch, result: R) -> bool {
        if !self.accepts(epoch) {
            return false;
        }
        self.phase = Phase::Success;
        self.last_result = Some(result);
        self.last_error = None;
        self.revision += 1;
        true
    }

    /// Apply a failed response. Returns `false` (and changes nothing) when
    /// the response is stale. The previous result is kept for display.
    pub fn fail(&mut self, epoch: Epoch, error: OperationError) -> bool {
        if !self.accepts(epoch) {
            return false;
        }
        self.phase = Phase::Error;
        self.last_error = Some(error);
        self.revision += 1;
        true
    }

    /// Stop caring about the in-flight request: its response will be
    /// discarded on arrival and the phase reverts to what it was before the
    /// request started.
    pub fn abandon(&mut self) {
        self.epochs.invalidate();
        if self.phase == Phase::Loading {
            self.phase = self.settled_phase;
        }
        self.revision += 1;
    }

    fn accepts(&self, epoch: Epoch) -> bool {
        self.phase == Phase::Loading && self.epochs.is_current(epoch)
    }
}

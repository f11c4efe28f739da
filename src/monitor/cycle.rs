//! Cycle results - what one invoke/classify/extract/persist pass produced

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::record::MetricsRecord;

/// Outcome tag of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    /// External job still running
    InProgress,
    /// Record extracted and appended
    Success,
    /// Output did not have the expected shape
    Unparseable,
    /// Run exceeded its budget
    TimedOut,
    /// Invocation or persistence failure
    UnexpectedError,
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::InProgress => "in-progress",
            Self::Success => "success",
            Self::Unparseable => "unparseable",
            Self::TimedOut => "timed-out",
            Self::UnexpectedError => "unexpected-error",
        };
        f.write_str(label)
    }
}

/// Outcome of a cycle with its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// External job still running; nothing persisted
    InProgress,
    /// The record that was appended to the store
    Success(MetricsRecord),
    /// Output kept for diagnostics; nothing persisted
    Unparseable {
        /// Why the output was rejected
        reason: String,
        /// Full captured text
        captured: String,
    },
    /// Run exceeded its budget; nothing persisted
    TimedOut,
    /// Invocation or persistence failure; nothing persisted
    UnexpectedError(String),
}

impl CycleOutcome {
    /// Tag without payload.
    #[must_use]
    pub const fn kind(&self) -> OutcomeKind {
        match self {
            Self::InProgress => OutcomeKind::InProgress,
            Self::Success(_) => OutcomeKind::Success,
            Self::Unparseable { .. } => OutcomeKind::Unparseable,
            Self::TimedOut => OutcomeKind::TimedOut,
            Self::UnexpectedError(_) => OutcomeKind::UnexpectedError,
        }
    }
}

/// Everything known about one finished cycle.
#[derive(Debug, Clone)]
pub struct CycleResult {
    /// 1-based cycle number within this monitor's lifetime
    pub sequence: u64,
    /// When the cycle started
    pub started_at: DateTime<Local>,
    /// Wall time spent invoking and processing (excludes the sleep)
    pub elapsed: Duration,
    /// Exit code of the run, when it exited on its own
    pub exit_code: Option<i32>,
    /// What happened
    pub outcome: CycleOutcome,
}

impl CycleResult {
    /// Tag of the outcome.
    #[must_use]
    pub const fn kind(&self) -> OutcomeKind {
        self.outcome.kind()
    }

    /// Whether a record was appended.
    #[must_use]
    pub const fn persisted(&self) -> bool {
        matches!(self.outcome, CycleOutcome::Success(_))
    }
}

/// Running tally of cycle outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    /// Cycles run
    pub cycles: u64,
    /// Records appended
    pub records_appended: u64,
    /// In-progress cycles
    pub in_progress: u64,
    /// Unparseable cycles
    pub unparseable: u64,
    /// Timed-out cycles
    pub timed_out: u64,
    /// Cycles that hit an unexpected error
    pub unexpected_errors: u64,
}

impl MonitorStats {
    /// Count one finished cycle.
    pub fn record(&mut self, kind: OutcomeKind) {
        self.cycles += 1;
        match kind {
            OutcomeKind::InProgress => self.in_progress += 1,
            OutcomeKind::Success => self.records_appended += 1,
            OutcomeKind::Unparseable => self.unparseable += 1,
            OutcomeKind::TimedOut => self.timed_out += 1,
            OutcomeKind::UnexpectedError => self.unexpected_errors += 1,
        }
    }
}

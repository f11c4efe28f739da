//! Scheduler Loop - invoke, classify, extract, persist, sleep, repeat
//!
//! ```text
//!            ┌──────────────────────── sleep(interval) ◄───────────────┐
//!            ▼                                                         │
//! Running ─► invoke ─► classify ─► extract ─► append ─► report ────────┤
//!    │         │          │           │                                │
//!    │         └ timeout / launch error, in-progress, unparseable ─────┘
//!    │
//!    └── stop requested (checked between cycles) ─► Stopped
//! ```
//!
//! Cycles never overlap and a record is appended only for a cycle whose
//! outcome is [`OutcomeKind::Success`], so the store's row order is the
//! order in which runs were observed.

mod cycle;
mod shutdown;

use std::time::{Duration, Instant};

use chrono::Local;
use tracing::{error, info, warn};

pub use cycle::{CycleOutcome, CycleResult, MonitorStats, OutcomeKind};
pub use shutdown::{listen_for_interrupt, stop_channel, StopHandle, StopSignal};

use crate::classifier::{Classification, OutputClassifier};
use crate::config::MonitorConfig;
use crate::error::{InvokeError, Result};
use crate::extractor::MetricsExtractor;
use crate::invoker::{Invoke, ProcessInvoker};
use crate::record::RecordSink;

/// Lifecycle state of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Cycles are being run
    Running,
    /// A stop was honored or the cycle limit was reached
    Stopped,
}

/// The benchmark monitor.
#[derive(Debug)]
pub struct Monitor<I> {
    invoker: I,
    classifier: OutputClassifier,
    extractor: MetricsExtractor,
    sink: RecordSink,
    interval: Duration,
    max_cycles: Option<u64>,
    state: MonitorState,
    stats: MonitorStats,
}

impl Monitor<ProcessInvoker> {
    /// Build a monitor that runs the configured command.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured schema version is unknown.
    pub fn from_config(config: &MonitorConfig) -> Result<Self> {
        let schema = config.schema()?;
        let monitor = Self::new(
            ProcessInvoker::from_config(config),
            OutputClassifier::default(),
            MetricsExtractor::new(schema.clone()),
            RecordSink::new(&config.store_path, schema),
            config.interval(),
        );
        Ok(monitor.with_max_cycles(config.max_cycles))
    }
}

impl<I: Invoke> Monitor<I> {
    /// Assemble a monitor from its parts.
    #[must_use]
    pub fn new(
        invoker: I,
        classifier: OutputClassifier,
        extractor: MetricsExtractor,
        sink: RecordSink,
        interval: Duration,
    ) -> Self {
        Self {
            invoker,
            classifier,
            extractor,
            sink,
            interval,
            max_cycles: None,
            state: MonitorState::Running,
            stats: MonitorStats::default(),
        }
    }

    /// Stop on its own after `max_cycles` cycles (`None` = until interrupted).
    #[must_use]
    pub fn with_max_cycles(mut self, max_cycles: Option<u64>) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> MonitorState {
        self.state
    }

    /// Outcome tally so far.
    #[must_use]
    pub const fn stats(&self) -> MonitorStats {
        self.stats
    }

    /// The record sink.
    #[must_use]
    pub const fn sink(&self) -> &RecordSink {
        &self.sink
    }

    /// The invoker.
    #[must_use]
    pub const fn invoker(&self) -> &I {
        &self.invoker
    }

    /// Run cycles until a stop is requested or the cycle limit is reached.
    ///
    /// The stop signal is consulted before each cycle and during the sleep
    /// that follows it, never while a run is in flight.
    pub async fn run(mut self, mut stop: StopSignal) -> MonitorStats {
        info!(
            command = %self.invoker.describe(),
            store = %self.sink.path().display(),
            interval_secs = self.interval.as_secs(),
            "benchmark monitor started"
        );

        while self.state == MonitorState::Running {
            if stop.is_stop_requested() {
                self.state = MonitorState::Stopped;
                break;
            }

            let result = self.run_cycle().await;
            report(&result, &self.sink);

            if self
                .max_cycles
                .is_some_and(|max| self.stats.cycles >= max)
            {
                info!(cycles = self.stats.cycles, "cycle limit reached");
                self.state = MonitorState::Stopped;
                break;
            }

            info!(seconds = self.interval.as_secs(), "waiting before next cycle");
            tokio::select! {
                () = tokio::time::sleep(self.interval) => {}
                () = stop.stopped() => self.state = MonitorState::Stopped,
            }
        }

        info!(
            cycles = self.stats.cycles,
            records_appended = self.stats.records_appended,
            in_progress = self.stats.in_progress,
            unparseable = self.stats.unparseable,
            timed_out = self.stats.timed_out,
            unexpected_errors = self.stats.unexpected_errors,
            "benchmark monitor stopped"
        );
        self.stats
    }

    /// Run exactly one cycle: invoke, classify, and on success extract and
    /// append one record.
    pub async fn run_cycle(&mut self) -> CycleResult {
        let sequence = self.stats.cycles + 1;
        let started_at = Local::now();
        let clock = Instant::now();
        info!(cycle = sequence, command = %self.invoker.describe(), "running command");

        let invoked = self.invoker.invoke().await;
        let (outcome, exit_code) = match invoked {
            Ok(captured) => (self.process_output(captured.text), captured.exit_code),
            Err(InvokeError::TimedOut { .. }) => (CycleOutcome::TimedOut, None),
            Err(e) => (CycleOutcome::UnexpectedError(e.to_string()), None),
        };

        self.stats.record(outcome.kind());
        CycleResult {
            sequence,
            started_at,
            elapsed: clock.elapsed(),
            exit_code,
            outcome,
        }
    }

    fn process_output(&self, text: String) -> CycleOutcome {
        let extracted = match self.classifier.classify(&text) {
            Classification::InProgress => return CycleOutcome::InProgress,
            Classification::Unparseable { missing } => {
                Err(format!("missing markers: {}", missing.join(", ")))
            }
            Classification::Success(fragments) => self
                .extractor
                .extract(&fragments)
                .map_err(|e| format!("malformed marker content: {e}")),
        };

        match extracted {
            Ok(record) => match self.sink.append(&record) {
                Ok(()) => CycleOutcome::Success(record),
                Err(e) => CycleOutcome::UnexpectedError(format!("failed to append record: {e}")),
            },
            Err(reason) => CycleOutcome::Unparseable {
                reason,
                captured: text,
            },
        }
    }
}

/// One progress line per cycle, plus the captured output for unparseable runs.
fn report(result: &CycleResult, sink: &RecordSink) {
    let elapsed_ms = u64::try_from(result.elapsed.as_millis()).unwrap_or(u64::MAX);
    match &result.outcome {
        CycleOutcome::InProgress => info!(
            cycle = result.sequence,
            outcome = %result.kind(),
            "previous run is still in progress, skipping this cycle"
        ),
        CycleOutcome::Success(record) => info!(
            cycle = result.sequence,
            outcome = %result.kind(),
            elapsed_ms,
            atlantic_id = record.atlantic_id(),
            epoch = record.epoch(),
            store = %sink.path().display(),
            "run completed, record appended"
        ),
        CycleOutcome::Unparseable { reason, captured } => {
            warn!(
                cycle = result.sequence,
                outcome = %result.kind(),
                exit_code = result.exit_code,
                reason = %reason,
                "run finished but key information was not found in the output"
            );
            warn!("captured output:\n{captured}");
        }
        CycleOutcome::TimedOut => warn!(
            cycle = result.sequence,
            outcome = %result.kind(),
            elapsed_ms,
            "command timed out, retrying next cycle"
        ),
        CycleOutcome::UnexpectedError(message) => error!(
            cycle = result.sequence,
            outcome = %result.kind(),
            error = %message,
            "unexpected error, retrying next cycle"
        ),
    }
}

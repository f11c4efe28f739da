//! Metrics Record - one successful proving run

use std::collections::BTreeMap;

use chrono::{Local, NaiveDateTime, SubsecRound};

/// Timestamp layout used in the store (ISO-8601, local clock, no offset).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Current local time at the precision the store keeps.
#[must_use]
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(6)
}

/// Metrics Record holds the counters extracted from one successful run.
///
/// Counters are optional: a counter missing from the map was never reported
/// by the resource summary, which is different from a reported zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsRecord {
    timestamp: NaiveDateTime,
    atlantic_id: String,
    epoch: u64,
    counters: BTreeMap<String, u64>,
}

impl MetricsRecord {
    /// Create a record with no counters, stamped with the current local time.
    #[must_use]
    pub fn new(atlantic_id: impl Into<String>, epoch: u64) -> Self {
        Self::builder(atlantic_id, epoch).build()
    }

    /// Create a builder for constructing a record with counters.
    #[must_use]
    pub fn builder(atlantic_id: impl Into<String>, epoch: u64) -> MetricsRecordBuilder {
        MetricsRecordBuilder::new(atlantic_id, epoch)
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    /// Get the submission identifier.
    #[must_use]
    pub fn atlantic_id(&self) -> &str {
        &self.atlantic_id
    }

    /// Get the proved epoch.
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Get a counter value, `None` when it was not reported.
    #[must_use]
    pub fn counter(&self, name: &str) -> Option<u64> {
        self.counters.get(name).copied()
    }

    /// Get all reported counters.
    #[must_use]
    pub const fn counters(&self) -> &BTreeMap<String, u64> {
        &self.counters
    }
}

/// Builder for `MetricsRecord`.
#[derive(Debug)]
pub struct MetricsRecordBuilder {
    timestamp: NaiveDateTime,
    atlantic_id: String,
    epoch: u64,
    counters: BTreeMap<String, u64>,
}

impl MetricsRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(atlantic_id: impl Into<String>, epoch: u64) -> Self {
        Self {
            timestamp: local_now(),
            atlantic_id: atlantic_id.into(),
            epoch,
            counters: BTreeMap::new(),
        }
    }

    /// Set a custom timestamp.
    #[must_use]
    pub const fn timestamp(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Set one counter, replacing any earlier value.
    #[must_use]
    pub fn counter(mut self, name: impl Into<String>, value: u64) -> Self {
        self.counters.insert(name.into(), value);
        self
    }

    /// Replace all counters.
    #[must_use]
    pub fn counters(mut self, counters: BTreeMap<String, u64>) -> Self {
        self.counters = counters;
        self
    }

    /// Build the `MetricsRecord`.
    #[must_use]
    pub fn build(self) -> MetricsRecord {
        MetricsRecord {
            timestamp: self.timestamp,
            atlantic_id: self.atlantic_id,
            epoch: self.epoch,
            counters: self.counters,
        }
    }
}

//! Metrics Extractor - turns matched marker fragments into a record
//!
//! The resource summary is scanned for `name: value` tokens. Only names in
//! the [`FieldSchema`] are kept; a kept name must carry a non-negative
//! integer, anything else fails the extraction rather than defaulting to
//! zero.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::classifier::SuccessFragments;
use crate::error::ExtractError;
use crate::record::{local_now, FieldSchema, MetricsRecord};

/// `name: value` where the value runs up to the next delimiter. A value
/// never starts a nested map, so `builtin_instance_counter: {output: 1}`
/// yields `output` rather than swallowing it.
static COUNTER_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+):\s*([^,\s{}]+)").expect("Invalid counter token regex"));

/// Extractor for one known-field set.
#[derive(Debug, Clone, Default)]
pub struct MetricsExtractor {
    schema: FieldSchema,
}

impl MetricsExtractor {
    /// Create an extractor retaining the counters of `schema`.
    #[must_use]
    pub const fn new(schema: FieldSchema) -> Self {
        Self { schema }
    }

    /// Known-field set in use.
    #[must_use]
    pub const fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Build a record stamped with the current local time.
    ///
    /// # Errors
    ///
    /// Returns an [`ExtractError`] if the submission id is empty, the epoch
    /// is not a `u64`, or a known counter has a non-integer value.
    pub fn extract(&self, fragments: &SuccessFragments<'_>) -> Result<MetricsRecord, ExtractError> {
        self.extract_at(fragments, local_now())
    }

    /// Build a record with an explicit timestamp.
    ///
    /// # Errors
    ///
    /// Same as [`MetricsExtractor::extract`].
    pub fn extract_at(
        &self,
        fragments: &SuccessFragments<'_>,
        timestamp: NaiveDateTime,
    ) -> Result<MetricsRecord, ExtractError> {
        let atlantic_id = parse_submission_id(fragments.submission_id.value)?;
        let epoch = parse_epoch(fragments.epoch.value)?;
        let counters = self.extract_counters(fragments.resource_summary.fragment)?;

        Ok(MetricsRecord::builder(atlantic_id, epoch)
            .timestamp(timestamp)
            .counters(counters)
            .build())
    }

    /// Parse the known counters out of a resource-summary fragment.
    ///
    /// Unknown names are ignored whatever their value. When a known name
    /// occurs more than once the last value wins.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::InvalidCounter`] for a known name whose value
    /// is not a non-negative integer fitting in a `u64`.
    pub fn extract_counters(&self, fragment: &str) -> Result<BTreeMap<String, u64>, ExtractError> {
        let mut counters = BTreeMap::new();
        for caps in COUNTER_TOKEN.captures_iter(fragment) {
            let name = &caps[1];
            if !self.schema.contains(name) {
                continue;
            }
            let raw = &caps[2];
            let value = parse_unsigned(raw).ok_or_else(|| ExtractError::InvalidCounter {
                name: name.to_string(),
                value: raw.to_string(),
            })?;
            counters.insert(name.to_string(), value);
        }
        Ok(counters)
    }
}

fn parse_submission_id(value: Option<&str>) -> Result<String, ExtractError> {
    match value.map(str::trim) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(ExtractError::MissingSubmissionId),
    }
}

fn parse_epoch(value: Option<&str>) -> Result<u64, ExtractError> {
    let raw = value.unwrap_or_default();
    parse_unsigned(raw).ok_or_else(|| ExtractError::InvalidEpoch(raw.to_string()))
}

/// Digits only: no sign, no whitespace, no overflow.
fn parse_unsigned(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

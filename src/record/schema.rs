//! Known-field set - the versioned list of counters the store tracks

use crate::error::{Error, Result};

/// Schema version written by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Columns that precede the counters in every store.
pub const FIXED_COLUMNS: [&str; 3] = ["timestamp", "atlantic_id", "epoch"];

const V1_COUNTERS: &[&str] = &[
    "n_steps",
    "n_memory_holes",
    "range_check",
    "poseidon",
    "bitwise",
    "add_mod",
    "range_check96",
    "mul_mod",
    "output",
    "pedersen",
];

/// Explicit, versioned set of counter names retained from a resource summary.
///
/// Counter names are never inferred from observed output: tracking a new
/// counter means adding a new schema version, which also changes the column
/// header of any store created with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    version: u32,
    counters: &'static [&'static str],
}

impl FieldSchema {
    /// Schema version 1.
    #[must_use]
    pub const fn v1() -> Self {
        Self {
            version: 1,
            counters: V1_COUNTERS,
        }
    }

    /// Look up a schema by version number.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedSchema`] for versions this build does not know.
    pub fn for_version(version: u32) -> Result<Self> {
        match version {
            1 => Ok(Self::v1()),
            other => Err(Error::UnsupportedSchema(other)),
        }
    }

    /// Schema version number.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Counter names in column order.
    #[must_use]
    pub const fn counters(&self) -> &'static [&'static str] {
        self.counters
    }

    /// Whether `name` belongs to the known-field set.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.counters.contains(&name)
    }

    /// All column names in store order: fixed columns, then counters.
    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        FIXED_COLUMNS.iter().chain(self.counters.iter()).copied()
    }

    /// The header line (without terminator).
    #[must_use]
    pub fn header(&self) -> String {
        self.columns().collect::<Vec<_>>().join(",")
    }
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self::v1()
    }
}

//! Configuration management.
//!
//! The monitor is configured once at startup. Lookup order:
//!
//! 1. the JSON file named by `BANKAI_BENCH_CONFIG` (must exist),
//! 2. `bench.json` in the working directory, if present,
//! 3. built-in defaults.
//!
//! Missing keys in a file fall back to the defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::record::{FieldSchema, CURRENT_SCHEMA_VERSION};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "BANKAI_BENCH_CONFIG";

/// Config file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "bench.json";

/// Default record store path.
pub const DEFAULT_STORE_PATH: &str = "bankai_metrics.csv";

/// Default pause between cycles (2 minutes).
pub const DEFAULT_INTERVAL_SECS: u64 = 120;

/// Default budget for one prover run (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Monitor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Program to invoke
    pub program: String,
    /// Fixed argument list
    pub args: Vec<String>,
    /// Directory to run the program from (defaults to the current one)
    pub working_dir: Option<PathBuf>,
    /// Record store path
    pub store_path: PathBuf,
    /// Seconds to sleep between cycles
    pub interval_secs: u64,
    /// Seconds a single run may take before it is killed
    pub timeout_secs: u64,
    /// Known-field set version
    pub schema_version: u32,
    /// Stop after this many cycles (runs until interrupted when unset)
    pub max_cycles: Option<u64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            program: "cargo".to_string(),
            args: ["run", "-r", "--bin", "cli", "prove", "recursive-epoch", "-f", "31"]
                .into_iter()
                .map(String::from)
                .collect(),
            working_dir: None,
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            interval_secs: DEFAULT_INTERVAL_SECS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            schema_version: CURRENT_SCHEMA_VERSION,
            max_cycles: None,
        }
    }
}

impl MonitorConfig {
    /// Load configuration using the lookup order described in the module docs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file named by `BANKAI_BENCH_CONFIG`
    /// is missing, a file cannot be parsed, or validation fails.
    pub fn load() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return Self::from_file(Path::new(&path));
        }
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Self::from_file(local);
        }
        info!("no config file found, using built-in defaults");
        let config = Self::default();
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("failed to parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parse and validate JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the JSON is malformed or validation fails.
    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty program, a zero timeout or an
    /// unknown schema version.
    pub fn validate(&self) -> Result<()> {
        if self.program.trim().is_empty() {
            return Err(Error::Config("program must not be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be positive".to_string()));
        }
        if self.store_path.as_os_str().is_empty() {
            return Err(Error::Config("store_path must not be empty".to_string()));
        }
        FieldSchema::for_version(self.schema_version)
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(())
    }

    /// Pause between cycles.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Budget for one run.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Known-field set for `schema_version`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedSchema`] for an unknown version.
    pub fn schema(&self) -> Result<FieldSchema> {
        FieldSchema::for_version(self.schema_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_harness() {
        let config = MonitorConfig::default();
        assert_eq!(config.program, "cargo");
        assert_eq!(
            config.args.join(" "),
            "run -r --bin cli prove recursive-epoch -f 31"
        );
        assert_eq!(config.interval(), Duration::from_secs(120));
        assert_eq!(config.timeout(), Duration::from_secs(300));
        assert_eq!(config.store_path, PathBuf::from("bankai_metrics.csv"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = MonitorConfig::from_json(r#"{"interval_secs": 5, "max_cycles": 3}"#).unwrap();
        assert_eq!(config.interval_secs, 5);
        assert_eq!(config.max_cycles, Some(3));
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_validation_errors() {
        assert!(matches!(
            MonitorConfig::from_json(r#"{"program": " "}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            MonitorConfig::from_json(r#"{"timeout_secs": 0}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            MonitorConfig::from_json(r#"{"schema_version": 2}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            MonitorConfig::from_json("{not json"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_from_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.json");
        let config = MonitorConfig {
            program: "prover".to_string(),
            args: vec!["--epoch".to_string(), "7".to_string()],
            interval_secs: 0,
            ..MonitorConfig::default()
        };
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        assert_eq!(MonitorConfig::from_file(&path).unwrap(), config);
    }
}

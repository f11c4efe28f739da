//! Error types for bankai-bench
//!
//! Invocation and extraction failures have their own enums because the
//! monitor maps them onto cycle outcomes instead of propagating them.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// bankai-bench error types
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration could not be loaded or failed validation
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Record store is not in the expected shape
    #[error("Record store {path}: {reason}")]
    Store {
        /// Path of the offending store
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// Known-field set version is not supported
    #[error("Unsupported field schema version {0}")]
    UnsupportedSchema(u32),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to obtain output from the proving command.
#[derive(Error, Debug)]
pub enum InvokeError {
    /// The command could not be started at all
    #[error("failed to launch `{program}`: {source}")]
    Launch {
        /// Program that was being launched
        program: String,
        /// Underlying spawn error
        source: std::io::Error,
    },

    /// Reading the child's output or waiting on it failed
    #[error("I/O error while running `{program}`: {source}")]
    Io {
        /// Program that was running
        program: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// The command exceeded its wall-clock budget and was killed
    #[error("`{program}` timed out after {}s", .timeout.as_secs())]
    TimedOut {
        /// Program that was running
        program: String,
        /// Budget that elapsed
        timeout: Duration,
    },
}

/// Failure to turn matched marker fragments into a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// Submission identifier marker matched but carried no identifier
    #[error("submission identifier is empty")]
    MissingSubmissionId,

    /// Epoch marker matched but its value is not a non-negative integer
    #[error("epoch value {0:?} is not a non-negative integer")]
    InvalidEpoch(String),

    /// A known counter carried a value that is not a non-negative integer
    #[error("counter `{name}` has non-integer value {value:?}")]
    InvalidCounter {
        /// Counter name from the known-field set
        name: String,
        /// Raw value found in the resource summary
        value: String,
    },
}

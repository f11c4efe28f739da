//! Logging setup for the monitor binary.
//!
//! Every cycle emits one `info` progress line; fmt output carries the
//! timestamp. `RUST_LOG` overrides the default `info` filter, e.g.
//! `RUST_LOG=bankai_bench=debug` to see spawn/exit and append details.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init() -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_level(true))
        .try_init()
}

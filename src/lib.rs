//! # bankai-bench: Prover Benchmark Monitor
//!
//! Periodically runs the proving CLI, decides from its free-form output
//! whether the run succeeded, is still in progress, or failed, and appends
//! the execution-resource counters of every successful run to a CSV history.
//!
//! ## Pipeline
//!
//! ```text
//! Monitor ─► ProcessInvoker ─► OutputClassifier ─► MetricsExtractor ─► RecordSink
//!    ▲                                                                   │
//!    └──────────────────────────── sleep(interval) ◄─────────────────────┘
//! ```
//!
//! - Timeouts, launch failures and unparseable output are logged and retried
//!   on the next cycle; none of them stops the loop.
//! - Only a stop request (SIGINT/SIGTERM in the binary) ends the loop, and
//!   only between cycles.
//! - The store is append-only: one header line, then one row per success.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use bankai_bench::config::MonitorConfig;
//! use bankai_bench::monitor::{listen_for_interrupt, stop_channel, Monitor};
//!
//! # async fn demo() -> bankai_bench::Result<()> {
//! let config = MonitorConfig::load()?;
//! let monitor = Monitor::from_config(&config)?;
//!
//! let (handle, signal) = stop_channel();
//! listen_for_interrupt(handle);
//! let stats = monitor.run(signal).await;
//! println!("{} records appended", stats.records_appended);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod classifier;
pub mod config;
pub mod error;
pub mod extractor;
pub mod invoker;
pub mod monitor;
pub mod observability;
pub mod record;

pub use error::{Error, ExtractError, InvokeError, Result};

//! Record schema and durable store
//!
//! ```text
//! FieldSchema (versioned known-field set)
//!      │
//!      ├── column header of the store
//!      └── counters retained by the extractor
//!
//! MetricsRecord ──> RecordSink::append ──> bankai_metrics.csv
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use bankai_bench::record::{FieldSchema, MetricsRecord, RecordSink};
//!
//! let dir = tempfile::tempdir()?;
//! let sink = RecordSink::new(dir.path().join("metrics.csv"), FieldSchema::v1());
//!
//! let record = MetricsRecord::builder("abc123", 42)
//!     .counter("n_steps", 100)
//!     .build();
//! sink.append(&record)?;
//!
//! assert_eq!(sink.read_records()?.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod metrics_record;
mod schema;
mod sink;

pub use metrics_record::{local_now, MetricsRecord, MetricsRecordBuilder, TIMESTAMP_FORMAT};
pub use schema::{FieldSchema, CURRENT_SCHEMA_VERSION, FIXED_COLUMNS};
pub use sink::{RecordSink, LINE_ENDING};

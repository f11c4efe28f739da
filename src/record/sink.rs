//! Record Sink - append-only CSV store of metrics records
//!
//! The store is a flat comma-separated table. Its first line is the column
//! header of the [`FieldSchema`] the store was created with; every later line
//! is one [`MetricsRecord`]. Rows are only ever appended: the file is opened
//! in append mode for each record and closed again, so it can be inspected
//! between cycles and always holds a complete prefix of the history.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::debug;

use super::{FieldSchema, MetricsRecord, FIXED_COLUMNS, TIMESTAMP_FORMAT};
use crate::error::{Error, Result};

/// Platform line terminator used for every line of a store.
#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
/// Platform line terminator used for every line of a store.
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

/// Append-only writer (and reader) for one record store.
#[derive(Debug, Clone)]
pub struct RecordSink {
    path: PathBuf,
    schema: FieldSchema,
}

impl RecordSink {
    /// Create a sink for the store at `path`. Nothing is touched on disk yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, schema: FieldSchema) -> Self {
        Self {
            path: path.into(),
            schema,
        }
    }

    /// Path of the store.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Schema used for the header and column order.
    #[must_use]
    pub const fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Append one record.
    ///
    /// Creates the store (and missing parent directories) on first use and
    /// writes the header before the first row. Existing content is never read
    /// or rewritten.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the store cannot be created, opened or written.
    pub fn append(&self, record: &MetricsRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let needs_header = match fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };

        // Header and row go out in one write so a fresh store never ends
        // up holding a header without its first row.
        let mut buf = String::new();
        if needs_header {
            buf.push_str(&self.schema.header());
            buf.push_str(LINE_ENDING);
        }
        buf.push_str(&self.format_row(record));
        buf.push_str(LINE_ENDING);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(buf.as_bytes())?;
        file.flush()?;
        file.sync_data()?;

        debug!(
            store = %self.path.display(),
            header_written = needs_header,
            atlantic_id = record.atlantic_id(),
            "appended record"
        );
        Ok(())
    }

    /// Serialize a record as one row (without terminator) in column order.
    ///
    /// Counters the record does not carry become empty cells. Counters the
    /// record carries but the schema does not know are not written.
    #[must_use]
    pub fn format_row(&self, record: &MetricsRecord) -> String {
        let width = FIXED_COLUMNS.len() + self.schema.counters().len();
        let mut cells: Vec<Cow<'_, str>> = Vec::with_capacity(width);
        cells.push(Cow::Owned(
            record.timestamp().format(TIMESTAMP_FORMAT).to_string(),
        ));
        cells.push(escape_cell(record.atlantic_id()));
        cells.push(Cow::Owned(record.epoch().to_string()));
        for name in self.schema.counters() {
            cells.push(
                record
                    .counter(name)
                    .map_or(Cow::Borrowed(""), |v| Cow::Owned(v.to_string())),
            );
        }
        cells.join(",")
    }

    /// Read every record back from the store, in append order.
    ///
    /// A store that does not exist yet reads as empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] if the header does not match this sink's
    /// schema or a row cannot be parsed, and an IO error if reading fails.
    pub fn read_records(&self) -> Result<Vec<MetricsRecord>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut rows = split_rows(&text).into_iter();
        let Some(header) = rows.next() else {
            return Ok(Vec::new());
        };
        let expected: Vec<&str> = self.schema.columns().collect();
        if header != expected {
            return Err(self.store_error(format!(
                "header {:?} does not match schema v{}",
                header.join(","),
                self.schema.version()
            )));
        }

        rows.enumerate()
            .map(|(index, row)| self.parse_row(index + 2, &row))
            .collect()
    }

    fn parse_row(&self, line: usize, cells: &[String]) -> Result<MetricsRecord> {
        let width = FIXED_COLUMNS.len() + self.schema.counters().len();
        if cells.len() != width {
            return Err(self.store_error(format!(
                "line {line}: expected {width} cells, found {}",
                cells.len()
            )));
        }

        let timestamp = NaiveDateTime::parse_from_str(&cells[0], TIMESTAMP_FORMAT)
            .map_err(|e| self.store_error(format!("line {line}: bad timestamp: {e}")))?;
        let epoch = cells[2]
            .parse::<u64>()
            .map_err(|e| self.store_error(format!("line {line}: bad epoch: {e}")))?;

        let mut counters = BTreeMap::new();
        let counter_cells = &cells[FIXED_COLUMNS.len()..];
        for (name, cell) in self.schema.counters().iter().zip(counter_cells) {
            if cell.is_empty() {
                continue;
            }
            let value = cell
                .parse::<u64>()
                .map_err(|e| self.store_error(format!("line {line}: bad {name}: {e}")))?;
            counters.insert((*name).to_string(), value);
        }

        Ok(MetricsRecord::builder(cells[1].clone(), epoch)
            .timestamp(timestamp)
            .counters(counters)
            .build())
    }

    fn store_error(&self, reason: String) -> Error {
        Error::Store {
            path: self.path.clone(),
            reason,
        }
    }
}

/// Quote a cell if it contains a delimiter, quote or line break.
fn escape_cell(value: &str) -> Cow<'_, str> {
    if value.contains(&[',', '"', '\r', '\n'][..]) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Split store text into rows of unquoted cells. Blank lines are skipped.
fn split_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    cell.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => cell.push(c),
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => row.push(std::mem::take(&mut cell)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                row.push(std::mem::take(&mut cell));
                rows.push(std::mem::take(&mut row));
            }
            _ => cell.push(c),
        }
    }
    if !cell.is_empty() || !row.is_empty() {
        row.push(cell);
        rows.push(row);
    }

    rows.retain(|r| !(r.len() == 1 && r[0].is_empty()));
    rows
}

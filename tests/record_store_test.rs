//! Record store format tests
//!
//! The store must hold exactly one header and one line per appended record,
//! in append order, and survive monitor restarts without any prior line
//! changing.

use std::fs;

use bankai_bench::record::{FieldSchema, MetricsRecord, RecordSink, LINE_ENDING, TIMESTAMP_FORMAT};
use chrono::NaiveDateTime;

fn at(second: u32) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(&format!("2025-06-01T08:00:{second:02}.000000"), TIMESTAMP_FORMAT)
        .unwrap()
}

fn record(id: &str, epoch: u64, second: u32) -> MetricsRecord {
    MetricsRecord::builder(id, epoch)
        .timestamp(at(second))
        .counter("n_steps", 1000 + epoch)
        .counter("pedersen", 0)
        .build()
}

#[test]
fn test_fresh_store_gets_header_then_rows_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let sink = RecordSink::new(dir.path().join("bankai_metrics.csv"), FieldSchema::v1());

    for epoch in 0..5 {
        sink.append(&record(&format!("id-{epoch}"), epoch, 0)).unwrap();
    }

    let text = fs::read_to_string(sink.path()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(lines[0], FieldSchema::v1().header());
    assert_eq!(lines.iter().filter(|l| l.starts_with("timestamp,")).count(), 1);
    for (epoch, line) in lines[1..].iter().enumerate() {
        assert!(line.contains(&format!(",id-{epoch},{epoch},")), "line {line}");
    }
    assert!(text.ends_with(LINE_ENDING));
}

#[test]
fn test_restart_appends_without_touching_prior_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bankai_metrics.csv");

    let first_run = RecordSink::new(&path, FieldSchema::v1());
    first_run.append(&record("a", 1, 1)).unwrap();
    first_run.append(&record("b", 2, 2)).unwrap();
    let before = fs::read(&path).unwrap();

    // A new sink over the same file models the monitor being restarted.
    let second_run = RecordSink::new(&path, FieldSchema::v1());
    second_run.append(&record("c", 3, 3)).unwrap();
    let after = fs::read(&path).unwrap();

    assert!(after.starts_with(&before));
    let added = String::from_utf8(after[before.len()..].to_vec()).unwrap();
    assert_eq!(added.lines().count(), 1);
    assert!(added.contains(",c,3,"));

    let ids: Vec<String> = second_run
        .read_records()
        .unwrap()
        .iter()
        .map(|r| r.atlantic_id().to_string())
        .collect();
    assert_eq!(ids, ["a", "b", "c"]);
}

#[test]
fn test_empty_existing_file_gets_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bankai_metrics.csv");
    fs::write(&path, "").unwrap();

    RecordSink::new(&path, FieldSchema::v1())
        .append(&record("a", 1, 1))
        .unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("timestamp,atlantic_id,epoch,"));
    assert_eq!(text.lines().count(), 2);
}

#[test]
fn test_null_and_zero_survive_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let sink = RecordSink::new(dir.path().join("m.csv"), FieldSchema::v1());
    let original = record("zero-vs-null", 9, 9);

    sink.append(&original).unwrap();
    let read = sink.read_records().unwrap();

    assert_eq!(read, vec![original]);
    assert_eq!(read[0].counter("pedersen"), Some(0));
    assert_eq!(read[0].counter("poseidon"), None);
}

#[test]
fn test_existing_rows_are_not_validated_on_append() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("m.csv");
    let history = format!("{}{LINE_ENDING}legacy row kept verbatim{LINE_ENDING}", FieldSchema::v1().header());
    fs::write(&path, &history).unwrap();

    RecordSink::new(&path, FieldSchema::v1())
        .append(&record("new", 1, 1))
        .unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with(&history));
    assert_eq!(text.lines().count(), 3);
}

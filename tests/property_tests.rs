//! Property-based tests for bankai-bench
//!
//! - Classification precedence and marker combinations
//! - Extraction fidelity for ids, epochs and counters (flat and nested)
//! - Store shape after N appends
//! - Run with ProptestConfig::with_cases(100)

use bankai_bench::classifier::{Classification, OutputClassifier};
use bankai_bench::extractor::MetricsExtractor;
use bankai_bench::record::{FieldSchema, MetricsRecord, RecordSink};
use proptest::prelude::*;

const IN_PROGRESS: &str = "Proof not ready yet (status: IN_PROGRESS)";

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

/// Filler text that can never contain a marker (no capitals, no colons)
fn arb_noise() -> impl Strategy<Value = String> {
    "[a-z \n]{0,60}"
}

fn arb_submission_id() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-]{1,24}"
}

fn id_line(id: &str) -> String {
    format!("Proof submitted to Atlantic with ID: {id}\n")
}

fn epoch_line(epoch: u64, genesis: bool) -> String {
    if genesis {
        format!("Genesis proof details - Epoch: {epoch}\n")
    } else {
        format!("Recursive epoch proof details - Target Epoch: {epoch}\n")
    }
}

fn summary_line(counters: &[(String, u64)]) -> String {
    let body = counters
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("Ok(ExecutionResources {{ {body} }})\n")
}

/// Known counters with values, in random order
fn arb_known_counters() -> impl Strategy<Value = Vec<(String, u64)>> {
    proptest::sample::subsequence(FieldSchema::v1().counters().to_vec(), 0..=10)
        .prop_flat_map(|names| {
            let len = names.len();
            (Just(names), proptest::collection::vec(any::<u64>(), len))
        })
        .prop_map(|(names, values)| {
            names
                .into_iter()
                .map(String::from)
                .zip(values)
                .collect()
        })
        .prop_shuffle()
}

/// Known counters split between the top level and the nested
/// `builtin_instance_counter` map, the way the prover prints them
fn arb_nested_summary() -> impl Strategy<Value = (Vec<(String, u64)>, String)> {
    arb_known_counters()
        .prop_flat_map(|known| {
            let len = known.len();
            (Just(known), 0..=len)
        })
        .prop_map(|(known, split)| {
            let (top, nested) = known.split_at(split);
            let mut fields: Vec<String> = top
                .iter()
                .map(|(name, value)| format!("{name}: {value}"))
                .collect();
            let builtins = nested
                .iter()
                .map(|(name, value)| format!("{name}: {value}"))
                .collect::<Vec<_>>()
                .join(", ");
            fields.push(format!("builtin_instance_counter: {{{builtins}}}"));
            let line = format!("Ok(ExecutionResources {{ {} }})\n", fields.join(", "));
            (known, line)
        })
}

/// Counter names guaranteed to be outside the known-field set
fn arb_unknown_counters() -> impl Strategy<Value = Vec<(String, u64)>> {
    proptest::collection::vec(("[a-z]{1,8}_untracked", any::<u64>()), 0..5)
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: the in-progress marker wins regardless of other content
    #[test]
    fn prop_in_progress_always_wins(
        before in arb_noise(),
        after in arb_noise(),
        id in arb_submission_id(),
        epoch in any::<u64>(),
        include_success in any::<bool>(),
    ) {
        let success = if include_success {
            format!("{}{}{}", id_line(&id), epoch_line(epoch, false), summary_line(&[]))
        } else {
            String::new()
        };
        let text = format!("{before}{success}{IN_PROGRESS}{after}");

        prop_assert_eq!(OutputClassifier::default().classify(&text), Classification::InProgress);
    }

    /// Property: well-formed markers yield exactly the marker contents
    #[test]
    fn prop_success_preserves_id_and_epoch(
        noise in arb_noise(),
        id in arb_submission_id(),
        epoch in any::<u64>(),
        genesis in any::<bool>(),
        known in arb_known_counters(),
    ) {
        let text = format!(
            "{noise}{}{noise}{}{}",
            id_line(&id),
            epoch_line(epoch, genesis),
            summary_line(&known)
        );

        let record = match OutputClassifier::default().classify(&text) {
            Classification::Success(fragments) => MetricsExtractor::default().extract(&fragments).unwrap(),
            other => return Err(TestCaseError::fail(format!("not a success: {other:?}"))),
        };

        prop_assert_eq!(record.atlantic_id(), id.as_str());
        prop_assert_eq!(record.epoch(), epoch);
        prop_assert_eq!(record.counters().len(), known.len());
        for (name, value) in &known {
            prop_assert_eq!(record.counter(name), Some(*value));
        }
    }

    /// Property: counters inside the nested builtin map are all extracted
    #[test]
    fn prop_nested_builtin_counters_are_extracted(
        id in arb_submission_id(),
        epoch in any::<u64>(),
        (known, summary) in arb_nested_summary(),
    ) {
        let text = format!("{}{}{summary}", id_line(&id), epoch_line(epoch, false));

        let record = match OutputClassifier::default().classify(&text) {
            Classification::Success(fragments) => MetricsExtractor::default().extract(&fragments).unwrap(),
            other => return Err(TestCaseError::fail(format!("not a success: {other:?}"))),
        };

        prop_assert_eq!(record.counters().len(), known.len());
        for (name, value) in &known {
            prop_assert_eq!(record.counter(name), Some(*value));
        }
    }

    /// Property: counters outside the known-field set never reach the record
    #[test]
    fn prop_unknown_counters_are_dropped(
        known in arb_known_counters(),
        unknown in arb_unknown_counters(),
    ) {
        let mut all = known.clone();
        all.extend(unknown.iter().cloned());
        let counters = MetricsExtractor::default()
            .extract_counters(&summary_line(&all))
            .unwrap();

        for (name, _) in &unknown {
            prop_assert!(!counters.contains_key(name));
        }
        prop_assert_eq!(counters.len(), known.len());
    }

    /// Property: a non-integer value on a known counter fails extraction
    #[test]
    fn prop_non_integer_known_counter_fails(
        index in 0usize..10,
        bad in "[a-z]{1,6}|[0-9]{1,4}[a-z]{1,3}",
    ) {
        let name = FieldSchema::v1().counters()[index];
        let fragment = format!("Ok(ExecutionResources {{ {name}: {bad} }})");
        prop_assert!(MetricsExtractor::default().extract_counters(&fragment).is_err());
    }

    /// Property: fewer than all three success markers is never a success
    #[test]
    fn prop_partial_markers_are_unparseable(
        noise in arb_noise(),
        id in arb_submission_id(),
        epoch in any::<u64>(),
        mask in 0u8..7,
    ) {
        let mut text = noise;
        if mask & 1 != 0 {
            text.push_str(&id_line(&id));
        }
        if mask & 2 != 0 {
            text.push_str(&epoch_line(epoch, mask & 4 == 0));
        }
        if mask & 4 != 0 {
            text.push_str(&summary_line(&[]));
        }

        let classification = OutputClassifier::default().classify(&text);
        let is_unparseable = matches!(classification, Classification::Unparseable { .. });
        prop_assert!(is_unparseable);
    }

    /// Property: N appends give one header and N rows, in order
    #[test]
    fn prop_store_has_one_header_and_n_rows(epochs in proptest::collection::vec(any::<u64>(), 1..20)) {
        let dir = tempfile::tempdir().unwrap();
        let sink = RecordSink::new(dir.path().join("m.csv"), FieldSchema::v1());

        for (i, epoch) in epochs.iter().enumerate() {
            sink.append(&MetricsRecord::new(format!("run-{i}"), *epoch)).unwrap();
        }

        let text = std::fs::read_to_string(sink.path()).unwrap();
        prop_assert_eq!(text.lines().count(), epochs.len() + 1);

        let read: Vec<u64> = sink.read_records().unwrap().iter().map(MetricsRecord::epoch).collect();
        prop_assert_eq!(read, epochs);
    }
}

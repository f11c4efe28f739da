//! Marker patterns recognised in prover output

use once_cell::sync::Lazy;
use regex::Regex;

/// `Proof not ready yet (status: IN_PROGRESS)`
pub const IN_PROGRESS_PATTERN: &str = r"Proof not ready yet \(status: IN_PROGRESS\)";

/// `Proof submitted to Atlantic with ID: <id>`
pub const SUBMISSION_ID_PATTERN: &str = r"Proof submitted to Atlantic with ID: (\S+)";

/// `Genesis proof details - Epoch: <n>`
pub const GENESIS_EPOCH_PATTERN: &str = r"Genesis proof details - Epoch: (\w+)";

/// `Recursive epoch proof details - Target Epoch: <n>`
pub const RECURSIVE_EPOCH_PATTERN: &str = r"Recursive epoch proof details - Target Epoch: (\w+)";

/// `Ok(ExecutionResources { ... })`, on a single line
pub const RESOURCE_SUMMARY_PATTERN: &str = r"Ok\(ExecutionResources \{ .*? \}\)";

static STANDARD: Lazy<MarkerSet> =
    Lazy::new(|| standard_markers().expect("built-in marker patterns are valid"));

fn standard_markers() -> Result<MarkerSet, regex::Error> {
    Ok(MarkerSet {
        in_progress: Marker::new("in_progress", IN_PROGRESS_PATTERN)?,
        submission_id: Marker::new("submission_id", SUBMISSION_ID_PATTERN)?,
        epoch: Marker::with_alternatives(
            "epoch",
            &[GENESIS_EPOCH_PATTERN, RECURSIVE_EPOCH_PATTERN],
        )?,
        resource_summary: Marker::new("resource_summary", RESOURCE_SUMMARY_PATTERN)?,
    })
}

/// A named textual pattern, possibly with several accepted phrasings.
///
/// When a phrasing has a capture group, its first group is the marker's
/// value (e.g. the submission identifier).
#[derive(Debug, Clone)]
pub struct Marker {
    name: &'static str,
    phrasings: Vec<Regex>,
}

/// Where a marker matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerMatch<'t> {
    /// Full text of the match
    pub fragment: &'t str,
    /// First capture group, if the phrasing has one
    pub value: Option<&'t str>,
    /// Byte offset of the match in the searched text
    pub start: usize,
}

impl Marker {
    /// Marker with a single phrasing.
    ///
    /// # Errors
    ///
    /// Returns the regex error if `pattern` does not compile.
    pub fn new(name: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Self::with_alternatives(name, &[pattern])
    }

    /// Marker accepting any of several phrasings.
    ///
    /// # Errors
    ///
    /// Returns the regex error of the first pattern that does not compile.
    pub fn with_alternatives(name: &'static str, patterns: &[&str]) -> Result<Self, regex::Error> {
        let phrasings = patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { name, phrasings })
    }

    /// Add another accepted phrasing.
    ///
    /// # Errors
    ///
    /// Returns the regex error if `pattern` does not compile.
    pub fn add_phrasing(&mut self, pattern: &str) -> Result<(), regex::Error> {
        self.phrasings.push(Regex::new(pattern)?);
        Ok(())
    }

    /// Marker name, used in diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Whether any phrasing occurs in `text`.
    #[must_use]
    pub fn is_present(&self, text: &str) -> bool {
        self.phrasings.iter().any(|re| re.is_match(text))
    }

    /// Earliest occurrence of any phrasing in `text`.
    #[must_use]
    pub fn find<'t>(&self, text: &'t str) -> Option<MarkerMatch<'t>> {
        self.phrasings
            .iter()
            .filter_map(|re| re.captures(text))
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                Some(MarkerMatch {
                    fragment: whole.as_str(),
                    value: caps.get(1).map(|m| m.as_str()),
                    start: whole.start(),
                })
            })
            .min_by_key(|m| m.start)
    }
}

/// The four markers the classifier looks for.
#[derive(Debug, Clone)]
pub struct MarkerSet {
    /// Still-running status report
    pub in_progress: Marker,
    /// Submission identifier
    pub submission_id: Marker,
    /// Proved epoch (genesis and recursive phrasings)
    pub epoch: Marker,
    /// Execution resource summary line
    pub resource_summary: Marker,
}

impl MarkerSet {
    /// The phrasings emitted by the current prover CLI.
    #[must_use]
    pub fn standard() -> Self {
        STANDARD.clone()
    }
}

impl Default for MarkerSet {
    fn default() -> Self {
        Self::standard()
    }
}

//! Output Classifier - decides what a captured prover run means
//!
//! Classification is first-match-wins:
//!
//! 1. the in-progress marker anywhere in the text → [`Classification::InProgress`]
//! 2. submission id, epoch *and* resource summary all present → [`Classification::Success`]
//! 3. anything else → [`Classification::Unparseable`]
//!
//! An in-progress report is never read as a completed run, even when stray
//! success markers are present in the same output.
//!
//! ## Example
//!
//! ```rust
//! use bankai_bench::classifier::{Classification, OutputClassifier};
//!
//! let classifier = OutputClassifier::default();
//! let text = "Proof submitted to Atlantic with ID: abc123\n\
//!             Recursive epoch proof details - Target Epoch: 42\n\
//!             Ok(ExecutionResources { n_steps: 100, range_check: 5 })\n";
//!
//! match classifier.classify(text) {
//!     Classification::Success(fragments) => {
//!         assert_eq!(fragments.submission_id.value, Some("abc123"));
//!         assert_eq!(fragments.epoch.value, Some("42"));
//!     }
//!     other => panic!("unexpected classification: {other:?}"),
//! }
//! ```

mod marker;

pub use marker::{
    Marker, MarkerMatch, MarkerSet, GENESIS_EPOCH_PATTERN, IN_PROGRESS_PATTERN,
    RECURSIVE_EPOCH_PATTERN, RESOURCE_SUMMARY_PATTERN, SUBMISSION_ID_PATTERN,
};

/// Marker fragments located in a successful run's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuccessFragments<'t> {
    /// Submission identifier match
    pub submission_id: MarkerMatch<'t>,
    /// Epoch match (either phrasing)
    pub epoch: MarkerMatch<'t>,
    /// Resource summary line
    pub resource_summary: MarkerMatch<'t>,
}

/// Result of classifying captured output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification<'t> {
    /// The external job is still running; skip this cycle.
    InProgress,
    /// All success markers were found.
    Success(SuccessFragments<'t>),
    /// Output did not contain the expected markers in combination.
    Unparseable {
        /// Names of the success markers that were not found
        missing: Vec<&'static str>,
    },
}

/// Classifier over a [`MarkerSet`].
#[derive(Debug, Clone, Default)]
pub struct OutputClassifier {
    markers: MarkerSet,
}

impl OutputClassifier {
    /// Create a classifier with custom markers.
    #[must_use]
    pub const fn new(markers: MarkerSet) -> Self {
        Self { markers }
    }

    /// Markers in use.
    #[must_use]
    pub const fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    /// Classify captured output.
    #[must_use]
    pub fn classify<'t>(&self, text: &'t str) -> Classification<'t> {
        if self.markers.in_progress.is_present(text) {
            return Classification::InProgress;
        }

        let submission_id = self.markers.submission_id.find(text);
        let epoch = self.markers.epoch.find(text);
        let resource_summary = self.markers.resource_summary.find(text);

        match (submission_id, epoch, resource_summary) {
            (Some(submission_id), Some(epoch), Some(resource_summary)) => {
                Classification::Success(SuccessFragments {
                    submission_id,
                    epoch,
                    resource_summary,
                })
            }
            (submission_id, epoch, resource_summary) => {
                let missing = [
                    (submission_id.is_none(), self.markers.submission_id.name()),
                    (epoch.is_none(), self.markers.epoch.name()),
                    (resource_summary.is_none(), self.markers.resource_summary.name()),
                ]
                .into_iter()
                .filter_map(|(absent, name)| absent.then_some(name))
                .collect();
                Classification::Unparseable { missing }
            }
        }
    }
}

//! Per-file inspection report
//!
//! Shared by `POST /api/inspect` and the `stridex-inspect` command.

use serde::Serialize;
use serde_json::{Map, Value};
use stridex_common::classifier::{classify_document, families_present};
use stridex_common::discovery::discover_with;
use stridex_common::loader::{DocumentLayout, TextEncoding};
use stridex_common::meta_labels::extract_meta_labels;
use stridex_common::series::SeriesStats;
use stridex_common::{Candidate, DiscoveryLimits, LoadOutcome, SensorFamily};

/// One discovered candidate, without its raw value
#[derive(Debug, Clone, Serialize)]
pub struct CandidateSummary {
    pub path: String,
    pub shape: Vec<usize>,
    pub family: SensorFamily,
    pub stats: Option<SeriesStats>,
}

impl From<&Candidate> for CandidateSummary {
    fn from(candidate: &Candidate) -> Self {
        Self {
            path: candidate.path_string(),
            shape: candidate.shape.clone(),
            family: candidate.family(),
            stats: candidate.to_array().and_then(|a| a.stats()),
        }
    }
}

/// Everything known about one loaded source
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub source: String,
    pub usable: bool,
    pub layout: Option<DocumentLayout>,
    pub encoding: Option<TextEncoding>,
    pub errors: Vec<String>,
    pub notes: Vec<String>,
    /// Family of the first mergeable document
    pub family: Option<SensorFamily>,
    pub families_present: Vec<SensorFamily>,
    pub meta: Map<String, Value>,
    pub labels: Map<String, Value>,
    pub candidate_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<CandidateSummary>>,
}

impl FileReport {
    /// Build a report; candidate details are listed only when asked for
    pub fn build(outcome: &LoadOutcome, limits: &DiscoveryLimits, with_candidates: bool) -> Self {
        let primary = outcome.merge_units().into_iter().find_map(Result::ok);
        let (meta, labels) = primary.map(extract_meta_labels).unwrap_or_default();

        let found = outcome
            .document
            .as_ref()
            .map(|doc| discover_with(&Value::Object(doc.clone()), limits))
            .unwrap_or_default();

        Self {
            source: outcome.source.clone(),
            usable: outcome.is_usable(),
            layout: outcome.layout,
            encoding: outcome.encoding,
            errors: outcome.errors.clone(),
            notes: outcome.notes.clone(),
            family: primary.map(classify_document),
            families_present: primary.map(families_present).unwrap_or_default(),
            meta,
            labels,
            candidate_count: found.len(),
            candidates: with_candidates.then(|| found.iter().map(CandidateSummary::from).collect()),
        }
    }
}

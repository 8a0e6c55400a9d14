//! Subject merging
//!
//! A [`SubjectIndex`] folds documents from any number of files into one
//! [`Subject`] per resolved id. The index is an explicit, caller-owned value;
//! merging is order dependent ("later wins") and must be applied in input order.
//!
//! **Merge rules:**
//! - meta: key-by-key update, last writer wins per key
//! - labels: every label object is kept; [`Subject::labels`] flattens them in
//!   encounter order
//! - family payloads (`data.<section>.values`): a non-empty payload replaces the
//!   stored one for that family only
//! - source files: appended, never deduplicated
//!
//! Only the explicit `meta` and `labels` keys take part; the heuristic
//! fallbacks of [`extract_meta_labels`](crate::meta_labels::extract_meta_labels)
//! are for inspection and never choose a subject id.
//!
//! A document is merged completely or not at all.

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::classifier::{section_values, SensorFamily};
use crate::loader::{load_bytes, load_path, source_stem, LoadOutcome};
use crate::meta_labels::{explicit_meta_labels, merge_label_sets, summarize_labels, LabelSummary};
use crate::normalize::{gait_cycle_split, normalize_days, normalize_metrics, DayRecord, GaitCycleSplit, MetricMap};

/// Why a document or record was not merged
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("no usable document")]
    Unloadable,

    #[error("no subject id (meta.patient.id, meta.id and file name all empty)")]
    MissingId,

    #[error("record {0} is not an object")]
    NotAnObject(usize),
}

impl Serialize for SkipReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One skipped document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedDocument {
    pub source: String,
    pub reason: SkipReason,
}

/// Outcome of ingesting one or more files
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    /// Files that contributed at least one merged document
    pub loaded: usize,
    /// Files attempted
    pub total: usize,
    /// Documents merged
    pub documents: usize,
    /// Retained loader errors, prefixed with their source
    pub errors: Vec<String>,
    pub skips: Vec<SkippedDocument>,
}

impl IngestReport {
    /// Fold another report into this one
    pub fn absorb(&mut self, other: IngestReport) {
        self.loaded += other.loaded;
        self.total += other.total;
        self.documents += other.documents;
        self.errors.extend(other.errors);
        self.skips.extend(other.skips);
    }

    /// "N of M files loaded"
    pub fn headline(&self) -> String {
        format!("{} of {} files loaded", self.loaded, self.total)
    }
}

// ============================================================================
// Subject
// ============================================================================

/// One patient/participant, merged across files
#[derive(Debug, Clone, PartialEq)]
pub struct Subject {
    pub id: String,
    pub meta: Map<String, Value>,
    /// Label objects in encounter order
    pub label_sets: Vec<Map<String, Value>>,
    /// Latest raw payload per family
    pub payloads: BTreeMap<SensorFamily, Map<String, Value>>,
    pub imu: Option<MetricMap>,
    pub gait_pad: Option<MetricMap>,
    pub insole_days: Vec<DayRecord>,
    pub source_files: Vec<String>,
}

impl Subject {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            meta: Map::new(),
            label_sets: Vec::new(),
            payloads: BTreeMap::new(),
            imu: None,
            gait_pad: None,
            insole_days: Vec::new(),
            source_files: Vec::new(),
        }
    }

    /// Label objects flattened key by key, later keys winning
    pub fn labels(&self) -> Map<String, Value> {
        merge_label_sets(&self.label_sets)
    }

    pub fn label_summary(&self) -> LabelSummary {
        summarize_labels(&self.labels())
    }

    /// Families with a stored payload, in priority order
    pub fn sensors(&self) -> Vec<SensorFamily> {
        self.payloads.keys().copied().collect()
    }

    /// Stance/swing split from the gait pad rates
    pub fn gait_cycle(&self) -> Option<GaitCycleSplit> {
        self.gait_pad.as_ref().map(gait_cycle_split)
    }

    fn apply(&mut self, update: DocumentUpdate, source: &str) {
        for (k, v) in update.meta {
            self.meta.insert(k, v);
        }
        if !update.labels.is_empty() {
            self.label_sets.push(update.labels);
        }
        for (family, raw) in update.payloads {
            match family {
                SensorFamily::Imu => self.imu = Some(normalize_metrics(&raw)),
                SensorFamily::GaitPad => self.gait_pad = Some(normalize_metrics(&raw)),
                SensorFamily::SmartInsole => self.insole_days = normalize_days(&raw),
                SensorFamily::Generic => continue,
            }
            self.payloads.insert(family, raw);
        }
        self.source_files.push(source.to_string());
    }
}

impl Serialize for Subject {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Subject", 9)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("sensors", &self.sensors())?;
        state.serialize_field("meta", &self.meta)?;
        state.serialize_field("labels", &self.labels())?;
        state.serialize_field("imu", &self.imu)?;
        state.serialize_field("gait_pad", &self.gait_pad)?;
        state.serialize_field("insole_days", &self.insole_days)?;
        state.serialize_field("gait_cycle", &self.gait_cycle())?;
        state.serialize_field("source_files", &self.source_files)?;
        state.end()
    }
}

/// Everything one document contributes, computed before any mutation
struct DocumentUpdate {
    id: String,
    meta: Map<String, Value>,
    labels: Map<String, Value>,
    payloads: Vec<(SensorFamily, Map<String, Value>)>,
}

impl DocumentUpdate {
    fn from_document(doc: &Map<String, Value>, fallback_id: &str) -> Result<Self, SkipReason> {
        let (meta, labels) = explicit_meta_labels(doc);
        let id = resolve_subject_id(&meta, fallback_id).ok_or(SkipReason::MissingId)?;
        let payloads = SensorFamily::DEVICES
            .iter()
            .filter_map(|family| {
                let section = family.section_key()?;
                section_values(doc, section)
                    .filter(|values| !values.is_empty())
                    .map(|values| (*family, values.clone()))
            })
            .collect();
        Ok(Self {
            id,
            meta,
            labels,
            payloads,
        })
    }
}

/// Resolve a subject id: `meta.patient.id` → `meta.id` → `fallback_id`
///
/// Strings are trimmed and numbers are used in their JSON text form; empty
/// values count as absent. `None` only when every source is empty.
pub fn resolve_subject_id(meta: &Map<String, Value>, fallback_id: &str) -> Option<String> {
    let patient_id = match meta.get("patient") {
        Some(Value::Object(patient)) => patient.get("id").and_then(id_text),
        _ => None,
    };
    patient_id
        .or_else(|| meta.get("id").and_then(id_text))
        .or_else(|| {
            let fallback = fallback_id.trim();
            (!fallback.is_empty()).then(|| fallback.to_string())
        })
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ============================================================================
// Index
// ============================================================================

/// Caller-owned collection of subjects, keyed and ordered by id
#[derive(Debug, Clone, Default)]
pub struct SubjectIndex {
    subjects: BTreeMap<String, Subject>,
}

impl SubjectIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    pub fn subject(&self, id: &str) -> Option<&Subject> {
        self.subjects.get(id)
    }

    /// Subjects in ascending id order
    pub fn subjects(&self) -> impl Iterator<Item = &Subject> {
        self.subjects.values()
    }

    /// Drop every subject
    pub fn reset(&mut self) {
        self.subjects.clear();
    }

    /// Merge one document
    ///
    /// Returns the id the document was merged under. On `Err` the index is
    /// unchanged.
    pub fn merge_document(
        &mut self,
        doc: &Map<String, Value>,
        source: &str,
        fallback_id: &str,
    ) -> Result<String, SkipReason> {
        let update = DocumentUpdate::from_document(doc, fallback_id)?;
        let id = update.id.clone();
        self.subjects
            .entry(id.clone())
            .or_insert_with(|| Subject::new(id.clone()))
            .apply(update, source);
        Ok(id)
    }

    /// Merge everything a loaded source provides
    pub fn ingest_outcome(&mut self, outcome: &LoadOutcome) -> IngestReport {
        let source = outcome.source.as_str();
        let mut report = IngestReport {
            total: 1,
            errors: outcome.errors.iter().map(|e| format!("{}: {}", source, e)).collect(),
            ..IngestReport::default()
        };

        if !outcome.is_usable() {
            report.skips.push(SkippedDocument {
                source: source.to_string(),
                reason: SkipReason::Unloadable,
            });
            warn!(source, errors = outcome.errors.len(), "Skipped unusable file");
            return report;
        }

        let fallback_id = source_stem(source);
        for unit in outcome.merge_units() {
            let merged = unit
                .map_err(SkipReason::NotAnObject)
                .and_then(|doc| self.merge_document(doc, source, &fallback_id));
            match merged {
                Ok(_) => report.documents += 1,
                Err(reason) => {
                    warn!(source, reason = %reason, "Skipped document");
                    report.skips.push(SkippedDocument {
                        source: source.to_string(),
                        reason,
                    });
                }
            }
        }
        if report.documents > 0 {
            report.loaded = 1;
        }

        info!(
            source,
            documents = report.documents,
            skipped = report.skips.len(),
            subjects = self.len(),
            "Ingested file"
        );
        report
    }

    /// Load and merge a file from disk
    pub fn ingest_path(&mut self, path: &Path) -> IngestReport {
        self.ingest_outcome(&load_path(path))
    }

    /// Load and merge an in-memory buffer
    pub fn ingest_bytes(&mut self, name: &str, bytes: &[u8]) -> IngestReport {
        self.ingest_outcome(&load_bytes(name, bytes))
    }

    /// Load and merge several files in order
    pub fn ingest_paths<I, P>(&mut self, paths: I) -> IngestReport
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut report = IngestReport::default();
        for path in paths {
            report.absorb(self.ingest_path(path.as_ref()));
        }
        report
    }
}

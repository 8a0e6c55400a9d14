//! # StrideX Common Library
//!
//! Shared code for the StrideX gait-sensor tools including:
//! - Document loading (JSON / JSONL / NDJSON, optionally gzip-compressed)
//! - Numeric coercion of loosely typed JSON leaves
//! - Candidate discovery (plottable numeric series anywhere in a document)
//! - Sensor family classification
//! - Meta/labels extraction
//! - Schema normalization into left/right metrics and day records
//! - Subject merging across files
//! - Configuration loading

pub mod catalog;
pub mod classifier;
pub mod coerce;
pub mod config;
pub mod discovery;
pub mod error;
pub mod loader;
pub mod meta_labels;
pub mod normalize;
pub mod series;
pub mod subject;

pub use classifier::SensorFamily;
pub use coerce::coerce_number;
pub use discovery::{discover, Candidate, DiscoveryLimits};
pub use error::{Error, Result};
pub use loader::{load_bytes, load_path, LoadOutcome};
pub use normalize::{to_lr_metric, DayRecord, LrMetric};
pub use subject::{IngestReport, Subject, SubjectIndex};

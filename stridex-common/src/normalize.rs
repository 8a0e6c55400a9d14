//! Schema normalization
//!
//! Rewrites a sensor family's raw `values` object into canonical records:
//! - IMU and gait pad: metric name → [`LrMetric`]
//! - Smart insole: `day_<N>` keys → [`DayRecord`]s sorted by `N`
//! - Generic: the discovered candidates of the raw object
//!
//! Normalization is total. A metric with the wrong JSON shape ends up with both
//! sides absent; it never fails the section. Missing metrics are left out, never
//! defaulted to zero.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

use crate::classifier::SensorFamily;
use crate::coerce::coerce_number;
use crate::discovery::{discover, Candidate};

static DAY_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^day_(\d+)").expect("valid day key pattern"));

/// Insole firmware spelling of `stride_length`
const STRIDE_LENGTH_MISSPELLED: &str = "stride_lenght";
const STRIDE_LENGTH: &str = "stride_length";

/// Lower bound on the stance + swing denominator
const PHASE_SUM_FLOOR: f64 = 1e-6;

/// Left/right reading of one metric
///
/// A bare scalar source value populates `left` only. That is a compatibility
/// convention for unilateral metrics (`velocity`, `gait_distance`, ...), not a
/// guarantee from the data producer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LrMetric {
    pub left: Option<f64>,
    pub right: Option<f64>,
}

impl LrMetric {
    pub fn new(left: Option<f64>, right: Option<f64>) -> Self {
        Self { left, right }
    }

    /// True when at least one side has a value
    pub fn is_present(&self) -> bool {
        self.left.is_some() || self.right.is_some()
    }

    /// True when both sides have a value
    pub fn is_bilateral(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }
}

/// Metric name → reading, sorted by name
pub type MetricMap = BTreeMap<String, LrMetric>;

/// One day of smart-insole metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    /// `N` from `day_<N>`; 0 when the key does not match
    pub day_index: u32,
    /// Key as found in the document
    pub key: String,
    pub metrics: MetricMap,
}

impl DayRecord {
    pub fn metric(&self, name: &str) -> Option<&LrMetric> {
        self.metrics.get(name)
    }
}

/// Normalized form of one family section
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum NormalizedSection {
    Metrics(MetricMap),
    Days(Vec<DayRecord>),
    Candidates(Vec<Candidate>),
}

/// Convert one raw metric value
///
/// **Rules:**
/// - object → `left = coerce(v.L)`, `right = coerce(v.R)`
/// - anything else → `left = coerce(v)`, `right = None`
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use stridex_common::normalize::{to_lr_metric, LrMetric};
///
/// assert_eq!(to_lr_metric(&json!({"L": 3, "R": 7})), LrMetric::new(Some(3.0), Some(7.0)));
/// assert_eq!(to_lr_metric(&json!(5)), LrMetric::new(Some(5.0), None));
/// assert_eq!(to_lr_metric(&json!(null)), LrMetric::new(None, None));
/// ```
pub fn to_lr_metric(value: &Value) -> LrMetric {
    match value {
        Value::Object(sides) => LrMetric {
            left: sides.get("L").and_then(coerce_number),
            right: sides.get("R").and_then(coerce_number),
        },
        other => LrMetric {
            left: coerce_number(other),
            right: None,
        },
    }
}

/// `N` from a key starting with `day_<N>`
pub fn day_index(key: &str) -> Option<u32> {
    DAY_KEY
        .captures(key)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Normalize a left/right metrics section (IMU, gait pad)
pub fn normalize_metrics(raw: &Map<String, Value>) -> MetricMap {
    raw.iter()
        .map(|(name, value)| (name.clone(), to_lr_metric(value)))
        .collect()
}

/// Normalize a smart-insole section into day records sorted by day index
///
/// The sort is stable: keys without a day number share index 0 and keep
/// document order.
pub fn normalize_days(raw: &Map<String, Value>) -> Vec<DayRecord> {
    let mut days: Vec<DayRecord> = raw
        .iter()
        .map(|(key, value)| DayRecord {
            day_index: day_index(key).unwrap_or(0),
            key: key.clone(),
            metrics: match value {
                Value::Object(metrics) => normalize_day_metrics(metrics),
                _ => MetricMap::new(),
            },
        })
        .collect();
    days.sort_by_key(|day| day.day_index);
    days
}

/// Day metrics with `stride_lenght` renamed to `stride_length`
///
/// A correctly spelled key wins over the misspelled one.
fn normalize_day_metrics(raw: &Map<String, Value>) -> MetricMap {
    let mut metrics = MetricMap::new();
    for (name, value) in raw {
        let name = if name == STRIDE_LENGTH_MISSPELLED {
            if raw.contains_key(STRIDE_LENGTH) {
                continue;
            }
            STRIDE_LENGTH
        } else {
            name.as_str()
        };
        metrics.insert(name.to_string(), to_lr_metric(value));
    }
    metrics
}

/// Normalize a raw `values` object for the given family
pub fn normalize_family(raw: &Map<String, Value>, family: SensorFamily) -> NormalizedSection {
    let section = match family {
        SensorFamily::Imu | SensorFamily::GaitPad => NormalizedSection::Metrics(normalize_metrics(raw)),
        SensorFamily::SmartInsole => NormalizedSection::Days(normalize_days(raw)),
        SensorFamily::Generic => NormalizedSection::Candidates(discover(&Value::Object(raw.clone()))),
    };
    debug!(family = %family, entries = raw.len(), "Normalized section");
    section
}

// ============================================================================
// Gait cycle split
// ============================================================================

/// Stance/swing percentages summing to 100
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhaseSplit {
    pub stance: f64,
    pub swing: f64,
}

/// Per-side gait cycle split derived from gait-pad phase rates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GaitCycleSplit {
    pub left: Option<PhaseSplit>,
    pub right: Option<PhaseSplit>,
}

/// Split each side's gait cycle into stance and swing shares
///
/// Uses `stance_phase_rate` and `swing_phase_rate`; a side is `None` unless
/// both rates are present for it.
pub fn gait_cycle_split(pad: &MetricMap) -> GaitCycleSplit {
    let stance = pad.get("stance_phase_rate").copied().unwrap_or_default();
    let swing = pad.get("swing_phase_rate").copied().unwrap_or_default();
    GaitCycleSplit {
        left: phase_split(stance.left, swing.left),
        right: phase_split(stance.right, swing.right),
    }
}

fn phase_split(stance: Option<f64>, swing: Option<f64>) -> Option<PhaseSplit> {
    let (stance, swing) = (stance?, swing?);
    let total = (stance + swing).max(PHASE_SUM_FLOOR);
    Some(PhaseSplit {
        stance: stance / total * 100.0,
        swing: swing / total * 100.0,
    })
}

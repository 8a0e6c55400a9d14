//! Sensor family classification
//!
//! Two modes:
//! - **Structural** (whole document): checks the conventional payload paths
//!   `data.<section>.values` in a fixed priority order (IMU, gait pad, smart insole).
//! - **Keyword** (candidate path or key set): case-insensitive substring match
//!   against per-family keyword lists, again in fixed priority order
//!   (IMU, smart insole, gait pad).
//!
//! Both modes are table driven; the first matching rule wins, so a document is
//! never assigned two families.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::normalize::day_index;

/// Sensor family tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorFamily {
    Imu,
    GaitPad,
    SmartInsole,
    Generic,
}

impl SensorFamily {
    /// Recognized device families, in structural priority order
    pub const DEVICES: [SensorFamily; 3] = [
        SensorFamily::Imu,
        SensorFamily::GaitPad,
        SensorFamily::SmartInsole,
    ];

    /// Snake-case tag (`imu`, `gait_pad`, `smart_insole`, `generic`)
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorFamily::Imu => "imu",
            SensorFamily::GaitPad => "gait_pad",
            SensorFamily::SmartInsole => "smart_insole",
            SensorFamily::Generic => "generic",
        }
    }

    /// Key of the family's section under `data` (`None` for generic)
    pub fn section_key(&self) -> Option<&'static str> {
        match self {
            SensorFamily::Imu => Some("imu_sensor"),
            SensorFamily::GaitPad => Some("gait_pad"),
            SensorFamily::SmartInsole => Some("smart_insole"),
            SensorFamily::Generic => None,
        }
    }

    /// Short listing label (`IMU`, `PAD`, `INSOLE`)
    pub fn short_label(&self) -> &'static str {
        match self {
            SensorFamily::Imu => "IMU",
            SensorFamily::GaitPad => "PAD",
            SensorFamily::SmartInsole => "INSOLE",
            SensorFamily::Generic => "GENERIC",
        }
    }
}

impl fmt::Display for SensorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Structural rules
// ============================================================================

/// `data.<section>.values` must be an object accepted by `accepts`
struct StructureRule {
    family: SensorFamily,
    section: &'static str,
    accepts: fn(&Map<String, Value>) -> bool,
}

const STRUCTURE_RULES: [StructureRule; 3] = [
    StructureRule {
        family: SensorFamily::Imu,
        section: "imu_sensor",
        accepts: any_object,
    },
    StructureRule {
        family: SensorFamily::GaitPad,
        section: "gait_pad",
        accepts: any_object,
    },
    StructureRule {
        family: SensorFamily::SmartInsole,
        section: "smart_insole",
        accepts: has_day_keys,
    },
];

fn any_object(_: &Map<String, Value>) -> bool {
    true
}

fn has_day_keys(values: &Map<String, Value>) -> bool {
    values.keys().any(|k| day_index(k).is_some())
}

/// The object at `data.<section>.values`, if there is one
pub fn section_values<'a>(doc: &'a Map<String, Value>, section: &str) -> Option<&'a Map<String, Value>> {
    doc.get("data")?
        .as_object()?
        .get(section)?
        .as_object()?
        .get("values")?
        .as_object()
}

/// Classify a whole document
///
/// Structural rules are tried first. When none match and the document has a
/// `data` object, its keys are classified by keyword; otherwise `generic`.
pub fn classify_document(doc: &Map<String, Value>) -> SensorFamily {
    for rule in &STRUCTURE_RULES {
        if section_values(doc, rule.section).is_some_and(rule.accepts) {
            return rule.family;
        }
    }
    match doc.get("data") {
        Some(Value::Object(data)) => classify_keys(data.keys()),
        _ => SensorFamily::Generic,
    }
}

/// Every family whose structural rule matches, in priority order
pub fn families_present(doc: &Map<String, Value>) -> Vec<SensorFamily> {
    STRUCTURE_RULES
        .iter()
        .filter(|rule| section_values(doc, rule.section).is_some_and(rule.accepts))
        .map(|rule| rule.family)
        .collect()
}

// ============================================================================
// Keyword rules
// ============================================================================

struct KeywordRule {
    family: SensorFamily,
    keywords: &'static [&'static str],
}

const KEYWORD_RULES: [KeywordRule; 3] = [
    KeywordRule {
        family: SensorFamily::Imu,
        keywords: &["imu", "accel", "gyro", "mag", "orientation"],
    },
    KeywordRule {
        family: SensorFamily::SmartInsole,
        keywords: &["insole", "pressure", "grid", "sole", "foot"],
    },
    KeywordRule {
        family: SensorFamily::GaitPad,
        keywords: &["pad", "gait", "matrix", "plate"],
    },
];

fn classify_text(text: &str) -> SensorFamily {
    let lower = text.to_lowercase();
    KEYWORD_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| lower.contains(k)))
        .map(|rule| rule.family)
        .unwrap_or(SensorFamily::Generic)
}

/// Classify a candidate path (`root/data/imu_sensor/accel`)
pub fn classify_path(path: &str) -> SensorFamily {
    classify_text(path)
}

/// Classify a set of keys
///
/// Keys are matched individually, so the result does not depend on key order.
pub fn classify_keys<I, S>(keys: I) -> SensorFamily
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = keys
        .into_iter()
        .map(|k| k.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(" ");
    classify_text(&joined)
}

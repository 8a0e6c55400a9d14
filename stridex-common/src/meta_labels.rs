//! Meta/labels extraction
//!
//! Pulls the descriptive `meta` object and the `labels` object out of a
//! document, falling back to heuristics when the conventional keys are missing.
//!
//! **Resolution order** (each step only when the previous produced nothing):
//! 1. `doc.meta` (object) and `doc.labels` (object, or array wrapped as
//!    `{"labels": [...]}`)
//! 2. meta: first top-level object that is shallow and descriptive
//! 3. labels: first top-level non-empty array whose first 50 elements are
//!    scalar-like and not numeric (a categorical list, not a data series)
//!
//! Both results are always objects, possibly empty.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::coerce::{coerce_number, is_container, is_scalar_like};

/// Elements inspected by the labels heuristic
const LABEL_SCAN_PREFIX: usize = 50;

/// Elements shown when previewing an array
const PREVIEW_ELEMENTS: usize = 8;

/// Extract `(meta, labels)` from a document
pub fn extract_meta_labels(doc: &Map<String, Value>) -> (Map<String, Value>, Map<String, Value>) {
    let (mut meta, mut labels) = explicit_meta_labels(doc);

    if meta.is_empty() {
        if let Some(found) = doc.values().find_map(|v| match v {
            Value::Object(m) if is_shallow_descriptive(m) => Some(m),
            _ => None,
        }) {
            meta = found.clone();
        }
    }

    if labels.is_empty() {
        if let Some((key, items)) = doc.iter().find_map(|(k, v)| match v {
            Value::Array(items) if is_categorical_list(items) => Some((k, items)),
            _ => None,
        }) {
            labels.insert(key.clone(), Value::Array(items.clone()));
        }
    }

    (meta, labels)
}

/// Only the conventional `meta` and `labels` keys, no heuristics
///
/// Used by subject merging: a descriptive block such as `device` never
/// supplies a subject id.
pub fn explicit_meta_labels(doc: &Map<String, Value>) -> (Map<String, Value>, Map<String, Value>) {
    let meta = match doc.get("meta") {
        Some(Value::Object(m)) => m.clone(),
        _ => Map::new(),
    };
    let labels = match doc.get("labels") {
        Some(Value::Object(l)) => l.clone(),
        Some(Value::Array(items)) => {
            let mut wrapped = Map::new();
            wrapped.insert("labels".to_string(), Value::Array(items.clone()));
            wrapped
        }
        _ => Map::new(),
    };
    (meta, labels)
}

/// Non-empty, and scalar-valued keys ≥ max(2, nested keys)
fn is_shallow_descriptive(map: &Map<String, Value>) -> bool {
    if map.is_empty() {
        return false;
    }
    let nested = map.values().filter(|v| is_container(v)).count();
    let scalars = map.values().filter(|v| is_scalar_like(v)).count();
    scalars >= nested.max(2)
}

fn is_categorical_list(items: &[Value]) -> bool {
    !items.is_empty()
        && items
            .iter()
            .take(LABEL_SCAN_PREFIX)
            .all(|x| is_scalar_like(x) && coerce_number(x).is_none())
}

/// Flatten merged label objects in encounter order, later keys winning
pub fn merge_label_sets<'a, I>(sets: I) -> Map<String, Value>
where
    I: IntoIterator<Item = &'a Map<String, Value>>,
{
    let mut merged = Map::new();
    for set in sets {
        for (k, v) in set {
            merged.insert(k.clone(), v.clone());
        }
    }
    merged
}

// ============================================================================
// Label summary
// ============================================================================

/// The four diagnostic fields of a label object
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LabelSummary {
    /// `"0 (normal)"`, `"1 (knee osteoarthritis)"`, or the raw class text
    pub class: Option<String>,
    /// Affected side
    pub side: Option<String>,
    pub region: Option<String>,
    pub diagnosis_text: Option<String>,
}

/// Summarize a (merged) labels object
///
/// `class`, `side` and `region` come from `annotation` when that key holds an
/// object, otherwise from the top level. `diagnosis_text` is always top level.
pub fn summarize_labels(labels: &Map<String, Value>) -> LabelSummary {
    let source = match labels.get("annotation") {
        Some(Value::Object(annotation)) => annotation,
        _ => labels,
    };
    LabelSummary {
        class: source.get("class").and_then(class_display),
        side: source.get("side").and_then(display_text),
        region: source.get("region").and_then(display_text),
        diagnosis_text: labels.get("diagnosis_text").and_then(display_text),
    }
}

fn class_display(value: &Value) -> Option<String> {
    let code = match value {
        Value::Null => return None,
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    Some(match code {
        Some(0) => "0 (normal)".to_string(),
        Some(c) => format!("{} (knee osteoarthritis)", c),
        None => display(value),
    })
}

fn display_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        other => Some(display(other)),
    }
}

/// Human-readable form of a value: strings unquoted, everything else as JSON
pub fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ============================================================================
// Key/value view
// ============================================================================

/// Flatten nested objects depth-first into `(key, display)` pairs
///
/// Only the last key segment is kept. Arrays are previewed with their first 8
/// elements, followed by `…(+N)` when longer.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use stridex_common::meta_labels::flatten_entries;
///
/// let doc = json!({"patient": {"id": "S1", "age": 64}, "tags": ["a", "b"]});
/// let entries = flatten_entries(doc.as_object().unwrap());
/// assert_eq!(entries[0], ("id".to_string(), "S1".to_string()));
/// assert_eq!(entries[2], ("tags".to_string(), "[a, b]".to_string()));
/// ```
pub fn flatten_entries(map: &Map<String, Value>) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    flatten_into(map, &mut entries);
    entries
}

fn flatten_into(map: &Map<String, Value>, entries: &mut Vec<(String, String)>) {
    for (key, value) in map {
        match value {
            Value::Object(inner) => flatten_into(inner, entries),
            Value::Array(items) => entries.push((key.clone(), preview(items))),
            other => entries.push((key.clone(), display(other))),
        }
    }
}

fn preview(items: &[Value]) -> String {
    let mut text = items
        .iter()
        .take(PREVIEW_ELEMENTS)
        .map(display)
        .collect::<Vec<_>>()
        .join(", ");
    if items.len() > PREVIEW_ELEMENTS {
        text.push_str(&format!(", …(+{})", items.len() - PREVIEW_ELEMENTS));
    }
    format!("[{}]", text)
}

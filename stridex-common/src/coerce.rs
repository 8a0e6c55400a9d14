//! Best-effort numeric coercion of JSON leaves
//!
//! `coerce_number` is the single rule for deciding whether a JSON leaf is usable
//! as data. Every module that reads a leaf numerically goes through it.

use serde_json::Value;

/// Coerce a JSON value to `f64`.
///
/// **Rules (in order):**
/// 1. `null` → `None`
/// 2. number → its value
/// 3. string → trimmed; empty → `None`; otherwise parsed as a decimal float, `None` on failure
/// 4. object, array, boolean → `None`
///
/// Never panics.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use stridex_common::coerce::coerce_number;
///
/// assert_eq!(coerce_number(&json!(61.2)), Some(61.2));
/// assert_eq!(coerce_number(&json!(" 48 ")), Some(48.0));
/// assert_eq!(coerce_number(&json!("")), None);
/// assert_eq!(coerce_number(&json!(true)), None);
/// ```
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Null => None,
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_decimal(s),
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Parse a trimmed decimal string, `None` when empty or not a float
pub fn parse_decimal(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Scalar-like leaf: string, number or null
///
/// Used by the meta/labels heuristics. Booleans are not scalar-like.
pub fn is_scalar_like(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Null)
}

/// Nested container: object or array
pub fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

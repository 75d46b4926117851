//! Helpers for reading loosely-typed evidence payloads.

use serde_json::Value;

/// Array of evidence items at `section.category`, empty when absent or malformed.
pub fn items<'a>(evidence: &'a Value, section: &str, category: &str) -> &'a [Value] {
    evidence
        .get(section)
        .and_then(|s| s.get(category))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Points awarded to one evidence item. Numeric strings are accepted,
/// anything else (including "NaN" and "inf") counts as zero.
pub fn points_of(item: &Value) -> f64 {
    let points = match item.get("points") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    points.filter(|p| p.is_finite()).unwrap_or(0.0)
}

pub fn sum_points(items: &[Value]) -> f64 {
    items.iter().map(points_of).sum()
}

/// True when the value is missing, null, an empty string, array or object.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
        Some(_) => false,
    }
}

/// Strict PubMed identifier check: only digits, at least `min_digits` long.
/// Integer JSON numbers are accepted as their decimal representation.
pub fn is_strict_pmid(value: Option<&Value>, min_digits: usize) -> bool {
    let text = match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) if n.is_u64() => n.to_string(),
        _ => return false,
    };
    !text.is_empty() && text.len() >= min_digits && text.chars().all(|c| c.is_ascii_digit())
}

/// Case-insensitive string at `section.field`, lowercased.
pub fn lowered(evidence: &Value, section: &str, field: &str) -> Option<String> {
    evidence
        .get(section)
        .and_then(|s| s.get(field))
        .and_then(Value::as_str)
        .map(str::to_lowercase)
}

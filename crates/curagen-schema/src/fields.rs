//! Per-type field checkers.
//!
//! Nested values are attributed with `field[index]` for array items and
//! `field.property` for object properties.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;

use crate::model::{FieldDefinition, FieldType};
use crate::result::{IssueKind, ValidationResult};
use crate::validator::ValidatorSettings;

fn email_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok())
        .as_ref()
}

fn url_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^https?://[-\w.]+(?::\d+)?(?:/[\w/.\-]*(?:\?[\w&=%.\-]*)?(?:#\w*)?)?$").ok()
    })
    .as_ref()
}

/// Render a JSON value the way users wrote it (strings unquoted).
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Check `value` against `def`, dispatching on the declared type.
pub fn check_value(
    field: &str,
    value: &Value,
    def: &FieldDefinition,
    settings: &ValidatorSettings,
    result: &mut ValidationResult,
) {
    match &def.field_type {
        FieldType::Text => check_text(field, value, def, settings, result),
        FieldType::Number => {
            check_number(field, value, def, result);
        }
        FieldType::Boolean => {
            if !value.is_boolean() {
                result.add_error(field, "Value must be true or false", IssueKind::Type);
            }
        }
        FieldType::Array => check_array(field, value, def, settings, result),
        FieldType::Object => check_object(field, value, def, settings, result),
        FieldType::Date => check_date(field, value, def, result),
        FieldType::Select => check_select(field, value, def, result),
        FieldType::Multiselect => check_multiselect(field, value, def, result),
        FieldType::Email => check_format(field, value, "Email", email_regex(), "Invalid email format", result),
        FieldType::Url => check_format(field, value, "URL", url_regex(), "Invalid URL format", result),
        FieldType::Pmid => check_pmid(field, value, result),
        FieldType::HgncId => check_hgnc_id(field, value, result),
        FieldType::Score => check_score(field, value, def, result),
        FieldType::Unknown(name) => {
            result.add_warning(field, format!("Unknown field type: {name}"), IssueKind::Configuration);
        }
    }
}

fn check_text(
    field: &str,
    value: &Value,
    def: &FieldDefinition,
    settings: &ValidatorSettings,
    result: &mut ValidationResult,
) {
    let Some(text) = value.as_str() else {
        result.add_error(field, "Value must be a string", IssueKind::Type);
        return;
    };
    let len = text.chars().count();

    if let Some(min) = def.min_length {
        if len < min {
            result.add_error(field, format!("Text must be at least {min} characters"), IssueKind::Length);
        }
    }
    if let Some(max) = def.max_length {
        if len > max {
            result.add_error(field, format!("Text must not exceed {max} characters"), IssueKind::Length);
        }
    }

    if let Some(pattern) = &def.pattern {
        // anchored at the start only
        match Regex::new(&format!("^(?:{pattern})")) {
            Ok(re) if !re.is_match(text) => {
                result.add_error(field, "Text does not match required pattern", IssueKind::Pattern);
            }
            Ok(_) => {}
            Err(e) => {
                result.add_warning(field, format!("Invalid pattern in schema: {e}"), IssueKind::Configuration);
            }
        }
    }

    if def.quality_checks && settings.text_quality_checks {
        if text.trim().len() != text.len() {
            result.add_warning(field, "Text has leading/trailing whitespace", IssueKind::Quality);
        }
        if !text.is_empty() && text.split_whitespace().count() < settings.min_descriptive_words {
            result.add_warning(field, "Consider providing more detailed description", IssueKind::Completeness);
        }
    }
}

/// Finite value of a JSON number or numeric string.
fn as_number(value: &Value) -> Option<f64> {
    let num = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    num.filter(|n| n.is_finite())
}

/// Fractional digits of the parsed value; `Display` for f64 never uses
/// exponent notation, so 1e-7 counts as seven places.
fn decimal_places(num: f64) -> usize {
    num.to_string().split_once('.').map_or(0, |(_, frac)| frac.len())
}

/// Returns the parsed value when the field is numeric.
fn check_number(field: &str, value: &Value, def: &FieldDefinition, result: &mut ValidationResult) -> Option<f64> {
    let Some(num) = as_number(value) else {
        result.add_error(field, "Value must be a number", IssueKind::Type);
        return None;
    };

    if let Some(min) = def.min_value {
        if num < min {
            result.add_error(field, format!("Value must be at least {min}"), IssueKind::Range);
        }
    }
    if let Some(max) = def.max_value {
        if num > max {
            result.add_error(field, format!("Value must not exceed {max}"), IssueKind::Range);
        }
    }
    if let Some(places) = def.decimal_places {
        if decimal_places(num) > places {
            result.add_error(
                field,
                format!("Value cannot have more than {places} decimal places"),
                IssueKind::Precision,
            );
        }
    }
    Some(num)
}

fn check_score(field: &str, value: &Value, def: &FieldDefinition, result: &mut ValidationResult) {
    let Some(score) = check_number(field, value, def, result) else {
        return;
    };
    if result.field_has_errors(field) {
        return;
    }
    if score < 0.0 {
        result.add_warning(field, "Negative scores are unusual - please verify", IssueKind::Quality);
    }
    let lowered = field.to_lowercase();
    if lowered.contains("genetic_evidence") && score > 12.0 {
        result.add_warning(
            field,
            "ClinGen genetic evidence scores typically don't exceed 12 points",
            IssueKind::Range,
        );
    }
    if lowered.contains("experimental_evidence") && score > 6.0 {
        result.add_warning(
            field,
            "ClinGen experimental evidence scores typically don't exceed 6 points",
            IssueKind::Range,
        );
    }
}

fn check_array(
    field: &str,
    value: &Value,
    def: &FieldDefinition,
    settings: &ValidatorSettings,
    result: &mut ValidationResult,
) {
    let Some(items) = value.as_array() else {
        result.add_error(field, "Value must be an array", IssueKind::Type);
        return;
    };
    if let Some(min) = def.min_items {
        if items.len() < min {
            result.add_error(field, format!("Array must have at least {min} items"), IssueKind::Length);
        }
    }
    if let Some(max) = def.max_items {
        if items.len() > max {
            result.add_error(field, format!("Array must not have more than {max} items"), IssueKind::Length);
        }
    }
    if let Some(item_def) = &def.items {
        for (i, item) in items.iter().enumerate() {
            check_value(&format!("{field}[{i}]"), item, item_def, settings, result);
        }
    }
}

fn check_object(
    field: &str,
    value: &Value,
    def: &FieldDefinition,
    settings: &ValidatorSettings,
    result: &mut ValidationResult,
) {
    let Some(obj) = value.as_object() else {
        result.add_error(field, "Value must be an object", IssueKind::Type);
        return;
    };
    for (prop, prop_def) in &def.properties {
        let name = format!("{field}.{prop}");
        match obj.get(prop) {
            None | Some(Value::Null) => {
                if prop_def.required {
                    result.add_error(&name, "Required property is missing", IssueKind::Required);
                }
            }
            Some(prop_value) => check_value(&name, prop_value, prop_def, settings, result),
        }
    }
}

/// Parse `YYYY-MM-DD`, naive `YYYY-MM-DDTHH:MM:SS[.f]`, or RFC 3339 (`Z` accepted).
pub fn parse_iso_datetime(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn check_date(field: &str, value: &Value, def: &FieldDefinition, result: &mut ValidationResult) {
    let Some(text) = value.as_str() else {
        result.add_error(field, "Date must be a string in ISO format", IssueKind::Type);
        return;
    };
    let Some(date) = parse_iso_datetime(text) else {
        result.add_error(field, "Invalid date format. Use ISO format (YYYY-MM-DD)", IssueKind::Format);
        return;
    };
    if let Some(min) = &def.min_date {
        match parse_iso_datetime(min) {
            Some(bound) if date < bound => {
                result.add_error(field, format!("Date must be after {min}"), IssueKind::Range);
            }
            Some(_) => {}
            None => result.add_warning(field, format!("Invalid min_date in schema: {min}"), IssueKind::Configuration),
        }
    }
    if let Some(max) = &def.max_date {
        match parse_iso_datetime(max) {
            Some(bound) if date > bound => {
                result.add_error(field, format!("Date must be before {max}"), IssueKind::Range);
            }
            Some(_) => {}
            None => result.add_warning(field, format!("Invalid max_date in schema: {max}"), IssueKind::Configuration),
        }
    }
}

fn joined_options(def: &FieldDefinition) -> String {
    def.option_values()
        .into_iter()
        .map(display_value)
        .collect::<Vec<_>>()
        .join(", ")
}

fn check_select(field: &str, value: &Value, def: &FieldDefinition, result: &mut ValidationResult) {
    if def.options.is_empty() {
        result.add_warning(field, "No options defined for select field", IssueKind::Configuration);
        return;
    }
    if !def.option_values().contains(&value) {
        result.add_error(
            field,
            format!("Value must be one of: {}", joined_options(def)),
            IssueKind::Options,
        );
    }
}

fn check_multiselect(field: &str, value: &Value, def: &FieldDefinition, result: &mut ValidationResult) {
    let Some(items) = value.as_array() else {
        result.add_error(field, "Value must be an array", IssueKind::Type);
        return;
    };
    if def.options.is_empty() {
        result.add_warning(field, "No options defined for multiselect field", IssueKind::Configuration);
        return;
    }
    let allowed = def.option_values();
    for item in items {
        if !allowed.contains(&item) {
            result.add_error(
                field,
                format!(
                    "Invalid option: {}. Must be one of: {}",
                    display_value(item),
                    joined_options(def)
                ),
                IssueKind::Options,
            );
        }
    }
}

fn check_format(
    field: &str,
    value: &Value,
    what: &str,
    re: Option<&Regex>,
    invalid: &str,
    result: &mut ValidationResult,
) {
    let Some(text) = value.as_str() else {
        result.add_error(field, format!("{what} must be a string"), IssueKind::Type);
        return;
    };
    if re.is_some_and(|re| !re.is_match(text)) {
        result.add_error(field, invalid, IssueKind::Format);
    }
}

fn check_pmid(field: &str, value: &Value, result: &mut ValidationResult) {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) if n.is_u64() => n.to_string(),
        _ => {
            result.add_error(field, "PMID must be a string or number", IssueKind::Type);
            return;
        }
    };
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        result.add_error(field, "PMID must contain only digits", IssueKind::Format);
        return;
    }
    if text.len() > 10 {
        result.add_error(field, "PMID must be 1-10 digits long", IssueKind::Format);
    }
}

fn check_hgnc_id(field: &str, value: &Value, result: &mut ValidationResult) {
    let Some(text) = value.as_str() else {
        result.add_error(field, "HGNC ID must be a string", IssueKind::Type);
        return;
    };
    let valid = text
        .strip_prefix("HGNC:")
        .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()));
    if !valid {
        result.add_error(
            field,
            "HGNC ID must be in format HGNC:#### where #### is a number",
            IssueKind::Format,
        );
    }
}

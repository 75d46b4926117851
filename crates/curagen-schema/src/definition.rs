//! Schema self-check: structural validation of a schema definition document.

use regex::Regex;
use serde_json::{Map, Value};

use crate::model::{CurationSchema, FieldType};
use crate::result::{IssueKind, ValidationResult};
use crate::validator::SchemaValidator;

const REQUIRED_SECTIONS: [&str; 4] = ["name", "version", "field_definitions", "workflow_states"];
const REQUIRED_STATES: [&str; 2] = ["draft", "submitted"];

impl SchemaValidator {
    /// Check a typed schema by way of its serialized definition.
    pub fn validate_schema(&self, schema: &CurationSchema) -> ValidationResult {
        self.validate_schema_definition(&schema.to_definition())
    }

    /// Check a raw definition document before it is accepted as a schema.
    pub fn validate_schema_definition(&self, definition: &Value) -> ValidationResult {
        let mut result = ValidationResult::new();

        let Some(doc) = definition.as_object() else {
            result.add_error("schema", "Schema definition must be an object", IssueKind::Structure);
            return result;
        };

        for section in REQUIRED_SECTIONS {
            if !doc.contains_key(section) {
                result.add_error("schema", format!("Missing required field: {section}"), IssueKind::Structure);
            }
        }

        if let Some(fields) = doc.get("field_definitions") {
            match fields.as_object() {
                Some(fields) => check_field_definitions("", fields, &mut result),
                None => result.add_error(
                    "field_definitions",
                    "field_definitions must be a dictionary",
                    IssueKind::Structure,
                ),
            }
        }

        if let Some(states) = doc.get("workflow_states") {
            check_workflow_states(states, &mut result);
        }

        if let Some(ui) = doc.get("ui_configuration") {
            if ui.get("sections").is_none() {
                result.add_warning(
                    "ui_configuration",
                    "Missing 'sections' - form may not render properly",
                    IssueKind::Usability,
                );
            }
        }

        if let Some(scoring) = doc.get("scoring_configuration") {
            match scoring.get("engine").and_then(Value::as_str) {
                None => result.add_warning(
                    "scoring_configuration",
                    "Missing 'engine' specification",
                    IssueKind::Configuration,
                ),
                Some(engine) if !self.scoring().contains(engine) => result.add_warning(
                    "scoring_configuration",
                    format!("Scoring engine '{engine}' is not registered"),
                    IssueKind::Configuration,
                ),
                Some(_) => {}
            }
        }

        if let Some(rules) = doc.get("business_rules").and_then(Value::as_array) {
            for name in rules.iter().filter_map(Value::as_str) {
                if !self.business_rules().contains(name) {
                    result.add_warning(
                        "business_rules",
                        format!("Unknown business rule: {name}"),
                        IssueKind::Configuration,
                    );
                }
            }
        }

        if let Some(rules) = doc.get("validation_rules").and_then(Value::as_object) {
            check_validation_rules(rules, &mut result);
        }

        let name = doc.get("name").and_then(Value::as_str).unwrap_or("<unnamed>");
        tracing::debug!(
            schema = name,
            is_valid = result.is_valid,
            "Schema definition checked"
        );
        result
    }
}

fn check_field_definitions(prefix: &str, fields: &Map<String, Value>, result: &mut ValidationResult) {
    for (name, config) in fields {
        let qualified = format!("{prefix}{name}");
        let Some(config) = config.as_object() else {
            result.add_error(
                "field_definitions",
                format!("Field '{qualified}' configuration must be an object"),
                IssueKind::Structure,
            );
            continue;
        };

        match config.get("type").and_then(Value::as_str) {
            None => result.add_error(
                "field_definitions",
                format!("Field '{qualified}' missing required 'type' property"),
                IssueKind::Structure,
            ),
            Some(t) if !FieldType::from(t.to_string()).is_known() => result.add_error(
                "field_definitions",
                format!("Field '{qualified}' has unknown type '{t}'; expected one of: {}", FieldType::KNOWN.join(", ")),
                IssueKind::Structure,
            ),
            Some(_) => {}
        }

        // nested definitions are labelled by their parent
        if prefix.is_empty() && !config.contains_key("label") {
            result.add_warning(
                "field_definitions",
                format!("Field '{qualified}' missing 'label' property"),
                IssueKind::Usability,
            );
        }

        if let Some(pattern) = config.get("pattern").and_then(Value::as_str) {
            if let Err(e) = Regex::new(pattern) {
                result.add_error(
                    "field_definitions",
                    format!("Field '{qualified}' has an invalid pattern: {e}"),
                    IssueKind::Structure,
                );
            }
        }

        let is_select = matches!(
            config.get("type").and_then(Value::as_str),
            Some("select") | Some("multiselect")
        );
        let has_options = config
            .get("options")
            .and_then(Value::as_array)
            .is_some_and(|o| !o.is_empty());
        if is_select && !has_options {
            result.add_warning(
                "field_definitions",
                format!("Field '{qualified}' declares no options"),
                IssueKind::Configuration,
            );
        }

        if let Some(items) = config.get("items") {
            let mut nested = Map::new();
            nested.insert("items".to_string(), items.clone());
            check_field_definitions(&format!("{qualified}."), &nested, result);
        }
        if let Some(props) = config.get("properties").and_then(Value::as_object) {
            check_field_definitions(&format!("{qualified}."), props, result);
        }
    }
}

fn check_workflow_states(states: &Value, result: &mut ValidationResult) {
    let Some(states) = states.as_array() else {
        result.add_error("workflow_states", "Workflow states must be an array", IssueKind::Structure);
        return;
    };
    for required in REQUIRED_STATES {
        if !states.iter().any(|s| s.as_str() == Some(required)) {
            result.add_error(
                "workflow_states",
                format!("Missing required workflow state: {required}"),
                IssueKind::Structure,
            );
        }
    }
}

fn check_validation_rules(rules: &Map<String, Value>, result: &mut ValidationResult) {
    for (name, rule) in rules {
        let kind = rule.get("type").and_then(Value::as_str).unwrap_or("condition");
        let needed: &[&str] = match kind {
            "condition" => &["condition"],
            "dependency" => &["field", "depends_on"],
            "calculation" => &[],
            other => {
                result.add_warning(
                    "validation_rules",
                    format!("Unsupported validation rule type '{other}': {name}"),
                    IssueKind::Configuration,
                );
                continue;
            }
        };
        for key in needed {
            if rule.get(*key).and_then(Value::as_str).is_none() {
                result.add_warning(
                    "validation_rules",
                    format!("Rule '{name}' is missing '{key}'"),
                    IssueKind::Configuration,
                );
            }
        }
    }
}

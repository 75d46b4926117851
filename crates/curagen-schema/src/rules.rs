//! Named cross-field validation rules.

use serde_json::Value;

use crate::model::{RuleKind, ValidationRule};
use crate::path::get_path;
use crate::result::{IssueKind, ValidationResult};

const RULES_FIELD: &str = "validation_rules";

fn is_present(evidence: &Value, path: &str) -> bool {
    !matches!(get_path(evidence, path), None | Some(Value::Null))
}

pub fn apply_rule(name: &str, rule: &ValidationRule, evidence: &Value, result: &mut ValidationResult) {
    match &rule.kind {
        RuleKind::Condition => apply_condition(name, rule, evidence, result),
        RuleKind::Dependency => apply_dependency(name, rule, evidence, result),
        RuleKind::Calculation => result.add_warning(
            RULES_FIELD,
            format!("Calculation rules not fully implemented: {name}"),
            IssueKind::Limitation,
        ),
        RuleKind::Unsupported(kind) => result.add_warning(
            RULES_FIELD,
            format!("Unsupported validation rule type '{kind}': {name}"),
            IssueKind::Configuration,
        ),
    }
}

fn apply_condition(name: &str, rule: &ValidationRule, evidence: &Value, result: &mut ValidationResult) {
    let condition = rule.condition.as_deref().unwrap_or("").trim();

    if condition.contains("&&") || condition.contains("||") {
        result.add_warning(
            RULES_FIELD,
            format!("Complex conditions not fully supported: {name}"),
            IssueKind::Limitation,
        );
        return;
    }

    let Some(field) = condition
        .strip_prefix("exists(")
        .and_then(|rest| rest.strip_suffix(')'))
        .map(str::trim)
        .filter(|f| !f.is_empty())
    else {
        result.add_warning(
            RULES_FIELD,
            format!("Unsupported condition in rule {name}: '{condition}'"),
            IssueKind::Limitation,
        );
        return;
    };

    if !is_present(evidence, field) {
        let message = rule
            .message
            .clone()
            .unwrap_or_else(|| format!("Condition rule {name} failed"));
        result.add_error(field, message, IssueKind::Condition);
    }
}

fn apply_dependency(name: &str, rule: &ValidationRule, evidence: &Value, result: &mut ValidationResult) {
    let (Some(field), Some(depends_on)) = (rule.field.as_deref(), rule.depends_on.as_deref()) else {
        result.add_warning(
            RULES_FIELD,
            format!("Dependency rule {name} must declare 'field' and 'depends_on'"),
            IssueKind::Configuration,
        );
        return;
    };

    if is_present(evidence, depends_on) && !is_present(evidence, field) {
        let message = rule
            .message
            .clone()
            .unwrap_or_else(|| format!("Field {field} is required when {depends_on} is provided"));
        result.add_error(field, message, IssueKind::Dependency);
    }
}

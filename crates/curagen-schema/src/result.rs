//! Structured validation outcome. Built incrementally; never partial.

use std::collections::BTreeMap;

use curagen_scoring::ScoringResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Required,
    Type,
    Length,
    Pattern,
    Range,
    Precision,
    Format,
    Options,
    Condition,
    Dependency,
    Quality,
    Completeness,
    Configuration,
    Limitation,
    Structure,
    Usability,
    Scoring,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub severity: Severity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldIssues {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRuleViolation {
    pub rule: String,
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub field_validations: BTreeMap<String, FieldIssues>,
    pub business_rule_violations: Vec<BusinessRuleViolation>,
    pub score_calculations: BTreeMap<String, f64>,
    pub completeness_score: f64,
    pub required_fields_missing: Vec<String>,
    pub suggested_improvements: Vec<String>,
    /// Full engine output when the schema declares a registered engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scoring: Option<ScoringResult>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            field_validations: BTreeMap::new(),
            business_rule_violations: Vec::new(),
            score_calculations: BTreeMap::new(),
            completeness_score: 0.0,
            required_fields_missing: Vec::new(),
            suggested_improvements: Vec::new(),
            scoring: None,
        }
    }

    pub fn add_error(&mut self, field: &str, message: impl Into<String>, kind: IssueKind) {
        self.is_valid = false;
        let issue = ValidationIssue {
            field: field.to_string(),
            message: message.into(),
            kind,
            severity: Severity::Error,
        };
        tracing::debug!(field, message = %issue.message, "Validation error");
        self.field_validations
            .entry(field.to_string())
            .or_default()
            .errors
            .push(issue.clone());
        self.errors.push(issue);
    }

    pub fn add_warning(&mut self, field: &str, message: impl Into<String>, kind: IssueKind) {
        let issue = ValidationIssue {
            field: field.to_string(),
            message: message.into(),
            kind,
            severity: Severity::Warning,
        };
        self.field_validations
            .entry(field.to_string())
            .or_default()
            .warnings
            .push(issue.clone());
        self.warnings.push(issue);
    }

    /// `Error` severity makes the result invalid; `Warning` does not.
    pub fn add_business_rule_violation(&mut self, rule: &str, message: impl Into<String>, severity: Severity) {
        if severity == Severity::Error {
            self.is_valid = false;
        }
        self.business_rule_violations.push(BusinessRuleViolation {
            rule: rule.to_string(),
            message: message.into(),
            severity,
        });
    }

    pub fn field_has_errors(&self, field: &str) -> bool {
        self.field_validations
            .get(field)
            .is_some_and(|f| !f.errors.is_empty())
    }

    /// Every blocking problem as `field: message`, business rules included.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .chain(
                self.business_rule_violations
                    .iter()
                    .filter(|v| v.severity == Severity::Error)
                    .map(|v| format!("{}: {}", v.rule, v.message)),
            )
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_invalidate_warnings_do_not() {
        let mut result = ValidationResult::new();
        result.add_warning("summary", "Text has leading/trailing whitespace", IssueKind::Quality);
        assert!(result.is_valid);
        result.add_business_rule_violation("institutional_review_notes", "notes recommended", Severity::Warning);
        assert!(result.is_valid);
        result.add_error("gene", "Required field is missing", IssueKind::Required);
        assert!(!result.is_valid);
        assert!(result.field_has_errors("gene"));
        assert!(!result.field_has_errors("summary"));
        assert_eq!(result.field_validations["summary"].warnings.len(), 1);
    }

    #[test]
    fn test_error_messages_include_blocking_violations() {
        let mut result = ValidationResult::new();
        result.add_business_rule_violation("clingen_genetic_max_score", "too high", Severity::Error);
        result.add_business_rule_violation("soft", "meh", Severity::Warning);
        assert!(!result.is_valid);
        assert_eq!(result.error_messages(), vec!["clingen_genetic_max_score: too high".to_string()]);
    }

    #[test]
    fn test_issue_serializes_type_key() {
        let mut result = ValidationResult::new();
        result.add_error("pmid", "PMID must contain only digits", IssueKind::Format);
        let value = serde_json::to_value(&result.errors[0]).unwrap();
        assert_eq!(value["type"], "format");
        assert_eq!(value["severity"], "error");
    }
}

//! Pluggable business rules, looked up by name from a schema's
//! `business_rules` list.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::path::get_path;
use crate::result::{IssueKind, Severity, ValidationResult};

/// A named methodology check over the whole evidence payload.
pub trait BusinessRule: Send + Sync {
    fn name(&self) -> &str;

    fn check(&self, evidence: &Value, context: Option<&Value>, result: &mut ValidationResult);
}

fn number_at(evidence: &Value, path: &str) -> Option<f64> {
    get_path(evidence, path).and_then(Value::as_f64)
}

fn blank_text(value: Option<&Value>) -> bool {
    value
        .and_then(Value::as_str)
        .map_or(true, |s| s.trim().is_empty())
}

// ─────────────────────────────────────────────
//  Built-in rules
// ─────────────────────────────────────────────

pub struct ClinGenGeneticEvidence;

impl BusinessRule for ClinGenGeneticEvidence {
    fn name(&self) -> &str { "clingen_genetic_evidence" }

    fn check(&self, evidence: &Value, _context: Option<&Value>, result: &mut ValidationResult) {
        let case_level = number_at(evidence, "genetic_evidence.case_level_score").unwrap_or(0.0);
        let segregation = number_at(evidence, "genetic_evidence.segregation_score").unwrap_or(0.0);

        if case_level > 0.0 && segregation > 0.0 {
            result.add_warning(
                "genetic_evidence",
                "Consider whether case-level and segregation data should be counted separately to avoid double-counting",
                IssueKind::Quality,
            );
        }

        let total = number_at(evidence, "genetic_evidence.total_score").unwrap_or(case_level + segregation);
        if total > 12.0 {
            result.add_business_rule_violation(
                "clingen_genetic_max_score",
                "ClinGen genetic evidence score cannot exceed 12 points",
                Severity::Error,
            );
        }
    }
}

pub struct ClinGenExperimentalEvidence;

impl BusinessRule for ClinGenExperimentalEvidence {
    fn name(&self) -> &str { "clingen_experimental_evidence" }

    fn check(&self, evidence: &Value, _context: Option<&Value>, result: &mut ValidationResult) {
        let total = number_at(evidence, "experimental_evidence.total_score").unwrap_or(0.0);
        if total > 6.0 {
            result.add_business_rule_violation(
                "clingen_experimental_max_score",
                "ClinGen experimental evidence score cannot exceed 6 points",
                Severity::Error,
            );
        }
    }
}

pub struct ClinGenContradictoryEvidence;

impl BusinessRule for ClinGenContradictoryEvidence {
    fn name(&self) -> &str { "clingen_contradictory_evidence" }

    fn check(&self, evidence: &Value, _context: Option<&Value>, result: &mut ValidationResult) {
        let flagged = get_path(evidence, "contradictory_evidence.has_contradictory")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if flagged && blank_text(get_path(evidence, "contradictory_evidence.description")) {
            result.add_business_rule_violation(
                "clingen_contradictory_description",
                "Contradictory evidence must include a detailed description",
                Severity::Error,
            );
        }
    }
}

pub const GENCC_CLASSIFICATIONS: [&str; 6] =
    ["Definitive", "Strong", "Moderate", "Limited", "Disputed", "Refuted"];

pub struct GenccClassification;

impl BusinessRule for GenccClassification {
    fn name(&self) -> &str { "gencc_classification" }

    fn check(&self, evidence: &Value, _context: Option<&Value>, result: &mut ValidationResult) {
        let Some(classification) = evidence.get("classification").and_then(Value::as_str) else {
            return;
        };
        if !classification.is_empty() && !GENCC_CLASSIFICATIONS.contains(&classification) {
            result.add_business_rule_violation(
                "gencc_valid_classification",
                format!("Classification must be one of: {}", GENCC_CLASSIFICATIONS.join(", ")),
                Severity::Error,
            );
        }
    }
}

/// Institution hook: when a payload requests institutional review, reviewer
/// notes are recommended.
pub struct InstitutionalReview;

impl BusinessRule for InstitutionalReview {
    fn name(&self) -> &str { "institutional_review" }

    fn check(&self, evidence: &Value, _context: Option<&Value>, result: &mut ValidationResult) {
        let required = get_path(evidence, "institutional_review.required")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if required && blank_text(get_path(evidence, "institutional_review.notes")) {
            result.add_business_rule_violation(
                "institutional_review_notes",
                "Institutional review requested; reviewer notes are recommended",
                Severity::Warning,
            );
        }
    }
}

// ─────────────────────────────────────────────
//  Registry
// ─────────────────────────────────────────────

pub struct BusinessRuleRegistry {
    rules: BTreeMap<String, Arc<dyn BusinessRule>>,
}

impl BusinessRuleRegistry {
    pub fn new() -> Self {
        Self { rules: BTreeMap::new() }
    }

    pub fn with_builtin_rules() -> Self {
        let mut reg = Self::new();
        reg.register(ClinGenGeneticEvidence);
        reg.register(ClinGenExperimentalEvidence);
        reg.register(ClinGenContradictoryEvidence);
        reg.register(GenccClassification);
        reg.register(InstitutionalReview);
        reg
    }

    /// Register a rule. Panics if the name is already registered.
    pub fn register<R: BusinessRule + 'static>(&mut self, rule: R) {
        let name = rule.name().to_string();
        assert!(!self.rules.contains_key(&name), "Duplicate business rule name: {name}");
        self.rules.insert(name, Arc::new(rule));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn BusinessRule>> {
        self.rules.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.rules.keys().cloned().collect()
    }

    /// Apply rules in the schema's declared order. Unknown names are
    /// configuration warnings.
    pub fn apply(&self, names: &[String], evidence: &Value, context: Option<&Value>, result: &mut ValidationResult) {
        for name in names {
            match self.get(name) {
                Some(rule) => rule.check(evidence, context, result),
                None => {
                    tracing::warn!(rule = %name, "Schema references unknown business rule");
                    result.add_warning(
                        "business_rules",
                        format!("Unknown business rule: {name}"),
                        IssueKind::Configuration,
                    );
                }
            }
        }
    }
}

impl Default for BusinessRuleRegistry {
    fn default() -> Self {
        Self::with_builtin_rules()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn apply(names: &[&str], evidence: Value) -> ValidationResult {
        let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        let mut result = ValidationResult::new();
        BusinessRuleRegistry::with_builtin_rules().apply(&names, &evidence, None, &mut result);
        result
    }

    #[test]
    fn test_genetic_max_and_double_counting() {
        let result = apply(
            &["clingen_genetic_evidence"],
            json!({"genetic_evidence": {"case_level_score": 10, "segregation_score": 3}}),
        );
        assert!(!result.is_valid);
        assert_eq!(result.business_rule_violations[0].rule, "clingen_genetic_max_score");
        assert_eq!(result.warnings.len(), 1);

        let explicit_total = apply(
            &["clingen_genetic_evidence"],
            json!({"genetic_evidence": {"case_level_score": 10, "segregation_score": 3, "total_score": 12}}),
        );
        assert!(explicit_total.is_valid);
    }

    #[test]
    fn test_experimental_max() {
        let result = apply(&["clingen_experimental_evidence"], json!({"experimental_evidence": {"total_score": 6.5}}));
        assert_eq!(result.business_rule_violations[0].rule, "clingen_experimental_max_score");
        assert!(!result.is_valid);
    }

    #[test]
    fn test_contradictory_requires_description() {
        let missing = apply(
            &["clingen_contradictory_evidence"],
            json!({"contradictory_evidence": {"has_contradictory": true, "description": " "}}),
        );
        assert!(!missing.is_valid);
        let described = apply(
            &["clingen_contradictory_evidence"],
            json!({"contradictory_evidence": {"has_contradictory": true, "description": "Unaffected carriers in two families"}}),
        );
        assert!(described.is_valid);
        let list_form = apply(&["clingen_contradictory_evidence"], json!({"contradictory_evidence": [{"pmid": "1"}]}));
        assert!(list_form.is_valid);
    }

    #[test]
    fn test_gencc_classification_enum() {
        assert!(apply(&["gencc_classification"], json!({"classification": "Strong"})).is_valid);
        let bad = apply(&["gencc_classification"], json!({"classification": "Probable"}));
        assert!(!bad.is_valid);
        assert!(bad.business_rule_violations[0].message.ends_with("Disputed, Refuted"));
    }

    #[test]
    fn test_institutional_review_is_advisory() {
        let result = apply(&["institutional_review"], json!({"institutional_review": {"required": true}}));
        assert!(result.is_valid);
        assert_eq!(result.business_rule_violations[0].severity, Severity::Warning);
    }

    #[test]
    fn test_unknown_rule_is_configuration_warning() {
        let result = apply(&["acmg_pvs1"], json!({}));
        assert!(result.is_valid);
        assert_eq!(result.warnings[0].message, "Unknown business rule: acmg_pvs1");
    }

    #[test]
    #[should_panic(expected = "Duplicate business rule name")]
    fn test_duplicate_rule_panics() {
        let mut reg = BusinessRuleRegistry::with_builtin_rules();
        reg.register(InstitutionalReview);
    }
}

//! Evidence validation against a curation schema.

use std::sync::Arc;

use curagen_scoring::ScoringRegistry;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::business::BusinessRuleRegistry;
use crate::fields::check_value;
use crate::model::CurationSchema;
use crate::result::{IssueKind, ValidationResult};
use crate::rules::apply_rule;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorSettings {
    /// Emit whitespace / short-description warnings for text fields.
    pub text_quality_checks: bool,
    /// Completeness below this percentage adds a generic suggestion.
    pub completeness_suggestion_threshold: f64,
    pub min_descriptive_words: usize,
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        Self {
            text_quality_checks: true,
            completeness_suggestion_threshold: 50.0,
            min_descriptive_words: 3,
        }
    }
}

/// A value counts as provided unless it is null, a blank string, or an
/// empty array/object.
pub(crate) fn is_filled(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(_) => true,
    }
}

/// Stateless validator; share one instance across requests.
pub struct SchemaValidator {
    scoring: Arc<ScoringRegistry>,
    rules: BusinessRuleRegistry,
    settings: ValidatorSettings,
}

impl SchemaValidator {
    pub fn new(scoring: Arc<ScoringRegistry>, settings: ValidatorSettings) -> Self {
        Self { scoring, rules: BusinessRuleRegistry::with_builtin_rules(), settings }
    }

    pub fn with_business_rules(mut self, rules: BusinessRuleRegistry) -> Self {
        self.rules = rules;
        self
    }

    pub fn scoring(&self) -> &Arc<ScoringRegistry> {
        &self.scoring
    }

    pub fn business_rules(&self) -> &BusinessRuleRegistry {
        &self.rules
    }

    pub fn settings(&self) -> &ValidatorSettings {
        &self.settings
    }

    /// Validate an evidence payload. Never fails; every problem is data in
    /// the returned result.
    pub fn validate(&self, schema: &CurationSchema, evidence: &Value, context: Option<&Value>) -> ValidationResult {
        let mut result = ValidationResult::new();

        if !evidence.is_object() {
            result.add_error("evidence_data", "Evidence data must be an object", IssueKind::Type);
        }

        self.validate_fields(schema, evidence, &mut result);

        for (name, rule) in &schema.validation_rules {
            apply_rule(name, rule, evidence, &mut result);
        }

        self.rules.apply(&schema.business_rules, evidence, context, &mut result);

        self.calculate_scores(schema, evidence, context, &mut result);

        result.completeness_score = completeness(schema, evidence);
        self.suggest_improvements(schema, evidence, &mut result);

        tracing::debug!(
            schema = %schema.schema_ref(),
            is_valid = result.is_valid,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            completeness = result.completeness_score,
            "Evidence validated"
        );
        result
    }

    fn validate_fields(&self, schema: &CurationSchema, evidence: &Value, result: &mut ValidationResult) {
        for (name, def) in &schema.field_definitions {
            let value = evidence.get(name);
            if def.required && !is_filled(value) {
                result.add_error(name, "Required field is missing", IssueKind::Required);
                result.required_fields_missing.push(name.clone());
                continue;
            }
            match value {
                None | Some(Value::Null) => continue,
                Some(value) => check_value(name, value, def, &self.settings, result),
            }
        }
    }

    fn calculate_scores(
        &self,
        schema: &CurationSchema,
        evidence: &Value,
        context: Option<&Value>,
        result: &mut ValidationResult,
    ) {
        let Some(config) = &schema.scoring_configuration else {
            tracing::warn!(schema = %schema.schema_ref(), "No scoring engine declared; skipping score calculation");
            return;
        };
        let Some(engine) = config.engine.as_deref() else {
            result.add_warning(
                "scoring_configuration",
                "Missing 'engine' specification",
                IssueKind::Configuration,
            );
            return;
        };
        let config_value = config.as_value();
        let Some(scoring) = self.scoring.calculate_scores(engine, evidence, &config_value, context) else {
            result.add_warning(
                "scoring_configuration",
                format!("Scoring engine '{engine}' is not registered"),
                IssueKind::Configuration,
            );
            return;
        };
        for problem in self.scoring.validate_evidence(engine, evidence, &config_value) {
            result.add_warning("scoring", problem, IssueKind::Scoring);
        }
        result.score_calculations.extend(scoring.scores.clone());
        result.scoring = Some(scoring);
    }

    fn suggest_improvements(&self, schema: &CurationSchema, evidence: &Value, result: &mut ValidationResult) {
        for (name, def) in &schema.field_definitions {
            if def.required || evidence.get(name).is_some() {
                continue;
            }
            if let Some(description) = def.description.as_deref().filter(|d| !d.is_empty()) {
                result
                    .suggested_improvements
                    .push(format!("Consider adding {name}: {description}"));
            }
        }
        if result.completeness_score < self.settings.completeness_suggestion_threshold {
            result.suggested_improvements.push(
                "Evidence data appears incomplete. Consider providing more detailed information.".to_string(),
            );
        }
        if !result.warnings.is_empty() {
            result
                .suggested_improvements
                .push("Address validation warnings to improve data quality.".to_string());
        }
    }
}

/// Percentage of declared top-level fields with a non-empty value.
pub fn completeness(schema: &CurationSchema, evidence: &Value) -> f64 {
    let total = schema.field_definitions.len();
    if total == 0 {
        return 0.0;
    }
    let filled = schema
        .field_definitions
        .keys()
        .filter(|name| is_filled(evidence.get(name.as_str())))
        .count();
    filled as f64 / total as f64 * 100.0
}

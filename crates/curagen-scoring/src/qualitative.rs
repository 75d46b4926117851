//! Ordinal qualitative assessment for institution-specific methodologies.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::engine::{ScoringEngine, ScoringMetadata, ScoringResult};
use crate::evidence::{is_blank, lowered};

/// A categorical assessment field and the points for each accepted level.
struct OrdinalScale {
    field: &'static str,
    display: &'static str,
    levels: &'static [(&'static str, f64)],
}

impl OrdinalScale {
    /// Unknown or missing levels score zero.
    fn score(&self, value: Option<&str>) -> f64 {
        value
            .and_then(|v| self.levels.iter().find(|(level, _)| *level == v))
            .map_or(0.0, |(_, points)| *points)
    }

    fn accepts(&self, value: &str) -> bool {
        self.levels.iter().any(|(level, _)| *level == value)
    }
}

struct AssessmentSection {
    key: &'static str,
    missing_warning: &'static str,
    max_score: f64,
    scales: [OrdinalScale; 2],
}

const SECTIONS: [AssessmentSection; 2] = [
    AssessmentSection {
        key: "clinical_assessment",
        missing_warning: "No clinical assessment provided",
        max_score: 5.0,
        scales: [
            OrdinalScale {
                field: "phenotype_match",
                display: "Phenotype match",
                levels: &[("excellent", 3.0), ("good", 2.0), ("fair", 1.0), ("poor", 0.0)],
            },
            OrdinalScale {
                field: "inheritance_consistency",
                display: "Inheritance consistency",
                levels: &[("consistent", 2.0), ("partially_consistent", 1.0), ("inconsistent", 0.0)],
            },
        ],
    },
    AssessmentSection {
        key: "literature_review",
        missing_warning: "No literature review provided",
        max_score: 5.0,
        scales: [
            OrdinalScale {
                field: "evidence_quality",
                display: "Evidence quality",
                levels: &[("high", 3.0), ("moderate", 2.0), ("low", 1.0)],
            },
            OrdinalScale {
                field: "study_design_strength",
                display: "Study design strength",
                levels: &[("strong", 2.0), ("adequate", 1.0), ("weak", 0.0)],
            },
        ],
    },
];

/// Low-confidence levels that deserve a warning even though they are valid.
const CAUTIONS: [(&str, &str, &str, &str); 3] = [
    ("clinical_assessment", "phenotype_match", "poor", "Poor phenotype match may indicate weak gene-disease association"),
    ("clinical_assessment", "inheritance_consistency", "inconsistent", "Inconsistent inheritance pattern raises questions about association"),
    ("literature_review", "evidence_quality", "low", "Low evidence quality limits confidence in assessment"),
];

const TIERS: [(f64, &str, &str); 3] = [
    (8.0, "Strong Association", "Excellent clinical and literature evidence support strong gene-disease association."),
    (5.0, "Moderate Association", "Good clinical and/or literature evidence support moderate gene-disease association."),
    (2.0, "Weak Association", "Limited evidence suggests possible gene-disease association."),
];
const FLOOR: (&str, &str) = ("Insufficient Evidence", "Insufficient evidence to support gene-disease association.");
const MAX_TOTAL: f64 = 10.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct QualitativeEngine;

impl QualitativeEngine {
    pub fn new() -> Self {
        Self
    }

    /// Verdict and rationale for a combined 0–10 score.
    pub fn classify(total_score: f64) -> (&'static str, &'static str) {
        TIERS
            .iter()
            .find(|(min, _, _)| total_score >= *min)
            .map_or(FLOOR, |(_, verdict, rationale)| (*verdict, *rationale))
    }

    fn section_score(section: &AssessmentSection, evidence: &Value) -> f64 {
        section
            .scales
            .iter()
            .map(|scale| scale.score(lowered(evidence, section.key, scale.field).as_deref()))
            .sum()
    }

    fn warnings(evidence: &Value) -> Vec<String> {
        let mut warnings = Vec::new();
        for section in &SECTIONS {
            if is_blank(evidence.get(section.key)) {
                warnings.push(section.missing_warning.to_string());
            }
        }
        for section in &SECTIONS {
            if is_blank(evidence.get(section.key)) {
                continue;
            }
            for scale in &section.scales {
                if is_blank(evidence[section.key].get(scale.field)) {
                    warnings.push(format!("{} assessment missing", scale.display));
                }
            }
        }
        for (section, field, level, message) in CAUTIONS {
            if lowered(evidence, section, field).as_deref() == Some(level) {
                warnings.push(message.to_string());
            }
        }
        warnings
    }
}

impl ScoringEngine for QualitativeEngine {
    fn name(&self) -> &str {
        "qualitative_assessment"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn description(&self) -> &str {
        "Qualitative clinical and literature assessment for institutional methodologies"
    }

    fn supported_verdicts(&self) -> Vec<String> {
        TIERS
            .iter()
            .map(|(_, verdict, _)| verdict.to_string())
            .chain([FLOOR.0.to_string()])
            .collect()
    }

    fn scoring_categories(&self) -> Vec<String> {
        SECTIONS.iter().map(|s| s.key.to_string()).collect()
    }

    fn calculate_scores(
        &self,
        evidence: &Value,
        _schema_config: &Value,
        scope_context: Option<&Value>,
    ) -> ScoringResult {
        let mut scores = BTreeMap::new();
        let mut breakdown = Map::new();
        let mut section_notes = Vec::new();
        let mut total = 0.0;

        for section in &SECTIONS {
            let score = Self::section_score(section, evidence);
            total += score;
            scores.insert(format!("{}_score", section.key), score);

            let mut detail = Map::new();
            detail.insert("score".into(), json!(score));
            detail.insert("max_score".into(), json!(section.max_score));
            let mut components = Map::new();
            for scale in &section.scales {
                let raw = evidence
                    .get(section.key)
                    .and_then(|s| s.get(scale.field))
                    .and_then(Value::as_str)
                    .unwrap_or("Not assessed");
                detail.insert(scale.field.into(), json!(raw));
                components.insert(
                    format!("{}_score", scale.field),
                    json!(scale.score(lowered(evidence, section.key, scale.field).as_deref())),
                );
            }
            detail.insert("components".into(), Value::Object(components));
            breakdown.insert(section.key.into(), Value::Object(detail));
            section_notes.push(format!(
                "{} score: {:.1}/{:.0}.",
                section.key.replace('_', " "),
                score,
                section.max_score
            ));
        }

        scores.insert("overall_score".to_string(), total);
        scores.insert("total_score".to_string(), total);
        breakdown.insert(
            "total_assessment".into(),
            json!({
                "combined_score": total,
                "max_possible_score": MAX_TOTAL,
                "score_percentage": total / MAX_TOTAL * 100.0,
            }),
        );

        let (verdict, rationale) = Self::classify(total);

        ScoringResult {
            scores,
            total_score: total,
            verdict: verdict.to_string(),
            verdict_rationale: format!("{rationale} {}", section_notes.join(" ")),
            evidence_breakdown: Value::Object(breakdown),
            warnings: Self::warnings(evidence),
            metadata: ScoringMetadata {
                engine: self.name().to_string(),
                engine_version: self.version().to_string(),
                methodology: "qualitative".to_string(),
                calculated_at: None,
                scope_context: scope_context.cloned().unwrap_or_else(|| json!({})),
            },
        }
    }

    fn validate_evidence(&self, evidence: &Value, _schema_config: &Value) -> Vec<String> {
        let mut errors = Vec::new();
        for section in &SECTIONS {
            for scale in &section.scales {
                let raw = evidence
                    .get(section.key)
                    .and_then(|s| s.get(scale.field))
                    .and_then(Value::as_str)
                    .filter(|v| !v.is_empty());
                if let Some(raw) = raw {
                    if !scale.accepts(&raw.to_lowercase()) {
                        errors.push(format!("Invalid {} value: {raw}", scale.display.to_lowercase()));
                    }
                }
            }
        }
        if SECTIONS.iter().all(|s| is_blank(evidence.get(s.key))) {
            errors.push("At least one assessment category (clinical or literature) is required".to_string());
        }
        errors
    }

    fn supports_schema(&self, schema_name: &str, schema_version: &str) -> bool {
        schema_name.starts_with("Qualitative") && schema_version.starts_with("1.")
    }
}

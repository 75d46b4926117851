//! Points-based gene–disease validity scoring.
//!
//! Evidence items carry `points`; each category sum is clamped to its cap,
//! each section total is clamped again, and the grand total is clamped to
//! the methodology maximum. The verdict is a pure function of
//! `(total_score, has_contradictory_evidence)`.
//!
//! ClinGen SOP v11 and GenCC share this framework. They are expressed as two
//! [`PointsMethodology`] values rather than two engines, so any future
//! divergence lands in configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::engine::{ScoringEngine, ScoringMetadata, ScoringResult};
use crate::evidence::{is_blank, is_strict_pmid, items, sum_points};

pub const DEFAULT_PMID_MIN_DIGITS: usize = 7;

/// One evidence category inside a section, e.g. `case_level_data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Key of the item array in the evidence payload.
    pub key: String,
    /// Prefix used in breakdown keys (`case_level_items`, `case_level_score`).
    pub short: String,
    /// Label used in validation messages, e.g. "Case-level item".
    pub item_label: String,
    pub max_points: f64,
    /// Allowed per-item point range enforced by `validate_evidence`.
    pub item_points_range: Option<(f64, f64)>,
    pub validate_pmid: bool,
    pub require_proband_label: bool,
    /// Below this many items a sufficiency warning is raised.
    pub min_recommended_items: Option<usize>,
}

impl CategoryRule {
    fn new(key: &str, short: &str, item_label: &str, max_points: f64) -> Self {
        Self {
            key: key.to_string(),
            short: short.to_string(),
            item_label: item_label.to_string(),
            max_points,
            item_points_range: None,
            validate_pmid: false,
            require_proband_label: false,
            min_recommended_items: None,
        }
    }

    fn checked(mut self, lo: f64, hi: f64) -> Self {
        self.item_points_range = Some((lo, hi));
        self.validate_pmid = true;
        self
    }

    fn with_proband_label(mut self) -> Self {
        self.require_proband_label = true;
        self
    }

    fn recommend_at_least(mut self, n: usize) -> Self {
        self.min_recommended_items = Some(n);
        self
    }

    fn clamped_score(&self, evidence: &Value, section: &str) -> f64 {
        sum_points(items(evidence, section, &self.key)).min(self.max_points)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSection {
    /// Key in the evidence payload, e.g. `genetic_evidence`.
    pub key: String,
    /// Human label, e.g. "genetic evidence".
    pub label: String,
    pub cap: f64,
    pub categories: Vec<CategoryRule>,
}

impl EvidenceSection {
    fn score(&self, evidence: &Value) -> f64 {
        self.categories
            .iter()
            .map(|c| c.clamped_score(evidence, &self.key))
            .sum::<f64>()
            .min(self.cap)
    }

    fn breakdown(&self, evidence: &Value, total: f64) -> Value {
        let mut out = Map::new();
        out.insert("total_score".into(), json!(total));
        for category in &self.categories {
            let n = items(evidence, &self.key, &category.key).len();
            out.insert(format!("{}_items", category.short), json!(n));
            out.insert(
                format!("{}_score", category.short),
                json!(category.clamped_score(evidence, &self.key)),
            );
        }
        Value::Object(out)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictTier {
    pub min_score: f64,
    pub verdict: String,
    pub rationale: String,
}

impl VerdictTier {
    fn new(min_score: f64, verdict: &str, rationale: &str) -> Self {
        Self { min_score, verdict: verdict.to_string(), rationale: rationale.to_string() }
    }
}

/// Declarative description of a points-based methodology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointsMethodology {
    pub engine_name: String,
    pub version: String,
    pub description: String,
    /// Display name, e.g. "ClinGen SOP v11".
    pub label: String,
    /// Schemas whose name starts with this prefix (and version `1.x`) are supported.
    pub schema_prefix: String,
    pub rationale_prefix: String,
    pub sections: Vec<EvidenceSection>,
    pub contradictory_key: String,
    pub total_cap: f64,
    /// Descending by `min_score`.
    pub tiers: Vec<VerdictTier>,
    pub floor: VerdictTier,
    pub disputed: VerdictTier,
    /// Verdicts the methodology recognises but never assigns from points.
    pub manual_verdicts: Vec<String>,
    /// Reject payloads where every section is empty.
    pub require_any_category: bool,
    pub pmid_min_digits: usize,
}

impl PointsMethodology {
    fn sections(genetic_checks: bool, proband_label: bool) -> Vec<EvidenceSection> {
        let mut case_level = CategoryRule::new("case_level_data", "case_level", "Case-level item", 12.0)
            .checked(0.0, 2.0)
            .recommend_at_least(2);
        if proband_label {
            case_level = case_level.with_proband_label();
        }
        let mut segregation = CategoryRule::new("segregation_data", "segregation", "Segregation item", 3.0);
        let mut function = CategoryRule::new("function", "function", "Function evidence item", 2.0);
        if genetic_checks {
            segregation = segregation.checked(0.0, 3.0);
            function = function.checked(0.0, 2.0);
        }
        vec![
            EvidenceSection {
                key: "genetic_evidence".into(),
                label: "genetic evidence".into(),
                cap: 12.0,
                categories: vec![
                    case_level,
                    segregation,
                    CategoryRule::new("case_control_data", "case_control", "Case-control item", 6.0),
                ],
            },
            EvidenceSection {
                key: "experimental_evidence".into(),
                label: "experimental evidence".into(),
                cap: 6.0,
                categories: vec![
                    function,
                    CategoryRule::new("models", "model", "Model system item", 4.0),
                    CategoryRule::new("rescue", "rescue", "Rescue item", 2.0),
                ],
            },
        ]
    }

    fn tiers(context: &str) -> Vec<VerdictTier> {
        vec![
            VerdictTier::new(12.0, "Definitive", &format!("Total score ≥12 {context} supports Definitive classification.")),
            VerdictTier::new(7.0, "Strong", &format!("Total score 7-11 {context} supports Strong classification.")),
            VerdictTier::new(4.0, "Moderate", "Total score 4-6 supports Moderate classification."),
            VerdictTier::new(1.0, "Limited", "Total score 1-3 supports Limited classification."),
        ]
    }

    pub fn clingen_sop_v11() -> Self {
        Self {
            engine_name: "clingen_sop_v11".into(),
            version: "1.0.0".into(),
            description: "ClinGen Standard Operating Procedure v11 gene-disease validity scoring".into(),
            label: "ClinGen SOP v11".into(),
            schema_prefix: "ClinGen_SOP".into(),
            rationale_prefix: "Based on ClinGen SOP v11 scoring".into(),
            sections: Self::sections(true, true),
            contradictory_key: "contradictory_evidence".into(),
            total_cap: 18.0,
            tiers: Self::tiers("with no contradictory evidence"),
            floor: VerdictTier::new(0.0, "No Known Disease Relationship", "No evidence supporting gene-disease relationship."),
            disputed: VerdictTier::new(0.0, "Disputed", "Contradictory evidence present, resulting in Disputed classification."),
            manual_verdicts: vec!["Refuted".into()],
            require_any_category: false,
            pmid_min_digits: DEFAULT_PMID_MIN_DIGITS,
        }
    }

    pub fn gencc_based() -> Self {
        Self {
            engine_name: "gencc_based".into(),
            description: "GenCC-based gene-disease validity classification".into(),
            label: "GenCC".into(),
            schema_prefix: "GenCC".into(),
            rationale_prefix: "GenCC-based classification".into(),
            sections: Self::sections(false, false),
            tiers: Self::tiers("of gene-disease validity"),
            manual_verdicts: Vec::new(),
            require_any_category: true,
            ..Self::clingen_sop_v11()
        }
    }

    pub fn with_pmid_min_digits(mut self, digits: usize) -> Self {
        self.pmid_min_digits = digits;
        self
    }

    /// Verdict and rationale for a total score.
    pub fn classify(&self, total_score: f64, has_contradictory: bool) -> &VerdictTier {
        if has_contradictory {
            return &self.disputed;
        }
        self.tiers
            .iter()
            .find(|tier| total_score >= tier.min_score)
            .unwrap_or(&self.floor)
    }

    pub fn has_contradictory(&self, evidence: &Value) -> bool {
        evidence
            .get(&self.contradictory_key)
            .and_then(Value::as_array)
            .is_some_and(|a| !a.is_empty())
    }

    fn all_items<'a>(&self, evidence: &'a Value) -> Vec<&'a Value> {
        self.sections
            .iter()
            .flat_map(|s| s.categories.iter().map(move |c| (s, c)))
            .flat_map(|(s, c)| items(evidence, &s.key, &c.key))
            .collect()
    }

    fn warnings(&self, evidence: &Value) -> Vec<String> {
        let mut warnings = Vec::new();
        for section in &self.sections {
            if is_blank(evidence.get(&section.key)) {
                warnings.push(format!("No {} provided", section.label));
            }
        }
        for section in &self.sections {
            for category in &section.categories {
                if let Some(min) = category.min_recommended_items {
                    let n = items(evidence, &section.key, &category.key).len();
                    if n < min {
                        warnings.push(format!(
                            "Only {n} {} evidence items (consider adding more)",
                            category.short.replace('_', "-")
                        ));
                    }
                }
            }
        }
        if self
            .all_items(evidence)
            .into_iter()
            .any(|item| !is_strict_pmid(item.get("pmid"), self.pmid_min_digits))
        {
            warnings.push("Invalid or missing PMID in evidence item".to_string());
        }
        warnings
    }
}

pub struct PointsEngine {
    methodology: PointsMethodology,
}

impl PointsEngine {
    pub fn new(methodology: PointsMethodology) -> Self {
        Self { methodology }
    }

    pub fn clingen() -> Self {
        Self::new(PointsMethodology::clingen_sop_v11())
    }

    pub fn gencc() -> Self {
        Self::new(PointsMethodology::gencc_based())
    }

    pub fn methodology(&self) -> &PointsMethodology {
        &self.methodology
    }
}

impl ScoringEngine for PointsEngine {
    fn name(&self) -> &str {
        &self.methodology.engine_name
    }

    fn version(&self) -> &str {
        &self.methodology.version
    }

    fn description(&self) -> &str {
        &self.methodology.description
    }

    fn supported_verdicts(&self) -> Vec<String> {
        let m = &self.methodology;
        m.tiers
            .iter()
            .map(|t| t.verdict.clone())
            .chain([m.floor.verdict.clone(), m.disputed.verdict.clone()])
            .chain(m.manual_verdicts.iter().cloned())
            .collect()
    }

    fn scoring_categories(&self) -> Vec<String> {
        self.methodology
            .sections
            .iter()
            .map(|s| s.key.clone())
            .chain([self.methodology.contradictory_key.clone()])
            .collect()
    }

    fn calculate_scores(
        &self,
        evidence: &Value,
        _schema_config: &Value,
        scope_context: Option<&Value>,
    ) -> ScoringResult {
        let m = &self.methodology;
        let mut scores = BTreeMap::new();
        let mut breakdown = Map::new();
        let mut parts = Vec::new();
        let mut subtotal = 0.0;

        for section in &m.sections {
            let score = section.score(evidence);
            subtotal += score;
            scores.insert(format!("{}_score", section.key), score);
            breakdown.insert(section.key.clone(), section.breakdown(evidence, score));
            parts.push(format!("{} score = {:.1}", section.label, score));
        }

        let total_score = subtotal.min(m.total_cap);
        scores.insert("total_score".to_string(), total_score);

        let has_contradictory = m.has_contradictory(evidence);
        let tier = m.classify(total_score, has_contradictory);
        breakdown.insert(
            m.contradictory_key.clone(),
            json!({
                "items": evidence.get(&m.contradictory_key).and_then(Value::as_array).map_or(0, Vec::len),
                "overrides_verdict": has_contradictory,
            }),
        );
        breakdown.insert("methodology".into(), json!(m.label));

        let verdict_rationale = format!(
            "{}: {}, total score = {:.1}. {}",
            m.rationale_prefix,
            parts.join(", "),
            total_score,
            tier.rationale
        );

        tracing::debug!(
            engine = %m.engine_name,
            total_score,
            verdict = %tier.verdict,
            "Points scoring complete"
        );

        ScoringResult {
            scores,
            total_score,
            verdict: tier.verdict.clone(),
            verdict_rationale,
            evidence_breakdown: Value::Object(breakdown),
            warnings: m.warnings(evidence),
            metadata: ScoringMetadata {
                engine: m.engine_name.clone(),
                engine_version: m.version.clone(),
                methodology: m.label.clone(),
                calculated_at: None,
                scope_context: scope_context.cloned().unwrap_or_else(|| json!({})),
            },
        }
    }

    fn validate_evidence(&self, evidence: &Value, _schema_config: &Value) -> Vec<String> {
        let m = &self.methodology;
        let mut errors = Vec::new();

        for section in &m.sections {
            for category in &section.categories {
                for (i, item) in items(evidence, &section.key, &category.key).iter().enumerate() {
                    let n = i + 1;
                    if category.validate_pmid && !is_strict_pmid(item.get("pmid"), m.pmid_min_digits) {
                        errors.push(format!("{} {n}: Invalid PMID format", category.item_label));
                    }
                    if let Some((lo, hi)) = category.item_points_range {
                        let in_range = match item.get("points") {
                            None => true,
                            Some(Value::Number(p)) => {
                                p.as_f64().is_some_and(|p| p.is_finite() && (lo..=hi).contains(&p))
                            }
                            Some(_) => false,
                        };
                        if !in_range {
                            errors.push(format!("{} {n}: Points must be {lo}-{hi}", category.item_label));
                        }
                    }
                    if category.require_proband_label && is_blank(item.get("proband_label")) {
                        errors.push(format!("{} {n}: Proband label required", category.item_label));
                    }
                }
            }
        }

        if m.require_any_category && m.sections.iter().all(|s| is_blank(evidence.get(&s.key))) {
            errors.push(format!(
                "At least one evidence category required for {} classification",
                m.label
            ));
        }

        errors
    }

    fn supports_schema(&self, schema_name: &str, schema_version: &str) -> bool {
        schema_name.starts_with(&self.methodology.schema_prefix) && schema_version.starts_with("1.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(points: f64, pmid: &str) -> Value {
        json!({"points": points, "pmid": pmid, "proband_label": "P1"})
    }

    fn genetic(case_level: f64, segregation: f64, case_control: f64) -> Value {
        json!({
            "genetic_evidence": {
                "case_level_data": [item(case_level, "12345678")],
                "segregation_data": [item(segregation, "12345679")],
                "case_control_data": [item(case_control, "12345670")],
            }
        })
    }

    #[test]
    fn test_definitive_scenario() {
        let engine = PointsEngine::clingen();
        let result = engine.calculate_scores(&genetic(9.0, 5.0, 0.0), &json!({}), None);
        assert_eq!(result.scores["genetic_evidence_score"], 12.0);
        assert_eq!(result.scores["experimental_evidence_score"], 0.0);
        assert_eq!(result.total_score, 12.0);
        assert_eq!(result.verdict, "Definitive");
        assert_eq!(result.evidence_breakdown["genetic_evidence"]["segregation_score"], json!(3.0));
    }

    #[test]
    fn test_contradictory_overrides_to_disputed() {
        let engine = PointsEngine::clingen();
        let mut evidence = genetic(9.0, 5.0, 0.0);
        evidence["contradictory_evidence"] = json!([{"description": "no segregation in large family"}]);
        let result = engine.calculate_scores(&evidence, &json!({}), None);
        assert_eq!(result.total_score, 12.0);
        assert_eq!(result.verdict, "Disputed");
        assert!(result.verdict_rationale.contains("Contradictory evidence present"));
    }

    #[test]
    fn test_empty_contradictory_list_does_not_dispute() {
        let engine = PointsEngine::clingen();
        let mut evidence = genetic(2.0, 0.0, 0.0);
        evidence["contradictory_evidence"] = json!([]);
        assert_eq!(engine.calculate_scores(&evidence, &json!({}), None).verdict, "Limited");
    }

    #[test]
    fn test_segregation_clamped_to_three() {
        let engine = PointsEngine::clingen();
        let evidence = json!({
            "genetic_evidence": {
                "segregation_data": [item(3.0, "1234567"), item(3.0, "1234568"), item(1.0, "1234569")]
            }
        });
        let result = engine.calculate_scores(&evidence, &json!({}), None);
        assert_eq!(result.scores["genetic_evidence_score"], 3.0);
        assert_eq!(result.verdict, "Limited");
    }

    #[test]
    fn test_experimental_caps_and_total_cap() {
        let engine = PointsEngine::clingen();
        let evidence = json!({
            "genetic_evidence": {
                "case_level_data": vec![item(2.0, "1234567"); 8],
                "case_control_data": [item(6.0, "1234567")],
            },
            "experimental_evidence": {
                "function": [item(2.0, "1234567"), item(2.0, "1234567")],
                "models": [item(4.0, "1234567"), item(4.0, "1234567")],
                "rescue": [item(2.0, "1234567")],
            }
        });
        let result = engine.calculate_scores(&evidence, &json!({}), None);
        // 16 + 6 capped to 12; 2 + 4 + 2 capped to 6
        assert_eq!(result.scores["genetic_evidence_score"], 12.0);
        assert_eq!(result.scores["experimental_evidence_score"], 6.0);
        assert_eq!(result.total_score, 18.0);
        assert_eq!(result.evidence_breakdown["experimental_evidence"]["model_score"], json!(4.0));
        assert_eq!(result.evidence_breakdown["genetic_evidence"]["case_level_items"], json!(8));
    }

    #[test]
    fn test_classify_thresholds() {
        let m = PointsMethodology::clingen_sop_v11();
        let cases = [
            (18.0, "Definitive"),
            (12.0, "Definitive"),
            (11.9, "Strong"),
            (7.0, "Strong"),
            (4.0, "Moderate"),
            (1.0, "Limited"),
            (0.5, "No Known Disease Relationship"),
            (0.0, "No Known Disease Relationship"),
        ];
        for (total, expected) in cases {
            assert_eq!(m.classify(total, false).verdict, expected, "total {total}");
            assert_eq!(m.classify(total, true).verdict, "Disputed");
        }
    }

    #[test]
    fn test_gencc_shares_thresholds_with_clingen() {
        let clingen = PointsMethodology::clingen_sop_v11();
        let gencc = PointsMethodology::gencc_based();
        for total in [0.0, 1.0, 3.5, 4.0, 6.9, 7.0, 11.0, 12.0, 18.0] {
            assert_eq!(clingen.classify(total, false).verdict, gencc.classify(total, false).verdict);
        }
        assert_eq!(gencc.total_cap, 18.0);
        let engine = PointsEngine::gencc();
        let result = engine.calculate_scores(&genetic(9.0, 5.0, 0.0), &json!({}), None);
        assert_eq!(result.verdict, "Definitive");
        assert!(result.verdict_rationale.starts_with("GenCC-based classification"));
        assert!(!engine.supported_verdicts().contains(&"Refuted".to_string()));
    }

    #[test]
    fn test_warnings() {
        let engine = PointsEngine::clingen();
        let evidence = json!({
            "genetic_evidence": { "case_level_data": [ {"points": 1, "pmid": "123"} ] }
        });
        let result = engine.calculate_scores(&evidence, &json!({}), None);
        assert_eq!(
            result.warnings,
            vec![
                "No experimental evidence provided".to_string(),
                "Only 1 case-level evidence items (consider adding more)".to_string(),
                "Invalid or missing PMID in evidence item".to_string(),
            ]
        );
    }

    #[test]
    fn test_clingen_validate_evidence() {
        let engine = PointsEngine::clingen();
        let evidence = json!({
            "genetic_evidence": {
                "case_level_data": [
                    {"points": 3, "pmid": "12a4567"},
                    {"points": 1.5, "pmid": "1234567", "proband_label": "II-1"}
                ],
                "segregation_data": [ {"points": -1, "pmid": "1234567"} ]
            },
            "experimental_evidence": {
                "function": [ {"points": "2", "pmid": "7654321"} ]
            }
        });
        let errors = engine.validate_evidence(&evidence, &json!({}));
        assert_eq!(
            errors,
            vec![
                "Case-level item 1: Invalid PMID format".to_string(),
                "Case-level item 1: Points must be 0-2".to_string(),
                "Case-level item 1: Proband label required".to_string(),
                "Segregation item 1: Points must be 0-3".to_string(),
                "Function evidence item 1: Points must be 0-2".to_string(),
            ]
        );
    }

    #[test]
    fn test_non_finite_points_do_not_score() {
        let engine = PointsEngine::clingen();
        let evidence = json!({
            "genetic_evidence": {
                "case_level_data": [ {"points": "NaN", "pmid": "12345678", "proband_label": "P1"} ]
            }
        });
        let result = engine.calculate_scores(&evidence, &json!({}), None);
        assert_eq!(result.total_score, 0.0);
        assert_eq!(result.scores["genetic_evidence_score"], 0.0);
        assert_ne!(result.verdict, "Definitive");
        assert_eq!(
            engine.validate_evidence(&evidence, &json!({})),
            vec!["Case-level item 1: Points must be 0-2".to_string()]
        );
    }

    #[test]
    fn test_gencc_requires_some_evidence() {
        let engine = PointsEngine::gencc();
        let errors = engine.validate_evidence(&json!({}), &json!({}));
        assert_eq!(errors, vec!["At least one evidence category required for GenCC classification".to_string()]);
        // GenCC does not require proband labels
        let ok = json!({"genetic_evidence": {"case_level_data": [ {"points": 1, "pmid": "1234567"} ]}});
        assert!(engine.validate_evidence(&ok, &json!({})).is_empty());
    }

    #[test]
    fn test_pmid_min_digits_configurable() {
        let engine = PointsEngine::new(PointsMethodology::clingen_sop_v11().with_pmid_min_digits(3));
        let evidence = json!({
            "genetic_evidence": { "case_level_data": [ {"points": 1, "pmid": "1234", "proband_label": "P"} ] }
        });
        assert!(engine.validate_evidence(&evidence, &json!({})).is_empty());
    }

    #[test]
    fn test_supports_schema() {
        let engine = PointsEngine::clingen();
        assert!(engine.supports_schema("ClinGen_SOP_v11", "1.2.0"));
        assert!(!engine.supports_schema("ClinGen_SOP_v11", "2.0.0"));
        assert!(!engine.supports_schema("GenCC_Standard", "1.0.0"));
        assert!(PointsEngine::gencc().supports_schema("GenCC_Standard", "1.0.0"));
    }

    #[test]
    fn test_scope_context_echoed() {
        let engine = PointsEngine::clingen();
        let scope = json!({"scope": "cardiology"});
        let result = engine.calculate_scores(&json!({}), &json!({}), Some(&scope));
        assert_eq!(result.metadata.scope_context, scope);
        assert_eq!(result.metadata.engine, "clingen_sop_v11");
        assert!(result.metadata.calculated_at.is_none());
    }
}

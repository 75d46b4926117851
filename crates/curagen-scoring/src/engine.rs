//! The scoring engine contract.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of scoring one evidence payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    /// Named sub-scores, always including `total_score`.
    pub scores: BTreeMap<String, f64>,
    pub total_score: f64,
    pub verdict: String,
    pub verdict_rationale: String,
    pub evidence_breakdown: Value,
    pub warnings: Vec<String>,
    pub metadata: ScoringMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringMetadata {
    pub engine: String,
    pub engine_version: String,
    pub methodology: String,
    /// Stamped by the registry; engines themselves are clock-free.
    pub calculated_at: Option<DateTime<Utc>>,
    pub scope_context: Value,
}

/// Listing entry for `ScoringRegistry::list_engines`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub supported_verdicts: Vec<String>,
    pub scoring_categories: Vec<String>,
}

/// An interchangeable scoring methodology.
///
/// Implementations must be pure: the same evidence, schema configuration and
/// scope context always produce the same result, and no call mutates the
/// engine. This lets a single registry be shared across threads without locks.
pub trait ScoringEngine: Send + Sync {
    /// Unique engine name, e.g. `"clingen_sop_v11"`.
    fn name(&self) -> &str;

    fn version(&self) -> &str;

    fn description(&self) -> &str;

    fn supported_verdicts(&self) -> Vec<String>;

    fn scoring_categories(&self) -> Vec<String>;

    fn calculate_scores(
        &self,
        evidence: &Value,
        schema_config: &Value,
        scope_context: Option<&Value>,
    ) -> ScoringResult;

    /// Methodology-specific evidence checks. An empty list means compliant.
    fn validate_evidence(&self, evidence: &Value, schema_config: &Value) -> Vec<String>;

    fn supports_schema(&self, schema_name: &str, schema_version: &str) -> bool;

    fn info(&self) -> EngineInfo {
        EngineInfo {
            name: self.name().to_string(),
            version: self.version().to_string(),
            description: self.description().to_string(),
            supported_verdicts: self.supported_verdicts(),
            scoring_categories: self.scoring_categories(),
        }
    }
}

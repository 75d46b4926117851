//! Name-keyed registry of scoring engines.
//!
//! Build once at startup, then share behind an `Arc`. Lookups take `&self`
//! and never lock.

use std::collections::BTreeMap;
use std::sync::Arc;

use curagen_common::{Clock, SystemClock};
use serde_json::Value;

use crate::engine::{EngineInfo, ScoringEngine, ScoringResult};
use crate::points::{PointsEngine, PointsMethodology, DEFAULT_PMID_MIN_DIGITS};
use crate::qualitative::QualitativeEngine;

pub const BUILTIN_ENGINES: [&str; 3] = ["clingen_sop_v11", "gencc_based", "qualitative_assessment"];

pub struct ScoringRegistry {
    engines: BTreeMap<String, Arc<dyn ScoringEngine>>,
    clock: Arc<dyn Clock>,
}

impl ScoringRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { engines: BTreeMap::new(), clock: Arc::new(SystemClock) }
    }

    /// Registry holding every built-in engine with default settings.
    pub fn with_default_engines() -> Self {
        let names: Vec<String> = BUILTIN_ENGINES.iter().map(|s| s.to_string()).collect();
        Self::with_builtin_engines(&names, DEFAULT_PMID_MIN_DIGITS)
    }

    /// Registry holding the named built-ins. Unknown names are skipped with a warning.
    pub fn with_builtin_engines(enabled: &[String], pmid_min_digits: usize) -> Self {
        let mut reg = Self::new();
        for name in enabled {
            match name.as_str() {
                "clingen_sop_v11" => reg.register(PointsEngine::new(
                    PointsMethodology::clingen_sop_v11().with_pmid_min_digits(pmid_min_digits),
                )),
                "gencc_based" => reg.register(PointsEngine::new(
                    PointsMethodology::gencc_based().with_pmid_min_digits(pmid_min_digits),
                )),
                "qualitative_assessment" => reg.register(QualitativeEngine::new()),
                other => tracing::warn!(engine = other, "Unknown built-in scoring engine, skipping"),
            }
        }
        tracing::info!(engines = ?reg.engine_names(), "ScoringRegistry ready with {} engines", reg.len());
        reg
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Register an engine. Panics if the name is already registered.
    pub fn register<E: ScoringEngine + 'static>(&mut self, engine: E) {
        let name = engine.name().to_string();
        assert!(
            !self.engines.contains_key(&name),
            "Duplicate scoring engine name: {name}"
        );
        self.engines.insert(name, Arc::new(engine));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ScoringEngine>> {
        self.engines.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.engines.contains_key(name)
    }

    pub fn list_engines(&self) -> Vec<EngineInfo> {
        self.engines.values().map(|e| e.info()).collect()
    }

    pub fn engine_names(&self) -> Vec<String> {
        self.engines.keys().cloned().collect()
    }

    pub fn find_engines_for_schema(&self, schema_name: &str, schema_version: &str) -> Vec<String> {
        self.engines
            .iter()
            .filter(|(_, e)| e.supports_schema(schema_name, schema_version))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Score evidence with the named engine. `None` when the engine is unknown.
    pub fn calculate_scores(
        &self,
        engine_name: &str,
        evidence: &Value,
        schema_config: &Value,
        scope_context: Option<&Value>,
    ) -> Option<ScoringResult> {
        let Some(engine) = self.get(engine_name) else {
            tracing::warn!(engine = engine_name, "Scoring requested for unknown engine");
            return None;
        };
        let mut result = engine.calculate_scores(evidence, schema_config, scope_context);
        result.metadata.calculated_at = Some(self.clock.now());
        Some(result)
    }

    pub fn validate_evidence(&self, engine_name: &str, evidence: &Value, schema_config: &Value) -> Vec<String> {
        match self.get(engine_name) {
            Some(engine) => engine.validate_evidence(evidence, schema_config),
            None => vec![format!("Unknown scoring engine: {engine_name}")],
        }
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

impl Default for ScoringRegistry {
    fn default() -> Self {
        Self::new()
    }
}

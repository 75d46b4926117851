//! Caller-facing operations over the validator, scoring registry and
//! workflow engine.

use std::sync::Arc;

use curagen_common::{
    ActiveCuration, ActorContext, Clock, CuragenError, EvidenceRecord, GeneScope, RecordKind, Result, Review,
    ReviewDecision, SchemaRef, WorkflowStage,
};
use curagen_schema::{generate_json_schema, CurationSchema, SchemaValidator, ValidationResult, WorkflowPair};
use curagen_scoring::{EngineInfo, ScoringRegistry, ScoringResult};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::engine::{
    NewRecord, ReviewOutcome, TransitionRecord, TransitionValidation, WorkflowEngine, WorkflowSettings,
    WorkflowState,
};
use crate::repository::{CurationStore, SchemaRepository};

pub struct CurationService {
    validator: Arc<SchemaValidator>,
    engine: WorkflowEngine,
}

impl std::fmt::Debug for CurationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurationService").field("engine", &self.engine).finish_non_exhaustive()
    }
}

impl CurationService {
    pub fn new(
        store: Arc<dyn CurationStore>,
        validator: Arc<SchemaValidator>,
        clock: Arc<dyn Clock>,
        settings: WorkflowSettings,
    ) -> Self {
        let engine = WorkflowEngine::new(store, Arc::clone(&validator), clock, settings);
        Self { validator, engine }
    }

    pub fn engine(&self) -> &WorkflowEngine {
        &self.engine
    }

    pub fn scoring(&self) -> &Arc<ScoringRegistry> {
        self.validator.scoring()
    }

    // ── Schemas ─────────────────────────────────────────────────────────────

    pub fn validate_evidence(&self, schema: &CurationSchema, payload: &Value, context: Option<&Value>) -> ValidationResult {
        self.validator.validate(schema, payload, context)
    }

    pub fn validate_schema_definition(&self, definition: &Value) -> ValidationResult {
        self.validator.validate_schema_definition(definition)
    }

    pub fn generate_json_schema(&self, schema: &CurationSchema) -> Value {
        generate_json_schema(schema)
    }

    /// Self-check, freeze and store a schema version. Returns its hash.
    pub async fn publish_schema(&self, mut schema: CurationSchema) -> Result<String> {
        let check = self.validator.validate_schema(&schema);
        if !check.is_valid {
            return Err(CuragenError::InvalidInput(format!(
                "Schema {} failed self-check: {}",
                schema.schema_ref(),
                check.error_messages().join("; ")
            )));
        }
        let hash = schema.publish();
        self.engine.store().save_schema(&schema).await?;
        info!(schema = %schema.schema_ref(), hash = %hash, "Schema published");
        Ok(hash)
    }

    pub async fn get_schema(&self, schema: &SchemaRef) -> Result<CurationSchema> {
        self.engine
            .store()
            .get_schema(schema)
            .await?
            .ok_or_else(|| CuragenError::not_found("schema", schema))
    }

    /// Register a workflow pair; both schemas must already be published.
    pub async fn register_workflow_pair(&self, pair: WorkflowPair) -> Result<Uuid> {
        for schema in [&pair.precuration_schema, &pair.curation_schema] {
            self.get_schema(schema).await?;
        }
        self.engine.store().save_workflow_pair(&pair).await?;
        info!(pair = %pair.name, precuration = %pair.precuration_schema, curation = %pair.curation_schema, "Workflow pair registered");
        Ok(pair.id)
    }

    // ── Scoring ─────────────────────────────────────────────────────────────

    pub fn list_scoring_engines(&self) -> Vec<EngineInfo> {
        self.scoring().list_engines()
    }

    pub fn calculate_scores(
        &self,
        engine_name: &str,
        evidence: &Value,
        schema_config: &Value,
        scope_context: Option<&Value>,
    ) -> Option<ScoringResult> {
        self.scoring().calculate_scores(engine_name, evidence, schema_config, scope_context)
    }

    // ── Workflow ────────────────────────────────────────────────────────────

    pub async fn create_record(&self, request: NewRecord, actor: &ActorContext) -> Result<EvidenceRecord> {
        self.engine.create_record(request, actor).await
    }

    pub async fn update_evidence(
        &self,
        item_id: Uuid,
        kind: RecordKind,
        evidence: Value,
        actor: &ActorContext,
        expected_hash: Option<&str>,
    ) -> Result<EvidenceRecord> {
        self.engine.update_evidence(item_id, kind, evidence, actor, expected_hash).await
    }

    pub async fn get_workflow_state(&self, item_id: Uuid, kind: RecordKind) -> Result<WorkflowState> {
        self.engine.get_workflow_state(item_id, kind).await
    }

    pub async fn validate_transition(
        &self,
        item_id: Uuid,
        kind: RecordKind,
        target: WorkflowStage,
        actor: &ActorContext,
    ) -> Result<TransitionValidation> {
        self.engine.validate_transition(item_id, kind, target, actor).await
    }

    pub async fn execute_transition(
        &self,
        item_id: Uuid,
        kind: RecordKind,
        target: WorkflowStage,
        actor: &ActorContext,
        notes: Option<String>,
    ) -> Result<TransitionRecord> {
        self.engine.execute_transition(item_id, kind, target, actor, notes).await
    }

    pub async fn assign_reviewer(&self, curation_id: Uuid, reviewer_id: Uuid, actor: &ActorContext) -> Result<Review> {
        self.engine.assign_reviewer(curation_id, reviewer_id, actor).await
    }

    pub async fn submit_review(
        &self,
        review_id: Uuid,
        actor: &ActorContext,
        decision: ReviewDecision,
        comments: Option<String>,
    ) -> Result<ReviewOutcome> {
        self.engine.submit_review(review_id, actor, decision, comments).await
    }

    pub async fn active_curation(&self, gene_scope: GeneScope) -> Result<Option<ActiveCuration>> {
        self.engine.active_curation(gene_scope).await
    }
}

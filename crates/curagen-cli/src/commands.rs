//! Subcommand implementations. Each returns `Ok(false)` when the command ran
//! but the checked artefact did not pass.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context as _};
use curagen_common::{ActorContext, CuragenError, GeneScope, RecordKind, ReviewDecision, SystemClock, UserRole, WorkflowStage};
use curagen_config::{Catalog, Config};
use curagen_schema::{generate_json_schema, CurationSchema, SchemaValidator};
use curagen_scoring::ScoringRegistry;
use curagen_workflow::{CurationService, InMemoryStore, NewRecord};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

pub struct Context {
    pub config: Config,
    pub scoring: Arc<ScoringRegistry>,
    pub validator: Arc<SchemaValidator>,
}

impl Context {
    pub fn new(config: Config) -> Self {
        let scoring = Arc::new(config.scoring_registry());
        let validator = Arc::new(SchemaValidator::new(Arc::clone(&scoring), config.validator_settings()));
        Self { config, scoring, validator }
    }

    fn catalog(&self) -> anyhow::Result<Catalog> {
        let dir = &self.config.catalog.schema_dir;
        Catalog::load_dir(dir).with_context(|| format!("failed to load schema catalog from {}", dir.display()))
    }

    /// A schema file path, or `name` / `name@version` from the catalog.
    fn resolve_schema(&self, reference: &str) -> anyhow::Result<CurationSchema> {
        let path = Path::new(reference);
        if path.is_file() {
            return CurationSchema::from_path(path);
        }
        let (name, version) = split_reference(reference);
        let catalog = self.catalog()?;
        match catalog.schema(name, version) {
            Some(schema) => Ok(schema.clone()),
            None => bail!("Schema {reference} not found in {}", self.config.catalog.schema_dir.display()),
        }
    }
}

fn split_reference(reference: &str) -> (&str, Option<&str>) {
    match reference.split_once('@') {
        Some((name, version)) => (name, Some(version)),
        None => (reference, None),
    }
}

/// Read a JSON or YAML document; anything not named `.json` is parsed as YAML.
fn read_document(path: &Path) -> anyhow::Result<Value> {
    let content = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let value = if path.extension().and_then(|e| e.to_str()) == Some("json") {
        serde_json::from_str(&content).with_context(|| format!("invalid JSON in {}", path.display()))?
    } else {
        serde_yaml::from_str(&content).with_context(|| format!("invalid YAML in {}", path.display()))?
    };
    Ok(value)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ── Validation and scoring ──────────────────────────────────────────────────

pub fn validate(ctx: &Context, schema: &str, evidence: &Path, context: Option<&Path>) -> anyhow::Result<bool> {
    let schema = ctx.resolve_schema(schema)?;
    let evidence = read_document(evidence)?;
    let scope_context = context.map(read_document).transpose()?;

    let result = ctx.validator.validate(&schema, &evidence, scope_context.as_ref());
    info!(
        schema = %schema.schema_ref(),
        valid = result.is_valid,
        errors = result.errors.len(),
        warnings = result.warnings.len(),
        completeness = result.completeness_score,
        "Evidence validated"
    );
    print_json(&result)?;
    Ok(result.is_valid)
}

pub fn score(ctx: &Context, engine: &str, evidence: &Path, schema: Option<&str>) -> anyhow::Result<bool> {
    let evidence = read_document(evidence)?;
    let schema_config = match schema {
        Some(reference) => ctx
            .resolve_schema(reference)?
            .scoring_configuration
            .map(|c| c.as_value())
            .unwrap_or_else(|| json!({})),
        None => json!({}),
    };

    let Some(result) = ctx.scoring.calculate_scores(engine, &evidence, &schema_config, None) else {
        bail!("Scoring engine '{engine}' is not registered (available: {})", ctx.scoring.engine_names().join(", "));
    };
    for message in ctx.scoring.validate_evidence(engine, &evidence, &schema_config) {
        warn!(engine, "{message}");
    }
    print_json(&result)?;
    Ok(true)
}

pub fn check_schema(ctx: &Context, path: &Path) -> anyhow::Result<bool> {
    let definition = read_document(path)?;
    let result = ctx.validator.validate_schema_definition(&definition);
    print_json(&result)?;
    Ok(result.is_valid)
}

pub fn json_schema(ctx: &Context, schema: &str) -> anyhow::Result<bool> {
    let schema = ctx.resolve_schema(schema)?;
    print_json(&generate_json_schema(&schema))?;
    Ok(true)
}

pub fn engines(ctx: &Context) -> anyhow::Result<bool> {
    print_json(&ctx.scoring.list_engines())?;
    Ok(true)
}

// ── Workflow walkthrough ────────────────────────────────────────────────────

fn member(role: UserRole, scope_id: Uuid) -> ActorContext {
    ActorContext::new(Uuid::new_v4(), role).with_scope(scope_id)
}

/// Run one gene-disease pair from entry to activation in an in-memory store.
pub async fn walkthrough(
    ctx: &Context,
    pair_name: Option<&str>,
    precuration: &Path,
    curation: &Path,
    reviewer_count: usize,
) -> anyhow::Result<bool> {
    let catalog = ctx.catalog()?;
    let service = CurationService::new(
        Arc::new(InMemoryStore::new()),
        Arc::clone(&ctx.validator),
        Arc::new(SystemClock),
        ctx.config.workflow_settings(),
    );

    for schema in catalog.schemas.iter().cloned() {
        service.publish_schema(schema).await?;
    }
    let pair = match pair_name {
        Some(name) => catalog.pairs.iter().find(|p| p.name == name),
        None => catalog.pairs.first(),
    };
    let Some(pair) = pair.cloned() else {
        bail!("No workflow pair found in {}", ctx.config.catalog.schema_dir.display());
    };
    let pair_id = service.register_workflow_pair(pair).await?;

    let gene_scope = GeneScope { gene_id: Uuid::new_v4(), scope_id: Uuid::new_v4() };
    let author = member(UserRole::Curator, gene_scope.scope_id);
    let submitter = member(UserRole::Curator, gene_scope.scope_id);
    let reviewers: Vec<ActorContext> =
        (0..reviewer_count).map(|_| member(UserRole::Reviewer, gene_scope.scope_id)).collect();

    let record = service
        .create_record(
            NewRecord {
                kind: RecordKind::Precuration,
                gene_scope,
                workflow_pair_id: pair_id,
                evidence_data: read_document(precuration)?,
            },
            &author,
        )
        .await?;
    let steps = [WorkflowStage::Precuration, WorkflowStage::Curation];
    let mut curation_id = None;
    for stage in steps {
        let Some(transition) = attempt(service.execute_transition(record.id, RecordKind::Precuration, stage, &author, None).await)? else {
            return Ok(false);
        };
        curation_id = transition.created_record_id.or(curation_id);
    }
    let Some(curation_id) = curation_id else {
        bail!("Handoff did not create a curation record");
    };

    service
        .update_evidence(curation_id, RecordKind::Curation, read_document(curation)?, &author, None)
        .await?;
    let submitted =
        attempt(service.execute_transition(curation_id, RecordKind::Curation, WorkflowStage::Review, &submitter, None).await)?;
    let Some(submitted) = submitted else {
        return Ok(false);
    };
    info!(verdict = ?submitted.computed_verdict, "Curation entered review");

    let mut review_ids = Vec::new();
    for reviewer in &reviewers {
        review_ids.push(service.assign_reviewer(curation_id, reviewer.user_id, &submitter).await?.id);
    }
    let mut activated = false;
    for (review_id, reviewer) in review_ids.into_iter().zip(&reviewers) {
        let outcome = service.submit_review(review_id, reviewer, ReviewDecision::Approve, None).await?;
        for reason in &outcome.blocked_reasons {
            warn!("{reason}");
        }
        activated |= outcome.transition.is_some();
    }
    if !activated && reviewers.is_empty() {
        activated = attempt(service.execute_transition(curation_id, RecordKind::Curation, WorkflowStage::Active, &submitter, None).await)?.is_some();
    }

    let state = service.get_workflow_state(curation_id, RecordKind::Curation).await?;
    let active = service.active_curation(gene_scope).await?;
    print_json(&json!({"workflow_state": state, "active_curation": active}))?;
    Ok(activated)
}

/// Unwrap a transition, logging and swallowing a rejection.
fn attempt<T>(result: curagen_common::Result<T>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(CuragenError::TransitionRejected { from, to, reasons }) => {
            warn!(%from, %to, "Transition rejected");
            for reason in reasons {
                warn!("  - {reason}");
            }
            Ok(None)
        }
        Err(other) => Err(other.into()),
    }
}

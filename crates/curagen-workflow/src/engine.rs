//! The workflow state machine: transition validation and execution, peer
//! review and evidence updates.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use curagen_common::{
    ActiveCuration, ActorContext, AuditEntry, AuditOperation, Clock, CuragenError, EvidenceRecord,
    GeneScope, RecordKind, RecordStatus, Result, Review, ReviewDecision, ReviewStatus, WorkflowStage,
};
use curagen_schema::{CurationSchema, SchemaValidator, ValidationResult, WorkflowPair};
use curagen_scoring::ScoringResult;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::repository::{
    ActiveCurationRepository, AuditRepository, CurationStore, RecordRepository, ReviewRepository,
    SchemaRepository,
};
use crate::requirements;
use crate::stage::{self, ProgressMetrics};

const AUTO_ACTIVATION_NOTE: &str = "All peer reviews approved - automatically activated";
const HANDED_OFF: &str = "Precuration has already been handed off to curation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSettings {
    pub require_review_before_activation: bool,
    pub auto_activate_on_approval: bool,
    pub enforce_scope_membership: bool,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            require_review_before_activation: true,
            auto_activate_on_approval: true,
            enforce_scope_membership: true,
        }
    }
}

/// Outcome of checking a transition without applying it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitionValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub requirements: Vec<String>,
}

/// What an executed transition did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub item_id: Uuid,
    pub item_kind: RecordKind,
    pub from_stage: WorkflowStage,
    pub to_stage: WorkflowStage,
    pub executed_by: Uuid,
    pub executed_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub auto_triggered: bool,
    pub record_hash: String,
    /// Curation created by a precuration handoff.
    pub created_record_id: Option<Uuid>,
    pub active_curation_id: Option<Uuid>,
    pub replaced_curation_id: Option<Uuid>,
    pub computed_verdict: Option<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub item_id: Uuid,
    pub item_kind: RecordKind,
    pub current_stage: WorkflowStage,
    pub status: RecordStatus,
    pub review_round: u32,
    pub available_transitions: Vec<WorkflowStage>,
    pub pending_reviews: Vec<Review>,
    pub progress: ProgressMetrics,
    pub history: Vec<AuditEntry>,
    pub last_updated: DateTime<Utc>,
    pub last_updated_by: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewOutcome {
    pub review: Review,
    /// Every review of the current round is now an approval.
    pub all_approved: bool,
    /// Set when the submission triggered automatic activation.
    pub transition: Option<TransitionRecord>,
    /// Why automatic activation did not go through, if it was attempted.
    pub blocked_reasons: Vec<String>,
}

/// Request to open a new record under a workflow pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    pub kind: RecordKind,
    pub gene_scope: GeneScope,
    pub workflow_pair_id: Uuid,
    pub evidence_data: Value,
}

struct Assessment {
    record: EvidenceRecord,
    validation: TransitionValidation,
    scoring: Option<ScoringResult>,
    pair: Option<WorkflowPair>,
}

pub struct WorkflowEngine {
    store: Arc<dyn CurationStore>,
    validator: Arc<SchemaValidator>,
    clock: Arc<dyn Clock>,
    settings: WorkflowSettings,
}

impl std::fmt::Debug for WorkflowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEngine").field("settings", &self.settings).finish_non_exhaustive()
    }
}

impl WorkflowEngine {
    pub fn new(
        store: Arc<dyn CurationStore>,
        validator: Arc<SchemaValidator>,
        clock: Arc<dyn Clock>,
        settings: WorkflowSettings,
    ) -> Self {
        Self { store, validator, clock, settings }
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn CurationStore> {
        &self.store
    }

    // ── Records ─────────────────────────────────────────────────────────────

    pub async fn create_record(&self, request: NewRecord, actor: &ActorContext) -> Result<EvidenceRecord> {
        if !actor.role.can_edit_evidence() {
            return Err(CuragenError::Unauthorized(format!(
                "role '{}' cannot create {} records",
                actor.role, request.kind
            )));
        }
        self.check_scope(actor, request.gene_scope.scope_id)?;
        if !request.evidence_data.is_object() {
            return Err(CuragenError::InvalidInput("Evidence data must be an object".into()));
        }

        let pair = self.load_pair(request.workflow_pair_id).await?;
        let schema = match request.kind {
            RecordKind::Precuration => pair.precuration_schema.clone(),
            RecordKind::Curation => pair.curation_schema.clone(),
        };
        self.load_schema(&schema).await?;

        let mut record = EvidenceRecord::new_draft(
            self.clock.new_id(),
            request.kind,
            request.gene_scope,
            schema,
            request.evidence_data,
            actor.user_id,
            self.clock.now(),
        );
        record.workflow_pair_id = Some(pair.id);
        self.store.insert_record(&record).await?;
        self.audit(&record, AuditOperation::Created, actor.user_id, None).await?;

        info!(item_id = %record.id, kind = %record.kind, schema = %record.schema, "Record created");
        Ok(record)
    }

    /// Replace a draft record's evidence. `expected_hash`, when given, must
    /// equal the record's current hash.
    pub async fn update_evidence(
        &self,
        item_id: Uuid,
        kind: RecordKind,
        evidence_data: Value,
        actor: &ActorContext,
        expected_hash: Option<&str>,
    ) -> Result<EvidenceRecord> {
        let mut record = self.load(item_id, kind).await?;
        if !actor.role.can_edit_evidence() {
            return Err(CuragenError::Unauthorized(format!("role '{}' cannot edit evidence", actor.role)));
        }
        self.check_scope(actor, record.scope_id)?;
        if record.created_by != actor.user_id && !actor.role.is_global_admin() {
            return Err(CuragenError::Unauthorized(format!(
                "only the creator of {kind} {item_id} can edit its draft evidence"
            )));
        }
        if record.status != RecordStatus::Draft || !stage::stages_for(kind).contains(&record.workflow_stage) {
            return Err(CuragenError::InvalidInput(format!(
                "{kind} {item_id} is not editable in status {:?} at stage {}",
                record.status, record.workflow_stage
            )));
        }
        if !evidence_data.is_object() {
            return Err(CuragenError::InvalidInput("Evidence data must be an object".into()));
        }
        let expected = record.record_hash.clone();
        if let Some(hash) = expected_hash {
            if hash != expected {
                return Err(CuragenError::Conflict { id: item_id, expected: hash.to_string(), found: expected });
            }
        }

        record.evidence_data = evidence_data;
        record.computed_scores.clear();
        record.computed_verdict = None;
        record.reseal(actor.user_id, self.clock.now());
        self.store.update_record(&record, &expected).await?;
        self.audit(
            &record,
            AuditOperation::EvidenceUpdated { version_number: record.version_number },
            actor.user_id,
            None,
        )
        .await?;
        Ok(record)
    }

    pub async fn get_record(&self, item_id: Uuid, kind: RecordKind) -> Result<EvidenceRecord> {
        self.load(item_id, kind).await
    }

    // ── Transitions ─────────────────────────────────────────────────────────

    pub async fn validate_transition(
        &self,
        item_id: Uuid,
        kind: RecordKind,
        target: WorkflowStage,
        actor: &ActorContext,
    ) -> Result<TransitionValidation> {
        let record = self.load(item_id, kind).await?;
        Ok(self.assess(record, target, actor).await?.validation)
    }

    /// Re-validate and apply a transition. A transition that fails
    /// validation is returned as `TransitionRejected` and nothing changes.
    pub async fn execute_transition(
        &self,
        item_id: Uuid,
        kind: RecordKind,
        target: WorkflowStage,
        actor: &ActorContext,
        notes: Option<String>,
    ) -> Result<TransitionRecord> {
        self.execute(item_id, kind, target, actor, notes, false).await
    }

    async fn execute(
        &self,
        item_id: Uuid,
        kind: RecordKind,
        to: WorkflowStage,
        actor: &ActorContext,
        notes: Option<String>,
        auto_triggered: bool,
    ) -> Result<TransitionRecord> {
        let record = self.load(item_id, kind).await?;
        let from = record.workflow_stage;
        let Assessment { mut record, validation, scoring, pair } = self.assess(record, to, actor).await?;
        if !validation.is_valid {
            warn!(
                item_id = %item_id,
                kind = %kind,
                from = %from,
                to = %to,
                actor = %actor.user_id,
                reasons = ?validation.errors,
                "Workflow transition rejected"
            );
            return Err(CuragenError::TransitionRejected { from, to, reasons: validation.errors });
        }

        let now = self.clock.now();
        let expected = record.record_hash.clone();
        let mut outcome = TransitionRecord {
            item_id,
            item_kind: kind,
            from_stage: from,
            to_stage: to,
            executed_by: actor.user_id,
            executed_at: now,
            notes: notes.clone(),
            auto_triggered,
            record_hash: String::new(),
            created_record_id: None,
            active_curation_id: None,
            replaced_curation_id: None,
            computed_verdict: None,
            warnings: validation.warnings,
        };

        use WorkflowStage as S;
        match (from, to) {
            (S::Entry, S::Precuration) | (S::Precuration, S::Entry) => {
                record.workflow_stage = to;
                record.status = RecordStatus::Draft;
            }
            (S::Precuration, S::Curation) => {
                // the precuration stays put; its successor carries the evidence on
                record.status = RecordStatus::Approved;
            }
            (S::Curation, S::Precuration) => {
                record.status = RecordStatus::Archived;
            }
            (S::Curation, S::Review) => {
                if let Some(scoring) = &scoring {
                    record.computed_scores = scoring.scores.clone();
                    record.computed_scores.insert("total_score".into(), scoring.total_score);
                    record.computed_verdict = Some(scoring.verdict.clone());
                }
                record.workflow_stage = S::Review;
                record.status = RecordStatus::InReview;
                record.review_round += 1;
            }
            (S::Active, S::Review) => {
                record.workflow_stage = S::Review;
                record.status = RecordStatus::InReview;
                record.review_round += 1;
            }
            (S::Review, S::Curation) => {
                record.workflow_stage = S::Curation;
                record.status = RecordStatus::Draft;
            }
            (S::Review, S::Active) => {
                record.workflow_stage = S::Active;
                record.status = RecordStatus::Active;
            }
            _ => {
                return Err(CuragenError::InvalidInput(format!("Unsupported transition {from} -> {to}")));
            }
        }

        record.reseal(actor.user_id, now);
        self.store.update_record(&record, &expected).await?;
        outcome.record_hash = record.record_hash.clone();
        outcome.computed_verdict = record.computed_verdict.clone();

        self.audit(
            &record,
            AuditOperation::Transition { from_stage: from, to_stage: to, auto_triggered },
            actor.user_id,
            notes,
        )
        .await?;

        match (from, to) {
            (S::Precuration, S::Curation) => {
                if let Some(pair) = pair {
                    let curation = self.hand_off(&record, &pair, actor, now).await?;
                    outcome.created_record_id = Some(curation.id);
                }
            }
            (S::Curation, S::Precuration) => self.reopen_precuration(&record, actor, now).await?,
            (S::Review, S::Active) => {
                let (row, replaced) = self.activate(&record, actor, now).await?;
                outcome.active_curation_id = Some(row);
                outcome.replaced_curation_id = replaced;
            }
            _ => {}
        }

        info!(
            item_id = %item_id,
            kind = %kind,
            from = %from,
            to = %to,
            actor = %actor.user_id,
            auto_triggered,
            "Workflow transition executed"
        );
        Ok(outcome)
    }

    async fn assess(
        &self,
        record: EvidenceRecord,
        to: WorkflowStage,
        actor: &ActorContext,
    ) -> Result<Assessment> {
        use WorkflowStage as S;

        let from = record.workflow_stage;
        let mut validation = TransitionValidation {
            requirements: stage::content_requirements(to),
            ..Default::default()
        };
        let mut scoring = None;
        let mut pair = None;
        let errors = &mut validation.errors;

        if !stage::is_adjacent(from, to) {
            errors.push(format!("Invalid transition from {from} to {to}"));
        }
        if record.status.is_terminal() {
            errors.push(format!("{} {} is archived", record.kind, record.id));
        }
        if !stage::authorized_roles(from, to).contains(&actor.role) {
            errors.push(format!("User role '{}' not authorized for this transition", actor.role));
        }
        if self.settings.enforce_scope_membership && !actor.has_scope(record.scope_id) {
            errors.push(format!("User is not assigned to scope {}", record.scope_id));
        }
        if stage::requires_independent_review(from, to) && actor.user_id == record.created_by {
            errors.push("4-eyes principle violation: Cannot review your own work".to_string());
        }

        if stage::is_adjacent(from, to) {
            match (from, to) {
                (S::Precuration, S::Entry) => {
                    if record.status == RecordStatus::Approved {
                        validation.errors.push(HANDED_OFF.into());
                    }
                }
                (S::Precuration, S::Curation) => {
                    if record.status == RecordStatus::Approved || self.has_live_curation(&record).await? {
                        validation.errors.push(HANDED_OFF.into());
                    }
                    match record.workflow_pair_id {
                        Some(pair_id) => match self.store.get_workflow_pair(pair_id).await? {
                            Some(found) => pair = Some(found),
                            None => validation.errors.push(format!("Workflow pair {pair_id} not found")),
                        },
                        None => validation
                            .errors
                            .push("No workflow pair assigned; cannot hand off to curation".into()),
                    }
                    if let Some(result) = self.run_validator(&record, &mut validation).await? {
                        validation.errors.extend(requirements::validation_errors("curation", &result));
                    }
                }
                (S::Curation, S::Precuration) => {
                    if record.precuration_id.is_none() {
                        validation
                            .errors
                            .push("Curation has no originating precuration to return to".into());
                    }
                }
                (S::Curation, S::Review) => {
                    if let Some(result) = self.run_validator(&record, &mut validation).await? {
                        validation.errors.extend(requirements::validation_errors("review", &result));
                        scoring = result.scoring;
                    }
                    validation
                        .errors
                        .extend(requirements::review_entry_errors(&record, scoring.as_ref()));
                    if scoring.is_none() && record.final_score().is_some() {
                        validation.warnings.push("Using previously computed final score".into());
                    }
                }
                (S::Review, S::Active) => {
                    let reviews = self.store.reviews_for(record.id).await?;
                    validation.errors.extend(requirements::activation_errors(
                        &reviews,
                        record.review_round,
                        self.settings.require_review_before_activation,
                    ));
                }
                _ => {}
            }
        }

        validation.is_valid = validation.errors.is_empty();
        Ok(Assessment { record, validation, scoring, pair })
    }

    /// Validate the record's evidence against its schema. A missing schema is
    /// a blocking error rather than a failure of the call.
    async fn run_validator(
        &self,
        record: &EvidenceRecord,
        validation: &mut TransitionValidation,
    ) -> Result<Option<ValidationResult>> {
        let Some(schema) = self.store.get_schema(&record.schema).await? else {
            validation.errors.push(format!("Schema {} is not registered", record.schema));
            return Ok(None);
        };
        let result = self.validator.validate(&schema, &record.evidence_data, Some(&scope_context(record)));
        validation
            .warnings
            .extend(result.warnings.iter().map(|w| format!("{}: {}", w.field, w.message)));
        Ok(Some(result))
    }

    async fn hand_off(
        &self,
        precuration: &EvidenceRecord,
        pair: &WorkflowPair,
        actor: &ActorContext,
        now: DateTime<Utc>,
    ) -> Result<EvidenceRecord> {
        let mut curation = EvidenceRecord::new_draft(
            self.clock.new_id(),
            RecordKind::Curation,
            precuration.gene_scope(),
            pair.curation_schema.clone(),
            pair.map_precuration_data(&precuration.evidence_data),
            actor.user_id,
            now,
        );
        curation.workflow_pair_id = Some(pair.id);
        curation.precuration_id = Some(precuration.id);
        self.store.insert_record(&curation).await?;
        self.audit(
            &curation,
            AuditOperation::Created,
            actor.user_id,
            Some(format!("Created from precuration {}", precuration.id)),
        )
        .await?;
        Ok(curation)
    }

    async fn reopen_precuration(
        &self,
        curation: &EvidenceRecord,
        actor: &ActorContext,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.audit(
            curation,
            AuditOperation::Archived { reason: "Returned to precuration".into() },
            actor.user_id,
            None,
        )
        .await?;

        let Some(precuration_id) = curation.precuration_id else {
            return Ok(());
        };
        let mut precuration = self.load(precuration_id, RecordKind::Precuration).await?;
        let expected = precuration.record_hash.clone();
        let from = precuration.workflow_stage;
        precuration.workflow_stage = WorkflowStage::Precuration;
        precuration.status = RecordStatus::Draft;
        precuration.reseal(actor.user_id, now);
        self.store.update_record(&precuration, &expected).await?;
        self.audit(
            &precuration,
            AuditOperation::Transition { from_stage: from, to_stage: WorkflowStage::Precuration, auto_triggered: true },
            actor.user_id,
            Some(format!("Reopened after curation {} was returned", curation.id)),
        )
        .await
    }

    /// Publish the curation for its (gene, scope) pair, archiving whatever
    /// was published before.
    async fn activate(
        &self,
        curation: &EvidenceRecord,
        actor: &ActorContext,
        now: DateTime<Utc>,
    ) -> Result<(Uuid, Option<Uuid>)> {
        let row = ActiveCuration {
            id: self.clock.new_id(),
            gene_id: curation.gene_id,
            scope_id: curation.scope_id,
            curation_id: curation.id,
            verdict: curation.computed_verdict.clone(),
            activated_by: actor.user_id,
            activated_at: now,
            replaced_curation_id: None,
            archived_at: None,
            archived_by: None,
            archive_reason: None,
        };
        let row_id = row.id;
        let previous = self
            .store
            .activate(row, &format!("Replaced by curation {}", curation.id))
            .await?;
        let replaced = previous.as_ref().map(|p| p.curation_id);
        self.audit(
            curation,
            AuditOperation::Activated { active_curation_id: row_id, replaced_curation_id: replaced },
            actor.user_id,
            None,
        )
        .await?;

        if let Some(previous_id) = replaced.filter(|id| *id != curation.id) {
            self.archive_replaced(previous_id, curation.id, actor, now).await?;
        }
        Ok((row_id, replaced))
    }

    async fn archive_replaced(
        &self,
        previous_id: Uuid,
        replacement: Uuid,
        actor: &ActorContext,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let Some(mut previous) = self.store.get_record(previous_id).await? else {
            warn!(curation_id = %previous_id, "Replaced curation record is missing");
            return Ok(());
        };
        if previous.status == RecordStatus::Archived {
            return Ok(());
        }
        let expected = previous.record_hash.clone();
        previous.status = RecordStatus::Archived;
        previous.reseal(actor.user_id, now);
        self.store.update_record(&previous, &expected).await?;
        self.audit(
            &previous,
            AuditOperation::Archived { reason: format!("Replaced by curation {replacement}") },
            actor.user_id,
            None,
        )
        .await
    }

    // ── State ───────────────────────────────────────────────────────────────

    pub async fn get_workflow_state(&self, item_id: Uuid, kind: RecordKind) -> Result<WorkflowState> {
        let record = self.load(item_id, kind).await?;
        let stage = record.workflow_stage;

        let pending_reviews = if stage == WorkflowStage::Review {
            self.store
                .reviews_for(item_id)
                .await?
                .into_iter()
                .filter(|r| r.review_round == record.review_round && r.status == ReviewStatus::Pending)
                .collect()
        } else {
            Vec::new()
        };

        Ok(WorkflowState {
            item_id,
            item_kind: kind,
            current_stage: stage,
            status: record.status,
            review_round: record.review_round,
            available_transitions: stage::next_stages(stage).to_vec(),
            pending_reviews,
            progress: ProgressMetrics::for_stage(stage),
            history: self.store.entries_for(item_id).await?,
            last_updated: record.updated_at,
            last_updated_by: record.updated_by,
        })
    }

    pub async fn active_curation(&self, gene_scope: GeneScope) -> Result<Option<ActiveCuration>> {
        self.store.current_active(gene_scope).await
    }

    // ── Peer review ─────────────────────────────────────────────────────────

    pub async fn assign_reviewer(
        &self,
        curation_id: Uuid,
        reviewer_id: Uuid,
        actor: &ActorContext,
    ) -> Result<Review> {
        let record = self.load(curation_id, RecordKind::Curation).await?;
        if record.workflow_stage != WorkflowStage::Review {
            return Err(CuragenError::InvalidInput(
                "Item must be in review stage to assign peer reviewer".into(),
            ));
        }
        if !actor.role.can_assign_reviewers() {
            return Err(CuragenError::Unauthorized(format!("role '{}' cannot assign reviewers", actor.role)));
        }
        self.check_scope(actor, record.scope_id)?;
        if reviewer_id == record.created_by {
            return Err(CuragenError::FourEyes("Cannot assign original creator as reviewer".into()));
        }

        let existing = self.store.reviews_for(curation_id).await?;
        if existing
            .iter()
            .any(|r| r.reviewer_id == reviewer_id && r.review_round == record.review_round)
        {
            return Err(CuragenError::InvalidInput(format!(
                "Reviewer {reviewer_id} is already assigned in round {}",
                record.review_round
            )));
        }

        let review = Review::pending(
            self.clock.new_id(),
            curation_id,
            reviewer_id,
            actor.user_id,
            record.review_round,
            self.clock.now(),
        );
        self.store.insert_review(&review).await?;
        self.audit(
            &record,
            AuditOperation::ReviewerAssigned {
                review_id: review.id,
                reviewer_id,
                review_round: review.review_round,
            },
            actor.user_id,
            None,
        )
        .await?;

        info!(curation_id = %curation_id, reviewer = %reviewer_id, round = review.review_round, "Reviewer assigned");
        Ok(review)
    }

    /// Record a review decision. When this completes an all-approve round
    /// the curation is activated on the reviewer's behalf.
    pub async fn submit_review(
        &self,
        review_id: Uuid,
        actor: &ActorContext,
        decision: ReviewDecision,
        comments: Option<String>,
    ) -> Result<ReviewOutcome> {
        let mut review = self
            .store
            .get_review(review_id)
            .await?
            .ok_or_else(|| CuragenError::not_found("review", review_id))?;
        if review.reviewer_id != actor.user_id {
            return Err(CuragenError::Unauthorized("Only assigned reviewer can submit this review".into()));
        }
        if review.is_completed() {
            return Err(CuragenError::InvalidInput("Review has already been completed".into()));
        }
        let record = self.load(review.curation_id, RecordKind::Curation).await?;
        if record.workflow_stage != WorkflowStage::Review || review.review_round != record.review_round {
            return Err(CuragenError::InvalidInput(format!(
                "Review {review_id} belongs to a closed review round"
            )));
        }

        review.complete(decision, comments, self.clock.now());
        self.store.update_review(&review).await?;
        self.audit(
            &record,
            AuditOperation::ReviewSubmitted { review_id, decision },
            actor.user_id,
            review.comments.clone(),
        )
        .await?;

        let reviews = self.store.reviews_for(record.id).await?;
        let all_approved = decision == ReviewDecision::Approve
            && requirements::all_reviews_approved(&reviews, record.review_round);

        let mut outcome = ReviewOutcome { review, all_approved, transition: None, blocked_reasons: Vec::new() };
        if all_approved && self.settings.auto_activate_on_approval {
            match self
                .execute(
                    record.id,
                    RecordKind::Curation,
                    WorkflowStage::Active,
                    actor,
                    Some(AUTO_ACTIVATION_NOTE.to_string()),
                    true,
                )
                .await
            {
                Ok(transition) => outcome.transition = Some(transition),
                Err(err @ (CuragenError::TransitionRejected { .. } | CuragenError::Conflict { .. })) => {
                    // a concurrent final approval may already have activated it
                    let current = self.load(record.id, RecordKind::Curation).await?;
                    if current.workflow_stage == WorkflowStage::Active {
                        info!(curation_id = %record.id, "Curation already activated by a concurrent review");
                    } else {
                        let reasons = match err {
                            CuragenError::TransitionRejected { reasons, .. } => reasons,
                            other => vec![other.to_string()],
                        };
                        warn!(curation_id = %record.id, reasons = ?reasons, "Automatic activation blocked");
                        outcome.blocked_reasons = reasons;
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Ok(outcome)
    }

    // ── Helpers ─────────────────────────────────────────────────────────────

    async fn load(&self, id: Uuid, kind: RecordKind) -> Result<EvidenceRecord> {
        match self.store.get_record(id).await? {
            Some(record) if record.kind == kind => Ok(record),
            _ => Err(CuragenError::not_found(kind.as_str(), id)),
        }
    }

    async fn load_pair(&self, id: Uuid) -> Result<WorkflowPair> {
        self.store
            .get_workflow_pair(id)
            .await?
            .ok_or_else(|| CuragenError::not_found("workflow_pair", id))
    }

    async fn load_schema(&self, schema: &curagen_common::SchemaRef) -> Result<CurationSchema> {
        self.store
            .get_schema(schema)
            .await?
            .ok_or_else(|| CuragenError::not_found("schema", schema))
    }

    /// Whether a non-archived curation already descends from this precuration.
    async fn has_live_curation(&self, precuration: &EvidenceRecord) -> Result<bool> {
        Ok(self.store.records_for(precuration.gene_scope()).await?.iter().any(|r| {
            r.kind == RecordKind::Curation
                && r.precuration_id == Some(precuration.id)
                && r.status != RecordStatus::Archived
        }))
    }

    fn check_scope(&self, actor: &ActorContext, scope_id: Uuid) -> Result<()> {
        if self.settings.enforce_scope_membership && !actor.has_scope(scope_id) {
            return Err(CuragenError::Unauthorized(format!("User is not assigned to scope {scope_id}")));
        }
        Ok(())
    }

    async fn audit(
        &self,
        record: &EvidenceRecord,
        operation: AuditOperation,
        actor_id: Uuid,
        notes: Option<String>,
    ) -> Result<()> {
        let entry = AuditEntry {
            id: self.clock.new_id(),
            entity_id: record.id,
            entity_kind: record.kind,
            scope_id: record.scope_id,
            operation,
            actor_id,
            timestamp: self.clock.now(),
            notes,
            record_hash: Some(record.record_hash.clone()),
        };
        self.store.append(&entry).await
    }
}

fn scope_context(record: &EvidenceRecord) -> Value {
    json!({
        "gene_id": record.gene_id,
        "scope_id": record.scope_id,
        "record_id": record.id,
    })
}

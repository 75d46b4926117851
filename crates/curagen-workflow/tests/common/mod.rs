#![allow(dead_code)]

use std::sync::Arc;

use curagen_common::{ActorContext, EvidenceRecord, FixedClock, GeneScope, RecordKind, ReviewDecision, WorkflowStage};
use curagen_schema::{SchemaValidator, ValidatorSettings};
use curagen_scoring::ScoringRegistry;
use curagen_test_utils as fixtures;
use curagen_workflow::{CurationService, InMemoryStore, NewRecord, WorkflowSettings};
use uuid::Uuid;

pub struct Harness {
    pub service: CurationService,
    pub clock: Arc<FixedClock>,
    pub pair_id: Uuid,
    pub gene_scope: GeneScope,
}

pub async fn harness() -> Harness {
    harness_with(WorkflowSettings::default()).await
}

pub async fn harness_with(settings: WorkflowSettings) -> Harness {
    let clock = Arc::new(FixedClock::new(fixtures::epoch()));
    let scoring = Arc::new(ScoringRegistry::with_default_engines().with_clock(clock.clone()));
    let validator = Arc::new(SchemaValidator::new(scoring, ValidatorSettings::default()));
    let store = Arc::new(InMemoryStore::new());
    let service = CurationService::new(store, validator, clock.clone(), settings);

    service.publish_schema(fixtures::precuration_schema()).await.unwrap();
    service.publish_schema(fixtures::clingen_schema()).await.unwrap();
    let pair_id = service.register_workflow_pair(fixtures::workflow_pair()).await.unwrap();

    Harness { service, clock, pair_id, gene_scope: fixtures::gene_scope() }
}

impl Harness {
    pub fn scope(&self) -> Uuid {
        self.gene_scope.scope_id
    }

    /// Precuration at `entry`, created by `author`.
    pub async fn new_precuration(&self, author: &ActorContext) -> EvidenceRecord {
        self.service
            .create_record(
                NewRecord {
                    kind: RecordKind::Precuration,
                    gene_scope: self.gene_scope,
                    workflow_pair_id: self.pair_id,
                    evidence_data: fixtures::precuration_evidence(),
                },
                author,
            )
            .await
            .unwrap()
    }

    /// Walk a precuration through handoff; returns the new curation id.
    pub async fn handed_off_curation(&self, author: &ActorContext) -> Uuid {
        let precuration = self.new_precuration(author).await;
        self.service
            .execute_transition(precuration.id, RecordKind::Precuration, WorkflowStage::Precuration, author, None)
            .await
            .unwrap();
        let handoff = self
            .service
            .execute_transition(precuration.id, RecordKind::Precuration, WorkflowStage::Curation, author, None)
            .await
            .unwrap();
        handoff.created_record_id.unwrap()
    }

    /// A curation authored by `author`, filled with Definitive evidence and
    /// submitted to review by `submitter`.
    pub async fn curation_in_review(&self, author: &ActorContext, submitter: &ActorContext) -> Uuid {
        let curation_id = self.handed_off_curation(author).await;
        self.service
            .update_evidence(curation_id, RecordKind::Curation, fixtures::definitive_evidence(), author, None)
            .await
            .unwrap();
        self.service
            .execute_transition(curation_id, RecordKind::Curation, WorkflowStage::Review, submitter, None)
            .await
            .unwrap();
        curation_id
    }

    /// Assign and approve with each reviewer in turn.
    pub async fn approve_all(&self, curation_id: Uuid, assigner: &ActorContext, reviewers: &[ActorContext]) {
        let mut reviews = Vec::new();
        for reviewer in reviewers {
            let review = self.service.assign_reviewer(curation_id, reviewer.user_id, assigner).await.unwrap();
            reviews.push(review.id);
        }
        for (review_id, reviewer) in reviews.into_iter().zip(reviewers) {
            self.service
                .submit_review(review_id, reviewer, ReviewDecision::Approve, None)
                .await
                .unwrap();
        }
    }
}

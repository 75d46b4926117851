mod common;

use curagen_common::{CuragenError, RecordKind, RecordStatus, ReviewDecision, ReviewStatus, WorkflowStage};
use curagen_test_utils as fixtures;
use curagen_workflow::{ActiveCurationRepository, NewRecord, WorkflowSettings};
use pretty_assertions::assert_eq;

use common::harness;

fn rejection_reasons(err: CuragenError) -> Vec<String> {
    match err {
        CuragenError::TransitionRejected { reasons, .. } => reasons,
        other => panic!("expected a rejected transition, got {other:?}"),
    }
}

#[tokio::test]
async fn test_second_approval_activates_automatically() {
    let h = harness().await;
    let author = fixtures::curator(h.scope());
    let submitter = fixtures::curator(h.scope());
    let (r1, r2) = (fixtures::reviewer(h.scope()), fixtures::reviewer(h.scope()));
    let curation_id = h.curation_in_review(&author, &submitter).await;

    let review_a = h.service.assign_reviewer(curation_id, r1.user_id, &submitter).await.unwrap();
    let review_b = h.service.assign_reviewer(curation_id, r2.user_id, &submitter).await.unwrap();

    let first = h
        .service
        .submit_review(review_a.id, &r1, ReviewDecision::Approve, Some("Scoring agrees with SOP".into()))
        .await
        .unwrap();
    assert!(!first.all_approved);
    assert!(first.transition.is_none());
    let state = h.service.get_workflow_state(curation_id, RecordKind::Curation).await.unwrap();
    assert_eq!(state.current_stage, WorkflowStage::Review);
    assert_eq!(state.pending_reviews.len(), 1);
    assert_eq!(state.pending_reviews[0].reviewer_id, r2.user_id);

    let second = h.service.submit_review(review_b.id, &r2, ReviewDecision::Approve, None).await.unwrap();
    assert!(second.all_approved);
    let transition = second.transition.expect("auto-activation");
    assert!(transition.auto_triggered);
    assert_eq!(transition.from_stage, WorkflowStage::Review);
    assert_eq!(transition.to_stage, WorkflowStage::Active);
    assert_eq!(transition.executed_by, r2.user_id);

    let active = h.service.active_curation(h.gene_scope).await.unwrap().unwrap();
    assert_eq!(active.curation_id, curation_id);
    assert_eq!(active.verdict.as_deref(), Some("Definitive"));

    let record = h.service.engine().get_record(curation_id, RecordKind::Curation).await.unwrap();
    assert_eq!(record.status, RecordStatus::Active);
    assert_eq!(record.workflow_stage, WorkflowStage::Active);
    assert!(record.verify_hash());
}

#[tokio::test]
async fn test_entering_review_persists_scores() {
    let h = harness().await;
    let author = fixtures::curator(h.scope());
    let submitter = fixtures::curator(h.scope());
    let curation_id = h.curation_in_review(&author, &submitter).await;

    let record = h.service.engine().get_record(curation_id, RecordKind::Curation).await.unwrap();
    assert_eq!(record.final_score(), Some(12.0));
    assert_eq!(record.computed_verdict.as_deref(), Some("Definitive"));
    assert_eq!(record.status, RecordStatus::InReview);
    assert_eq!(record.review_round, 1);
}

#[tokio::test]
async fn test_activation_replaces_previous_curation() {
    let h = harness().await;
    let author = fixtures::curator(h.scope());
    let submitter = fixtures::curator(h.scope());
    let reviewers = [fixtures::reviewer(h.scope()), fixtures::reviewer(h.scope())];

    let c1 = h.curation_in_review(&author, &submitter).await;
    h.approve_all(c1, &submitter, &reviewers).await;

    let c2_record = h
        .service
        .create_record(
            NewRecord {
                kind: RecordKind::Curation,
                gene_scope: h.gene_scope,
                workflow_pair_id: h.pair_id,
                evidence_data: fixtures::definitive_evidence(),
            },
            &author,
        )
        .await
        .unwrap();
    let c2 = c2_record.id;
    h.service
        .execute_transition(c2, RecordKind::Curation, WorkflowStage::Review, &submitter, None)
        .await
        .unwrap();
    h.approve_all(c2, &submitter, &reviewers).await;

    let history = h.service.engine().store().active_history(h.gene_scope).await.unwrap();
    assert_eq!(history.len(), 2);
    let current: Vec<_> = history.iter().filter(|row| row.is_current()).collect();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].curation_id, c2);
    assert_eq!(current[0].replaced_curation_id, Some(c1));

    let archived = history.iter().find(|row| row.curation_id == c1).unwrap();
    assert!(archived.archived_at.is_some());

    let c1_record = h.service.engine().get_record(c1, RecordKind::Curation).await.unwrap();
    assert_eq!(c1_record.status, RecordStatus::Archived);
}

#[tokio::test]
async fn test_active_to_curation_is_rejected() {
    let h = harness().await;
    let author = fixtures::curator(h.scope());
    let submitter = fixtures::curator(h.scope());
    let curation_id = h.curation_in_review(&author, &submitter).await;
    h.approve_all(curation_id, &submitter, &[fixtures::reviewer(h.scope())]).await;

    let admin = fixtures::admin();
    let err = h
        .service
        .execute_transition(curation_id, RecordKind::Curation, WorkflowStage::Curation, &admin, None)
        .await
        .unwrap_err();
    let reasons = rejection_reasons(err);
    assert!(reasons.contains(&"Invalid transition from active to curation".to_string()));

    let state = h.service.get_workflow_state(curation_id, RecordKind::Curation).await.unwrap();
    assert_eq!(state.current_stage, WorkflowStage::Active);
}

#[tokio::test]
async fn test_creator_cannot_submit_or_review_own_curation() {
    let h = harness().await;
    let author = fixtures::curator(h.scope());
    let curation_id = h.handed_off_curation(&author).await;
    h.service
        .update_evidence(curation_id, RecordKind::Curation, fixtures::definitive_evidence(), &author, None)
        .await
        .unwrap();

    let err = h
        .service
        .execute_transition(curation_id, RecordKind::Curation, WorkflowStage::Review, &author, None)
        .await
        .unwrap_err();
    assert!(rejection_reasons(err).contains(&"4-eyes principle violation: Cannot review your own work".to_string()));

    let submitter = fixtures::curator(h.scope());
    h.service
        .execute_transition(curation_id, RecordKind::Curation, WorkflowStage::Review, &submitter, None)
        .await
        .unwrap();

    let err = h.service.assign_reviewer(curation_id, author.user_id, &submitter).await.unwrap_err();
    assert!(matches!(err, CuragenError::FourEyes(_)));
}

#[tokio::test]
async fn test_creator_cannot_activate() {
    let h = harness().await;
    let author = fixtures::scope_admin(h.scope());
    let submitter = fixtures::curator(h.scope());
    let curation_id = h.curation_in_review(&author, &submitter).await;

    let validation = h
        .service
        .validate_transition(curation_id, RecordKind::Curation, WorkflowStage::Active, &author)
        .await
        .unwrap();
    assert!(!validation.is_valid);
    assert!(validation.errors.contains(&"4-eyes principle violation: Cannot review your own work".to_string()));
}

#[tokio::test]
async fn test_review_requires_summary_and_valid_evidence() {
    let h = harness().await;
    let author = fixtures::curator(h.scope());
    let submitter = fixtures::curator(h.scope());
    let curation_id = h.handed_off_curation(&author).await;

    let validation = h
        .service
        .validate_transition(curation_id, RecordKind::Curation, WorkflowStage::Review, &submitter)
        .await
        .unwrap();
    assert!(!validation.is_valid);
    assert!(validation
        .errors
        .contains(&"cannot enter review: evidence_summary: Required field is missing".to_string()));
    assert!(validation.errors.contains(&"cannot enter review: missing evidence summary".to_string()));
    assert_eq!(validation.requirements.len(), 3);

    // nothing was applied
    let state = h.service.get_workflow_state(curation_id, RecordKind::Curation).await.unwrap();
    assert_eq!(state.current_stage, WorkflowStage::Curation);
}

#[tokio::test]
async fn test_request_changes_blocks_activation() {
    let h = harness().await;
    let author = fixtures::curator(h.scope());
    let submitter = fixtures::curator(h.scope());
    let reviewer = fixtures::reviewer(h.scope());
    let curation_id = h.curation_in_review(&author, &submitter).await;

    let review = h.service.assign_reviewer(curation_id, reviewer.user_id, &submitter).await.unwrap();
    let outcome = h
        .service
        .submit_review(review.id, &reviewer, ReviewDecision::RequestChanges, Some("Recheck PMIDs".into()))
        .await
        .unwrap();
    assert_eq!(outcome.review.status, ReviewStatus::NeedsRevision);
    assert!(outcome.transition.is_none());

    let err = h
        .service
        .execute_transition(curation_id, RecordKind::Curation, WorkflowStage::Active, &submitter, None)
        .await
        .unwrap_err();
    let reasons = rejection_reasons(err);
    assert_eq!(reasons.len(), 1);
    assert!(reasons[0].ends_with("was not approved (request_changes)"));

    // sending it back to curation unlocks editing again
    h.service
        .execute_transition(curation_id, RecordKind::Curation, WorkflowStage::Curation, &reviewer, None)
        .await
        .unwrap();
    h.service
        .update_evidence(curation_id, RecordKind::Curation, fixtures::definitive_evidence(), &author, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_review_can_only_be_submitted_once_by_its_reviewer() {
    let h = harness().await;
    let author = fixtures::curator(h.scope());
    let submitter = fixtures::curator(h.scope());
    let (reviewer, other) = (fixtures::reviewer(h.scope()), fixtures::reviewer(h.scope()));
    let curation_id = h.curation_in_review(&author, &submitter).await;
    let review = h.service.assign_reviewer(curation_id, reviewer.user_id, &submitter).await.unwrap();

    let err = h.service.submit_review(review.id, &other, ReviewDecision::Approve, None).await.unwrap_err();
    assert!(matches!(err, CuragenError::Unauthorized(_)));

    h.service.submit_review(review.id, &reviewer, ReviewDecision::Reject, None).await.unwrap();
    let err = h.service.submit_review(review.id, &reviewer, ReviewDecision::Approve, None).await.unwrap_err();
    assert!(matches!(err, CuragenError::InvalidInput(_)));
}

#[tokio::test]
async fn test_reopen_starts_new_review_round() {
    let h = harness().await;
    let author = fixtures::curator(h.scope());
    let submitter = fixtures::curator(h.scope());
    let curation_id = h.curation_in_review(&author, &submitter).await;
    h.approve_all(curation_id, &submitter, &[fixtures::reviewer(h.scope())]).await;

    // curators may not reopen a published curation
    let err = h
        .service
        .execute_transition(curation_id, RecordKind::Curation, WorkflowStage::Review, &submitter, None)
        .await
        .unwrap_err();
    assert!(rejection_reasons(err).contains(&"User role 'curator' not authorized for this transition".to_string()));

    let scope_admin = fixtures::scope_admin(h.scope());
    h.service
        .execute_transition(curation_id, RecordKind::Curation, WorkflowStage::Review, &scope_admin, Some("New variant data".into()))
        .await
        .unwrap();

    let state = h.service.get_workflow_state(curation_id, RecordKind::Curation).await.unwrap();
    assert_eq!(state.review_round, 2);
    assert!(state.pending_reviews.is_empty());

    // the round-one approval does not carry over
    let validation = h
        .service
        .validate_transition(curation_id, RecordKind::Curation, WorkflowStage::Active, &submitter)
        .await
        .unwrap();
    assert_eq!(validation.errors, vec!["cannot activate: no peer reviews assigned"]);

    // the published row stays until a replacement is activated
    let active = h.service.active_curation(h.gene_scope).await.unwrap().unwrap();
    assert_eq!(active.curation_id, curation_id);
}

#[tokio::test]
async fn test_activation_without_reviews_when_not_required() {
    let h = common::harness_with(WorkflowSettings {
        require_review_before_activation: false,
        ..WorkflowSettings::default()
    })
    .await;
    let author = fixtures::curator(h.scope());
    let submitter = fixtures::curator(h.scope());
    let curation_id = h.curation_in_review(&author, &submitter).await;

    let transition = h
        .service
        .execute_transition(curation_id, RecordKind::Curation, WorkflowStage::Active, &submitter, None)
        .await
        .unwrap();
    assert!(transition.active_curation_id.is_some());
    assert_eq!(transition.replaced_curation_id, None);
}

#[tokio::test]
async fn test_revert_to_precuration_archives_curation() {
    let h = harness().await;
    let author = fixtures::curator(h.scope());
    let curation_id = h.handed_off_curation(&author).await;
    let curation = h.service.engine().get_record(curation_id, RecordKind::Curation).await.unwrap();
    let precuration_id = curation.precuration_id.unwrap();
    assert_eq!(curation.evidence_data["disease_name"], "Hereditary breast and ovarian cancer");

    h.service
        .execute_transition(curation_id, RecordKind::Curation, WorkflowStage::Precuration, &author, None)
        .await
        .unwrap();

    let curation = h.service.engine().get_record(curation_id, RecordKind::Curation).await.unwrap();
    assert_eq!(curation.status, RecordStatus::Archived);
    let precuration = h.service.engine().get_record(precuration_id, RecordKind::Precuration).await.unwrap();
    assert_eq!(precuration.status, RecordStatus::Draft);
    assert_eq!(precuration.workflow_stage, WorkflowStage::Precuration);

    // an archived curation cannot move again
    let err = h
        .service
        .execute_transition(curation_id, RecordKind::Curation, WorkflowStage::Review, &fixtures::curator(h.scope()), None)
        .await
        .unwrap_err();
    assert!(rejection_reasons(err).iter().any(|r| r.ends_with("is archived")));

    // with its curation archived the precuration may be handed off again
    h.service
        .execute_transition(precuration_id, RecordKind::Precuration, WorkflowStage::Curation, &author, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_handoff_happens_once() {
    let h = harness().await;
    let author = fixtures::curator(h.scope());
    let precuration = h.new_precuration(&author).await;
    h.service
        .execute_transition(precuration.id, RecordKind::Precuration, WorkflowStage::Precuration, &author, None)
        .await
        .unwrap();
    h.service
        .execute_transition(precuration.id, RecordKind::Precuration, WorkflowStage::Curation, &author, None)
        .await
        .unwrap();
    let err = h
        .service
        .execute_transition(precuration.id, RecordKind::Precuration, WorkflowStage::Curation, &author, None)
        .await
        .unwrap_err();
    assert!(rejection_reasons(err).contains(&"Precuration has already been handed off to curation".to_string()));

    // stepping back to entry must not reopen the handoff
    let err = h
        .service
        .execute_transition(precuration.id, RecordKind::Precuration, WorkflowStage::Entry, &author, None)
        .await
        .unwrap_err();
    assert!(rejection_reasons(err).contains(&"Precuration has already been handed off to curation".to_string()));

    let record = h.service.engine().get_record(precuration.id, RecordKind::Precuration).await.unwrap();
    assert_eq!(record.status, RecordStatus::Approved);
    assert_eq!(record.workflow_stage, WorkflowStage::Precuration);
}

#[tokio::test]
async fn test_only_creator_or_admin_edits_draft() {
    let h = harness().await;
    let author = fixtures::curator(h.scope());
    let precuration = h.new_precuration(&author).await;

    let err = h
        .service
        .update_evidence(precuration.id, RecordKind::Precuration, fixtures::precuration_evidence(), &fixtures::curator(h.scope()), None)
        .await
        .unwrap_err();
    assert!(matches!(err, CuragenError::Unauthorized(_)));
    let record = h.service.engine().get_record(precuration.id, RecordKind::Precuration).await.unwrap();
    assert_eq!(record.version_number, 1);

    let updated = h
        .service
        .update_evidence(precuration.id, RecordKind::Precuration, fixtures::precuration_evidence(), &fixtures::admin(), None)
        .await
        .unwrap();
    assert_eq!(updated.version_number, 2);
}

#[tokio::test]
async fn test_concurrent_final_approvals_activate_once() {
    let h = harness().await;
    let author = fixtures::curator(h.scope());
    let submitter = fixtures::curator(h.scope());
    let (r1, r2) = (fixtures::reviewer(h.scope()), fixtures::reviewer(h.scope()));
    let curation_id = h.curation_in_review(&author, &submitter).await;
    let review_a = h.service.assign_reviewer(curation_id, r1.user_id, &submitter).await.unwrap();
    let review_b = h.service.assign_reviewer(curation_id, r2.user_id, &submitter).await.unwrap();

    let (first, second) = tokio::join!(
        h.service.submit_review(review_a.id, &r1, ReviewDecision::Approve, None),
        h.service.submit_review(review_b.id, &r2, ReviewDecision::Approve, None),
    );
    let outcomes = [first.unwrap(), second.unwrap()];
    assert_eq!(outcomes.iter().filter(|o| o.transition.is_some()).count(), 1);
    assert!(outcomes.iter().all(|o| o.blocked_reasons.is_empty()));

    let record = h.service.engine().get_record(curation_id, RecordKind::Curation).await.unwrap();
    assert_eq!(record.workflow_stage, WorkflowStage::Active);
    let active = h.service.active_curation(h.gene_scope).await.unwrap().unwrap();
    assert_eq!(active.curation_id, curation_id);
}

#[tokio::test]
async fn test_scope_membership_and_roles() {
    let h = harness().await;
    let author = fixtures::curator(h.scope());
    let precuration = h.new_precuration(&author).await;

    let outsider = fixtures::curator(uuid::Uuid::new_v4());
    let validation = h
        .service
        .validate_transition(precuration.id, RecordKind::Precuration, WorkflowStage::Precuration, &outsider)
        .await
        .unwrap();
    assert_eq!(validation.errors, vec![format!("User is not assigned to scope {}", h.scope())]);

    let viewer = fixtures::viewer(h.scope());
    let validation = h
        .service
        .validate_transition(precuration.id, RecordKind::Precuration, WorkflowStage::Precuration, &viewer)
        .await
        .unwrap();
    assert_eq!(validation.errors, vec!["User role 'viewer' not authorized for this transition"]);

    // global admins need no scope assignment
    let validation = h
        .service
        .validate_transition(precuration.id, RecordKind::Precuration, WorkflowStage::Precuration, &fixtures::admin())
        .await
        .unwrap();
    assert!(validation.is_valid);
}

#[tokio::test]
async fn test_stale_hash_update_conflicts() {
    let h = harness().await;
    let author = fixtures::curator(h.scope());
    let precuration = h.new_precuration(&author).await;
    let stale_hash = precuration.record_hash.clone();

    let updated = h
        .service
        .update_evidence(precuration.id, RecordKind::Precuration, fixtures::precuration_evidence(), &author, Some(&stale_hash))
        .await
        .unwrap();
    assert_eq!(updated.previous_hash.as_deref(), Some(stale_hash.as_str()));
    assert_eq!(updated.version_number, 2);

    let err = h
        .service
        .update_evidence(precuration.id, RecordKind::Precuration, fixtures::precuration_evidence(), &author, Some(&stale_hash))
        .await
        .unwrap_err();
    assert!(matches!(err, CuragenError::Conflict { .. }));
}

#[tokio::test]
async fn test_racing_transitions_commit_once() {
    let h = harness().await;
    let author = fixtures::curator(h.scope());
    let curation_id = h.handed_off_curation(&author).await;
    h.service
        .update_evidence(curation_id, RecordKind::Curation, fixtures::definitive_evidence(), &author, None)
        .await
        .unwrap();

    let (b, c) = (fixtures::curator(h.scope()), fixtures::curator(h.scope()));
    let (first, second) = tokio::join!(
        h.service.execute_transition(curation_id, RecordKind::Curation, WorkflowStage::Review, &b, None),
        h.service.execute_transition(curation_id, RecordKind::Curation, WorkflowStage::Review, &c, None),
    );
    assert_eq!([first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(), 1);

    let record = h.service.engine().get_record(curation_id, RecordKind::Curation).await.unwrap();
    assert_eq!(record.review_round, 1);
}

#[tokio::test]
async fn test_workflow_state_reports_history_and_progress() {
    let h = harness().await;
    let author = fixtures::curator(h.scope());
    let precuration = h.new_precuration(&author).await;
    h.service
        .execute_transition(precuration.id, RecordKind::Precuration, WorkflowStage::Precuration, &author, Some("Started".into()))
        .await
        .unwrap();

    let state = h.service.get_workflow_state(precuration.id, RecordKind::Precuration).await.unwrap();
    assert_eq!(state.current_stage, WorkflowStage::Precuration);
    assert_eq!(state.available_transitions, vec![WorkflowStage::Curation, WorkflowStage::Entry]);
    assert_eq!(state.progress.current_stage_index, 1);
    assert_eq!(state.progress.progress_percentage, 25.0);
    assert_eq!(state.history.len(), 2);
    assert!(state.history[1].is_transition());
    assert_eq!(state.history[1].notes.as_deref(), Some("Started"));
    assert_eq!(state.last_updated_by, author.user_id);

    let err = h.service.get_workflow_state(precuration.id, RecordKind::Curation).await.unwrap_err();
    assert!(matches!(err, CuragenError::NotFound { .. }));
}

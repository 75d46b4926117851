//! Stage-entry content checks.
//!
//! Each check returns the itemized reasons that block the transition; an
//! empty list means the item may enter the stage.

use curagen_common::{EvidenceRecord, Review};
use curagen_schema::ValidationResult;
use curagen_scoring::ScoringResult;

/// Schema validation errors block entry into `stage`.
pub fn validation_errors(stage: &str, validation: &ValidationResult) -> Vec<String> {
    validation
        .error_messages()
        .into_iter()
        .map(|m| format!("cannot enter {stage}: {m}"))
        .collect()
}

/// Entering review needs a summary and a final score, either freshly computed
/// or already on the record.
pub fn review_entry_errors(record: &EvidenceRecord, scoring: Option<&ScoringResult>) -> Vec<String> {
    let mut errors = Vec::new();
    if record.evidence_summary().is_none() {
        errors.push("cannot enter review: missing evidence summary".to_string());
    }
    let score = scoring.map(|s| s.total_score).or_else(|| record.final_score());
    if score.is_none() {
        errors.push("cannot enter review: missing computed final score".to_string());
    }
    errors
}

fn in_round(reviews: &[Review], round: u32) -> impl Iterator<Item = &Review> {
    reviews.iter().filter(move |r| r.review_round == round)
}

/// Every review of the round is completed with `approve`, and there is at
/// least one.
pub fn all_reviews_approved(reviews: &[Review], round: u32) -> bool {
    let mut current = in_round(reviews, round).peekable();
    current.peek().is_some() && current.all(Review::is_approved)
}

pub fn activation_errors(reviews: &[Review], round: u32, require_review: bool) -> Vec<String> {
    let current: Vec<&Review> = in_round(reviews, round).collect();
    if current.is_empty() {
        return if require_review {
            vec!["cannot activate: no peer reviews assigned".to_string()]
        } else {
            Vec::new()
        };
    }

    let mut errors = Vec::new();
    let pending = current.iter().filter(|r| !r.is_completed()).count();
    if pending > 0 {
        errors.push(format!("cannot activate: {pending} peer review(s) still pending"));
    }
    for review in current.iter().filter(|r| r.is_completed() && !r.is_approved()) {
        let decision = review.decision.map(|d| d.as_str()).unwrap_or("none");
        errors.push(format!(
            "cannot activate: review by {} was not approved ({decision})",
            review.reviewer_id
        ));
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use curagen_common::{GeneScope, RecordKind, ReviewDecision, SchemaRef};
    use serde_json::json;
    use uuid::Uuid;

    fn review(round: u32, decision: Option<ReviewDecision>) -> Review {
        let mut r = Review::pending(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), round, Utc::now());
        if let Some(d) = decision {
            r.complete(d, None, Utc::now());
        }
        r
    }

    fn record(evidence: serde_json::Value) -> EvidenceRecord {
        EvidenceRecord::new_draft(
            Uuid::new_v4(),
            RecordKind::Curation,
            GeneScope { gene_id: Uuid::new_v4(), scope_id: Uuid::new_v4() },
            SchemaRef::new("ClinGen_SOP_v11", "1.0.0"),
            evidence,
            Uuid::new_v4(),
            Utc::now(),
        )
    }

    #[test]
    fn test_review_entry_needs_summary_and_score() {
        let errors = review_entry_errors(&record(json!({})), None);
        assert_eq!(
            errors,
            vec![
                "cannot enter review: missing evidence summary",
                "cannot enter review: missing computed final score",
            ]
        );

        let mut scored = record(json!({"evidence_summary": "Nine probands with LoF variants"}));
        scored.computed_scores.insert("total_score".into(), 12.0);
        assert!(review_entry_errors(&scored, None).is_empty());
    }

    #[test]
    fn test_one_of_two_approvals_is_not_enough() {
        let reviews = vec![review(1, Some(ReviewDecision::Approve)), review(1, None)];
        assert!(!all_reviews_approved(&reviews, 1));
        assert_eq!(activation_errors(&reviews, 1, true), vec!["cannot activate: 1 peer review(s) still pending"]);
    }

    #[test]
    fn test_all_approved() {
        let reviews = vec![review(1, Some(ReviewDecision::Approve)), review(1, Some(ReviewDecision::Approve))];
        assert!(all_reviews_approved(&reviews, 1));
        assert!(activation_errors(&reviews, 1, true).is_empty());
    }

    #[test]
    fn test_earlier_rounds_do_not_count() {
        let reviews = vec![review(1, Some(ReviewDecision::Approve)), review(2, Some(ReviewDecision::RequestChanges))];
        assert!(!all_reviews_approved(&reviews, 2));
        let errors = activation_errors(&reviews, 2, true);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].ends_with("was not approved (request_changes)"));
    }

    #[test]
    fn test_no_reviews() {
        assert!(!all_reviews_approved(&[], 1));
        assert_eq!(activation_errors(&[], 1, true), vec!["cannot activate: no peer reviews assigned"]);
        assert!(activation_errors(&[], 1, false).is_empty());
    }
}

//! Stage adjacency, the transition role matrix and progress metrics.

use curagen_common::{RecordKind, UserRole, WorkflowStage};
use serde::{Deserialize, Serialize};

use WorkflowStage::*;

const FROM_ENTRY: &[WorkflowStage] = &[Precuration];
const FROM_PRECURATION: &[WorkflowStage] = &[Curation, Entry];
const FROM_CURATION: &[WorkflowStage] = &[Review, Precuration];
const FROM_REVIEW: &[WorkflowStage] = &[Active, Curation];
const FROM_ACTIVE: &[WorkflowStage] = &[Review];

const CURATOR_OR_ABOVE: &[UserRole] = &[UserRole::Curator, UserRole::Admin, UserRole::ScopeAdmin];
const REVIEW_OUTCOME: &[UserRole] = &[
    UserRole::Curator,
    UserRole::Reviewer,
    UserRole::Admin,
    UserRole::ScopeAdmin,
];
const SCOPE_ADMINS: &[UserRole] = &[UserRole::Admin, UserRole::ScopeAdmin];
const ADMIN_ONLY: &[UserRole] = &[UserRole::Admin];

/// Stages reachable from `from` in one step, forward move first.
pub fn next_stages(from: WorkflowStage) -> &'static [WorkflowStage] {
    match from {
        Entry => FROM_ENTRY,
        Precuration => FROM_PRECURATION,
        Curation => FROM_CURATION,
        Review => FROM_REVIEW,
        Active => FROM_ACTIVE,
    }
}

pub fn is_adjacent(from: WorkflowStage, to: WorkflowStage) -> bool {
    next_stages(from).contains(&to)
}

/// Roles allowed to move an item from `from` to `to`. Pairs outside the
/// matrix fall back to admin only.
pub fn authorized_roles(from: WorkflowStage, to: WorkflowStage) -> &'static [UserRole] {
    match (from, to) {
        (Entry, Precuration)
        | (Precuration, Curation)
        | (Curation, Review)
        | (Precuration, Entry)
        | (Curation, Precuration) => CURATOR_OR_ABOVE,
        (Review, Active) | (Review, Curation) => REVIEW_OUTCOME,
        (Active, Review) => SCOPE_ADMINS,
        _ => ADMIN_ONLY,
    }
}

/// Transitions the item's creator may not perform themselves.
pub fn requires_independent_review(from: WorkflowStage, to: WorkflowStage) -> bool {
    matches!((from, to), (Curation, Review) | (Review, Active))
}

/// Stages a record of the given kind may occupy.
pub fn stages_for(kind: RecordKind) -> &'static [WorkflowStage] {
    match kind {
        RecordKind::Precuration => &[Entry, Precuration],
        RecordKind::Curation => &[Curation, Review, Active],
    }
}

/// Informational checklist shown to the user for a transition.
pub fn content_requirements(to: WorkflowStage) -> Vec<String> {
    let items: &[&str] = match to {
        Curation => &[
            "Precuration must be completed",
            "Disease association must be documented",
            "Lumping/splitting decision must be made",
        ],
        Review => &[
            "All evidence fields must be completed",
            "Scoring must be calculated",
            "Summary must be generated",
        ],
        Active => &[
            "All peer reviews must be completed",
            "All reviewers must approve",
            "Final quality checks must pass",
        ],
        Entry | Precuration => &[],
    };
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressMetrics {
    pub current_stage_index: usize,
    pub total_stages: usize,
    pub progress_percentage: f64,
    pub stages_completed: usize,
    pub stages_remaining: usize,
}

impl ProgressMetrics {
    pub fn for_stage(stage: WorkflowStage) -> Self {
        let total = WorkflowStage::ALL.len();
        let index = stage.index();
        Self {
            current_stage_index: index,
            total_stages: total,
            progress_percentage: index as f64 / (total.max(2) - 1) as f64 * 100.0,
            stages_completed: index,
            stages_remaining: total - index - 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacency_table() {
        assert!(is_adjacent(Entry, Precuration));
        assert!(is_adjacent(Precuration, Entry));
        assert!(is_adjacent(Review, Active));
        assert!(is_adjacent(Active, Review));
        assert!(!is_adjacent(Active, Curation));
        assert!(!is_adjacent(Entry, Curation));
        assert!(!is_adjacent(Curation, Active));
        assert!(!is_adjacent(Review, Review));
    }

    #[test]
    fn test_reopen_is_admin_level() {
        let roles = authorized_roles(Active, Review);
        assert!(roles.contains(&UserRole::ScopeAdmin));
        assert!(!roles.contains(&UserRole::Curator));
        assert_eq!(authorized_roles(Active, Curation), &[UserRole::Admin]);
    }

    #[test]
    fn test_viewer_never_authorized() {
        for from in WorkflowStage::ALL {
            for to in next_stages(from) {
                assert!(!authorized_roles(from, *to).contains(&UserRole::Viewer));
            }
        }
    }

    #[test]
    fn test_independent_review_pairs() {
        assert!(requires_independent_review(Curation, Review));
        assert!(requires_independent_review(Review, Active));
        assert!(!requires_independent_review(Review, Curation));
        assert!(!requires_independent_review(Active, Review));
    }

    #[test]
    fn test_progress_metrics() {
        let m = ProgressMetrics::for_stage(Curation);
        assert_eq!(m.current_stage_index, 2);
        assert_eq!(m.total_stages, 5);
        assert_eq!(m.progress_percentage, 50.0);
        assert_eq!(m.stages_remaining, 2);
        assert_eq!(ProgressMetrics::for_stage(Active).progress_percentage, 100.0);
        assert_eq!(ProgressMetrics::for_stage(Entry).stages_completed, 0);
    }

    #[test]
    fn test_content_requirements() {
        assert_eq!(content_requirements(Review).len(), 3);
        assert!(content_requirements(Entry).is_empty());
    }
}

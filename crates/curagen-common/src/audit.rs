//! Append-only audit trail entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::records::{RecordKind, WorkflowStage};
use crate::review::ReviewDecision;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum AuditOperation {
    Created,
    EvidenceUpdated {
        version_number: u32,
    },
    Transition {
        from_stage: WorkflowStage,
        to_stage: WorkflowStage,
        auto_triggered: bool,
    },
    ReviewerAssigned {
        review_id: Uuid,
        reviewer_id: Uuid,
        review_round: u32,
    },
    ReviewSubmitted {
        review_id: Uuid,
        decision: ReviewDecision,
    },
    Activated {
        active_curation_id: Uuid,
        replaced_curation_id: Option<Uuid>,
    },
    Archived {
        reason: String,
    },
}

impl AuditOperation {
    pub fn label(&self) -> &'static str {
        match self {
            AuditOperation::Created => "created",
            AuditOperation::EvidenceUpdated { .. } => "evidence_updated",
            AuditOperation::Transition { .. } => "transition",
            AuditOperation::ReviewerAssigned { .. } => "reviewer_assigned",
            AuditOperation::ReviewSubmitted { .. } => "review_submitted",
            AuditOperation::Activated { .. } => "activated",
            AuditOperation::Archived { .. } => "archived",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub entity_id: Uuid,
    pub entity_kind: RecordKind,
    pub scope_id: Uuid,
    #[serde(flatten)]
    pub operation: AuditOperation,
    pub actor_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub notes: Option<String>,
    /// Record hash after the operation, when it changed the record.
    pub record_hash: Option<String>,
}

impl AuditEntry {
    pub fn is_transition(&self) -> bool {
        matches!(self.operation, AuditOperation::Transition { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_flattens_into_entry() {
        let entry = AuditEntry {
            id: Uuid::nil(),
            entity_id: Uuid::nil(),
            entity_kind: RecordKind::Curation,
            scope_id: Uuid::nil(),
            operation: AuditOperation::Transition {
                from_stage: WorkflowStage::Review,
                to_stage: WorkflowStage::Active,
                auto_triggered: true,
            },
            actor_id: Uuid::nil(),
            timestamp: Utc::now(),
            notes: None,
            record_hash: None,
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["operation"], "transition");
        assert_eq!(value["from_stage"], "review");
        assert_eq!(value["to_stage"], "active");
        assert!(entry.is_transition());
        assert_eq!(entry.operation.label(), "transition");
    }
}

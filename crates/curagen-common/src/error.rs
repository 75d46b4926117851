use thiserror::Error;
use uuid::Uuid;

use crate::records::WorkflowStage;

#[derive(Debug, Error)]
pub enum CuragenError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Transition {from} -> {to} rejected: {}", .reasons.join("; "))]
    TransitionRejected {
        from: WorkflowStage,
        to: WorkflowStage,
        reasons: Vec<String>,
    },

    #[error("4-eyes principle violation: {0}")]
    FourEyes(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Concurrent modification of {id}: expected hash {expected}, found {found}")]
    Conflict { id: Uuid, expected: String, found: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CuragenError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        CuragenError::NotFound { kind, id: id.to_string() }
    }

    /// Itemized reasons a caller can surface to the user, one per blocking rule.
    pub fn reasons(&self) -> Vec<String> {
        match self {
            CuragenError::TransitionRejected { reasons, .. } => reasons.clone(),
            other => vec![other.to_string()],
        }
    }
}

pub type Result<T> = std::result::Result<T, CuragenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_rejection_lists_every_reason() {
        let err = CuragenError::TransitionRejected {
            from: WorkflowStage::Curation,
            to: WorkflowStage::Review,
            reasons: vec![
                "cannot enter review: missing evidence summary".to_string(),
                "cannot enter review: missing computed final score".to_string(),
            ],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Transition curation -> review rejected"));
        assert!(msg.contains("missing evidence summary; cannot enter review"));
        assert_eq!(err.reasons().len(), 2);
    }

    #[test]
    fn test_other_errors_yield_single_reason() {
        let err = CuragenError::not_found("Curation", "abc");
        assert_eq!(err.reasons(), vec!["Curation not found: abc".to_string()]);
    }
}

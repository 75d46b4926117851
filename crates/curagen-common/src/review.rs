//! Peer review assignments on curations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
    NeedsRevision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    RequestChanges,
    Reject,
}

impl ReviewDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewDecision::Approve => "approve",
            ReviewDecision::RequestChanges => "request_changes",
            ReviewDecision::Reject => "reject",
        }
    }

    pub fn resulting_status(&self) -> ReviewStatus {
        match self {
            ReviewDecision::Approve => ReviewStatus::Approved,
            ReviewDecision::RequestChanges => ReviewStatus::NeedsRevision,
            ReviewDecision::Reject => ReviewStatus::Rejected,
        }
    }
}

impl std::fmt::Display for ReviewDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReviewDecision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(ReviewDecision::Approve),
            "request_changes" => Ok(ReviewDecision::RequestChanges),
            "reject" => Ok(ReviewDecision::Reject),
            other => Err(format!(
                "invalid review decision '{other}', expected approve|request_changes|reject"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub curation_id: Uuid,
    pub reviewer_id: Uuid,
    pub assigned_by: Uuid,
    pub review_round: u32,
    pub status: ReviewStatus,
    pub decision: Option<ReviewDecision>,
    pub comments: Option<String>,
    pub assigned_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Review {
    pub fn pending(
        id: Uuid,
        curation_id: Uuid,
        reviewer_id: Uuid,
        assigned_by: Uuid,
        review_round: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            curation_id,
            reviewer_id,
            assigned_by,
            review_round,
            status: ReviewStatus::Pending,
            decision: None,
            comments: None,
            assigned_at: now,
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some() && self.decision.is_some()
    }

    pub fn is_approved(&self) -> bool {
        self.is_completed() && self.decision == Some(ReviewDecision::Approve)
    }

    pub fn complete(&mut self, decision: ReviewDecision, comments: Option<String>, now: DateTime<Utc>) {
        self.decision = Some(decision);
        self.status = decision.resulting_status();
        self.comments = comments;
        self.completed_at = Some(now);
    }
}

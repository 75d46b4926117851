//! Evidence record types: precurations, curations and the published
//! active-curation slot per (gene, clinical scope).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::provenance::compute_record_hash;

// ---------------------------------------------------------------------------
// Workflow stage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    Entry,
    Precuration,
    Curation,
    Review,
    Active,
}

impl WorkflowStage {
    pub const ALL: [WorkflowStage; 5] = [
        WorkflowStage::Entry,
        WorkflowStage::Precuration,
        WorkflowStage::Curation,
        WorkflowStage::Review,
        WorkflowStage::Active,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStage::Entry => "entry",
            WorkflowStage::Precuration => "precuration",
            WorkflowStage::Curation => "curation",
            WorkflowStage::Review => "review",
            WorkflowStage::Active => "active",
        }
    }

    /// Zero-based position in the pipeline.
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkflowStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkflowStage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| format!("unknown workflow stage '{s}'"))
    }
}

// ---------------------------------------------------------------------------
// Record kind / status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Precuration,
    Curation,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Precuration => "precuration",
            RecordKind::Curation => "curation",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Draft,
    Submitted,
    InReview,
    Approved,
    Rejected,
    Active,
    Archived,
}

impl RecordStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RecordStatus::Archived)
    }
}

// ---------------------------------------------------------------------------
// References
// ---------------------------------------------------------------------------

/// `(name, version)` identity of a published schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SchemaRef {
    pub name: String,
    pub version: String,
}

impl SchemaRef {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self { name: name.into(), version: version.into() }
    }
}

impl std::fmt::Display for SchemaRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GeneScope {
    pub gene_id: Uuid,
    pub scope_id: Uuid,
}

// ---------------------------------------------------------------------------
// Evidence record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub id: Uuid,
    pub kind: RecordKind,
    pub gene_id: Uuid,
    pub scope_id: Uuid,
    pub schema: SchemaRef,
    pub workflow_pair_id: Option<Uuid>,
    /// For curations: the precuration this record was handed off from.
    pub precuration_id: Option<Uuid>,
    pub status: RecordStatus,
    pub workflow_stage: WorkflowStage,
    pub evidence_data: Value,
    #[serde(default)]
    pub computed_scores: BTreeMap<String, f64>,
    pub computed_verdict: Option<String>,
    pub review_round: u32,
    pub version_number: u32,
    pub record_hash: String,
    pub previous_hash: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_by: Uuid,
    pub updated_at: DateTime<Utc>,
}

impl EvidenceRecord {
    pub fn new_draft(
        id: Uuid,
        kind: RecordKind,
        gene: GeneScope,
        schema: SchemaRef,
        evidence_data: Value,
        created_by: Uuid,
        now: DateTime<Utc>,
    ) -> Self {
        let workflow_stage = match kind {
            RecordKind::Precuration => WorkflowStage::Entry,
            RecordKind::Curation => WorkflowStage::Curation,
        };
        let mut record = Self {
            id,
            kind,
            gene_id: gene.gene_id,
            scope_id: gene.scope_id,
            schema,
            workflow_pair_id: None,
            precuration_id: None,
            status: RecordStatus::Draft,
            workflow_stage,
            evidence_data,
            computed_scores: BTreeMap::new(),
            computed_verdict: None,
            review_round: 0,
            version_number: 1,
            record_hash: String::new(),
            previous_hash: None,
            created_by,
            created_at: now,
            updated_by: created_by,
            updated_at: now,
        };
        record.record_hash = record.compute_hash();
        record
    }

    pub fn gene_scope(&self) -> GeneScope {
        GeneScope { gene_id: self.gene_id, scope_id: self.scope_id }
    }

    /// Core fields covered by the provenance digest.
    pub fn hash_core(&self) -> Value {
        json!({
            "id": self.id,
            "kind": self.kind,
            "gene_id": self.gene_id,
            "scope_id": self.scope_id,
            "schema": self.schema,
            "status": self.status,
            "workflow_stage": self.workflow_stage,
            "evidence_data": self.evidence_data,
            "computed_scores": self.computed_scores,
            "computed_verdict": self.computed_verdict,
            "review_round": self.review_round,
            "version_number": self.version_number,
        })
    }

    pub fn compute_hash(&self) -> String {
        compute_record_hash(&self.hash_core(), self.previous_hash.as_deref(), self.updated_by)
    }

    /// Start a new link in the hash chain after the caller mutated the record.
    pub fn reseal(&mut self, actor_id: Uuid, now: DateTime<Utc>) {
        self.previous_hash = Some(std::mem::take(&mut self.record_hash));
        self.version_number += 1;
        self.updated_by = actor_id;
        self.updated_at = now;
        self.record_hash = self.compute_hash();
    }

    pub fn verify_hash(&self) -> bool {
        self.record_hash == self.compute_hash()
    }

    pub fn final_score(&self) -> Option<f64> {
        self.computed_scores.get("total_score").copied()
    }

    /// Free-text summary of the evidence, if the curator wrote one.
    pub fn evidence_summary(&self) -> Option<&str> {
        ["evidence_summary", "summary"]
            .iter()
            .filter_map(|key| self.evidence_data.get(*key))
            .filter_map(Value::as_str)
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Active curation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveCuration {
    pub id: Uuid,
    pub gene_id: Uuid,
    pub scope_id: Uuid,
    pub curation_id: Uuid,
    pub verdict: Option<String>,
    pub activated_by: Uuid,
    pub activated_at: DateTime<Utc>,
    /// Curation this row superseded, if any.
    pub replaced_curation_id: Option<Uuid>,
    pub archived_at: Option<DateTime<Utc>>,
    pub archived_by: Option<Uuid>,
    pub archive_reason: Option<String>,
}

impl ActiveCuration {
    pub fn is_current(&self) -> bool {
        self.archived_at.is_none()
    }

    pub fn gene_scope(&self) -> GeneScope {
        GeneScope { gene_id: self.gene_id, scope_id: self.scope_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EvidenceRecord {
        EvidenceRecord::new_draft(
            Uuid::new_v4(),
            RecordKind::Curation,
            GeneScope { gene_id: Uuid::new_v4(), scope_id: Uuid::new_v4() },
            SchemaRef::new("ClinGen_SOP_v11", "1.0.0"),
            json!({"evidence_summary": "  ", "summary": "LoF variants in 9 probands"}),
            Uuid::new_v4(),
            Utc::now(),
        )
    }

    #[test]
    fn test_new_draft_starts_chain() {
        let record = sample();
        assert_eq!(record.status, RecordStatus::Draft);
        assert_eq!(record.workflow_stage, WorkflowStage::Curation);
        assert_eq!(record.version_number, 1);
        assert!(record.previous_hash.is_none());
        assert!(record.verify_hash());
    }

    #[test]
    fn test_reseal_links_previous_hash() {
        let mut record = sample();
        let first = record.record_hash.clone();
        record.evidence_data["summary"] = json!("updated");
        let editor = Uuid::new_v4();
        record.reseal(editor, Utc::now());
        assert_eq!(record.previous_hash.as_deref(), Some(first.as_str()));
        assert_eq!(record.version_number, 2);
        assert_eq!(record.updated_by, editor);
        assert!(record.verify_hash());
        assert_ne!(record.record_hash, first);
    }

    #[test]
    fn test_tampering_breaks_hash() {
        let mut record = sample();
        record.computed_verdict = Some("Definitive".into());
        assert!(!record.verify_hash());
    }

    #[test]
    fn test_evidence_summary_skips_blank_values() {
        let record = sample();
        assert_eq!(record.evidence_summary(), Some("LoF variants in 9 probands"));
    }

    #[test]
    fn test_stage_parse_and_index() {
        assert_eq!("review".parse::<WorkflowStage>().unwrap(), WorkflowStage::Review);
        assert_eq!(WorkflowStage::Active.index(), 4);
        assert!("published".parse::<WorkflowStage>().is_err());
    }
}

//! Repository capabilities consumed by the workflow engine.
//!
//! The engine never touches storage directly. Each entity gets a narrow async
//! trait; [`CurationStore`] bundles them so one backend can serve them all.

use async_trait::async_trait;
use curagen_common::{ActiveCuration, AuditEntry, EvidenceRecord, GeneScope, Result, Review, SchemaRef};
use curagen_schema::{CurationSchema, WorkflowPair};
use uuid::Uuid;

#[async_trait]
pub trait RecordRepository: Send + Sync {
    async fn get_record(&self, id: Uuid) -> Result<Option<EvidenceRecord>>;

    /// Insert a new record. Fails with `Conflict` if the id is taken.
    async fn insert_record(&self, record: &EvidenceRecord) -> Result<()>;

    /// Replace a record only if the stored hash still equals `expected_hash`
    /// and the new record chains onto it.
    async fn update_record(&self, record: &EvidenceRecord, expected_hash: &str) -> Result<()>;

    async fn records_for(&self, gene_scope: GeneScope) -> Result<Vec<EvidenceRecord>>;
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn get_review(&self, id: Uuid) -> Result<Option<Review>>;

    async fn insert_review(&self, review: &Review) -> Result<()>;

    async fn update_review(&self, review: &Review) -> Result<()>;

    /// All reviews on a curation, oldest assignment first.
    async fn reviews_for(&self, curation_id: Uuid) -> Result<Vec<Review>>;
}

#[async_trait]
pub trait ActiveCurationRepository: Send + Sync {
    async fn current_active(&self, gene_scope: GeneScope) -> Result<Option<ActiveCuration>>;

    /// Archive the current row for the pair (if any) and insert `row` as one
    /// atomic step. Returns the archived row.
    async fn activate(&self, row: ActiveCuration, reason: &str) -> Result<Option<ActiveCuration>>;

    /// Every row for the pair, archived ones included, oldest first.
    async fn active_history(&self, gene_scope: GeneScope) -> Result<Vec<ActiveCuration>>;
}

#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn append(&self, entry: &AuditEntry) -> Result<()>;

    async fn entries_for(&self, entity_id: Uuid) -> Result<Vec<AuditEntry>>;
}

#[async_trait]
pub trait SchemaRepository: Send + Sync {
    async fn get_schema(&self, schema: &SchemaRef) -> Result<Option<CurationSchema>>;

    /// Store a published schema. Re-publishing the same `(name, version)` is
    /// accepted only when the hash is identical.
    async fn save_schema(&self, schema: &CurationSchema) -> Result<()>;

    async fn list_schemas(&self) -> Result<Vec<SchemaRef>>;

    async fn get_workflow_pair(&self, id: Uuid) -> Result<Option<WorkflowPair>>;

    async fn save_workflow_pair(&self, pair: &WorkflowPair) -> Result<()>;
}

/// Everything the workflow engine needs from storage.
pub trait CurationStore:
    RecordRepository + ReviewRepository + ActiveCurationRepository + AuditRepository + SchemaRepository
{
}

impl<T> CurationStore for T where
    T: RecordRepository + ReviewRepository + ActiveCurationRepository + AuditRepository + SchemaRepository
{
}

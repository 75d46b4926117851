//! In-memory [`CurationStore`], used by tests and the CLI.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use curagen_common::{
    ActiveCuration, AuditEntry, CuragenError, EvidenceRecord, GeneScope, Result, Review, SchemaRef,
};
use curagen_schema::{CurationSchema, WorkflowPair};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::repository::{
    ActiveCurationRepository, AuditRepository, RecordRepository, ReviewRepository, SchemaRepository,
};

#[derive(Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<Uuid, EvidenceRecord>>,
    reviews: RwLock<Vec<Review>>,
    active: RwLock<Vec<ActiveCuration>>,
    audit: RwLock<Vec<AuditEntry>>,
    schemas: RwLock<BTreeMap<SchemaRef, CurationSchema>>,
    pairs: RwLock<HashMap<Uuid, WorkflowPair>>,
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore").finish_non_exhaustive()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordRepository for InMemoryStore {
    async fn get_record(&self, id: Uuid) -> Result<Option<EvidenceRecord>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn insert_record(&self, record: &EvidenceRecord) -> Result<()> {
        let mut records = self.records.write().await;
        if let Some(existing) = records.get(&record.id) {
            return Err(CuragenError::Conflict {
                id: record.id,
                expected: String::new(),
                found: existing.record_hash.clone(),
            });
        }
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn update_record(&self, record: &EvidenceRecord, expected_hash: &str) -> Result<()> {
        let mut records = self.records.write().await;
        let stored = records
            .get_mut(&record.id)
            .ok_or_else(|| CuragenError::not_found(record.kind.as_str(), record.id))?;
        if stored.record_hash != expected_hash {
            return Err(CuragenError::Conflict {
                id: record.id,
                expected: expected_hash.to_string(),
                found: stored.record_hash.clone(),
            });
        }
        if record.previous_hash.as_deref() != Some(expected_hash) || !record.verify_hash() {
            return Err(CuragenError::InvalidInput(format!(
                "record {} does not extend its provenance chain",
                record.id
            )));
        }
        *stored = record.clone();
        Ok(())
    }

    async fn records_for(&self, gene_scope: GeneScope) -> Result<Vec<EvidenceRecord>> {
        let records = self.records.read().await;
        let mut matching: Vec<_> = records
            .values()
            .filter(|r| r.gene_scope() == gene_scope)
            .cloned()
            .collect();
        matching.sort_by_key(|r| r.created_at);
        Ok(matching)
    }
}

#[async_trait]
impl ReviewRepository for InMemoryStore {
    async fn get_review(&self, id: Uuid) -> Result<Option<Review>> {
        Ok(self.reviews.read().await.iter().find(|r| r.id == id).cloned())
    }

    async fn insert_review(&self, review: &Review) -> Result<()> {
        self.reviews.write().await.push(review.clone());
        Ok(())
    }

    async fn update_review(&self, review: &Review) -> Result<()> {
        let mut reviews = self.reviews.write().await;
        let slot = reviews
            .iter_mut()
            .find(|r| r.id == review.id)
            .ok_or_else(|| CuragenError::not_found("review", review.id))?;
        *slot = review.clone();
        Ok(())
    }

    async fn reviews_for(&self, curation_id: Uuid) -> Result<Vec<Review>> {
        Ok(self
            .reviews
            .read()
            .await
            .iter()
            .filter(|r| r.curation_id == curation_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ActiveCurationRepository for InMemoryStore {
    async fn current_active(&self, gene_scope: GeneScope) -> Result<Option<ActiveCuration>> {
        Ok(self
            .active
            .read()
            .await
            .iter()
            .find(|row| row.is_current() && row.gene_scope() == gene_scope)
            .cloned())
    }

    async fn activate(&self, mut row: ActiveCuration, reason: &str) -> Result<Option<ActiveCuration>> {
        // single write guard: no reader sees zero or two current rows
        let mut active = self.active.write().await;
        let previous = active
            .iter_mut()
            .find(|existing| existing.is_current() && existing.gene_scope() == row.gene_scope())
            .map(|existing| {
                existing.archived_at = Some(row.activated_at);
                existing.archived_by = Some(row.activated_by);
                existing.archive_reason = Some(reason.to_string());
                existing.clone()
            });
        row.replaced_curation_id = previous.as_ref().map(|p| p.curation_id);
        active.push(row);
        Ok(previous)
    }

    async fn active_history(&self, gene_scope: GeneScope) -> Result<Vec<ActiveCuration>> {
        Ok(self
            .active
            .read()
            .await
            .iter()
            .filter(|row| row.gene_scope() == gene_scope)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AuditRepository for InMemoryStore {
    async fn append(&self, entry: &AuditEntry) -> Result<()> {
        self.audit.write().await.push(entry.clone());
        Ok(())
    }

    async fn entries_for(&self, entity_id: Uuid) -> Result<Vec<AuditEntry>> {
        Ok(self
            .audit
            .read()
            .await
            .iter()
            .filter(|e| e.entity_id == entity_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SchemaRepository for InMemoryStore {
    async fn get_schema(&self, schema: &SchemaRef) -> Result<Option<CurationSchema>> {
        Ok(self.schemas.read().await.get(schema).cloned())
    }

    async fn save_schema(&self, schema: &CurationSchema) -> Result<()> {
        let key = schema.schema_ref();
        if !schema.is_published() {
            return Err(CuragenError::InvalidInput(format!(
                "Schema {key} must be published before it is stored"
            )));
        }
        let mut schemas = self.schemas.write().await;
        match schemas.get(&key) {
            Some(existing) if existing.schema_hash != schema.schema_hash => Err(CuragenError::InvalidInput(
                format!("Schema {key} is already published with a different definition"),
            )),
            Some(_) => Ok(()),
            None => {
                schemas.insert(key, schema.clone());
                Ok(())
            }
        }
    }

    async fn list_schemas(&self) -> Result<Vec<SchemaRef>> {
        Ok(self.schemas.read().await.keys().cloned().collect())
    }

    async fn get_workflow_pair(&self, id: Uuid) -> Result<Option<WorkflowPair>> {
        Ok(self.pairs.read().await.get(&id).cloned())
    }

    async fn save_workflow_pair(&self, pair: &WorkflowPair) -> Result<()> {
        self.pairs.write().await.insert(pair.id, pair.clone());
        Ok(())
    }
}

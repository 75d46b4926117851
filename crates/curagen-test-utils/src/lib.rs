//! Shared fixtures: sample schemas, workflow pairs, actors and evidence.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use curagen_common::{ActorContext, GeneScope, UserRole};
use curagen_schema::{
    CurationSchema, FieldDefinition, FieldType, SchemaType, ScoringConfiguration, SelectOption, WorkflowPair,
};
use serde_json::{json, Value};
use uuid::Uuid;

pub const CLINGEN_SCHEMA: &str = "ClinGen_SOP_v11";
pub const PRECURATION_SCHEMA: &str = "ClinGen_Precuration";
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Fixed start time for deterministic clocks.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).single().unwrap_or_else(Utc::now)
}

pub fn gene_scope() -> GeneScope {
    GeneScope { gene_id: Uuid::new_v4(), scope_id: Uuid::new_v4() }
}

// ── Actors ──────────────────────────────────────────────────────────────────

pub fn actor(role: UserRole, scope_id: Uuid) -> ActorContext {
    ActorContext::new(Uuid::new_v4(), role).with_scope(scope_id)
}

pub fn curator(scope_id: Uuid) -> ActorContext {
    actor(UserRole::Curator, scope_id)
}

pub fn reviewer(scope_id: Uuid) -> ActorContext {
    actor(UserRole::Reviewer, scope_id)
}

pub fn scope_admin(scope_id: Uuid) -> ActorContext {
    actor(UserRole::ScopeAdmin, scope_id)
}

pub fn admin() -> ActorContext {
    ActorContext::new(Uuid::new_v4(), UserRole::Admin)
}

pub fn viewer(scope_id: Uuid) -> ActorContext {
    actor(UserRole::Viewer, scope_id)
}

// ── Schemas ─────────────────────────────────────────────────────────────────

fn text(label: &str) -> FieldDefinition {
    FieldDefinition::new(FieldType::Text).labeled(label)
}

/// Precuration schema: disease association, inheritance and lumping/splitting.
pub fn precuration_schema() -> CurationSchema {
    let mut schema = CurationSchema::new(PRECURATION_SCHEMA, SCHEMA_VERSION, SchemaType::Precuration);
    schema.field_definitions = BTreeMap::from([
        ("disease_name".to_string(), text("Disease").required()),
        (
            "mondo_id".to_string(),
            FieldDefinition { pattern: Some(r"MONDO:\d{7}".into()), ..text("MONDO ID") },
        ),
        (
            "mode_of_inheritance".to_string(),
            FieldDefinition {
                options: ["Autosomal dominant", "Autosomal recessive", "X-linked"]
                    .into_iter()
                    .map(|o| SelectOption::Plain(json!(o)))
                    .collect(),
                ..FieldDefinition::new(FieldType::Select).labeled("Mode of inheritance").required()
            },
        ),
        ("lumping_splitting_notes".to_string(), text("Lumping and splitting")),
    ]);
    schema
}

/// ClinGen SOP v11 curation schema scored by `clingen_sop_v11`.
pub fn clingen_schema() -> CurationSchema {
    let mut schema = CurationSchema::new(CLINGEN_SCHEMA, SCHEMA_VERSION, SchemaType::Curation);
    schema.field_definitions = BTreeMap::from([
        ("disease_name".to_string(), text("Disease").required()),
        ("mode_of_inheritance".to_string(), text("Mode of inheritance")),
        ("evidence_summary".to_string(), text("Evidence summary").required()),
        (
            "genetic_evidence".to_string(),
            FieldDefinition::new(FieldType::Object).labeled("Genetic evidence"),
        ),
        (
            "experimental_evidence".to_string(),
            FieldDefinition::new(FieldType::Object).labeled("Experimental evidence"),
        ),
        (
            "contradictory_evidence".to_string(),
            FieldDefinition::new(FieldType::Array).labeled("Contradictory evidence"),
        ),
    ]);
    schema.business_rules = vec!["clingen_genetic_evidence".into(), "clingen_experimental_evidence".into()];
    schema.scoring_configuration = Some(ScoringConfiguration::for_engine("clingen_sop_v11"));
    schema.ui_configuration = Some(json!({"sections": [{"name": "Evidence", "fields": ["evidence_summary"]}]}));
    schema
}

/// Pair carrying disease and inheritance from precuration into curation.
pub fn workflow_pair() -> WorkflowPair {
    WorkflowPair {
        id: Uuid::new_v4(),
        name: "ClinGen standard".into(),
        version: SCHEMA_VERSION.into(),
        precuration_schema: precuration_schema().schema_ref(),
        curation_schema: clingen_schema().schema_ref(),
        data_mapping: BTreeMap::from([
            ("disease_name".to_string(), "disease_name".to_string()),
            ("mode_of_inheritance".to_string(), "mode_of_inheritance".to_string()),
        ]),
        description: None,
    }
}

// ── Evidence ────────────────────────────────────────────────────────────────

pub fn precuration_evidence() -> Value {
    json!({
        "disease_name": "Hereditary breast and ovarian cancer",
        "mondo_id": "MONDO:0011450",
        "mode_of_inheritance": "Autosomal dominant",
        "lumping_splitting_notes": "Single entity per ClinGen lumping guidance",
    })
}

fn case(points: f64, pmid: &str, proband: &str) -> Value {
    json!({"points": points, "pmid": pmid, "proband_label": proband})
}

/// Case-level points 9, segregation points 5: a Definitive classification.
pub fn definitive_evidence() -> Value {
    json!({
        "disease_name": "Hereditary breast and ovarian cancer",
        "mode_of_inheritance": "Autosomal dominant",
        "evidence_summary": "Loss-of-function variants in nine unrelated probands with segregation in two families",
        "genetic_evidence": {
            "case_level_data": [
                case(2.0, "20301425", "P1"),
                case(2.0, "20301426", "P2"),
                case(2.0, "20301427", "P3"),
                case(2.0, "20301428", "P4"),
                case(1.0, "20301429", "P5"),
            ],
            "segregation_data": [
                {"points": 3.0, "pmid": "21111111"},
                {"points": 2.0, "pmid": "21111112"},
            ],
        },
        "experimental_evidence": {},
        "contradictory_evidence": [],
    })
}

/// Curation evidence with nothing scored and no summary.
pub fn empty_curation_evidence() -> Value {
    json!({"disease_name": "Hereditary breast and ovarian cancer"})
}

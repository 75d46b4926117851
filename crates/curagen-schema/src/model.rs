//! Schema model: methodology descriptors and workflow pairs.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use curagen_common::provenance::{canonical_json, sha256_hex};
use curagen_common::SchemaRef;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::path::{get_path, set_path};

// ── Field types ─────────────────────────────────────────────────────────────

/// Declared type of a schema field. Unrecognised type names are preserved so
/// an evolving schema never fails to load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    #[default]
    Text,
    Number,
    Boolean,
    Array,
    Object,
    Date,
    Select,
    Multiselect,
    Email,
    Url,
    Pmid,
    HgncId,
    Score,
    Unknown(String),
}

impl FieldType {
    pub const KNOWN: [&'static str; 13] = [
        "text", "number", "boolean", "array", "object", "date", "select",
        "multiselect", "email", "url", "pmid", "hgnc_id", "score",
    ];

    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
            FieldType::Date => "date",
            FieldType::Select => "select",
            FieldType::Multiselect => "multiselect",
            FieldType::Email => "email",
            FieldType::Url => "url",
            FieldType::Pmid => "pmid",
            FieldType::HgncId => "hgnc_id",
            FieldType::Score => "score",
            FieldType::Unknown(other) => other,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, FieldType::Unknown(_))
    }
}

impl From<String> for FieldType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "text" => FieldType::Text,
            "number" => FieldType::Number,
            "boolean" => FieldType::Boolean,
            "array" => FieldType::Array,
            "object" => FieldType::Object,
            "date" => FieldType::Date,
            "select" => FieldType::Select,
            "multiselect" => FieldType::Multiselect,
            "email" => FieldType::Email,
            "url" => FieldType::Url,
            "pmid" => FieldType::Pmid,
            "hgnc_id" => FieldType::HgncId,
            "score" => FieldType::Score,
            _ => FieldType::Unknown(s),
        }
    }
}

impl From<FieldType> for String {
    fn from(t: FieldType) -> Self {
        t.as_str().to_string()
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Select option: either a bare value or `{value, label}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectOption {
    Labeled {
        value: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    Plain(Value),
}

impl SelectOption {
    pub fn value(&self) -> &Value {
        match self {
            SelectOption::Labeled { value, .. } => value,
            SelectOption::Plain(value) => value,
        }
    }
}

fn default_true() -> bool { true }

fn is_true(b: &bool) -> bool { *b }

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldDefinition {
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,

    // text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub quality_checks: bool,

    // number / score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimal_places: Option<usize>,

    // array / object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldDefinition>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, FieldDefinition>,

    // select / multiselect
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,

    // date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_date: Option<String>,
}

impl FieldDefinition {
    pub fn new(field_type: FieldType) -> Self {
        Self { field_type, quality_checks: true, ..Default::default() }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn labeled(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn option_values(&self) -> Vec<&Value> {
        self.options.iter().map(SelectOption::value).collect()
    }
}

// ── Validation rules ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RuleKind {
    #[default]
    Condition,
    Dependency,
    Calculation,
    Unsupported(String),
}

impl From<String> for RuleKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "condition" => RuleKind::Condition,
            "dependency" => RuleKind::Dependency,
            "calculation" => RuleKind::Calculation,
            _ => RuleKind::Unsupported(s),
        }
    }
}

impl From<RuleKind> for String {
    fn from(k: RuleKind) -> Self {
        match k {
            RuleKind::Condition => "condition".into(),
            RuleKind::Dependency => "dependency".into(),
            RuleKind::Calculation => "calculation".into(),
            RuleKind::Unsupported(s) => s,
        }
    }
}

/// A named cross-field rule. Only existence conditions and dependencies are
/// evaluated; compound conditions and calculations are reported as
/// limitations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(rename = "type", default)]
    pub kind: RuleKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ── Scoring configuration ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoringConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    /// Engine-specific options, passed through untouched.
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl ScoringConfiguration {
    pub fn for_engine(engine: &str) -> Self {
        Self { engine: Some(engine.to_string()), options: Map::new() }
    }

    pub fn as_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

// ── Curation schema ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaType {
    Precuration,
    Curation,
    #[default]
    Combined,
}

/// Immutable-once-published methodology descriptor, identified by
/// `(name, version)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurationSchema {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub schema_type: SchemaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(default)]
    pub field_definitions: BTreeMap<String, FieldDefinition>,
    #[serde(default)]
    pub validation_rules: BTreeMap<String, ValidationRule>,
    #[serde(default)]
    pub business_rules: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scoring_configuration: Option<ScoringConfiguration>,
    #[serde(default)]
    pub workflow_states: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_configuration: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub based_on: Option<SchemaRef>,
    /// Set by [`CurationSchema::publish`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_hash: Option<String>,
}

impl CurationSchema {
    pub fn new(name: &str, version: &str, schema_type: SchemaType) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            version: version.to_string(),
            schema_type,
            description: None,
            institution: None,
            field_definitions: BTreeMap::new(),
            validation_rules: BTreeMap::new(),
            business_rules: Vec::new(),
            scoring_configuration: None,
            workflow_states: vec!["draft".into(), "submitted".into()],
            ui_configuration: None,
            based_on: None,
            schema_hash: None,
        }
    }

    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        let schema: Self = serde_yaml::from_str(content).context("invalid YAML curation schema")?;
        Ok(schema)
    }

    pub fn from_json_str(content: &str) -> anyhow::Result<Self> {
        let schema: Self = serde_json::from_str(content).context("invalid JSON curation schema")?;
        Ok(schema)
    }

    /// Load from a `.yaml`/`.yml` or `.json` file.
    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read schema file {}", path.display()))?;
        let parsed = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        };
        parsed.with_context(|| format!("failed to parse schema file {}", path.display()))
    }

    pub fn schema_ref(&self) -> SchemaRef {
        SchemaRef::new(&self.name, &self.version)
    }

    pub fn scoring_engine(&self) -> Option<&str> {
        self.scoring_configuration.as_ref().and_then(|c| c.engine.as_deref())
    }

    /// Digest over the definition, excluding identity and the hash itself.
    pub fn compute_hash(&self) -> String {
        let mut doc = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut doc {
            map.remove("id");
            map.remove("schema_hash");
        }
        sha256_hex(&canonical_json(&doc))
    }

    /// Freeze the definition: records its hash. Returns the hash.
    pub fn publish(&mut self) -> String {
        let hash = self.compute_hash();
        self.schema_hash = Some(hash.clone());
        hash
    }

    pub fn is_published(&self) -> bool {
        self.schema_hash.is_some()
    }

    /// True when a published schema still matches its recorded hash.
    pub fn verify_hash(&self) -> bool {
        self.schema_hash.as_deref() == Some(self.compute_hash().as_str())
    }

    /// The definition as a raw document, for the schema self-check.
    pub fn to_definition(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

// ── Workflow pair ───────────────────────────────────────────────────────────

/// Binds the precuration and curation schemas used for one clinical scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowPair {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    pub version: String,
    pub precuration_schema: SchemaRef,
    pub curation_schema: SchemaRef,
    /// Precuration field path -> curation field path.
    #[serde(default)]
    pub data_mapping: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl WorkflowPair {
    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        let pair: Self = serde_yaml::from_str(content).context("invalid YAML workflow pair")?;
        Ok(pair)
    }

    pub fn from_json_str(content: &str) -> anyhow::Result<Self> {
        let pair: Self = serde_json::from_str(content).context("invalid JSON workflow pair")?;
        Ok(pair)
    }

    /// Seed curation evidence from precuration evidence. With an empty
    /// mapping every top-level field carries over unchanged.
    pub fn map_precuration_data(&self, precuration: &Value) -> Value {
        if self.data_mapping.is_empty() {
            return match precuration {
                Value::Object(_) => precuration.clone(),
                _ => Value::Object(Map::new()),
            };
        }
        let mut out = Value::Object(Map::new());
        for (source, target) in &self.data_mapping {
            if let Some(value) = get_path(precuration, source) {
                set_path(&mut out, target, value.clone());
            }
        }
        out
    }
}

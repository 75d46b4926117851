//! Configuration loading for Curagen.
//! Reads curagen.toml from the current directory or the path in CURAGEN_CONFIG.

use std::path::{Path, PathBuf};

use curagen_schema::{CurationSchema, ValidatorSettings, WorkflowPair};
use curagen_scoring::registry::BUILTIN_ENGINES;
use curagen_scoring::ScoringRegistry;
use curagen_workflow::WorkflowSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_ENV: &str = "CURAGEN_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "curagen.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid YAML in {path}: {source}")]
    Yaml { path: PathBuf, source: serde_yaml::Error },

    #[error("Invalid JSON in {path}: {source}")]
    Json { path: PathBuf, source: serde_json::Error },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "bool_true")]
    pub text_quality_checks: bool,
    #[serde(default = "default_completeness_threshold")]
    pub completeness_suggestion_threshold: f64,
    #[serde(default = "default_min_words")]
    pub min_descriptive_words: usize,
}

fn bool_true() -> bool { true }
fn default_completeness_threshold() -> f64 { 50.0 }
fn default_min_words() -> usize { 3 }

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            text_quality_checks: bool_true(),
            completeness_suggestion_threshold: default_completeness_threshold(),
            min_descriptive_words: default_min_words(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_engines")]
    pub enabled_engines: Vec<String>,
    #[serde(default = "default_pmid_digits")]
    pub strict_pmid_min_digits: usize,
}

fn default_engines() -> Vec<String> {
    BUILTIN_ENGINES.iter().map(|s| s.to_string()).collect()
}
fn default_pmid_digits() -> usize { 7 }

impl Default for ScoringConfig {
    fn default() -> Self {
        Self { enabled_engines: default_engines(), strict_pmid_min_digits: default_pmid_digits() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default = "bool_true")]
    pub require_review_before_activation: bool,
    #[serde(default = "bool_true")]
    pub auto_activate_on_approval: bool,
    #[serde(default = "bool_true")]
    pub enforce_scope_membership: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            require_review_before_activation: true,
            auto_activate_on_approval: true,
            enforce_scope_membership: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String { "curagen=info,warn".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: default_log_filter() }
    }
}

/// Where schema and workflow-pair definition files live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_schema_dir")]
    pub schema_dir: PathBuf,
}

fn default_schema_dir() -> PathBuf { PathBuf::from("schemas") }

impl Default for CatalogConfig {
    fn default() -> Self {
        Self { schema_dir: default_schema_dir() }
    }
}

#[cfg(test)]
mod tests;

impl Config {
    /// Load configuration from curagen.toml.
    /// Checks CURAGEN_CONFIG first, then the current directory. A missing
    /// default file yields the built-in defaults; a missing explicit path is
    /// an error.
    pub fn load() -> Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_path(path),
            Err(_) if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_path(DEFAULT_CONFIG_FILE),
            Err(_) => {
                tracing::info!("No {DEFAULT_CONFIG_FILE} found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let threshold = self.validation.completeness_suggestion_threshold;
        if !(0.0..=100.0).contains(&threshold) {
            return Err(ConfigError::Invalid(format!(
                "validation.completeness_suggestion_threshold must be within 0-100, got {threshold}"
            )));
        }
        if self.scoring.strict_pmid_min_digits == 0 || self.scoring.strict_pmid_min_digits > 10 {
            return Err(ConfigError::Invalid(format!(
                "scoring.strict_pmid_min_digits must be within 1-10, got {}",
                self.scoring.strict_pmid_min_digits
            )));
        }
        if let Some(unknown) = self
            .scoring
            .enabled_engines
            .iter()
            .find(|name| !BUILTIN_ENGINES.contains(&name.as_str()))
        {
            return Err(ConfigError::Invalid(format!(
                "scoring.enabled_engines: unknown engine '{unknown}' (available: {})",
                BUILTIN_ENGINES.join(", ")
            )));
        }
        Ok(())
    }

    pub fn validator_settings(&self) -> ValidatorSettings {
        ValidatorSettings {
            text_quality_checks: self.validation.text_quality_checks,
            completeness_suggestion_threshold: self.validation.completeness_suggestion_threshold,
            min_descriptive_words: self.validation.min_descriptive_words,
        }
    }

    pub fn workflow_settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            require_review_before_activation: self.workflow.require_review_before_activation,
            auto_activate_on_approval: self.workflow.auto_activate_on_approval,
            enforce_scope_membership: self.workflow.enforce_scope_membership,
        }
    }

    pub fn scoring_registry(&self) -> ScoringRegistry {
        ScoringRegistry::with_builtin_engines(&self.scoring.enabled_engines, self.scoring.strict_pmid_min_digits)
    }
}

// ── Schema catalog ──────────────────────────────────────────────────────────

/// Schemas and workflow pairs read from a catalog directory.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub schemas: Vec<CurationSchema>,
    pub pairs: Vec<WorkflowPair>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DefinitionKind {
    Schema,
    Pair,
}

fn classify(path: &Path) -> Option<(DefinitionKind, bool)> {
    let name = path.file_name()?.to_str()?;
    let (stem, is_json) = if let Some(stem) = name.strip_suffix(".json") {
        (stem, true)
    } else if let Some(stem) = name.strip_suffix(".yaml").or_else(|| name.strip_suffix(".yml")) {
        (stem, false)
    } else {
        return None;
    };
    if stem.ends_with(".pair") {
        Some((DefinitionKind::Pair, is_json))
    } else {
        Some((DefinitionKind::Schema, is_json))
    }
}

fn parse<T: serde::de::DeserializeOwned>(path: &Path, content: &str, is_json: bool) -> Result<T> {
    if is_json {
        serde_json::from_str(content).map_err(|source| ConfigError::Json { path: path.to_path_buf(), source })
    } else {
        serde_yaml::from_str(content).map_err(|source| ConfigError::Yaml { path: path.to_path_buf(), source })
    }
}

impl Catalog {
    /// Read every `*.yaml`, `*.yml` and `*.json` file in `dir`. Files named
    /// `*.pair.<ext>` are workflow pairs; everything else is a schema.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let io_err = |source| ConfigError::Io { path: dir.to_path_buf(), source };
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(io_err)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect();
        paths.sort();

        let mut catalog = Catalog::default();
        for path in paths {
            let Some((kind, is_json)) = classify(&path) else {
                continue;
            };
            let content = std::fs::read_to_string(&path)
                .map_err(|source| ConfigError::Io { path: path.clone(), source })?;
            match kind {
                DefinitionKind::Schema => catalog.schemas.push(parse(&path, &content, is_json)?),
                DefinitionKind::Pair => catalog.pairs.push(parse(&path, &content, is_json)?),
            }
        }
        tracing::info!(
            dir = %dir.display(),
            schemas = catalog.schemas.len(),
            pairs = catalog.pairs.len(),
            "Schema catalog loaded"
        );
        Ok(catalog)
    }

    pub fn schema(&self, name: &str, version: Option<&str>) -> Option<&CurationSchema> {
        self.schemas
            .iter()
            .filter(|s| s.name == name && version.map_or(true, |v| s.version == v))
            .last()
    }
}

//! curagen-scoring: Pluggable scoring engines that turn curated evidence
//! into numeric scores and a categorical verdict.
//!
//! Engines implement [`ScoringEngine`] and are looked up by name from a
//! schema's `scoring_configuration.engine` through a [`ScoringRegistry`].
//! Built-ins:
//!   - `clingen_sop_v11`        points-based, ClinGen SOP v11 caps and thresholds
//!   - `gencc_based`            the same points framework labelled for GenCC
//!   - `qualitative_assessment` ordinal clinical / literature assessment

pub mod engine;
pub mod evidence;
pub mod points;
pub mod qualitative;
pub mod registry;

pub use engine::{EngineInfo, ScoringEngine, ScoringMetadata, ScoringResult};
pub use points::{PointsEngine, PointsMethodology};
pub use qualitative::QualitativeEngine;
pub use registry::ScoringRegistry;

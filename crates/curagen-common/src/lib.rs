//! curagen-common: Shared types, errors, and provenance helpers used across all Curagen crates.

pub mod error;
pub mod actor;
pub mod records;
pub mod review;
pub mod audit;
pub mod clock;
pub mod provenance;

// Re-export commonly used types
pub use error::{CuragenError, Result};
pub use actor::{ActorContext, UserRole};
pub use records::{
    ActiveCuration, EvidenceRecord, GeneScope, RecordKind, RecordStatus, SchemaRef, WorkflowStage,
};
pub use review::{Review, ReviewDecision, ReviewStatus};
pub use audit::{AuditEntry, AuditOperation};
pub use clock::{Clock, FixedClock, SystemClock};

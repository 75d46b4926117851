//! curagen-workflow: The curation workflow state machine.
//!
//! Records move `entry -> precuration -> curation -> review -> active`.
//! [`WorkflowEngine`] checks each move against the stage adjacency table,
//! the role matrix, the 4-eyes rule and stage-entry content requirements,
//! then applies it through a [`CurationStore`]. Writes are guarded by the
//! record's provenance hash, so two racing transitions cannot both commit.

pub mod stage;
pub mod repository;
pub mod memory;
pub mod requirements;
pub mod engine;
pub mod service;

pub use engine::{
    NewRecord, ReviewOutcome, TransitionRecord, TransitionValidation, WorkflowEngine, WorkflowSettings,
    WorkflowState,
};
pub use memory::InMemoryStore;
pub use repository::{
    ActiveCurationRepository, AuditRepository, CurationStore, RecordRepository, ReviewRepository,
    SchemaRepository,
};
pub use service::CurationService;
pub use stage::ProgressMetrics;

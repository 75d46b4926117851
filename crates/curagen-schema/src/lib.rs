//! curagen-schema: Declarative curation schemas and the evidence validator.
//!
//! A [`CurationSchema`] describes a methodology: typed field definitions,
//! named validation rules, business-rule names and an optional scoring
//! configuration. [`SchemaValidator`] checks an evidence payload against a
//! schema and never fails: every problem is reported in the returned
//! [`ValidationResult`].

pub mod model;
pub mod path;
pub mod result;
pub mod fields;
pub mod rules;
pub mod business;
pub mod validator;
pub mod definition;
pub mod json_schema;

pub use model::{
    CurationSchema, FieldDefinition, FieldType, RuleKind, SchemaType, ScoringConfiguration,
    SelectOption, ValidationRule, WorkflowPair,
};
pub use result::{BusinessRuleViolation, FieldIssues, IssueKind, Severity, ValidationIssue, ValidationResult};
pub use business::{BusinessRule, BusinessRuleRegistry};
pub use validator::{SchemaValidator, ValidatorSettings};
pub use json_schema::generate_json_schema;

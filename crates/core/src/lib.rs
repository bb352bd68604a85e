//! # Intake Core
//!
//! Core business logic for the clinical intake engine.
//!
//! This crate turns a loosely-typed patient intake record into FHIR resources and walks the
//! resulting bundle through an approval workflow:
//! - Diagnosis code mapping between the local code system and ICD-11
//! - The intake form with registry auto-fill and read-only rules
//! - Pure resource building and bundle assembly
//! - The validation → consent → submission state machine and the session that drives it
//!
//! **No transport concerns**: submission goes through the [`SubmissionSink`] trait; the wire
//! models themselves live in the `fhir` crate.

pub mod builder;
pub mod bundle;
pub mod config;
pub mod constants;
pub mod error;
pub mod record;
pub mod registry;
pub mod session;
pub mod terminology;
pub mod timer;
pub mod workflow;

pub use builder::{ClinicalEncounterContext, ResourceBuilder};
pub use bundle::{assemble, BundleParts};
pub use config::IntakeConfig;
pub use error::{IntakeError, IntakeResult};
pub use record::{IntakeForm, PatientRecord, RecordField, RequiredFields};
pub use registry::PatientRegistry;
pub use session::{IntakeSession, SubmissionSink};
pub use terminology::{ClassificationCode, CodeMappingTable, DiagnosisEntry};
pub use timer::ConsentTimer;
pub use workflow::{
    ConsentStatus, Effect, Outcome, Rejection, SubmissionStatus, ValidationStatus,
    WorkflowEvent, WorkflowState,
};

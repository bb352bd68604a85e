//! FHIR wire/boundary support for the clinical intake engine.
//!
//! This crate provides **wire models** and **format helpers** for the resources the intake
//! engine produces:
//! - Patient, Condition, Observation, Encounter, Consent
//! - a collection Bundle aggregating the first four
//!
//! This crate focuses on:
//! - FHIR R4 semantic alignment of the JSON shape
//! - canonical serialisation (field declaration order, two-space indentation)
//! - strict deserialisation for previews and round-trip checks
//!
//! It holds no mapping logic: turning intake records into these structs is the job of
//! `intake-core`.

pub mod bundle;
pub mod condition;
pub mod consent;
pub mod datatypes;
pub mod encounter;
pub mod observation;
pub mod patient;
pub mod resource;

// Re-export resource structs
pub use bundle::{BundleEntry, BundleResource, BundleType, BundledResource};
pub use condition::ConditionResource;
pub use consent::{ConsentPolicy, ConsentResource};
pub use encounter::{EncounterParticipant, EncounterResource};
pub use observation::ObservationResource;
pub use patient::PatientResource;
pub use resource::{Resource, ResourceType};

// Re-export shared datatypes
pub use datatypes::{
    Address, CodeableConcept, Coding, ContactPoint, HumanName, Identifier, Meta, Period,
    Quantity, Reference,
};

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;

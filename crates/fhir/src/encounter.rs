//! FHIR Encounter wire model.

use crate::datatypes::{CodeableConcept, Coding, Meta, Period, Reference};
use serde::{Deserialize, Serialize};

/// Wire representation of an Encounter resource.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EncounterResource {
    pub id: String,

    pub meta: Meta,

    pub status: String,

    /// R4 models `Encounter.class` as a bare Coding.
    pub class: Coding,

    pub subject: Reference,

    pub participant: Vec<EncounterParticipant>,

    pub period: Period,

    #[serde(rename = "reasonCode")]
    pub reason_code: Vec<CodeableConcept>,
}

/// A practitioner taking part in the encounter.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EncounterParticipant {
    pub individual: Reference,
}

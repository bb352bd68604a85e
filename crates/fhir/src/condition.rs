//! FHIR Condition wire model.
//!
//! The `code` concept carries the diagnosis under two coding systems at once: an ICD-11
//! classification code and the local NAMASTE code.

use crate::datatypes::{CodeableConcept, Meta, Reference};
use serde::{Deserialize, Serialize};

/// Wire representation of a Condition resource.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConditionResource {
    pub id: String,

    pub meta: Meta,

    #[serde(rename = "clinicalStatus")]
    pub clinical_status: CodeableConcept,

    #[serde(rename = "verificationStatus")]
    pub verification_status: CodeableConcept,

    pub code: CodeableConcept,

    pub subject: Reference,

    pub encounter: Reference,

    #[serde(rename = "recordedDate")]
    pub recorded_date: String,
}

impl ConditionResource {
    /// Returns the code for `system` from the condition's coding list.
    pub fn code_for_system(&self, system: &str) -> Option<&str> {
        self.code
            .coding
            .iter()
            .find(|c| c.system == system)
            .map(|c| c.code.as_str())
    }
}

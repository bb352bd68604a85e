//! FHIR Consent wire model.

use crate::datatypes::{CodeableConcept, Meta, Reference};
use serde::{Deserialize, Serialize};

/// Wire representation of a Consent resource.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConsentResource {
    pub id: String,

    pub meta: Meta,

    pub status: String,

    pub scope: CodeableConcept,

    pub category: Vec<CodeableConcept>,

    pub patient: Reference,

    #[serde(rename = "dateTime")]
    pub date_time: String,

    pub policy: Vec<ConsentPolicy>,
}

/// Policy the consent is given under.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConsentPolicy {
    pub uri: String,
}

//! FHIR Observation wire model (vital signs).

use crate::datatypes::{CodeableConcept, Meta, Quantity, Reference};
use serde::{Deserialize, Serialize};

/// Wire representation of an Observation resource.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ObservationResource {
    pub id: String,

    pub meta: Meta,

    pub status: String,

    pub category: Vec<CodeableConcept>,

    pub code: CodeableConcept,

    pub subject: Reference,

    #[serde(rename = "valueQuantity")]
    pub value_quantity: Quantity,

    #[serde(rename = "effectiveDateTime")]
    pub effective_date_time: String,
}

//! FHIR Patient wire model.
//!
//! Carries identity and contact data captured on the intake form.

use crate::datatypes::{Address, ContactPoint, HumanName, Identifier, Meta};
use serde::{Deserialize, Serialize};

/// Wire representation of a Patient resource.
///
/// `resourceType` is written by the enclosing [`crate::Resource`] tag.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PatientResource {
    pub id: String,

    pub meta: Meta,

    pub identifier: Vec<Identifier>,

    pub name: Vec<HumanName>,

    pub gender: String,

    #[serde(rename = "birthDate")]
    pub birth_date: String,

    pub telecom: Vec<ContactPoint>,

    pub address: Vec<Address>,
}

impl PatientResource {
    /// Value of the first identifier, if any.
    pub fn primary_identifier(&self) -> Option<&str> {
        self.identifier.first().map(|i| i.value.as_str())
    }
}

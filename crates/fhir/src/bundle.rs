//! FHIR Bundle wire model.
//!
//! Entries can only hold the four clinical resources ([`BundledResource`]); there is no
//! variant for a Bundle, so a bundle can never nest another bundle.

use crate::condition::ConditionResource;
use crate::datatypes::Meta;
use crate::encounter::EncounterResource;
use crate::observation::ObservationResource;
use crate::patient::PatientResource;
use crate::resource::ResourceType;
use serde::{Deserialize, Serialize};

/// Wire representation of a Bundle resource.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BundleResource {
    pub id: String,

    pub meta: Meta,

    #[serde(rename = "type")]
    pub bundle_type: BundleType,

    pub timestamp: String,

    pub entry: Vec<BundleEntry>,
}

impl BundleResource {
    /// `fullUrl` of every entry, in bundle order.
    pub fn full_urls(&self) -> Vec<&str> {
        self.entry.iter().map(|e| e.full_url.as_str()).collect()
    }
}

/// Bundle type. Only `collection` bundles are produced or accepted.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BundleType {
    Collection,
}

/// One bundle entry.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BundleEntry {
    #[serde(rename = "fullUrl")]
    pub full_url: String,

    pub resource: BundledResource,
}

/// A resource that may appear inside a bundle entry.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "resourceType")]
pub enum BundledResource {
    Patient(PatientResource),
    Condition(ConditionResource),
    Observation(ObservationResource),
    Encounter(EncounterResource),
}

impl BundledResource {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            BundledResource::Patient(_) => ResourceType::Patient,
            BundledResource::Condition(_) => ResourceType::Condition,
            BundledResource::Observation(_) => ResourceType::Observation,
            BundledResource::Encounter(_) => ResourceType::Encounter,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            BundledResource::Patient(r) => &r.id,
            BundledResource::Condition(r) => &r.id,
            BundledResource::Observation(r) => &r.id,
            BundledResource::Encounter(r) => &r.id,
        }
    }
}

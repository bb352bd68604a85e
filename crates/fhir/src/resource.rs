//! The tagged resource envelope and its canonical JSON form.
//!
//! Responsibilities:
//! - Discriminate the six intake resources by `resourceType`
//! - Render a resource as canonical JSON (declaration-order keys, two-space indentation)
//! - Strictly parse rendered JSON back, reporting the failing path on schema mismatch

use crate::bundle::BundleResource;
use crate::condition::ConditionResource;
use crate::consent::ConsentResource;
use crate::encounter::EncounterResource;
use crate::observation::ObservationResource;
use crate::patient::PatientResource;
use crate::{FhirError, FhirResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Base URI for resource profiles.
pub const PROFILE_BASE_URI: &str = "http://hl7.org/fhir/StructureDefinition/";

// ============================================================================
// Resource types
// ============================================================================

/// The six resource kinds the intake engine produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Patient,
    Condition,
    Observation,
    Encounter,
    Bundle,
    Consent,
}

impl ResourceType {
    /// All resource types, in preview section order.
    pub const ALL: [ResourceType; 6] = [
        ResourceType::Patient,
        ResourceType::Condition,
        ResourceType::Observation,
        ResourceType::Encounter,
        ResourceType::Bundle,
        ResourceType::Consent,
    ];

    /// The `resourceType` discriminator, e.g. `"Condition"`.
    pub fn name(self) -> &'static str {
        match self {
            ResourceType::Patient => "Patient",
            ResourceType::Condition => "Condition",
            ResourceType::Observation => "Observation",
            ResourceType::Encounter => "Encounter",
            ResourceType::Bundle => "Bundle",
            ResourceType::Consent => "Consent",
        }
    }

    /// Lowercase section key, e.g. `"condition"`. Also the identifier prefix.
    pub fn section(self) -> &'static str {
        match self {
            ResourceType::Patient => "patient",
            ResourceType::Condition => "condition",
            ResourceType::Observation => "observation",
            ResourceType::Encounter => "encounter",
            ResourceType::Bundle => "bundle",
            ResourceType::Consent => "consent",
        }
    }

    /// Profile URI stamped into `meta.profile`.
    ///
    /// Only the Patient profile is capitalised; the rest use the section key. Downstream
    /// consumers match on these exact strings.
    pub fn profile_uri(self) -> String {
        match self {
            ResourceType::Patient => format!("{PROFILE_BASE_URI}Patient"),
            other => format!("{PROFILE_BASE_URI}{}", other.section()),
        }
    }

    /// Generated identifier `<section>-<epoch_millis>`.
    ///
    /// Two resources of the same type generated in the same millisecond share an id.
    pub fn generated_id(self, epoch_millis: i64) -> String {
        format!("{}-{}", self.section(), epoch_millis)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResourceType {
    type Err = FhirError;

    /// Case-insensitive match on the resource name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ResourceType::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| FhirError::InvalidInput(format!("unknown resource type '{s}'")))
    }
}

// ============================================================================
// Resource envelope
// ============================================================================

/// Any resource produced by the intake engine.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "resourceType")]
pub enum Resource {
    Patient(PatientResource),
    Condition(ConditionResource),
    Observation(ObservationResource),
    Encounter(EncounterResource),
    Bundle(BundleResource),
    Consent(ConsentResource),
}

impl Resource {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            Resource::Patient(_) => ResourceType::Patient,
            Resource::Condition(_) => ResourceType::Condition,
            Resource::Observation(_) => ResourceType::Observation,
            Resource::Encounter(_) => ResourceType::Encounter,
            Resource::Bundle(_) => ResourceType::Bundle,
            Resource::Consent(_) => ResourceType::Consent,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Resource::Patient(r) => &r.id,
            Resource::Condition(r) => &r.id,
            Resource::Observation(r) => &r.id,
            Resource::Encounter(r) => &r.id,
            Resource::Bundle(r) => &r.id,
            Resource::Consent(r) => &r.id,
        }
    }

    /// Render the resource as canonical JSON.
    ///
    /// Keys follow field declaration order with `resourceType` first, indented by two
    /// spaces. This is the text offered for copy/preview and must match what a
    /// document-exchange endpoint expects.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::Translation`] if serialisation fails.
    pub fn render(&self) -> FhirResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            FhirError::Translation(format!(
                "Failed to serialise {}: {e}",
                self.resource_type()
            ))
        })
    }

    /// Parse a resource from JSON text.
    ///
    /// This uses `serde_path_to_error` to surface a best-effort path (e.g. `entry[0]`) to the
    /// failing field when the JSON does not match the wire schema.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if:
    /// - the text is not a single JSON document,
    /// - `resourceType` is missing or not one of the six intake resources,
    /// - any field has an unexpected type,
    /// - any unknown keys are present.
    pub fn parse(json_text: &str) -> FhirResult<Resource> {
        let mut deserializer = serde_json::Deserializer::from_str(json_text);

        let resource = match serde_path_to_error::deserialize::<_, Resource>(&mut deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(FhirError::Translation(format!(
                    "Resource schema mismatch at {path}: {source}"
                )));
            }
        };

        deserializer.end()?;
        Ok(resource)
    }

    /// Parse JSON text that must hold a resource of type `expected`.
    ///
    /// # Errors
    ///
    /// As [`Resource::parse`], plus [`FhirError::InvalidInput`] when the parsed resource is
    /// of a different type.
    pub fn parse_as(json_text: &str, expected: ResourceType) -> FhirResult<Resource> {
        let resource = Self::parse(json_text)?;
        if resource.resource_type() != expected {
            return Err(FhirError::InvalidInput(format!(
                "Expected resourceType '{}', got '{}'",
                expected,
                resource.resource_type()
            )));
        }
        Ok(resource)
    }

    /// Parse JSON text holding a Bundle.
    pub fn parse_bundle(json_text: &str) -> FhirResult<BundleResource> {
        match Self::parse_as(json_text, ResourceType::Bundle)? {
            Resource::Bundle(bundle) => Ok(bundle),
            other => Err(FhirError::InvalidInput(format!(
                "Expected resourceType 'Bundle', got '{}'",
                other.resource_type()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{BundleEntry, BundleType, BundledResource};
    use crate::consent::ConsentPolicy;
    use crate::datatypes::{CodeableConcept, Coding, Meta, Reference};

    fn meta(resource_type: ResourceType) -> Meta {
        Meta {
            version_id: "1".into(),
            last_updated: "2026-01-23T13:58:04.099Z".into(),
            profile: vec![resource_type.profile_uri()],
        }
    }

    fn consent() -> ConsentResource {
        ConsentResource {
            id: "consent-1769176684099".into(),
            meta: meta(ResourceType::Consent),
            status: "active".into(),
            scope: CodeableConcept::single(Coding::new(
                "http://terminology.hl7.org/CodeSystem/consentscope",
                "patient-privacy",
            )),
            category: vec![CodeableConcept::single(Coding::new(
                "http://terminology.hl7.org/CodeSystem/consentcategorycodes",
                "idscl",
            ))],
            patient: Reference::new("Patient/patient-123").with_display("Priya Patel"),
            date_time: "2026-01-23T13:58:04.099Z".into(),
            policy: vec![ConsentPolicy {
                uri: "http://example.org/consent-policy".into(),
            }],
        }
    }

    #[test]
    fn profile_uri_capitalises_patient_only() {
        assert_eq!(
            ResourceType::Patient.profile_uri(),
            "http://hl7.org/fhir/StructureDefinition/Patient"
        );
        assert_eq!(
            ResourceType::Condition.profile_uri(),
            "http://hl7.org/fhir/StructureDefinition/condition"
        );
    }

    #[test]
    fn generated_id_uses_section_prefix() {
        assert_eq!(
            ResourceType::Observation.generated_id(1769176684099),
            "observation-1769176684099"
        );
    }

    #[test]
    fn resource_type_parses_case_insensitively() {
        assert_eq!(
            "bundle".parse::<ResourceType>().expect("parse"),
            ResourceType::Bundle
        );
        assert_eq!(
            "Encounter".parse::<ResourceType>().expect("parse"),
            ResourceType::Encounter
        );
        assert!("Practitioner".parse::<ResourceType>().is_err());
    }

    #[test]
    fn render_puts_resource_type_first_with_two_space_indent() {
        let json = Resource::Consent(consent()).render().expect("render");
        assert!(
            json.starts_with("{\n  \"resourceType\": \"Consent\",\n  \"id\": \"consent-"),
            "got {json}"
        );
        let meta_pos = json.find("\"meta\"").expect("meta");
        let status_pos = json.find("\"status\"").expect("status");
        let policy_pos = json.find("\"policy\"").expect("policy");
        assert!(meta_pos < status_pos && status_pos < policy_pos);
    }

    #[test]
    fn round_trips_consent() {
        let resource = Resource::Consent(consent());
        let json = resource.render().expect("render");
        let reparsed = Resource::parse(&json).expect("parse");
        assert_eq!(resource, reparsed);
    }

    #[test]
    fn rejects_unknown_keys() {
        let json = Resource::Consent(consent()).render().expect("render");
        let tampered = json.replacen("\"status\"", "\"unexpected_key\": 1,\n  \"status\"", 1);

        let err = Resource::parse(&tampered).expect_err("should reject unknown key");
        match err {
            FhirError::Translation(msg) => assert!(msg.contains("unexpected_key"), "{msg}"),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_resource_type() {
        let err = Resource::parse(r#"{"resourceType": "Practitioner", "id": "x"}"#)
            .expect_err("should reject");
        match err {
            FhirError::Translation(msg) => assert!(msg.contains("Practitioner"), "{msg}"),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_trailing_content() {
        let json = Resource::Consent(consent()).render().expect("render");
        let err = Resource::parse(&format!("{json} {{}}")).expect_err("should reject");
        assert!(matches!(err, FhirError::InvalidJson(_)));
    }

    #[test]
    fn parse_as_rejects_other_resource_types() {
        let json = Resource::Consent(consent()).render().expect("render");
        let err = Resource::parse_bundle(&json).expect_err("not a bundle");
        match err {
            FhirError::InvalidInput(msg) => {
                assert!(msg.contains("Bundle"));
                assert!(msg.contains("Consent"));
            }
            other => panic!("expected InvalidInput error, got {other:?}"),
        }
    }

    #[test]
    fn bundle_entries_cannot_hold_a_bundle() {
        let inner = BundleResource {
            id: "bundle-1".into(),
            meta: meta(ResourceType::Bundle),
            bundle_type: BundleType::Collection,
            timestamp: "2026-01-23T13:58:04.099Z".into(),
            entry: vec![],
        };
        let inner_json =
            serde_json::to_value(Resource::Bundle(inner)).expect("serialise inner bundle");
        let outer = serde_json::json!({
            "resourceType": "Bundle",
            "id": "bundle-2",
            "meta": meta(ResourceType::Bundle),
            "type": "collection",
            "timestamp": "2026-01-23T13:58:04.099Z",
            "entry": [{ "fullUrl": "Bundle/bundle-1", "resource": inner_json }]
        });

        let err = Resource::parse(&outer.to_string()).expect_err("nested bundle");
        assert!(matches!(err, FhirError::Translation(_)));
    }

    #[test]
    fn bundled_resource_reports_type_and_id() {
        let patient_json = r#"{
  "id": "patient-1",
  "meta": {"versionId": "1", "lastUpdated": "t", "profile": []},
  "identifier": [],
  "name": [],
  "gender": "female",
  "birthDate": "1990-03-22",
  "telecom": [],
  "address": []
}"#;
        let patient: PatientResource = serde_json::from_str(patient_json).expect("patient");
        let entry = BundleEntry {
            full_url: "Patient/patient-123".into(),
            resource: BundledResource::Patient(patient),
        };
        assert_eq!(entry.resource.resource_type(), ResourceType::Patient);
        assert_eq!(entry.resource.id(), "patient-1");
    }

    #[test]
    fn non_collection_bundles_are_rejected() {
        let bundle = serde_json::json!({
            "resourceType": "Bundle",
            "id": "bundle-1",
            "meta": meta(ResourceType::Bundle),
            "type": "document",
            "timestamp": "2026-01-23T13:58:04.099Z",
            "entry": []
        });
        let err = Resource::parse(&bundle.to_string()).expect_err("document bundle");
        assert!(matches!(err, FhirError::Translation(_)));
    }

    #[test]
    fn member_resources_have_total_equality() {
        fn requires_eq<T: Eq>() {}
        requires_eq::<Meta>();
        requires_eq::<PatientResource>();
        requires_eq::<ConditionResource>();
        requires_eq::<EncounterResource>();
        requires_eq::<ConsentResource>();

        let meta = meta(ResourceType::Consent);
        assert_eq!(consent(), consent());
        assert_ne!(
            consent(),
            ConsentResource {
                meta: Meta {
                    version_id: "2".into(),
                    ..meta
                },
                ..consent()
            }
        );
    }
}

//! Bundle assembly.
//!
//! A collection bundle is composed from four already-built resources. The parts are taken by
//! value and slotted in a fixed order under fixed synthetic `fullUrl`s, which match the
//! references the members use for each other.

use crate::builder::{meta, ClinicalEncounterContext};
use crate::constants::{CONDITION_REF, ENCOUNTER_REF, OBSERVATION_REF, PATIENT_REF};
use fhir::{
    BundleEntry, BundleResource, BundleType, BundledResource, ConditionResource,
    EncounterResource, ObservationResource, PatientResource, ResourceType,
};

/// The member resources of a collection bundle.
#[derive(Clone, Debug, PartialEq)]
pub struct BundleParts {
    pub patient: PatientResource,
    pub condition: ConditionResource,
    pub observation: ObservationResource,
    pub encounter: EncounterResource,
}

/// Assemble `parts` into a collection bundle stamped with the context's timestamp.
pub fn assemble(parts: BundleParts, ctx: &ClinicalEncounterContext) -> BundleResource {
    let entry = vec![
        BundleEntry {
            full_url: PATIENT_REF.into(),
            resource: BundledResource::Patient(parts.patient),
        },
        BundleEntry {
            full_url: CONDITION_REF.into(),
            resource: BundledResource::Condition(parts.condition),
        },
        BundleEntry {
            full_url: OBSERVATION_REF.into(),
            resource: BundledResource::Observation(parts.observation),
        },
        BundleEntry {
            full_url: ENCOUNTER_REF.into(),
            resource: BundledResource::Encounter(parts.encounter),
        },
    ];

    BundleResource {
        id: ResourceType::Bundle.generated_id(ctx.epoch_millis()),
        meta: meta(ResourceType::Bundle, ctx),
        bundle_type: BundleType::Collection,
        timestamp: ctx.iso_timestamp(),
        entry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ResourceBuilder;
    use crate::record::PatientRecord;
    use crate::terminology::CodeMappingTable;
    use chrono::{TimeZone, Utc};
    use fhir::Resource;
    use intake_types::NonEmptyText;

    fn ctx() -> ClinicalEncounterContext {
        let ts = Utc
            .with_ymd_and_hms(2026, 3, 2, 9, 30, 0)
            .single()
            .expect("valid timestamp");
        ClinicalEncounterContext::new(NonEmptyText::new("Dr. Sarah Johnson").expect("name"), ts)
    }

    fn record() -> PatientRecord {
        PatientRecord {
            health_id: Some("98765432109876".into()),
            name: Some("Priya Patel".into()),
            birth_date: Some("1990-03-22".into()),
            gender: Some("Female".into()),
            weight: Some("58.5".into()),
            ..Default::default()
        }
    }

    #[test]
    fn assembled_bundle_has_four_entries_in_fixed_order() {
        let bundle = ResourceBuilder::bundle(&record(), None, &ctx());
        assert_eq!(bundle.bundle_type, BundleType::Collection);
        assert_eq!(
            bundle.full_urls(),
            vec![PATIENT_REF, CONDITION_REF, OBSERVATION_REF, ENCOUNTER_REF]
        );
        let types: Vec<_> = bundle.entry.iter().map(|e| e.resource.resource_type()).collect();
        assert_eq!(
            types,
            vec![
                ResourceType::Patient,
                ResourceType::Condition,
                ResourceType::Observation,
                ResourceType::Encounter
            ]
        );
        assert_eq!(bundle.timestamp, "2026-03-02T09:30:00.000Z");
        assert_eq!(
            bundle.meta.profile,
            vec!["http://hl7.org/fhir/StructureDefinition/bundle"]
        );
    }

    #[test]
    fn rendered_bundle_parses_back_with_full_urls_in_order() {
        let table = CodeMappingTable::builtin();
        let diagnosis = table.get("NAM-002");
        let resource = Resource::Bundle(ResourceBuilder::bundle(&record(), diagnosis, &ctx()));

        let json = resource.render().expect("render");
        let parsed = Resource::parse_bundle(&json).expect("parse");

        assert_eq!(
            parsed.full_urls(),
            vec![
                "Patient/patient-123",
                "Condition/condition-123",
                "Observation/observation-123",
                "Encounter/encounter-123"
            ]
        );
        assert_eq!(Resource::Bundle(parsed), resource);
    }

    #[test]
    fn assemble_keeps_the_given_parts() {
        let c = ctx();
        let r = record();
        let parts = BundleParts {
            patient: ResourceBuilder::patient(&r, &c),
            condition: ResourceBuilder::condition(&r, None, &c),
            observation: ResourceBuilder::observation(&r, &c),
            encounter: ResourceBuilder::encounter(&r, None, &c),
        };
        let bundle = assemble(parts.clone(), &c);

        match &bundle.entry[2].resource {
            BundledResource::Observation(obs) => assert_eq!(obs, &parts.observation),
            other => panic!("expected observation, got {:?}", other.resource_type()),
        }
        assert_eq!(bundle.entry[0].resource.id(), parts.patient.id);
    }
}

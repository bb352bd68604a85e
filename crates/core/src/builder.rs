//! Resource builder: intake record + diagnosis + encounter context → FHIR resources.
//!
//! Every function here is a pure mapping of its inputs. The generation timestamp comes from
//! the [`ClinicalEncounterContext`], so building twice from the same inputs yields identical
//! resources.
//!
//! Absent record fields are replaced by the defaults in [`crate::constants`]. Downstream
//! consumers expect fully populated documents, so these substitutions are part of the output
//! contract and must not be "improved" into errors. In particular a weight that is empty,
//! non-numeric, zero or non-finite silently becomes 70 kg; this is a known fidelity gap for
//! clinical data.

use crate::bundle::{assemble, BundleParts};
use crate::constants::*;
use crate::record::{PatientRecord, RecordField};
use crate::terminology::DiagnosisEntry;
use chrono::{DateTime, SecondsFormat, Utc};
use fhir::{
    Address, CodeableConcept, Coding, ConditionResource, ConsentPolicy, ConsentResource,
    ContactPoint, EncounterParticipant, EncounterResource, HumanName, Identifier, Meta,
    ObservationResource, PatientResource, Period, Quantity, Reference, Resource, ResourceType,
};
use intake_types::{Gender, NonEmptyText};

// ============================================================================
// Encounter context
// ============================================================================

/// Ephemeral encounter data captured when generation is requested.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClinicalEncounterContext {
    practitioner: NonEmptyText,
    timestamp: DateTime<Utc>,
}

impl ClinicalEncounterContext {
    pub fn new(practitioner: NonEmptyText, timestamp: DateTime<Utc>) -> Self {
        Self {
            practitioner,
            timestamp,
        }
    }

    /// Context stamped with the current time.
    pub fn now(practitioner: NonEmptyText) -> Self {
        Self::new(practitioner, Utc::now())
    }

    pub fn practitioner(&self) -> &NonEmptyText {
        &self.practitioner
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// `Practitioner/<slug>`, e.g. `Practitioner/dr-sarah-johnson`.
    pub fn practitioner_reference(&self) -> String {
        format!("Practitioner/{}", slug(self.practitioner.as_str()))
    }

    /// ISO-8601 UTC with millisecond precision, e.g. `2026-01-23T13:58:04.099Z`.
    pub(crate) fn iso_timestamp(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub(crate) fn epoch_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}

/// Lowercase, hyphen-separated form of `text` (runs of non-alphanumerics collapse).
fn slug(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

// ============================================================================
// Public builder operations
// ============================================================================

/// Resource builder operations.
///
/// This is a zero-sized type used for namespacing; all methods are associated functions.
pub struct ResourceBuilder;

impl ResourceBuilder {
    /// Build the resource for one preview section.
    ///
    /// For [`ResourceType::Bundle`] the four member resources are built first and handed to
    /// the bundle assembler; this function never calls itself.
    pub fn build(
        resource_type: ResourceType,
        record: &PatientRecord,
        diagnosis: Option<&DiagnosisEntry>,
        ctx: &ClinicalEncounterContext,
    ) -> Resource {
        tracing::debug!(resource_type = %resource_type, "building resource");
        match resource_type {
            ResourceType::Patient => Resource::Patient(Self::patient(record, ctx)),
            ResourceType::Condition => Resource::Condition(Self::condition(record, diagnosis, ctx)),
            ResourceType::Observation => Resource::Observation(Self::observation(record, ctx)),
            ResourceType::Encounter => Resource::Encounter(Self::encounter(record, diagnosis, ctx)),
            ResourceType::Bundle => Resource::Bundle(Self::bundle(record, diagnosis, ctx)),
            ResourceType::Consent => Resource::Consent(Self::consent(record, ctx)),
        }
    }

    pub fn patient(record: &PatientRecord, ctx: &ClinicalEncounterContext) -> PatientResource {
        let name = display_name(record);
        let mut words = name.split(' ');
        let given = words
            .next()
            .filter(|w| !w.is_empty())
            .unwrap_or(DEFAULT_GIVEN);
        let family = name
            .split(' ')
            .last()
            .filter(|w| !w.is_empty())
            .unwrap_or(DEFAULT_FAMILY);
        let address = record.get(RecordField::Address);

        PatientResource {
            id: ResourceType::Patient.generated_id(ctx.epoch_millis()),
            meta: meta(ResourceType::Patient, ctx),
            identifier: vec![Identifier {
                use_type: "usual".into(),
                type_concept: CodeableConcept::single(
                    Coding::new(IDENTIFIER_TYPE_SYSTEM, "ABHA").with_display("ABHA ID"),
                ),
                value: field_or(record, RecordField::HealthId, DEFAULT_HEALTH_ID),
            }],
            name: vec![HumanName {
                use_type: "official".into(),
                text: name.to_string(),
                family: family.to_string(),
                given: vec![given.to_string()],
            }],
            gender: gender_code(record),
            birth_date: field_or(record, RecordField::BirthDate, DEFAULT_BIRTH_DATE),
            telecom: vec![
                ContactPoint {
                    system: "phone".into(),
                    value: field_or(record, RecordField::Phone, DEFAULT_PHONE),
                    use_type: "mobile".into(),
                },
                ContactPoint {
                    system: "email".into(),
                    value: field_or(record, RecordField::Email, DEFAULT_EMAIL),
                    use_type: "home".into(),
                },
            ],
            address: vec![Address {
                use_type: "home".into(),
                text: address.unwrap_or(DEFAULT_ADDRESS_TEXT).to_string(),
                line: vec![address.unwrap_or(DEFAULT_ADDRESS_LINE).to_string()],
                city: DEFAULT_CITY.into(),
                state: DEFAULT_STATE.into(),
                postal_code: DEFAULT_POSTAL_CODE.into(),
                country: DEFAULT_COUNTRY.into(),
            }],
        }
    }

    /// Condition coded under ICD-11 and the local code system at once.
    pub fn condition(
        record: &PatientRecord,
        diagnosis: Option<&DiagnosisEntry>,
        ctx: &ClinicalEncounterContext,
    ) -> ConditionResource {
        let (icd_code, icd_name) = diagnosis
            .map(|d| (d.icd11_tm2.code.as_str(), d.icd11_tm2.name.as_str()))
            .unwrap_or((DEFAULT_ICD11_CODE, DEFAULT_ICD11_NAME));

        ConditionResource {
            id: ResourceType::Condition.generated_id(ctx.epoch_millis()),
            meta: meta(ResourceType::Condition, ctx),
            clinical_status: CodeableConcept::single(Coding::new(
                CONDITION_CLINICAL_SYSTEM,
                "active",
            )),
            verification_status: CodeableConcept::single(Coding::new(
                CONDITION_VER_STATUS_SYSTEM,
                "confirmed",
            )),
            code: CodeableConcept {
                coding: vec![
                    Coding::new(ICD11_CODE_SYSTEM, icd_code).with_display(icd_name),
                    local_coding(diagnosis),
                ],
            },
            subject: patient_reference(record),
            encounter: Reference::new(ENCOUNTER_REF),
            recorded_date: ctx.iso_timestamp(),
        }
    }

    /// Body-weight observation. Other captured vitals are not emitted.
    pub fn observation(
        record: &PatientRecord,
        ctx: &ClinicalEncounterContext,
    ) -> ObservationResource {
        ObservationResource {
            id: ResourceType::Observation.generated_id(ctx.epoch_millis()),
            meta: meta(ResourceType::Observation, ctx),
            status: "final".into(),
            category: vec![CodeableConcept::single(
                Coding::new(OBSERVATION_CATEGORY_SYSTEM, "vital-signs").with_display("Vital Signs"),
            )],
            code: CodeableConcept::single(
                Coding::new(LOINC_SYSTEM, BODY_WEIGHT_LOINC).with_display("Body Weight"),
            ),
            subject: patient_reference(record),
            value_quantity: Quantity {
                value: weight_kg(record),
                unit: "kg".into(),
                system: UCUM_SYSTEM.into(),
                code: "kg".into(),
            },
            effective_date_time: ctx.iso_timestamp(),
        }
    }

    /// Ambulatory encounter. The reason code uses the local code system only.
    pub fn encounter(
        record: &PatientRecord,
        diagnosis: Option<&DiagnosisEntry>,
        ctx: &ClinicalEncounterContext,
    ) -> EncounterResource {
        let now = ctx.iso_timestamp();
        EncounterResource {
            id: ResourceType::Encounter.generated_id(ctx.epoch_millis()),
            meta: meta(ResourceType::Encounter, ctx),
            status: "finished".into(),
            class: Coding::new(ACT_CODE_SYSTEM, "AMB").with_display("ambulatory"),
            subject: patient_reference(record),
            participant: vec![EncounterParticipant {
                individual: Reference::new(ctx.practitioner_reference())
                    .with_display(ctx.practitioner().as_str()),
            }],
            period: Period {
                start: now.clone(),
                end: now,
            },
            reason_code: vec![CodeableConcept::single(local_coding(diagnosis))],
        }
    }

    pub fn consent(record: &PatientRecord, ctx: &ClinicalEncounterContext) -> ConsentResource {
        ConsentResource {
            id: ResourceType::Consent.generated_id(ctx.epoch_millis()),
            meta: meta(ResourceType::Consent, ctx),
            status: "active".into(),
            scope: CodeableConcept::single(Coding::new(CONSENT_SCOPE_SYSTEM, "patient-privacy")),
            category: vec![CodeableConcept::single(Coding::new(
                CONSENT_CATEGORY_SYSTEM,
                "idscl",
            ))],
            patient: patient_reference(record),
            date_time: ctx.iso_timestamp(),
            policy: vec![ConsentPolicy {
                uri: CONSENT_POLICY_URI.into(),
            }],
        }
    }

    /// Build the four member resources, then assemble them into a collection bundle.
    pub fn bundle(
        record: &PatientRecord,
        diagnosis: Option<&DiagnosisEntry>,
        ctx: &ClinicalEncounterContext,
    ) -> fhir::BundleResource {
        let parts = BundleParts {
            patient: Self::patient(record, ctx),
            condition: Self::condition(record, diagnosis, ctx),
            observation: Self::observation(record, ctx),
            encounter: Self::encounter(record, diagnosis, ctx),
        };
        assemble(parts, ctx)
    }
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

pub(crate) fn meta(resource_type: ResourceType, ctx: &ClinicalEncounterContext) -> Meta {
    Meta {
        version_id: RESOURCE_VERSION.into(),
        last_updated: ctx.iso_timestamp(),
        profile: vec![resource_type.profile_uri()],
    }
}

fn field_or(record: &PatientRecord, field: RecordField, default: &str) -> String {
    record.get(field).unwrap_or(default).to_string()
}

fn display_name(record: &PatientRecord) -> &str {
    record.get(RecordField::Name).unwrap_or(DEFAULT_NAME)
}

fn patient_reference(record: &PatientRecord) -> Reference {
    Reference::new(PATIENT_REF).with_display(display_name(record))
}

fn local_coding(diagnosis: Option<&DiagnosisEntry>) -> Coding {
    let (code, name) = diagnosis
        .map(|d| (d.local_code.as_str(), d.name.as_str()))
        .unwrap_or((DEFAULT_LOCAL_CODE, DEFAULT_LOCAL_NAME));
    Coding::new(LOCAL_CODE_SYSTEM, code).with_display(name)
}

/// Recognised genders map to their wire code; any other text is lowercased as-is.
fn gender_code(record: &PatientRecord) -> String {
    match record.get(RecordField::Gender) {
        None => DEFAULT_GENDER.to_string(),
        Some(raw) => raw
            .parse::<Gender>()
            .map(|g| g.code().to_string())
            .unwrap_or_else(|_| raw.to_lowercase()),
    }
}

fn weight_kg(record: &PatientRecord) -> f64 {
    record
        .get(RecordField::Weight)
        .and_then(leading_decimal)
        .filter(|v| v.is_finite() && *v != 0.0)
        .unwrap_or(DEFAULT_WEIGHT_KG)
}

/// Parse the longest numeric prefix of `text` (`"72.5 kg"` → 72.5).
fn leading_decimal(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let mut digit_count = int_end - end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        digit_count += frac_end - (end + 1);
        end = frac_end;
    }
    if digit_count == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok()
}

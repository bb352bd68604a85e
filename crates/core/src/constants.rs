//! Constants used throughout the intake core crate.
//!
//! Code-system URIs, fixed references and the default values substituted for absent record
//! fields. Downstream consumers expect fully populated documents, so the defaults are part
//! of the output contract.

use std::time::Duration;

/// Local (NAMASTE) code-system URI.
pub const LOCAL_CODE_SYSTEM: &str = "http://namaste.gov.in/codes";

/// ICD-11 code-system URI.
pub const ICD11_CODE_SYSTEM: &str = "http://hl7.org/fhir/sid/icd-11";

/// HL7 v2 identifier type code system.
pub const IDENTIFIER_TYPE_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/v2-0203";

pub const CONDITION_CLINICAL_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/condition-clinical";
pub const CONDITION_VER_STATUS_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/condition-ver-status";
pub const OBSERVATION_CATEGORY_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/observation-category";
pub const LOINC_SYSTEM: &str = "http://loinc.org";
pub const UCUM_SYSTEM: &str = "http://unitsofmeasure.org";
pub const ACT_CODE_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/v3-ActCode";
pub const CONSENT_SCOPE_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/consentscope";
pub const CONSENT_CATEGORY_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/consentcategorycodes";
pub const CONSENT_POLICY_URI: &str = "http://example.org/consent-policy";

/// LOINC code for body weight.
pub const BODY_WEIGHT_LOINC: &str = "29463-7";

/// Synthetic references linking resources inside one bundle.
pub const PATIENT_REF: &str = "Patient/patient-123";
pub const CONDITION_REF: &str = "Condition/condition-123";
pub const OBSERVATION_REF: &str = "Observation/observation-123";
pub const ENCOUNTER_REF: &str = "Encounter/encounter-123";

/// Version stamped into every generated resource's `meta.versionId`.
pub const RESOURCE_VERSION: &str = "1";

/// Minimum query length before diagnosis suggestions are surfaced.
pub const MIN_SEARCH_CHARS: usize = 3;

/// Simulated consent-service round trip.
pub const DEFAULT_CONSENT_DELAY: Duration = Duration::from_secs(10);

pub const DEFAULT_PRACTITIONER: &str = "Dr. Sarah Johnson";
pub const DEFAULT_HOSPITAL_ID: &str = "HSP-2024-001";

// Substitutes for absent record fields.
pub const DEFAULT_HEALTH_ID: &str = "12345678901234";
pub const DEFAULT_NAME: &str = "John Doe";
pub const DEFAULT_FAMILY: &str = "Doe";
pub const DEFAULT_GIVEN: &str = "John";
pub const DEFAULT_GENDER: &str = "male";
pub const DEFAULT_BIRTH_DATE: &str = "1990-01-01";
pub const DEFAULT_PHONE: &str = "+91 98765 43210";
pub const DEFAULT_EMAIL: &str = "john.doe@example.com";
pub const DEFAULT_ADDRESS_TEXT: &str = "123 Health Street, Medical City, IN 110001";
pub const DEFAULT_ADDRESS_LINE: &str = "123 Health Street";
pub const DEFAULT_CITY: &str = "Medical City";
pub const DEFAULT_STATE: &str = "Delhi";
pub const DEFAULT_POSTAL_CODE: &str = "110001";
pub const DEFAULT_COUNTRY: &str = "IN";
pub const DEFAULT_WEIGHT_KG: f64 = 70.0;

// Substitutes when no diagnosis is selected.
pub const DEFAULT_LOCAL_CODE: &str = "NAM001";
pub const DEFAULT_LOCAL_NAME: &str = "Hypertension";
pub const DEFAULT_ICD11_CODE: &str = "BA00";
pub const DEFAULT_ICD11_NAME: &str = "Essential hypertension";

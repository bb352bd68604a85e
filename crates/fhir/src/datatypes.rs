//! Shared FHIR datatypes used by the intake resources.
//!
//! Field order in every struct is the JSON key order on the wire, so do not reorder fields
//! without checking downstream consumers of the rendered documents.

use serde::{Deserialize, Serialize, Serializer};

/// Resource metadata block.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Meta {
    #[serde(rename = "versionId")]
    pub version_id: String,

    #[serde(rename = "lastUpdated")]
    pub last_updated: String,

    pub profile: Vec<String>,
}

/// A code from a code system.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Coding {
    pub system: String,

    pub code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Coding {
    pub fn new(system: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            code: code.into(),
            display: None,
        }
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }
}

/// A concept expressed as one or more codings.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CodeableConcept {
    pub coding: Vec<Coding>,
}

impl CodeableConcept {
    pub fn single(coding: Coding) -> Self {
        Self {
            coding: vec![coding],
        }
    }
}

/// A literal reference to another resource.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Reference {
    pub reference: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Reference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            display: None,
        }
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }
}

/// A business identifier.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Identifier {
    #[serde(rename = "use")]
    pub use_type: String,

    #[serde(rename = "type")]
    pub type_concept: CodeableConcept,

    pub value: String,
}

/// A human name.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HumanName {
    #[serde(rename = "use")]
    pub use_type: String,

    pub text: String,

    pub family: String,

    pub given: Vec<String>,
}

/// A phone number, email address or other contact point.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ContactPoint {
    pub system: String,

    pub value: String,

    #[serde(rename = "use")]
    pub use_type: String,
}

/// A postal address.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Address {
    #[serde(rename = "use")]
    pub use_type: String,

    pub text: String,

    pub line: Vec<String>,

    pub city: String,

    pub state: String,

    #[serde(rename = "postalCode")]
    pub postal_code: String,

    pub country: String,
}

/// A measured amount.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Quantity {
    #[serde(serialize_with = "serialize_decimal")]
    pub value: f64,

    pub unit: String,

    pub system: String,

    pub code: String,
}

/// A time range.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Period {
    pub start: String,

    pub end: String,
}

/// Writes whole numbers without a fractional part (`70`, not `70.0`).
fn serialize_decimal<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    // 2^53: beyond this an f64 no longer represents every integer exactly
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;

    if value.is_finite() && value.fract() == 0.0 && value.abs() <= MAX_EXACT {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quantity(value: f64) -> Quantity {
        Quantity {
            value,
            unit: "kg".into(),
            system: "http://unitsofmeasure.org".into(),
            code: "kg".into(),
        }
    }

    #[test]
    fn whole_quantities_render_as_integers() {
        let json = serde_json::to_string(&quantity(70.0)).expect("serialise");
        assert!(json.contains("\"value\":70,"), "got {json}");
    }

    #[test]
    fn fractional_quantities_keep_their_fraction() {
        let json = serde_json::to_string(&quantity(72.5)).expect("serialise");
        assert!(json.contains("\"value\":72.5,"), "got {json}");
    }

    #[test]
    fn integer_quantities_parse_as_floats() {
        let input = r#"{"value":70,"unit":"kg","system":"http://unitsofmeasure.org","code":"kg"}"#;
        let parsed: Quantity = serde_json::from_str(input).expect("parse");
        assert_eq!(parsed.value, 70.0);
    }

    #[test]
    fn coding_omits_absent_display() {
        let json = serde_json::to_string(&Coding::new("http://loinc.org", "29463-7"))
            .expect("serialise");
        assert_eq!(json, r#"{"system":"http://loinc.org","code":"29463-7"}"#);
    }

    #[test]
    fn identifier_uses_fhir_key_names() {
        let identifier = Identifier {
            use_type: "usual".into(),
            type_concept: CodeableConcept::single(Coding::new("urn:test", "ABHA")),
            value: "12345678901234".into(),
        };
        let json = serde_json::to_string(&identifier).expect("serialise");
        assert!(json.starts_with(r#"{"use":"usual","type":{"#), "got {json}");
    }
}

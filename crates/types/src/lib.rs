//! Validated primitive types shared across the intake workspace.
//!
//! These wrappers guarantee their invariant once constructed, so downstream code can accept
//! them without re-checking:
//! - [`NonEmptyText`]: trimmed, non-empty text
//! - [`HealthId`]: the 14-digit external health identifier (ABHA ID)
//! - [`Gender`]: administrative gender as captured on the intake form

use std::fmt;
use std::str::FromStr;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns `Err(TextError::Empty)` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Errors raised when parsing a [`HealthId`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HealthIdError {
    #[error("health id must be exactly {expected} digits, got {actual} characters")]
    WrongLength { expected: usize, actual: usize },
    #[error("health id must contain only ASCII digits")]
    NonDigit,
}

/// External health identifier (ABHA ID): exactly 14 ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HealthId(String);

impl HealthId {
    /// Number of digits in a valid identifier.
    pub const LEN: usize = 14;

    /// Parses an identifier, trimming surrounding whitespace first.
    ///
    /// # Errors
    ///
    /// Returns [`HealthIdError`] if the trimmed input is not exactly 14 ASCII digits.
    pub fn parse(input: &str) -> Result<Self, HealthIdError> {
        let trimmed = input.trim();
        if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(HealthIdError::NonDigit);
        }
        if trimmed.len() != Self::LEN {
            return Err(HealthIdError::WrongLength {
                expected: Self::LEN,
                actual: trimmed.len(),
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HealthId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors raised when parsing a [`Gender`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unrecognised gender '{0}' (expected male, female or other)")]
pub struct GenderError(pub String);

/// Administrative gender as offered by the intake form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// Lowercase wire code, as used in FHIR `Patient.gender`.
    pub fn code(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl FromStr for Gender {
    type Err = GenderError;

    /// Case-insensitive; accepts both form labels ("Male") and wire codes ("male").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            _ => Err(GenderError(s.to_owned())),
        }
    }
}

//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into the intake session. Parsing helpers take already-read values so that nothing in
//! the core reads process-wide environment variables during a session.

use crate::constants::{DEFAULT_CONSENT_DELAY, DEFAULT_HOSPITAL_ID, DEFAULT_PRACTITIONER};
use crate::{IntakeError, IntakeResult};
use intake_types::NonEmptyText;
use std::path::PathBuf;
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct IntakeConfig {
    consent_delay: Duration,
    practitioner: NonEmptyText,
    hospital_id: NonEmptyText,
    terminology_file: Option<PathBuf>,
}

impl IntakeConfig {
    /// Create a new `IntakeConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::InvalidInput`] if `consent_delay` is zero. A zero delay would
    /// grant consent in the same tick it was requested, skipping the `requesting` stage.
    pub fn new(
        consent_delay: Duration,
        practitioner: NonEmptyText,
        hospital_id: NonEmptyText,
        terminology_file: Option<PathBuf>,
    ) -> IntakeResult<Self> {
        if consent_delay.is_zero() {
            return Err(IntakeError::InvalidInput(
                "consent delay must be greater than zero".into(),
            ));
        }

        Ok(Self {
            consent_delay,
            practitioner,
            hospital_id,
            terminology_file,
        })
    }

    pub fn consent_delay(&self) -> Duration {
        self.consent_delay
    }

    pub fn practitioner(&self) -> &NonEmptyText {
        &self.practitioner
    }

    pub fn hospital_id(&self) -> &NonEmptyText {
        &self.hospital_id
    }

    pub fn terminology_file(&self) -> Option<&PathBuf> {
        self.terminology_file.as_ref()
    }

    /// Returns a copy with a different consent delay.
    pub fn with_consent_delay(mut self, consent_delay: Duration) -> IntakeResult<Self> {
        if consent_delay.is_zero() {
            return Err(IntakeError::InvalidInput(
                "consent delay must be greater than zero".into(),
            ));
        }
        self.consent_delay = consent_delay;
        Ok(self)
    }
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            consent_delay: DEFAULT_CONSENT_DELAY,
            // SAFETY: both defaults are non-empty literals
            practitioner: NonEmptyText::new(DEFAULT_PRACTITIONER)
                .expect("default practitioner is non-empty"),
            hospital_id: NonEmptyText::new(DEFAULT_HOSPITAL_ID)
                .expect("default hospital id is non-empty"),
            terminology_file: None,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the consent delay (milliseconds) from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default delay.
pub fn consent_delay_from_env_value(value: Option<String>) -> IntakeResult<Duration> {
    match non_blank(value) {
        None => Ok(DEFAULT_CONSENT_DELAY),
        Some(v) => {
            let millis = v.parse::<u64>().map_err(|e| {
                IntakeError::InvalidInput(format!("invalid consent delay '{v}': {e}"))
            })?;
            if millis == 0 {
                return Err(IntakeError::InvalidInput(
                    "consent delay must be greater than zero".into(),
                ));
            }
            Ok(Duration::from_millis(millis))
        }
    }
}

/// Parse a non-empty text setting, falling back to `default` when unset or blank.
pub fn text_from_env_value(value: Option<String>, default: &str) -> IntakeResult<NonEmptyText> {
    let value = non_blank(value).unwrap_or_else(|| default.to_string());
    NonEmptyText::new(value).map_err(|e| IntakeError::InvalidInput(e.to_string()))
}

/// Parse an optional path setting; unset or blank means "not configured".
pub fn path_from_env_value(value: Option<String>) -> Option<PathBuf> {
    non_blank(value).map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_ten_second_delay() {
        let cfg = IntakeConfig::default();
        assert_eq!(cfg.consent_delay(), Duration::from_secs(10));
        assert_eq!(cfg.practitioner().as_str(), "Dr. Sarah Johnson");
        assert_eq!(cfg.hospital_id().as_str(), "HSP-2024-001");
        assert!(cfg.terminology_file().is_none());
    }

    #[test]
    fn rejects_zero_consent_delay() {
        let err = IntakeConfig::default()
            .with_consent_delay(Duration::ZERO)
            .expect_err("zero delay");
        assert!(matches!(err, IntakeError::InvalidInput(msg) if msg.contains("greater than zero")));
    }

    #[test]
    fn consent_delay_env_value_defaults_when_blank() {
        assert_eq!(
            consent_delay_from_env_value(None).expect("default"),
            DEFAULT_CONSENT_DELAY
        );
        assert_eq!(
            consent_delay_from_env_value(Some("  ".into())).expect("default"),
            DEFAULT_CONSENT_DELAY
        );
    }

    #[test]
    fn consent_delay_env_value_parses_millis() {
        assert_eq!(
            consent_delay_from_env_value(Some("250".into())).expect("parse"),
            Duration::from_millis(250)
        );
    }

    #[test]
    fn consent_delay_env_value_rejects_garbage_and_zero() {
        assert!(consent_delay_from_env_value(Some("soon".into())).is_err());
        assert!(consent_delay_from_env_value(Some("0".into())).is_err());
    }

    #[test]
    fn text_env_value_falls_back_to_default() {
        let text = text_from_env_value(Some(" ".into()), "HSP-2024-001").expect("default");
        assert_eq!(text.as_str(), "HSP-2024-001");
        let text = text_from_env_value(Some("Dr. Amit Rao".into()), "x").expect("value");
        assert_eq!(text.as_str(), "Dr. Amit Rao");
    }

    #[test]
    fn path_env_value_ignores_blank() {
        assert!(path_from_env_value(Some("".into())).is_none());
        assert_eq!(
            path_from_env_value(Some("terms.yaml".into())),
            Some(PathBuf::from("terms.yaml"))
        );
    }
}

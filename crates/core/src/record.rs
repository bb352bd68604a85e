//! Patient intake records and the editable intake form.
//!
//! A [`PatientRecord`] is deliberately loose: every field is optional text, exactly as it is
//! captured from the form. Validation happens only when the patient is saved
//! ([`PatientRecord::validate_required`]); the resource builder accepts any record and
//! substitutes documented defaults for absent fields.

use crate::registry::PatientRegistry;
use crate::{IntakeError, IntakeResult};
use chrono::NaiveDate;
use intake_types::{Gender, HealthId, NonEmptyText};
use std::fmt;

/// A single field on the intake form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordField {
    HealthId,
    Name,
    HospitalId,
    PatientId,
    BirthDate,
    Gender,
    Phone,
    Email,
    Address,
    Weight,
    Height,
    BloodPressure,
    FollowUpDate,
    Notes,
    Complaint,
}

impl RecordField {
    /// Fields that must be present before a patient can be saved.
    pub const REQUIRED: [RecordField; 4] = [
        RecordField::HealthId,
        RecordField::Name,
        RecordField::BirthDate,
        RecordField::Gender,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RecordField::HealthId => "ABHA ID",
            RecordField::Name => "patient name",
            RecordField::HospitalId => "hospital ID",
            RecordField::PatientId => "patient ID",
            RecordField::BirthDate => "date of birth",
            RecordField::Gender => "gender",
            RecordField::Phone => "phone number",
            RecordField::Email => "email address",
            RecordField::Address => "address",
            RecordField::Weight => "weight",
            RecordField::Height => "height",
            RecordField::BloodPressure => "blood pressure",
            RecordField::FollowUpDate => "follow-up date",
            RecordField::Notes => "notes",
            RecordField::Complaint => "primary complaint",
        }
    }

    /// Identity fields that become read-only while the form is auto-filled.
    fn locked_by_auto_fill(self) -> bool {
        matches!(
            self,
            RecordField::Name
                | RecordField::BirthDate
                | RecordField::Gender
                | RecordField::Phone
                | RecordField::Email
                | RecordField::Address
        )
    }

    /// Fields the form never lets the user edit.
    fn always_read_only(self) -> bool {
        matches!(self, RecordField::HospitalId | RecordField::PatientId)
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Patient identity, contact and encounter data as captured on the form.
///
/// Empty or whitespace-only text is treated the same as an absent value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatientRecord {
    /// External health identifier (ABHA ID), expected to be 14 digits.
    pub health_id: Option<String>,
    pub name: Option<String>,
    pub hospital_id: Option<String>,
    pub patient_id: Option<String>,
    /// Calendar date, `YYYY-MM-DD`.
    pub birth_date: Option<String>,
    /// `Male`, `Female` or `Other` (case-insensitive).
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    /// Body weight in kilograms, free text.
    pub weight: Option<String>,
    pub height: Option<String>,
    pub blood_pressure: Option<String>,
    pub follow_up_date: Option<String>,
    pub notes: Option<String>,
    pub complaint: Option<String>,
}

/// The required identity fields of a record, validated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequiredFields {
    pub health_id: HealthId,
    pub name: NonEmptyText,
    pub birth_date: NaiveDate,
    pub gender: Gender,
}

impl PatientRecord {
    fn slot(&self, field: RecordField) -> &Option<String> {
        match field {
            RecordField::HealthId => &self.health_id,
            RecordField::Name => &self.name,
            RecordField::HospitalId => &self.hospital_id,
            RecordField::PatientId => &self.patient_id,
            RecordField::BirthDate => &self.birth_date,
            RecordField::Gender => &self.gender,
            RecordField::Phone => &self.phone,
            RecordField::Email => &self.email,
            RecordField::Address => &self.address,
            RecordField::Weight => &self.weight,
            RecordField::Height => &self.height,
            RecordField::BloodPressure => &self.blood_pressure,
            RecordField::FollowUpDate => &self.follow_up_date,
            RecordField::Notes => &self.notes,
            RecordField::Complaint => &self.complaint,
        }
    }

    fn slot_mut(&mut self, field: RecordField) -> &mut Option<String> {
        match field {
            RecordField::HealthId => &mut self.health_id,
            RecordField::Name => &mut self.name,
            RecordField::HospitalId => &mut self.hospital_id,
            RecordField::PatientId => &mut self.patient_id,
            RecordField::BirthDate => &mut self.birth_date,
            RecordField::Gender => &mut self.gender,
            RecordField::Phone => &mut self.phone,
            RecordField::Email => &mut self.email,
            RecordField::Address => &mut self.address,
            RecordField::Weight => &mut self.weight,
            RecordField::Height => &mut self.height,
            RecordField::BloodPressure => &mut self.blood_pressure,
            RecordField::FollowUpDate => &mut self.follow_up_date,
            RecordField::Notes => &mut self.notes,
            RecordField::Complaint => &mut self.complaint,
        }
    }

    /// Trimmed value of `field`, or `None` when absent or blank.
    pub fn get(&self, field: RecordField) -> Option<&str> {
        self.slot(field)
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// Overwrite `field` without any read-only checks.
    pub fn set(&mut self, field: RecordField, value: impl Into<String>) {
        *self.slot_mut(field) = Some(value.into());
    }

    pub fn clear(&mut self, field: RecordField) {
        *self.slot_mut(field) = None;
    }

    /// Required fields that are absent or blank, in form order.
    pub fn missing_required(&self) -> Vec<RecordField> {
        RecordField::REQUIRED
            .into_iter()
            .filter(|f| self.get(*f).is_none())
            .collect()
    }

    /// Check the fields required to save a patient.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [`IntakeError::MissingRequiredFields`] listing every absent required field,
    /// - [`IntakeError::InvalidInput`] if the health id is not 14 digits, the birth date is
    ///   not `YYYY-MM-DD`, or the gender is not male/female/other.
    pub fn validate_required(&self) -> IntakeResult<RequiredFields> {
        let missing = self.missing_required();
        if !missing.is_empty() {
            return Err(IntakeError::MissingRequiredFields(missing));
        }

        let health_id = HealthId::parse(self.get(RecordField::HealthId).unwrap_or_default())
            .map_err(|e| IntakeError::InvalidInput(e.to_string()))?;
        let name = NonEmptyText::new(self.get(RecordField::Name).unwrap_or_default())
            .map_err(|e| IntakeError::InvalidInput(e.to_string()))?;
        let raw_date = self.get(RecordField::BirthDate).unwrap_or_default();
        let birth_date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|e| {
            IntakeError::InvalidInput(format!("invalid date of birth '{raw_date}': {e}"))
        })?;
        let gender = self
            .get(RecordField::Gender)
            .unwrap_or_default()
            .parse::<Gender>()
            .map_err(|e| IntakeError::InvalidInput(e.to_string()))?;

        Ok(RequiredFields {
            health_id,
            name,
            birth_date,
            gender,
        })
    }
}

/// The editable intake form.
///
/// Wraps a [`PatientRecord`] with the form's edit rules: hospital and patient identifiers
/// are never user-editable, and identity fields are locked while they hold data auto-filled
/// from a known health id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntakeForm {
    record: PatientRecord,
    auto_filled: bool,
}

impl IntakeForm {
    /// A blank form with the hospital identifier pre-filled.
    pub fn new(hospital_id: &str) -> Self {
        let mut record = PatientRecord::default();
        record.set(RecordField::HospitalId, hospital_id);
        Self {
            record,
            auto_filled: false,
        }
    }

    pub fn record(&self) -> &PatientRecord {
        &self.record
    }

    pub fn is_auto_filled(&self) -> bool {
        self.auto_filled
    }

    pub fn is_read_only(&self, field: RecordField) -> bool {
        field.always_read_only() || (self.auto_filled && field.locked_by_auto_fill())
    }

    /// Set the health id, auto-filling identity fields when it matches a known patient.
    ///
    /// Only the exact 14-digit text matches; surrounding whitespace does not. Any value that
    /// does not match a known patient clears the auto-filled state; the previously filled
    /// values stay but become editable again.
    ///
    /// Returns `true` if the form was auto-filled.
    pub fn set_health_id(&mut self, value: &str, registry: &PatientRegistry) -> bool {
        self.record.set(RecordField::HealthId, value);

        let known = HealthId::parse(value)
            .ok()
            .filter(|id| id.as_str() == value)
            .and_then(|id| registry.find(&id));

        match known {
            Some(known) => {
                for field in [
                    RecordField::Name,
                    RecordField::HospitalId,
                    RecordField::PatientId,
                    RecordField::BirthDate,
                    RecordField::Gender,
                    RecordField::Phone,
                    RecordField::Email,
                    RecordField::Address,
                ] {
                    *self.record.slot_mut(field) = known.slot(field).clone();
                }
                self.auto_filled = true;
                tracing::info!("auto-filled patient data from health id");
            }
            None => self.auto_filled = false,
        }

        self.auto_filled
    }

    /// Set a form field, enforcing the read-only rules.
    ///
    /// Setting [`RecordField::HealthId`] here is equivalent to [`IntakeForm::set_health_id`].
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::ReadOnlyField`] when `field` is currently read-only.
    pub fn set_field(
        &mut self,
        field: RecordField,
        value: &str,
        registry: &PatientRegistry,
    ) -> IntakeResult<()> {
        if field == RecordField::HealthId {
            self.set_health_id(value, registry);
            return Ok(());
        }
        if self.is_read_only(field) {
            return Err(IntakeError::ReadOnlyField(field));
        }
        self.record.set(field, value);
        Ok(())
    }
}

//! Known patients, keyed by external health identifier.
//!
//! Stands in for a health-id lookup service: a hit lets the intake form auto-fill identity
//! and contact fields.

use crate::record::PatientRecord;
use intake_types::HealthId;
use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
pub struct PatientRegistry {
    records: HashMap<HealthId, PatientRecord>,
}

impl PatientRegistry {
    /// An empty registry; no health id will auto-fill.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in demo registry.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.insert(
            HealthId::parse("12345678901234").expect("valid literal health id"),
            PatientRecord {
                health_id: Some("12345678901234".into()),
                name: Some("Raj Kumar Sharma".into()),
                hospital_id: Some("HSP-2024-001".into()),
                patient_id: Some("PAT-2024-0123".into()),
                birth_date: Some("1985-06-15".into()),
                gender: Some("Male".into()),
                phone: Some("+91 98765 43210".into()),
                email: Some("raj.sharma@email.com".into()),
                address: Some("123 Gandhi Nagar, New Delhi, 110001".into()),
                ..Default::default()
            },
        );
        registry.insert(
            HealthId::parse("98765432109876").expect("valid literal health id"),
            PatientRecord {
                health_id: Some("98765432109876".into()),
                name: Some("Priya Patel".into()),
                hospital_id: Some("HSP-2024-001".into()),
                patient_id: Some("PAT-2024-0124".into()),
                birth_date: Some("1990-03-22".into()),
                gender: Some("Female".into()),
                phone: Some("+91 87654 32109".into()),
                email: Some("priya.patel@email.com".into()),
                address: Some("456 MG Road, Mumbai, 400001".into()),
                ..Default::default()
            },
        );
        registry
    }

    /// Register or replace a known patient.
    pub fn insert(&mut self, health_id: HealthId, record: PatientRecord) {
        self.records.insert(health_id, record);
    }

    pub fn find(&self, health_id: &HealthId) -> Option<&PatientRecord> {
        self.records.get(health_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

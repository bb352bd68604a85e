//! The intake session.
//!
//! An [`IntakeSession`] owns everything one clinician-patient intake needs: the editable form,
//! the selected diagnosis, whether the patient has been saved, and the approval workflow.
//!
//! Workflow snapshots are published through a `tokio::sync::watch` channel. Callers either
//! poll [`IntakeSession::state`] or [`IntakeSession::subscribe`] to observe transitions,
//! including the deferred consent grant fired by the [`ConsentTimer`].

use crate::builder::{ClinicalEncounterContext, ResourceBuilder};
use crate::config::IntakeConfig;
use crate::constants::MIN_SEARCH_CHARS;
use crate::record::{IntakeForm, RecordField, RequiredFields};
use crate::registry::PatientRegistry;
use crate::terminology::{CodeMappingTable, DiagnosisEntry};
use crate::timer::ConsentTimer;
use crate::workflow::{self, Effect, Outcome, WorkflowEvent, WorkflowState};
use crate::{IntakeError, IntakeResult};
use fhir::{BundleResource, Resource, ResourceType};
use std::sync::Arc;
use tokio::sync::watch;

/// Receives the assembled bundle when a submission is accepted.
pub trait SubmissionSink {
    /// # Errors
    ///
    /// Implementations return an error when the bundle could not be handed over. The
    /// workflow then stays unsubmitted and the submission may be retried.
    fn submit(&mut self, bundle: &BundleResource) -> IntakeResult<()>;
}

/// Collects submitted bundles in memory.
impl SubmissionSink for Vec<BundleResource> {
    fn submit(&mut self, bundle: &BundleResource) -> IntakeResult<()> {
        self.push(bundle.clone());
        Ok(())
    }
}

pub struct IntakeSession {
    config: IntakeConfig,
    table: CodeMappingTable,
    registry: PatientRegistry,
    form: IntakeForm,
    diagnosis: Option<DiagnosisEntry>,
    saved: bool,
    workflow: Arc<watch::Sender<WorkflowState>>,
    consent_timer: Option<ConsentTimer>,
}

impl IntakeSession {
    pub fn new(config: IntakeConfig, table: CodeMappingTable, registry: PatientRegistry) -> Self {
        let form = IntakeForm::new(config.hospital_id().as_str());
        let (sender, _) = watch::channel(WorkflowState::default());
        Self {
            config,
            table,
            registry,
            form,
            diagnosis: None,
            saved: false,
            workflow: Arc::new(sender),
            consent_timer: None,
        }
    }

    /// Session using the configured terminology file (or the built-in table) and the
    /// built-in patient registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured terminology file cannot be read or parsed.
    pub fn from_config(config: IntakeConfig) -> IntakeResult<Self> {
        let table = match config.terminology_file() {
            Some(path) => CodeMappingTable::from_yaml_file(path)?,
            None => CodeMappingTable::builtin(),
        };
        Ok(Self::new(config, table, PatientRegistry::builtin()))
    }

    pub fn config(&self) -> &IntakeConfig {
        &self.config
    }

    pub fn table(&self) -> &CodeMappingTable {
        &self.table
    }

    pub fn form(&self) -> &IntakeForm {
        &self.form
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }

    pub fn selected_diagnosis(&self) -> Option<&DiagnosisEntry> {
        self.diagnosis.as_ref()
    }

    // ------------------------------------------------------------------------
    // Form editing
    // ------------------------------------------------------------------------

    /// Set the health id; returns `true` if the form was auto-filled from the registry.
    pub fn set_health_id(&mut self, value: &str) -> bool {
        self.form.set_health_id(value, &self.registry)
    }

    /// # Errors
    ///
    /// Returns [`IntakeError::ReadOnlyField`] when the field is currently read-only.
    pub fn set_field(&mut self, field: RecordField, value: &str) -> IntakeResult<()> {
        self.form.set_field(field, value, &self.registry)
    }

    /// Validate the required fields and mark the patient as saved.
    ///
    /// # Errors
    ///
    /// As [`crate::record::PatientRecord::validate_required`]. On error the session is left
    /// unchanged.
    pub fn save_patient(&mut self) -> IntakeResult<RequiredFields> {
        let required = self.form.record().validate_required()?;
        self.saved = true;
        tracing::info!("patient saved");
        Ok(required)
    }

    // ------------------------------------------------------------------------
    // Diagnosis
    // ------------------------------------------------------------------------

    /// Diagnosis suggestions for `query`, in table order.
    ///
    /// Queries shorter than three characters yield no suggestions. The query is used as
    /// typed, so surrounding whitespace counts towards the length and the match.
    pub fn search_diagnoses(&self, query: &str) -> Vec<&DiagnosisEntry> {
        if query.chars().count() < MIN_SEARCH_CHARS {
            return Vec::new();
        }
        self.table.lookup(query)
    }

    /// Select a diagnosis by local code and copy its name into the complaint field.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::UnknownDiagnosis`] if no entry has that code.
    pub fn select_diagnosis(&mut self, local_code: &str) -> IntakeResult<&DiagnosisEntry> {
        let entry = self
            .table
            .get(local_code.trim())
            .cloned()
            .ok_or_else(|| IntakeError::UnknownDiagnosis(local_code.to_string()))?;

        self.form
            .set_field(RecordField::Complaint, &entry.name, &self.registry)?;
        tracing::info!(local_code = %entry.local_code, "diagnosis selected");
        let entry = self.diagnosis.insert(entry);
        Ok(&*entry)
    }

    // ------------------------------------------------------------------------
    // Generation
    // ------------------------------------------------------------------------

    fn require_saved(&self) -> IntakeResult<()> {
        if self.saved {
            Ok(())
        } else {
            Err(IntakeError::PatientNotSaved)
        }
    }

    fn encounter_context(&self) -> ClinicalEncounterContext {
        ClinicalEncounterContext::now(self.config.practitioner().clone())
    }

    /// Build a fresh resource for `section`, stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::PatientNotSaved`] until [`IntakeSession::save_patient`] has
    /// succeeded.
    pub fn generate(&self, section: ResourceType) -> IntakeResult<Resource> {
        self.require_saved()?;
        Ok(ResourceBuilder::build(
            section,
            self.form.record(),
            self.diagnosis.as_ref(),
            &self.encounter_context(),
        ))
    }

    /// Canonical JSON for `section`.
    ///
    /// # Errors
    ///
    /// As [`IntakeSession::generate`], plus [`IntakeError::Fhir`] if rendering fails.
    pub fn render(&self, section: ResourceType) -> IntakeResult<String> {
        Ok(self.generate(section)?.render()?)
    }

    // ------------------------------------------------------------------------
    // Workflow
    // ------------------------------------------------------------------------

    /// Current workflow snapshot.
    pub fn state(&self) -> WorkflowState {
        *self.workflow.borrow()
    }

    /// Receiver that observes every published workflow snapshot.
    pub fn subscribe(&self) -> watch::Receiver<WorkflowState> {
        self.workflow.subscribe()
    }

    /// # Errors
    ///
    /// Returns [`IntakeError::PatientNotSaved`] if the patient has not been saved.
    pub fn request_validation(&mut self) -> IntakeResult<Outcome> {
        self.require_saved()?;
        Ok(dispatch(&self.workflow, WorkflowEvent::RequestValidation))
    }

    /// Request consent; when accepted, consent is granted after the configured delay.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::NoRuntime`] when called outside a tokio runtime. The workflow
    /// is left unchanged in that case.
    pub fn request_consent(&mut self) -> IntakeResult<Outcome> {
        tokio::runtime::Handle::try_current()?;

        let outcome = dispatch(&self.workflow, WorkflowEvent::RequestConsent);
        if let Outcome::Applied {
            effect: Some(Effect::ScheduleConsentGrant),
            ..
        } = outcome
        {
            let workflow = Arc::clone(&self.workflow);
            let timer = ConsentTimer::start(self.config.consent_delay(), move || {
                dispatch(&workflow, WorkflowEvent::ConsentGranted);
            })?;
            self.consent_timer = Some(timer);
        }
        Ok(outcome)
    }

    /// Cancel a scheduled consent grant.
    ///
    /// Consent stays `requesting`; it cannot be requested again in this session.
    /// Returns `true` if a grant was still pending.
    pub fn cancel_pending_consent(&mut self) -> bool {
        match self.consent_timer.take() {
            Some(timer) if !timer.is_finished() => {
                timer.cancel();
                tracing::info!("pending consent grant cancelled");
                true
            }
            _ => false,
        }
    }

    /// Submit the bundle once consent has been granted.
    ///
    /// The bundle is built fresh and handed to `sink` before the submission stage is marked
    /// successful. A rejected submission never reaches the sink.
    ///
    /// # Errors
    ///
    /// Returns [`IntakeError::PatientNotSaved`] if the patient has not been saved, or the
    /// sink's error. On error the workflow is unchanged.
    pub fn submit(&mut self, sink: &mut dyn SubmissionSink) -> IntakeResult<Outcome> {
        self.require_saved()?;

        if let Outcome::Rejected(reason) = workflow::apply(self.state(), WorkflowEvent::Submit) {
            tracing::warn!(event = %WorkflowEvent::Submit, %reason, "workflow event rejected");
            return Ok(Outcome::Rejected(reason));
        }

        let bundle = ResourceBuilder::bundle(
            self.form.record(),
            self.diagnosis.as_ref(),
            &self.encounter_context(),
        );
        sink.submit(&bundle)?;
        tracing::info!(bundle_id = %bundle.id, "bundle handed to submission sink");

        Ok(dispatch(&self.workflow, WorkflowEvent::Submit))
    }
}

/// Apply `event` to the published state, notifying subscribers only on change.
fn dispatch(workflow: &watch::Sender<WorkflowState>, event: WorkflowEvent) -> Outcome {
    let mut result = None;
    workflow.send_if_modified(|state| {
        let outcome = workflow::apply(*state, event);
        let changed = match &outcome {
            Outcome::Applied { state: next, .. } => {
                *state = *next;
                true
            }
            Outcome::Rejected(_) => false,
        };
        result = Some(outcome);
        changed
    });

    // send_if_modified always runs the closure
    let outcome = result.unwrap_or_else(|| workflow::apply(*workflow.borrow(), event));
    match &outcome {
        Outcome::Applied { state, .. } => tracing::info!(
            %event,
            validation = ?state.validation,
            consent = ?state.consent,
            submission = ?state.submission,
            "workflow transition applied"
        ),
        Outcome::Rejected(reason) => {
            tracing::warn!(%event, %reason, "workflow event rejected")
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{ConsentStatus, Rejection, SubmissionStatus, ValidationStatus};
    use std::time::Duration;
    use tokio::time::Instant;

    const DELAY: Duration = Duration::from_secs(10);

    fn session() -> IntakeSession {
        let config = IntakeConfig::default()
            .with_consent_delay(DELAY)
            .expect("config");
        IntakeSession::new(
            config,
            CodeMappingTable::builtin(),
            PatientRegistry::builtin(),
        )
    }

    fn saved_session() -> IntakeSession {
        let mut session = session();
        assert!(session.set_health_id("12345678901234"));
        session.save_patient().expect("save");
        session
    }

    struct FailingSink;

    impl SubmissionSink for FailingSink {
        fn submit(&mut self, _bundle: &BundleResource) -> IntakeResult<()> {
            Err(IntakeError::InvalidInput("endpoint unavailable".into()))
        }
    }

    #[test]
    fn missing_required_fields_reject_save_and_leave_state_unchanged() {
        let mut session = session();
        session
            .set_field(RecordField::Name, "Priya Patel")
            .expect("name");

        let err = session.save_patient().expect_err("missing fields");
        assert!(matches!(
            &err,
            IntakeError::MissingRequiredFields(fields)
                if fields == &vec![RecordField::HealthId, RecordField::BirthDate, RecordField::Gender]
        ));
        assert!(!session.is_saved());
        assert_eq!(session.state(), WorkflowState::default());
        assert!(matches!(
            session.generate(ResourceType::Patient),
            Err(IntakeError::PatientNotSaved)
        ));
        assert!(matches!(
            session.request_validation(),
            Err(IntakeError::PatientNotSaved)
        ));
    }

    #[test]
    fn search_needs_three_characters() {
        let session = session();
        assert!(session.search_diagnoses("Va").is_empty());
        assert!(session.search_diagnoses("  va  ").is_empty());
        assert!(session.search_diagnoses("  vat").is_empty());
        let hits = session.search_diagnoses("Vat");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].local_code, "AYU-001");
    }

    #[test]
    fn selecting_a_diagnosis_fills_the_complaint() {
        let mut session = saved_session();
        let entry = session.select_diagnosis("NAM-003").expect("select");
        assert_eq!(entry.name, "Essential Hypertension");
        assert_eq!(
            session.form().record().get(RecordField::Complaint),
            Some("Essential Hypertension")
        );

        assert!(matches!(
            session.select_diagnosis("XYZ-999"),
            Err(IntakeError::UnknownDiagnosis(code)) if code == "XYZ-999"
        ));
        assert_eq!(
            session.selected_diagnosis().map(|d| d.local_code.as_str()),
            Some("NAM-003")
        );
    }

    #[test]
    fn generate_uses_the_auto_filled_record() {
        let session = saved_session();
        let json = session.render(ResourceType::Patient).expect("render");
        let value: serde_json::Value = serde_json::from_str(&json).expect("json");
        assert_eq!(value["identifier"][0]["value"], "12345678901234");
        assert_eq!(value["gender"], "male");
        assert_eq!(value["name"][0]["text"], "Raj Kumar Sharma");
    }

    #[test]
    fn consent_outside_a_runtime_is_an_error() {
        let mut session = saved_session();
        session.request_validation().expect("validate");
        let err = session.request_consent().expect_err("no runtime");
        assert!(matches!(err, IntakeError::NoRuntime(_)));
        assert_eq!(session.state().consent, ConsentStatus::Pending);
    }

    #[test]
    fn submit_is_rejected_before_consent() {
        let mut session = saved_session();
        session.request_validation().expect("validate");

        let mut sink: Vec<BundleResource> = Vec::new();
        let outcome = session.submit(&mut sink).expect("submit");
        assert_eq!(outcome, Outcome::Rejected(Rejection::ConsentNotGranted));
        assert!(sink.is_empty());
        assert_eq!(session.state().submission, SubmissionStatus::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn consent_is_requesting_until_the_delay_elapses() {
        let mut session = saved_session();
        session.request_validation().expect("validate");
        let mut rx = session.subscribe();
        let start = Instant::now();

        let outcome = session.request_consent().expect("request");
        assert!(matches!(outcome, Outcome::Applied { .. }));
        assert_eq!(session.state().consent, ConsentStatus::Requesting);
        assert_eq!(
            session.request_consent().expect("again"),
            Outcome::Rejected(Rejection::ConsentInProgress)
        );

        tokio::time::advance(DELAY - Duration::from_millis(1)).await;
        tokio::task::yield_now().await;
        assert_eq!(session.state().consent, ConsentStatus::Requesting);

        rx.wait_for(|s| s.consent == ConsentStatus::Granted)
            .await
            .expect("granted");
        let elapsed = start.elapsed();
        assert!(elapsed >= DELAY && elapsed < DELAY + Duration::from_millis(5), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn full_workflow_submits_bundle() {
        let mut session = saved_session();
        session.select_diagnosis("AYU-001").expect("select");
        session.request_validation().expect("validate");
        session.request_consent().expect("consent");

        let mut rx = session.subscribe();
        rx.wait_for(|s| s.consent == ConsentStatus::Granted)
            .await
            .expect("granted");

        let mut sink: Vec<BundleResource> = Vec::new();
        let outcome = session.submit(&mut sink).expect("submit");
        assert!(matches!(outcome, Outcome::Applied { .. }));
        assert!(session.state().is_complete());
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].entry.len(), 4);

        assert_eq!(
            session.submit(&mut sink).expect("again"),
            Outcome::Rejected(Rejection::AlreadySubmitted)
        );
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_sink_leaves_submission_pending() {
        let mut session = saved_session();
        session.request_validation().expect("validate");
        session.request_consent().expect("consent");
        tokio::time::sleep(DELAY + Duration::from_millis(1)).await;
        assert_eq!(session.state().consent, ConsentStatus::Granted);

        assert!(session.submit(&mut FailingSink).is_err());
        assert_eq!(session.state().submission, SubmissionStatus::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_consent_never_grants() {
        let mut session = saved_session();
        session.request_validation().expect("validate");
        session.request_consent().expect("consent");

        assert!(session.cancel_pending_consent());
        assert!(!session.cancel_pending_consent());

        tokio::time::sleep(DELAY * 3).await;
        assert_eq!(session.state().consent, ConsentStatus::Requesting);
        assert_eq!(session.state().validation, ValidationStatus::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_session_cancels_the_grant() {
        let mut session = saved_session();
        session.request_validation().expect("validate");
        session.request_consent().expect("consent");
        let rx = session.subscribe();

        drop(session);
        tokio::time::sleep(DELAY * 2).await;
        assert_eq!(rx.borrow().consent, ConsentStatus::Requesting);
    }
}

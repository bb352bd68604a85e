//! Approval workflow state machine.
//!
//! Three stages gate the exposure and transmission of a generated bundle:
//! validation, consent and submission. The machine is a pure reducer: [`apply`] takes the
//! current [`WorkflowState`] and a [`WorkflowEvent`] and returns an [`Outcome`]. Out-of-order
//! events are rejected, never errors.
//!
//! The consent grant is deferred. Applying [`WorkflowEvent::RequestConsent`] yields the
//! [`Effect::ScheduleConsentGrant`] effect; the owner of the state is responsible for
//! feeding [`WorkflowEvent::ConsentGranted`] back in once the delay has elapsed.

use serde::Serialize;
use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    #[default]
    Pending,
    Success,
    /// Never produced: validation is simulated and always succeeds.
    Error,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsentStatus {
    #[default]
    Pending,
    Requesting,
    Granted,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    #[default]
    Pending,
    Success,
}

/// Snapshot of the three workflow stages. Starts all-pending.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WorkflowState {
    pub validation: ValidationStatus,
    pub consent: ConsentStatus,
    pub submission: SubmissionStatus,
}

impl WorkflowState {
    /// All three stages have reached their terminal success state.
    pub fn is_complete(&self) -> bool {
        self.validation == ValidationStatus::Success
            && self.consent == ConsentStatus::Granted
            && self.submission == SubmissionStatus::Success
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkflowEvent {
    RequestValidation,
    RequestConsent,
    /// Fired by the consent timer; not meant to be sent by users directly.
    ConsentGranted,
    Submit,
}

impl fmt::Display for WorkflowEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowEvent::RequestValidation => "request_validation",
            WorkflowEvent::RequestConsent => "request_consent",
            WorkflowEvent::ConsentGranted => "consent_granted",
            WorkflowEvent::Submit => "submit",
        };
        f.write_str(name)
    }
}

/// Work the caller must carry out after a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Apply [`WorkflowEvent::ConsentGranted`] after the configured consent delay.
    ScheduleConsentGrant,
}

/// Result of applying an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Applied {
        state: WorkflowState,
        effect: Option<Effect>,
    },
    Rejected(Rejection),
}

/// Why an event was not applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    AlreadyValidated,
    NotValidated,
    ConsentInProgress,
    ConsentAlreadyGranted,
    ConsentNotRequested,
    ConsentNotGranted,
    AlreadySubmitted,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Rejection::AlreadyValidated => "validation already succeeded",
            Rejection::NotValidated => "validation has not succeeded",
            Rejection::ConsentInProgress => "consent request already in progress",
            Rejection::ConsentAlreadyGranted => "consent already granted",
            Rejection::ConsentNotRequested => "consent was not requested",
            Rejection::ConsentNotGranted => "consent has not been granted",
            Rejection::AlreadySubmitted => "bundle already submitted",
        };
        f.write_str(reason)
    }
}

/// Apply `event` to `state`.
///
/// Transitions only ever move a stage forward:
/// - `RequestValidation`: validation `pending → success`.
/// - `RequestConsent`: requires validation success; consent `pending → requesting`, with
///   [`Effect::ScheduleConsentGrant`].
/// - `ConsentGranted`: consent `requesting → granted`.
/// - `Submit`: requires consent granted; submission `pending → success`.
pub fn apply(state: WorkflowState, event: WorkflowEvent) -> Outcome {
    let mut next = state;
    let mut effect = None;

    match event {
        WorkflowEvent::RequestValidation => {
            if state.validation == ValidationStatus::Success {
                return Outcome::Rejected(Rejection::AlreadyValidated);
            }
            next.validation = ValidationStatus::Success;
        }
        WorkflowEvent::RequestConsent => {
            if state.validation != ValidationStatus::Success {
                return Outcome::Rejected(Rejection::NotValidated);
            }
            match state.consent {
                ConsentStatus::Pending => {
                    next.consent = ConsentStatus::Requesting;
                    effect = Some(Effect::ScheduleConsentGrant);
                }
                ConsentStatus::Requesting => {
                    return Outcome::Rejected(Rejection::ConsentInProgress)
                }
                ConsentStatus::Granted => {
                    return Outcome::Rejected(Rejection::ConsentAlreadyGranted)
                }
            }
        }
        WorkflowEvent::ConsentGranted => match state.consent {
            ConsentStatus::Requesting => next.consent = ConsentStatus::Granted,
            ConsentStatus::Pending => return Outcome::Rejected(Rejection::ConsentNotRequested),
            ConsentStatus::Granted => {
                return Outcome::Rejected(Rejection::ConsentAlreadyGranted)
            }
        },
        WorkflowEvent::Submit => {
            if state.consent != ConsentStatus::Granted {
                return Outcome::Rejected(Rejection::ConsentNotGranted);
            }
            if state.submission == SubmissionStatus::Success {
                return Outcome::Rejected(Rejection::AlreadySubmitted);
            }
            next.submission = SubmissionStatus::Success;
        }
    }

    Outcome::Applied {
        state: next,
        effect,
    }
}

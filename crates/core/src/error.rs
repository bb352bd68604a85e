use crate::record::RecordField;

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("missing required fields: {}", format_fields(.0))]
    MissingRequiredFields(Vec<RecordField>),
    #[error("{0} is read-only")]
    ReadOnlyField(RecordField),
    #[error("patient must be saved before this operation")]
    PatientNotSaved,
    #[error("unknown diagnosis code: {0}")]
    UnknownDiagnosis(String),
    #[error("invalid terminology table: {0}")]
    InvalidTerminology(String),
    #[error("consent timer requires a running tokio runtime: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
    #[error("FHIR error: {0}")]
    Fhir(#[from] fhir::FhirError),
    #[error("failed to read terminology file: {0}")]
    FileRead(std::io::Error),
}

fn format_fields(fields: &[RecordField]) -> String {
    fields
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type IntakeResult<T> = std::result::Result<T, IntakeError>;

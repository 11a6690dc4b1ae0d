use form_rules::{AuthoringError, ValidationResult};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not authenticated")]
    Unauthenticated,
    #[error("{0} not found")]
    NotFound(String),
    #[error(transparent)]
    Invalid(#[from] AuthoringError),
    #[error("{message}")]
    Rejected {
        message: String,
        validation: ValidationResult,
    },
    #[error("record write failed: {0}")]
    RecordWrite(String),
    #[error("webhook registration failed: {0}")]
    Registration(String),
    #[error("store unavailable: {0}")]
    Store(String),
    #[error("invalid json: {0}")]
    Json(#[source] serde_json::Error),
    #[error("failed to parse config: {0}")]
    Config(#[source] serde_json::Error),
}

impl ServiceError {
    /// Stable identifier used in JSON error responses.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Unauthenticated => "unauthenticated",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Invalid(err) => err.code(),
            ServiceError::Rejected { .. } => "submission_rejected",
            ServiceError::RecordWrite(_) => "record_write_failed",
            ServiceError::Registration(_) => "webhook_registration_failed",
            ServiceError::Store(_) => "store_unavailable",
            ServiceError::Json(_) => "invalid_json",
            ServiceError::Config(_) => "invalid_config",
        }
    }
}

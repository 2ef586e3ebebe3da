// Central Error Type for the Application

use crate::domain::{DomainError, OperationalStatus};
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Resource busy: {0}")]
    ResourceBusy(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Admission closed: station is {0}")]
    AdmissionClosed(OperationalStatus),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidStateTransition { .. } => {
                AppError::InvalidTransition(err.to_string())
            }
            DomainError::ValidationError(msg) => AppError::Validation(msg),
        }
    }
}

impl AppError {
    /// Short machine-readable kind, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::InvalidTransition(_) => "invalid_transition",
            AppError::ResourceBusy(_) => "resource_busy",
            AppError::NotFound(_) => "not_found",
            AppError::AdmissionClosed(_) => "admission_closed",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Config(_) => "config",
            AppError::Internal(_) => "internal",
        }
    }
}

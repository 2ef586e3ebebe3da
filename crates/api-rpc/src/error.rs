//! RPC Error Types
//!
//! Maps application errors to stable JSON-RPC error codes.

use jsonrpsee::types::ErrorObjectOwned;
use photoqueue_core::error::AppError;

/// RPC Error Codes
pub mod code {
    pub const VALIDATION_ERROR: i32 = 4000;
    pub const NOT_FOUND: i32 = 4001;
    pub const INVALID_TRANSITION: i32 = 4002;
    pub const RESOURCE_BUSY: i32 = 4004;
    pub const ADMISSION_CLOSED: i32 = 4005;
    pub const UNAUTHORIZED: i32 = 4010;
    pub const INTERNAL_ERROR: i32 = 5000;
}

/// Convert AppError to JSON-RPC ErrorObject
pub fn to_rpc_error(err: AppError) -> ErrorObjectOwned {
    let code = match &err {
        AppError::Validation(_) => code::VALIDATION_ERROR,
        AppError::NotFound(_) => code::NOT_FOUND,
        AppError::InvalidTransition(_) => code::INVALID_TRANSITION,
        AppError::ResourceBusy(_) => code::RESOURCE_BUSY,
        AppError::AdmissionClosed(_) => code::ADMISSION_CLOSED,
        AppError::Unauthorized(_) => code::UNAUTHORIZED,
        AppError::Config(_) | AppError::Internal(_) => code::INTERNAL_ERROR,
    };

    // Admission closed carries the current status so clients can render it
    let data = match &err {
        AppError::AdmissionClosed(status) => Some(status.to_string()),
        _ => None,
    };
    ErrorObjectOwned::owned(code, err.to_string(), data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use photoqueue_core::domain::OperationalStatus;

    #[test]
    fn test_each_kind_has_distinct_code() {
        let cases = [
            (AppError::Validation("x".into()), code::VALIDATION_ERROR),
            (AppError::NotFound("x".into()), code::NOT_FOUND),
            (AppError::InvalidTransition("x".into()), code::INVALID_TRANSITION),
            (AppError::ResourceBusy("x".into()), code::RESOURCE_BUSY),
            (
                AppError::AdmissionClosed(OperationalStatus::Closed),
                code::ADMISSION_CLOSED,
            ),
            (AppError::Unauthorized("x".into()), code::UNAUTHORIZED),
            (AppError::Internal("x".into()), code::INTERNAL_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(to_rpc_error(err).code(), expected);
        }
    }

    #[test]
    fn test_admission_closed_carries_status() {
        let err = to_rpc_error(AppError::AdmissionClosed(OperationalStatus::Break));
        let data = err.data().map(|raw| raw.get().to_string());
        assert_eq!(data.as_deref(), Some("\"break\""));
        assert!(err.message().contains("break"));
    }
}

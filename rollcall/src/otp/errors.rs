//! OTP issuance error types.

use crate::db::StoreError;
use thiserror::Error;

/// Errors from OTP issuance.
#[derive(Debug, Error)]
pub enum OtpError {
    /// Subject is not an exact, case-sensitive catalog entry
    #[error("Invalid subject")]
    InvalidSubject,

    /// No approved teacher matches the employee ID
    #[error("Teacher not found")]
    TeacherNotFound,

    /// Duration must be a positive number of minutes
    #[error("Duration must be a positive number of minutes")]
    InvalidDuration,

    /// Storage failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl OtpError {
    /// Client-safe message; storage internals are not exposed.
    pub fn client_message(&self) -> String {
        match self {
            OtpError::Store(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for OTP operations
pub type OtpResult<T> = Result<T, OtpError>;

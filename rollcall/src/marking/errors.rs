//! Attendance marking error taxonomy.
//!
//! Every variant except `Store` is a client-input/state error surfaced
//! verbatim with a stable kind; the marking chain reports the first
//! failing check, so a given malformed claim always yields the same
//! diagnostic.

use crate::db::StoreError;
use thiserror::Error;

/// Errors from the attendance validation chain, in chain order.
#[derive(Debug, Error)]
pub enum MarkError {
    /// Claim subject is not in the catalog (case-insensitive)
    #[error("Invalid subject")]
    InvalidSubject,

    /// No approved student matches the roll number
    #[error("Student not found")]
    StudentNotFound,

    /// No OTP record matches the code (exact, case-sensitive)
    #[error("Invalid OTP")]
    OtpNotFound,

    /// Current instant is outside the OTP's active window
    #[error("OTP expired or not active")]
    OtpExpired,

    /// OTP is bound to a different subject
    #[error("Subject does not match OTP")]
    SubjectMismatch,

    /// A record for this (roll number, OTP) pair already exists
    #[error("Attendance already marked")]
    AlreadyMarked,

    /// Location is required by policy but the claim carries none
    #[error("Location is required to mark attendance")]
    LocationRequired,

    /// The OTP record carries no teacher location to geofence against
    #[error("Teacher location is missing for this OTP")]
    TeacherLocationMissing,

    /// Claim location is outside the geofence radius
    #[error("Too far from the teacher to mark attendance ({meters:.0} m away)")]
    TooFarFromTeacher { meters: f64 },

    /// This device marked attendance for this student too recently
    #[error("Attendance already marked from this device recently (within {minutes} minutes)")]
    DeviceCooldownActive { minutes: i64 },

    /// Storage failure, never retried here
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl MarkError {
    /// Client-safe message; storage internals are not exposed.
    pub fn client_message(&self) -> String {
        match self {
            MarkError::Store(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for marking operations
pub type MarkResult<T> = Result<T, MarkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_far_message_carries_rounded_distance() {
        let err = MarkError::TooFarFromTeacher { meters: 184.0 };
        assert!(err.to_string().contains("184 m"));
    }

    #[test]
    fn store_errors_are_sanitized_for_clients() {
        let err = MarkError::Store(StoreError::Database(sqlx::Error::PoolTimedOut));
        assert_eq!(err.client_message(), "Internal server error");
        assert_eq!(MarkError::OtpExpired.client_message(), "OTP expired or not active");
    }
}

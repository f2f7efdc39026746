//! Attendance claim and record models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A student's attendance-marking request against a specific OTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceClaim {
    pub roll_no: String,
    pub otp_code: String,
    pub subject: String,
    /// Claimed per-device identifier (browser visitor ID).
    pub device_fingerprint: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// A committed attendance record. Append-only; at most one record exists
/// per `(roll_no, otp_code)` pair, enforced by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: i64,
    /// Uppercase-normalized roll number.
    pub roll_no: String,
    /// Student display name snapshotted at mark time.
    pub student_name: String,
    /// Lowercased subject.
    pub subject: String,
    /// The OTP consumed by this record.
    pub otp_code: String,
    pub device_fingerprint: String,
    pub marked_at: DateTime<Utc>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

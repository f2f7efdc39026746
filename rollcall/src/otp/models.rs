//! OTP data models.

use crate::marking::geo::GeoPoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A one-time passcode bound to a subject, an issuing teacher, an active
/// time window, and the teacher's position at issuance.
///
/// Immutable after creation. Validity is computed on read against the
/// current instant; records are never evicted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpRecord {
    pub id: i64,
    /// Random fixed-length code from the A-Z0-9 alphabet, case-sensitive.
    pub code: String,
    /// Canonical subject name as issued (exact catalog spelling).
    pub subject: String,
    /// Uppercase-normalized employee ID of the issuing teacher.
    pub teacher_id: String,
    /// Start of the active window (UTC). Invariant:
    /// `end_time = start_time + duration`.
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Teacher's position at issuance; absent on legacy records.
    pub location: Option<GeoPoint>,
}

impl OtpRecord {
    /// Whether `instant` lies within the active window, bounds inclusive.
    pub fn is_active_at(&self, instant: DateTime<Utc>) -> bool {
        self.start_time <= instant && instant <= self.end_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(start: DateTime<Utc>, minutes: i64) -> OtpRecord {
        OtpRecord {
            id: 1,
            code: "A1B2C3".to_string(),
            subject: "DSA".to_string(),
            teacher_id: "T100".to_string(),
            start_time: start,
            end_time: start + Duration::minutes(minutes),
            location: None,
        }
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let start = Utc::now();
        let otp = record(start, 10);
        assert!(otp.is_active_at(start));
        assert!(otp.is_active_at(start + Duration::minutes(5)));
        assert!(otp.is_active_at(otp.end_time));
        assert!(!otp.is_active_at(start - Duration::seconds(1)));
        assert!(!otp.is_active_at(otp.end_time + Duration::seconds(1)));
    }
}

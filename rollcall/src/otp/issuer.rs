//! OTP issuance.

use super::{
    errors::{OtpError, OtpResult},
    models::OtpRecord,
};
use crate::db::{OtpRepository, PeopleRepository};
use crate::marking::geo::GeoPoint;
use crate::people::models::ApprovalState;
use crate::subjects::SubjectCatalog;
use chrono::{Duration, Utc};
use rand::Rng;
use std::sync::Arc;

/// Alphabet codes are drawn from: uppercase letters and digits.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Default code length.
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// OTP issuer
///
/// Issues codes bound to a subject, the issuing teacher, a time window,
/// and the teacher's position. Codes are drawn uniformly with replacement
/// from [`CODE_ALPHABET`]; collisions with existing codes are not checked.
/// This is an accepted tradeoff: a claim is matched by subsequent subject
/// and window checks, so codes are not required to be globally unique.
#[derive(Clone)]
pub struct OtpIssuer {
    people: Arc<dyn PeopleRepository>,
    otps: Arc<dyn OtpRepository>,
    catalog: SubjectCatalog,
    code_length: usize,
}

impl OtpIssuer {
    pub fn new(
        people: Arc<dyn PeopleRepository>,
        otps: Arc<dyn OtpRepository>,
        catalog: SubjectCatalog,
    ) -> Self {
        Self {
            people,
            otps,
            catalog,
            code_length: DEFAULT_CODE_LENGTH,
        }
    }

    /// Override the generated code length.
    pub fn with_code_length(mut self, code_length: usize) -> Self {
        self.code_length = code_length;
        self
    }

    /// Issue a new OTP.
    ///
    /// The subject must match the catalog case-sensitively (issuance is
    /// stricter than claim matching, deliberately), the teacher must be
    /// approved, and the duration must be positive. The window starts now
    /// (UTC) and ends `duration_minutes` later.
    ///
    /// # Errors
    ///
    /// * `OtpError::InvalidSubject` - subject not in the catalog
    /// * `OtpError::TeacherNotFound` - no approved teacher matches
    /// * `OtpError::InvalidDuration` - non-positive duration
    pub async fn issue(
        &self,
        teacher_id: &str,
        subject: &str,
        duration_minutes: i64,
        location: GeoPoint,
    ) -> OtpResult<OtpRecord> {
        if !self.catalog.contains_exact(subject) {
            return Err(OtpError::InvalidSubject);
        }

        let teacher_id = teacher_id.to_uppercase();
        self.people
            .find_teacher(&teacher_id, ApprovalState::Approved)
            .await?
            .ok_or(OtpError::TeacherNotFound)?;

        if duration_minutes <= 0 {
            return Err(OtpError::InvalidDuration);
        }

        let start_time = Utc::now();
        let mut record = OtpRecord {
            id: 0,
            code: generate_code(self.code_length),
            subject: subject.to_string(),
            teacher_id,
            start_time,
            end_time: start_time + Duration::minutes(duration_minutes),
            location: Some(location),
        };
        record.id = self.otps.insert(&record).await?;

        log::info!(
            "OTP issued for {} by {}, valid {} minutes",
            record.subject,
            record.teacher_id,
            duration_minutes
        );
        Ok(record)
    }
}

/// Generate a random code of `length` symbols drawn uniformly, with
/// replacement, from [`CODE_ALPHABET`].
pub fn generate_code(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::mock::{MockOtpRepository, MockPeopleRepository};
    use crate::people::models::Teacher;
    use chrono::NaiveDate;

    fn approved_teacher(employee_id: &str) -> Teacher {
        Teacher {
            id: 1,
            full_name: "R. Gupta".to_string(),
            email: "gupta@example.com".to_string(),
            phone: "9123456780".to_string(),
            dob: NaiveDate::from_ymd_opt(1980, 7, 2).unwrap(),
            gender: "M".to_string(),
            address: "Sector 25".to_string(),
            employee_id: employee_id.to_string(),
            subject: "DSA".to_string(),
            state: ApprovalState::Approved,
            created_at: Utc::now(),
        }
    }

    fn issuer_with_teacher() -> OtpIssuer {
        OtpIssuer::new(
            Arc::new(MockPeopleRepository::new().with_teacher(approved_teacher("T100"))),
            Arc::new(MockOtpRepository::new()),
            SubjectCatalog::default_catalog(),
        )
    }

    #[test]
    fn generated_codes_use_the_fixed_alphabet() {
        for _ in 0..50 {
            let code = generate_code(DEFAULT_CODE_LENGTH);
            assert_eq!(code.len(), 6);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)), "{code}");
        }
    }

    #[tokio::test]
    async fn issue_binds_subject_window_and_location() {
        let issuer = issuer_with_teacher();
        let record = issuer
            .issue("t100", "DSA", 15, GeoPoint::new(30.0, 76.0))
            .await
            .unwrap();

        assert_eq!(record.subject, "DSA");
        assert_eq!(record.teacher_id, "T100");
        assert_eq!(record.end_time - record.start_time, Duration::minutes(15));
        assert_eq!(record.location, Some(GeoPoint::new(30.0, 76.0)));
        assert_eq!(record.code.len(), 6);
    }

    #[tokio::test]
    async fn issuance_subject_match_is_case_sensitive() {
        let issuer = issuer_with_teacher();
        // Claims accept "dsa"; issuance does not.
        let err = issuer
            .issue("T100", "dsa", 15, GeoPoint::new(30.0, 76.0))
            .await
            .unwrap_err();
        assert!(matches!(err, OtpError::InvalidSubject));
    }

    #[tokio::test]
    async fn unknown_or_unapproved_teacher_is_rejected() {
        let issuer = OtpIssuer::new(
            Arc::new(MockPeopleRepository::new()),
            Arc::new(MockOtpRepository::new()),
            SubjectCatalog::default_catalog(),
        );
        let err = issuer
            .issue("T999", "DSA", 15, GeoPoint::new(30.0, 76.0))
            .await
            .unwrap_err();
        assert!(matches!(err, OtpError::TeacherNotFound));
    }

    #[tokio::test]
    async fn non_positive_duration_is_rejected() {
        let issuer = issuer_with_teacher();
        for minutes in [0, -5] {
            let err = issuer
                .issue("T100", "DSA", minutes, GeoPoint::new(30.0, 76.0))
                .await
                .unwrap_err();
            assert!(matches!(err, OtpError::InvalidDuration));
        }
    }
}

//! The attendance validator: the ordered rule chain that decides whether
//! a single claim is accepted.

use super::{
    errors::{MarkError, MarkResult},
    geo::{self, GeoPoint},
    models::{AttendanceClaim, AttendanceRecord},
};
use crate::db::{AttendanceRepository, OtpRepository, PeopleRepository, StoreError};
use crate::people::models::ApprovalState;
use crate::subjects::{SubjectCatalog, normalize_subject};
use chrono::{Duration, Utc};
use std::sync::Arc;

/// Anti-fraud policy for attendance marking.
///
/// The geofence and the device cooldown are independent, stackable
/// layers: the cooldown stops one device marking several students in
/// sequence; the geofence stops remote or proxied marking.
#[derive(Debug, Clone)]
pub struct MarkingPolicy {
    /// Whether claims must carry a location.
    pub require_location: bool,
    /// Maximum allowed distance from the teacher, in meters (inclusive).
    pub geofence_radius_m: f64,
    /// Minimum spacing between marks from one device for one student.
    pub device_cooldown_minutes: i64,
}

impl Default for MarkingPolicy {
    fn default() -> Self {
        Self {
            require_location: true,
            geofence_radius_m: 100.0,
            device_cooldown_minutes: 50,
        }
    }
}

/// Attendance validator
///
/// Checks run strictly in order and the first failure is the reported
/// error: existence and static lookups before geometry and history scans.
/// The order is part of the contract; callers feeding the same malformed
/// claim must get the same diagnostic every time.
#[derive(Clone)]
pub struct AttendanceValidator {
    people: Arc<dyn PeopleRepository>,
    otps: Arc<dyn OtpRepository>,
    attendance: Arc<dyn AttendanceRepository>,
    catalog: SubjectCatalog,
    policy: MarkingPolicy,
}

impl AttendanceValidator {
    pub fn new(
        people: Arc<dyn PeopleRepository>,
        otps: Arc<dyn OtpRepository>,
        attendance: Arc<dyn AttendanceRepository>,
        catalog: SubjectCatalog,
        policy: MarkingPolicy,
    ) -> Self {
        Self {
            people,
            otps,
            attendance,
            catalog,
            policy,
        }
    }

    /// Validate a claim and commit an attendance record.
    ///
    /// # Errors
    ///
    /// One of the [`MarkError`] chain variants, in check order. A
    /// uniqueness violation on the final insert also maps to
    /// [`MarkError::AlreadyMarked`]: the duplicate pre-check is advisory,
    /// the store constraint is authoritative.
    pub async fn mark(&self, claim: AttendanceClaim) -> MarkResult<AttendanceRecord> {
        // 1. Subject recognized (case-insensitive).
        let subject = self
            .catalog
            .resolve_claim(&claim.subject)
            .ok_or(MarkError::InvalidSubject)?;

        // 2. Student eligibility.
        let roll_no = claim.roll_no.trim().to_uppercase();
        let student = self
            .people
            .find_student(&roll_no, ApprovalState::Approved)
            .await?
            .ok_or(MarkError::StudentNotFound)?;

        // 3. OTP existence (codes are case-sensitive as generated).
        let otp = self
            .otps
            .find_by_code(&claim.otp_code)
            .await?
            .ok_or(MarkError::OtpNotFound)?;

        // 4. Time-window validity, bounds inclusive.
        let now = Utc::now();
        if !otp.is_active_at(now) {
            return Err(MarkError::OtpExpired);
        }

        // 5. Subject match against the OTP's binding.
        if normalize_subject(&otp.subject) != subject {
            return Err(MarkError::SubjectMismatch);
        }

        // 6. Duplicate-claim check (advisory; see the final insert).
        if self.attendance.find(&roll_no, &claim.otp_code).await?.is_some() {
            return Err(MarkError::AlreadyMarked);
        }

        // 7. Geofence.
        if self.policy.require_location {
            let here = match (claim.lat, claim.lng) {
                (Some(lat), Some(lng)) => GeoPoint::new(lat, lng),
                _ => return Err(MarkError::LocationRequired),
            };
            let teacher_pos = otp.location.ok_or(MarkError::TeacherLocationMissing)?;
            let meters = geo::haversine_m(here, teacher_pos);
            if meters > self.policy.geofence_radius_m {
                return Err(MarkError::TooFarFromTeacher { meters });
            }
        }

        // 8. Device replay window.
        let since = now - Duration::minutes(self.policy.device_cooldown_minutes);
        if self
            .attendance
            .find_recent_by_device(&roll_no, &claim.device_fingerprint, since)
            .await?
            .is_some()
        {
            return Err(MarkError::DeviceCooldownActive {
                minutes: self.policy.device_cooldown_minutes,
            });
        }

        // 9. Commit.
        let mut record = AttendanceRecord {
            id: 0,
            roll_no,
            student_name: student.full_name,
            subject,
            otp_code: claim.otp_code,
            device_fingerprint: claim.device_fingerprint,
            marked_at: now,
            lat: claim.lat,
            lng: claim.lng,
        };
        match self.attendance.insert(&record).await {
            Ok(id) => {
                record.id = id;
                log::info!(
                    "Attendance marked: {} / {} ({})",
                    record.roll_no,
                    record.subject,
                    record.otp_code
                );
                Ok(record)
            }
            // Lost a race with an identical concurrent claim.
            Err(StoreError::Duplicate) => Err(MarkError::AlreadyMarked),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::mock::{
        MockAttendanceRepository, MockOtpRepository, MockPeopleRepository,
    };
    use crate::otp::models::OtpRecord;
    use crate::people::models::Student;
    use chrono::{DateTime, NaiveDate};

    fn approved_student(roll_no: &str) -> Student {
        Student {
            id: 1,
            full_name: "Asha Verma".to_string(),
            email: "asha@example.com".to_string(),
            phone: "9876543210".to_string(),
            dob: NaiveDate::from_ymd_opt(2004, 3, 14).unwrap(),
            gender: "F".to_string(),
            address: "Hostel 4".to_string(),
            roll_no: roll_no.to_string(),
            department: "ECE".to_string(),
            course: "B.Tech".to_string(),
            semester: 5,
            section: "A".to_string(),
            state: ApprovalState::Approved,
            created_at: Utc::now(),
        }
    }

    fn otp(code: &str, subject: &str, start: DateTime<Utc>, minutes: i64) -> OtpRecord {
        OtpRecord {
            id: 1,
            code: code.to_string(),
            subject: subject.to_string(),
            teacher_id: "T100".to_string(),
            start_time: start,
            end_time: start + Duration::minutes(minutes),
            location: Some(GeoPoint::new(30.0, 76.0)),
        }
    }

    fn claim(roll_no: &str, code: &str, subject: &str, fingerprint: &str) -> AttendanceClaim {
        AttendanceClaim {
            roll_no: roll_no.to_string(),
            otp_code: code.to_string(),
            subject: subject.to_string(),
            device_fingerprint: fingerprint.to_string(),
            lat: Some(30.0),
            // ~55 m east of the teacher at this latitude.
            lng: Some(76.0005),
        }
    }

    struct Fixture {
        people: MockPeopleRepository,
        otps: MockOtpRepository,
        attendance: MockAttendanceRepository,
        policy: MarkingPolicy,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                people: MockPeopleRepository::new().with_student(approved_student("101")),
                otps: MockOtpRepository::new().with_record(otp("A1B2C3", "DSA", Utc::now(), 15)),
                attendance: MockAttendanceRepository::new(),
                policy: MarkingPolicy::default(),
            }
        }

        fn build(self) -> (AttendanceValidator, Arc<MockAttendanceRepository>) {
            let attendance = Arc::new(self.attendance);
            let validator = AttendanceValidator::new(
                Arc::new(self.people),
                Arc::new(self.otps),
                attendance.clone(),
                SubjectCatalog::default_catalog(),
                self.policy,
            );
            (validator, attendance)
        }
    }

    #[tokio::test]
    async fn end_to_end_valid_claim_is_committed() {
        let (validator, attendance) = Fixture::new().build();
        let before = Utc::now();

        let record = validator
            .mark(claim("101", "A1B2C3", "dsa", "fp-1"))
            .await
            .unwrap();

        assert_eq!(record.roll_no, "101");
        assert_eq!(record.student_name, "Asha Verma");
        assert_eq!(record.subject, "dsa");
        assert_eq!(record.otp_code, "A1B2C3");
        assert!(record.marked_at >= before && record.marked_at <= Utc::now());
        assert_eq!(attendance.record_count(), 1);
    }

    #[tokio::test]
    async fn unknown_subject_fails_first_regardless_of_other_fields() {
        let (validator, _) = Fixture::new().build();
        // Bogus roll number and OTP too; the subject check still wins.
        let err = validator
            .mark(claim("999", "XXXXXX", "Quantum Computing", "fp-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, MarkError::InvalidSubject));
    }

    #[tokio::test]
    async fn unapproved_student_is_rejected() {
        let (validator, _) = Fixture::new().build();
        let err = validator
            .mark(claim("999", "A1B2C3", "DSA", "fp-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, MarkError::StudentNotFound));
    }

    #[tokio::test]
    async fn otp_code_match_is_exact_and_case_sensitive() {
        let (validator, _) = Fixture::new().build();
        let err = validator
            .mark(claim("101", "a1b2c3", "DSA", "fp-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, MarkError::OtpNotFound));
    }

    #[tokio::test]
    async fn ten_minute_otp_expires_after_eleven() {
        let mut fixture = Fixture::new();
        fixture.otps = MockOtpRepository::new().with_record(otp(
            "A1B2C3",
            "DSA",
            Utc::now() - Duration::minutes(11),
            10,
        ));
        let (validator, _) = fixture.build();

        let err = validator
            .mark(claim("101", "A1B2C3", "DSA", "fp-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, MarkError::OtpExpired));
    }

    #[tokio::test]
    async fn ten_minute_otp_is_valid_after_five() {
        let mut fixture = Fixture::new();
        fixture.otps = MockOtpRepository::new().with_record(otp(
            "A1B2C3",
            "DSA",
            Utc::now() - Duration::minutes(5),
            10,
        ));
        let (validator, _) = fixture.build();

        validator
            .mark(claim("101", "A1B2C3", "DSA", "fp-1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn not_yet_active_otp_is_rejected() {
        let mut fixture = Fixture::new();
        fixture.otps = MockOtpRepository::new().with_record(otp(
            "A1B2C3",
            "DSA",
            Utc::now() + Duration::minutes(5),
            10,
        ));
        let (validator, _) = fixture.build();

        let err = validator
            .mark(claim("101", "A1B2C3", "DSA", "fp-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, MarkError::OtpExpired));
    }

    #[tokio::test]
    async fn subject_must_match_the_otp_binding() {
        let (validator, _) = Fixture::new().build();
        let err = validator
            .mark(claim("101", "A1B2C3", "NETWORKS", "fp-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, MarkError::SubjectMismatch));
    }

    #[tokio::test]
    async fn second_identical_claim_is_already_marked() {
        let (validator, attendance) = Fixture::new().build();

        validator
            .mark(claim("101", "A1B2C3", "DSA", "fp-1"))
            .await
            .unwrap();
        let err = validator
            .mark(claim("101", "A1B2C3", "DSA", "fp-2"))
            .await
            .unwrap_err();

        assert!(matches!(err, MarkError::AlreadyMarked));
        assert_eq!(attendance.record_count(), 1);
    }

    #[tokio::test]
    async fn claim_without_location_is_rejected_when_required() {
        let (validator, _) = Fixture::new().build();
        let mut c = claim("101", "A1B2C3", "DSA", "fp-1");
        c.lat = None;
        let err = validator.mark(c).await.unwrap_err();
        assert!(matches!(err, MarkError::LocationRequired));
    }

    #[tokio::test]
    async fn otp_without_teacher_location_cannot_geofence() {
        let mut fixture = Fixture::new();
        let mut record = otp("A1B2C3", "DSA", Utc::now(), 15);
        record.location = None;
        fixture.otps = MockOtpRepository::new().with_record(record);
        let (validator, _) = fixture.build();

        let err = validator
            .mark(claim("101", "A1B2C3", "DSA", "fp-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, MarkError::TeacherLocationMissing));
    }

    #[tokio::test]
    async fn geofence_boundary_is_inclusive() {
        // 0.0009 degrees of longitude at the equator is 100.075 m: just
        // outside the default 100 m radius, inside a radius set exactly to
        // the computed distance.
        let distance = geo::haversine_m(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.0009));
        assert!(distance > 100.0 && distance < 100.2);

        let equator_claim = || {
            let mut c = claim("101", "A1B2C3", "DSA", "fp-1");
            c.lat = Some(0.0);
            c.lng = Some(0.0009);
            c
        };
        let equator_otp = || {
            let mut record = otp("A1B2C3", "DSA", Utc::now(), 15);
            record.location = Some(GeoPoint::new(0.0, 0.0));
            record
        };

        let mut fixture = Fixture::new();
        fixture.otps = MockOtpRepository::new().with_record(equator_otp());
        let (validator, _) = fixture.build();
        let err = validator.mark(equator_claim()).await.unwrap_err();
        match err {
            MarkError::TooFarFromTeacher { meters } => {
                assert!((meters - distance).abs() < 1e-9)
            }
            other => panic!("expected TooFarFromTeacher, got {other:?}"),
        }

        let mut fixture = Fixture::new();
        fixture.otps = MockOtpRepository::new().with_record(equator_otp());
        fixture.policy.geofence_radius_m = distance;
        let (validator, _) = fixture.build();
        validator.mark(equator_claim()).await.unwrap();
    }

    #[tokio::test]
    async fn device_cooldown_blocks_marks_thirty_minutes_apart() {
        let mut fixture = Fixture::new();
        fixture.otps = MockOtpRepository::new()
            .with_record(otp("A1B2C3", "DSA", Utc::now() - Duration::minutes(31), 45))
            .with_record(otp("X9Y8Z7", "DSA", Utc::now(), 15));
        fixture.attendance = MockAttendanceRepository::new().with_record(AttendanceRecord {
            id: 1,
            roll_no: "101".to_string(),
            student_name: "Asha Verma".to_string(),
            subject: "dsa".to_string(),
            otp_code: "A1B2C3".to_string(),
            device_fingerprint: "fp-1".to_string(),
            marked_at: Utc::now() - Duration::minutes(30),
            lat: Some(30.0),
            lng: Some(76.0005),
        });
        let (validator, _) = fixture.build();

        let err = validator
            .mark(claim("101", "X9Y8Z7", "DSA", "fp-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, MarkError::DeviceCooldownActive { minutes: 50 }));
    }

    #[tokio::test]
    async fn device_cooldown_clears_after_fifty_one_minutes() {
        let mut fixture = Fixture::new();
        fixture.otps = MockOtpRepository::new().with_record(otp("X9Y8Z7", "DSA", Utc::now(), 15));
        fixture.attendance = MockAttendanceRepository::new().with_record(AttendanceRecord {
            id: 1,
            roll_no: "101".to_string(),
            student_name: "Asha Verma".to_string(),
            subject: "dsa".to_string(),
            otp_code: "A1B2C3".to_string(),
            device_fingerprint: "fp-1".to_string(),
            marked_at: Utc::now() - Duration::minutes(51),
            lat: Some(30.0),
            lng: Some(76.0005),
        });
        let (validator, attendance) = fixture.build();

        validator
            .mark(claim("101", "X9Y8Z7", "DSA", "fp-1"))
            .await
            .unwrap();
        assert_eq!(attendance.record_count(), 2);
    }

    #[tokio::test]
    async fn a_fresh_device_is_not_throttled() {
        let mut fixture = Fixture::new();
        fixture.otps = MockOtpRepository::new().with_record(otp("X9Y8Z7", "DSA", Utc::now(), 15));
        fixture.attendance = MockAttendanceRepository::new().with_record(AttendanceRecord {
            id: 1,
            roll_no: "101".to_string(),
            student_name: "Asha Verma".to_string(),
            subject: "dsa".to_string(),
            otp_code: "A1B2C3".to_string(),
            device_fingerprint: "fp-other".to_string(),
            marked_at: Utc::now() - Duration::minutes(5),
            lat: None,
            lng: None,
        });
        let (validator, _) = fixture.build();

        validator
            .mark(claim("101", "X9Y8Z7", "DSA", "fp-1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn location_checks_are_skipped_when_policy_allows() {
        let mut fixture = Fixture::new();
        fixture.policy.require_location = false;
        let (validator, _) = fixture.build();

        let mut c = claim("101", "A1B2C3", "DSA", "fp-1");
        c.lat = None;
        c.lng = None;
        validator.mark(c).await.unwrap();
    }

    #[tokio::test]
    async fn roll_number_is_normalized_before_lookup() {
        let mut fixture = Fixture::new();
        fixture.people = MockPeopleRepository::new().with_student(approved_student("ABC101"));
        let (validator, _) = fixture.build();

        let record = validator
            .mark(claim(" abc101 ", "A1B2C3", "DSA", "fp-1"))
            .await
            .unwrap();
        assert_eq!(record.roll_no, "ABC101");
    }
}

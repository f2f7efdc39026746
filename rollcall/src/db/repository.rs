//! Repository trait definitions for testability and dependency injection.
//!
//! The managers in this crate only see these traits; PostgreSQL
//! implementations live here alongside in-memory mocks used by the unit
//! tests. The attendance store is the one place with a hard ordering
//! guarantee: `insert` must fail distinctly on the `(roll_no, otp_code)`
//! uniqueness constraint so that concurrent duplicate claims resolve to
//! exactly one stored record.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use thiserror::Error;

use crate::marking::geo::GeoPoint;
use crate::marking::models::AttendanceRecord;
use crate::otp::models::OtpRecord;
use crate::people::models::{
    ApprovalState, Student, StudentRegistration, Teacher, TeacherRegistration,
};

/// Storage-level errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write. For attendance inserts
    /// this is the authoritative duplicate signal.
    #[error("unique constraint violated")]
    Duplicate,

    /// Any other database failure (connectivity, timeout, bad query).
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

fn map_insert_err(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate,
        _ => StoreError::Database(e),
    }
}

/// Trait for student/teacher repository operations
#[async_trait]
pub trait PeopleRepository: Send + Sync {
    /// Insert a student registration in pending state, returning its ID.
    async fn insert_pending_student(&self, registration: &StudentRegistration)
    -> StoreResult<i64>;

    /// Insert a teacher registration in pending state, returning its ID.
    async fn insert_pending_teacher(&self, registration: &TeacherRegistration)
    -> StoreResult<i64>;

    /// Find a student by uppercase-normalized roll number in a given state.
    async fn find_student(&self, roll_no: &str, state: ApprovalState)
    -> StoreResult<Option<Student>>;

    /// Find a teacher by uppercase-normalized employee ID in a given state.
    async fn find_teacher(
        &self,
        employee_id: &str,
        state: ApprovalState,
    ) -> StoreResult<Option<Teacher>>;

    /// Transition a student `from -> to`. Returns false when no row was in
    /// the `from` state, which makes the transition at-most-once.
    async fn set_student_state(
        &self,
        roll_no: &str,
        from: ApprovalState,
        to: ApprovalState,
    ) -> StoreResult<bool>;

    /// Transition a teacher `from -> to`, at-most-once as above.
    async fn set_teacher_state(
        &self,
        employee_id: &str,
        from: ApprovalState,
        to: ApprovalState,
    ) -> StoreResult<bool>;

    /// List students in a given state, oldest registration first.
    async fn list_students(&self, state: ApprovalState) -> StoreResult<Vec<Student>>;

    /// List teachers in a given state, oldest registration first.
    async fn list_teachers(&self, state: ApprovalState) -> StoreResult<Vec<Teacher>>;
}

/// Trait for OTP repository operations
#[async_trait]
pub trait OtpRepository: Send + Sync {
    /// Persist a new OTP record, returning its ID.
    async fn insert(&self, record: &OtpRecord) -> StoreResult<i64>;

    /// Find an OTP by exact, case-sensitive code match.
    async fn find_by_code(&self, code: &str) -> StoreResult<Option<OtpRecord>>;

    /// All codes ever issued by a teacher.
    async fn codes_issued_by(&self, teacher_id: &str) -> StoreResult<Vec<String>>;
}

/// Trait for attendance repository operations
#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    /// Append a new attendance record, returning its ID. Fails with
    /// [`StoreError::Duplicate`] when a record for the same
    /// `(roll_no, otp_code)` already exists.
    async fn insert(&self, record: &AttendanceRecord) -> StoreResult<i64>;

    /// Find the record for a `(roll_no, otp_code)` pair.
    async fn find(&self, roll_no: &str, otp_code: &str) -> StoreResult<Option<AttendanceRecord>>;

    /// Find any record for the same roll number and device fingerprint
    /// marked at or after `since`.
    async fn find_recent_by_device(
        &self,
        roll_no: &str,
        fingerprint: &str,
        since: DateTime<Utc>,
    ) -> StoreResult<Option<AttendanceRecord>>;

    /// All records for a student, optionally filtered by lowercased
    /// subject, oldest first.
    async fn list_for_student(
        &self,
        roll_no: &str,
        subject: Option<&str>,
    ) -> StoreResult<Vec<AttendanceRecord>>;

    /// All records marked against any of the given OTP codes.
    async fn list_for_codes(&self, codes: &[String]) -> StoreResult<Vec<AttendanceRecord>>;
}

/// PostgreSQL implementation of [`PeopleRepository`]
pub struct PgPeopleRepository {
    pool: PgPool,
}

impl PgPeopleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn student_from_row(row: &PgRow, state: ApprovalState) -> Student {
    Student {
        id: row.get("id"),
        full_name: row.get("full_name"),
        email: row.get("email"),
        phone: row.get("phone"),
        dob: row.get("dob"),
        gender: row.get("gender"),
        address: row.get("address"),
        roll_no: row.get("roll_no"),
        department: row.get("department"),
        course: row.get("course"),
        semester: row.get("semester"),
        section: row.get("section"),
        state,
        created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
    }
}

fn teacher_from_row(row: &PgRow, state: ApprovalState) -> Teacher {
    Teacher {
        id: row.get("id"),
        full_name: row.get("full_name"),
        email: row.get("email"),
        phone: row.get("phone"),
        dob: row.get("dob"),
        gender: row.get("gender"),
        address: row.get("address"),
        employee_id: row.get("employee_id"),
        subject: row.get("subject"),
        state,
        created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
    }
}

const STUDENT_COLUMNS: &str = "id, full_name, email, phone, dob, gender, address, roll_no, \
     department, course, semester, section, created_at";

const TEACHER_COLUMNS: &str = "id, full_name, email, phone, dob, gender, address, employee_id, \
     subject, created_at";

#[async_trait]
impl PeopleRepository for PgPeopleRepository {
    async fn insert_pending_student(
        &self,
        registration: &StudentRegistration,
    ) -> StoreResult<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO students
                (full_name, email, phone, dob, gender, address, roll_no,
                 department, course, semester, section, state)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'pending')
            RETURNING id
            "#,
        )
        .bind(&registration.full_name)
        .bind(&registration.email)
        .bind(&registration.phone)
        .bind(registration.dob)
        .bind(&registration.gender)
        .bind(&registration.address)
        .bind(&registration.roll_no)
        .bind(&registration.department)
        .bind(&registration.course)
        .bind(registration.semester)
        .bind(&registration.section)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_err)?;

        Ok(row.get("id"))
    }

    async fn insert_pending_teacher(
        &self,
        registration: &TeacherRegistration,
    ) -> StoreResult<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO teachers
                (full_name, email, phone, dob, gender, address, employee_id, subject, state)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending')
            RETURNING id
            "#,
        )
        .bind(&registration.full_name)
        .bind(&registration.email)
        .bind(&registration.phone)
        .bind(registration.dob)
        .bind(&registration.gender)
        .bind(&registration.address)
        .bind(&registration.employee_id)
        .bind(&registration.subject)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_err)?;

        Ok(row.get("id"))
    }

    async fn find_student(
        &self,
        roll_no: &str,
        state: ApprovalState,
    ) -> StoreResult<Option<Student>> {
        let row = sqlx::query(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE roll_no = $1 AND state = $2"
        ))
        .bind(roll_no)
        .bind(state.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| student_from_row(&r, state)))
    }

    async fn find_teacher(
        &self,
        employee_id: &str,
        state: ApprovalState,
    ) -> StoreResult<Option<Teacher>> {
        let row = sqlx::query(&format!(
            "SELECT {TEACHER_COLUMNS} FROM teachers WHERE employee_id = $1 AND state = $2"
        ))
        .bind(employee_id)
        .bind(state.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| teacher_from_row(&r, state)))
    }

    async fn set_student_state(
        &self,
        roll_no: &str,
        from: ApprovalState,
        to: ApprovalState,
    ) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE students SET state = $3 WHERE roll_no = $1 AND state = $2")
            .bind(roll_no)
            .bind(from.as_str())
            .bind(to.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_teacher_state(
        &self,
        employee_id: &str,
        from: ApprovalState,
        to: ApprovalState,
    ) -> StoreResult<bool> {
        let result =
            sqlx::query("UPDATE teachers SET state = $3 WHERE employee_id = $1 AND state = $2")
                .bind(employee_id)
                .bind(from.as_str())
                .bind(to.as_str())
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_students(&self, state: ApprovalState) -> StoreResult<Vec<Student>> {
        let rows = sqlx::query(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE state = $1 ORDER BY created_at"
        ))
        .bind(state.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|r| student_from_row(r, state)).collect())
    }

    async fn list_teachers(&self, state: ApprovalState) -> StoreResult<Vec<Teacher>> {
        let rows = sqlx::query(&format!(
            "SELECT {TEACHER_COLUMNS} FROM teachers WHERE state = $1 ORDER BY created_at"
        ))
        .bind(state.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|r| teacher_from_row(r, state)).collect())
    }
}

/// PostgreSQL implementation of [`OtpRepository`]
pub struct PgOtpRepository {
    pool: PgPool,
}

impl PgOtpRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn otp_from_row(row: &PgRow) -> OtpRecord {
    let lat: Option<f64> = row.get("teacher_lat");
    let lng: Option<f64> = row.get("teacher_lng");
    OtpRecord {
        id: row.get("id"),
        code: row.get("code"),
        subject: row.get("subject"),
        teacher_id: row.get("teacher_id"),
        // Stored naive, always UTC.
        start_time: row.get::<chrono::NaiveDateTime, _>("start_time").and_utc(),
        end_time: row.get::<chrono::NaiveDateTime, _>("end_time").and_utc(),
        location: match (lat, lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        },
    }
}

#[async_trait]
impl OtpRepository for PgOtpRepository {
    async fn insert(&self, record: &OtpRecord) -> StoreResult<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO otps (code, subject, teacher_id, start_time, end_time,
                              teacher_lat, teacher_lng)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&record.code)
        .bind(&record.subject)
        .bind(&record.teacher_id)
        .bind(record.start_time.naive_utc())
        .bind(record.end_time.naive_utc())
        .bind(record.location.map(|p| p.lat))
        .bind(record.location.map(|p| p.lng))
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_err)?;

        Ok(row.get("id"))
    }

    async fn find_by_code(&self, code: &str) -> StoreResult<Option<OtpRecord>> {
        let row = sqlx::query(
            "SELECT id, code, subject, teacher_id, start_time, end_time, teacher_lat, teacher_lng
             FROM otps WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| otp_from_row(&r)))
    }

    async fn codes_issued_by(&self, teacher_id: &str) -> StoreResult<Vec<String>> {
        let rows = sqlx::query("SELECT code FROM otps WHERE teacher_id = $1 ORDER BY start_time")
            .bind(teacher_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|r| r.get("code")).collect())
    }
}

/// PostgreSQL implementation of [`AttendanceRepository`]
pub struct PgAttendanceRepository {
    pool: PgPool,
}

impl PgAttendanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn attendance_from_row(row: &PgRow) -> AttendanceRecord {
    AttendanceRecord {
        id: row.get("id"),
        roll_no: row.get("roll_no"),
        student_name: row.get("student_name"),
        subject: row.get("subject"),
        otp_code: row.get("otp_code"),
        device_fingerprint: row.get("device_fingerprint"),
        marked_at: row.get::<chrono::NaiveDateTime, _>("marked_at").and_utc(),
        lat: row.get("lat"),
        lng: row.get("lng"),
    }
}

const ATTENDANCE_COLUMNS: &str =
    "id, roll_no, student_name, subject, otp_code, device_fingerprint, marked_at, lat, lng";

#[async_trait]
impl AttendanceRepository for PgAttendanceRepository {
    async fn insert(&self, record: &AttendanceRecord) -> StoreResult<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO attendance
                (roll_no, student_name, subject, otp_code, device_fingerprint,
                 marked_at, lat, lng)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&record.roll_no)
        .bind(&record.student_name)
        .bind(&record.subject)
        .bind(&record.otp_code)
        .bind(&record.device_fingerprint)
        .bind(record.marked_at.naive_utc())
        .bind(record.lat)
        .bind(record.lng)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_err)?;

        Ok(row.get("id"))
    }

    async fn find(&self, roll_no: &str, otp_code: &str) -> StoreResult<Option<AttendanceRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE roll_no = $1 AND otp_code = $2"
        ))
        .bind(roll_no)
        .bind(otp_code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| attendance_from_row(&r)))
    }

    async fn find_recent_by_device(
        &self,
        roll_no: &str,
        fingerprint: &str,
        since: DateTime<Utc>,
    ) -> StoreResult<Option<AttendanceRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance
             WHERE roll_no = $1 AND device_fingerprint = $2 AND marked_at >= $3
             LIMIT 1"
        ))
        .bind(roll_no)
        .bind(fingerprint)
        .bind(since.naive_utc())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| attendance_from_row(&r)))
    }

    async fn list_for_student(
        &self,
        roll_no: &str,
        subject: Option<&str>,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        let rows = match subject {
            Some(subject) => {
                sqlx::query(&format!(
                    "SELECT {ATTENDANCE_COLUMNS} FROM attendance
                     WHERE roll_no = $1 AND subject = $2 ORDER BY marked_at"
                ))
                .bind(roll_no)
                .bind(subject)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {ATTENDANCE_COLUMNS} FROM attendance
                     WHERE roll_no = $1 ORDER BY marked_at"
                ))
                .bind(roll_no)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.iter().map(attendance_from_row).collect())
    }

    async fn list_for_codes(&self, codes: &[String]) -> StoreResult<Vec<AttendanceRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance
             WHERE otp_code = ANY($1) ORDER BY marked_at"
        ))
        .bind(codes)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(attendance_from_row).collect())
    }
}

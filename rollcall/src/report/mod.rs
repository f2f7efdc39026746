//! Reporting formatter: renders stored attendance for viewing and export.
//!
//! Instants are stored UTC-qualified everywhere; conversion to the fixed
//! display offset (UTC+5:30) happens here and only here. No business rule
//! beyond formatting lives in this module.

use crate::db::{AttendanceRepository, OtpRepository, PeopleRepository, StoreError};
use crate::people::models::ApprovalState;
use crate::subjects::SubjectCatalog;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Display offset for human-facing timestamps: UTC+5:30 (IST).
pub fn display_offset() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600 + 30 * 60).expect("UTC+5:30 is a valid offset")
}

/// Format a stored UTC instant in the display timezone.
pub fn display_time(instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&display_offset())
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Errors from report assembly.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Invalid subject")]
    InvalidSubject,

    #[error("Teacher not found")]
    TeacherNotFound,

    #[error("Invalid OTP")]
    OtpNotFound,

    #[error("No attendance records found")]
    NoRecords,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ReportError {
    pub fn client_message(&self) -> String {
        match self {
            ReportError::Store(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for report operations
pub type ReportResult<T> = Result<T, ReportError>;

/// One row of a student's attendance history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentAttendanceRow {
    pub subject: String,
    pub marked_at: String,
}

/// One row of a teacher's attendance view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherAttendanceRow {
    pub student_name: String,
    pub roll_no: String,
    pub subject: String,
    pub marked_at: String,
}

/// Status of an OTP, window bounds in display time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpStatus {
    pub subject: String,
    pub start_time: String,
    pub end_time: String,
}

/// Report assembler over the persistence gateway.
#[derive(Clone)]
pub struct Reporter {
    people: Arc<dyn PeopleRepository>,
    otps: Arc<dyn OtpRepository>,
    attendance: Arc<dyn AttendanceRepository>,
    catalog: SubjectCatalog,
}

impl Reporter {
    pub fn new(
        people: Arc<dyn PeopleRepository>,
        otps: Arc<dyn OtpRepository>,
        attendance: Arc<dyn AttendanceRepository>,
        catalog: SubjectCatalog,
    ) -> Self {
        Self {
            people,
            otps,
            attendance,
            catalog,
        }
    }

    /// A student's attendance history, optionally filtered by subject
    /// (matched case-insensitively against the catalog).
    pub async fn student_attendance(
        &self,
        roll_no: &str,
        subject: Option<&str>,
    ) -> ReportResult<Vec<StudentAttendanceRow>> {
        let roll_no = roll_no.to_uppercase();
        let subject = match subject {
            Some(raw) => Some(
                self.catalog
                    .resolve_claim(raw)
                    .ok_or(ReportError::InvalidSubject)?,
            ),
            None => None,
        };

        let records = self
            .attendance
            .list_for_student(&roll_no, subject.as_deref())
            .await?;
        Ok(records
            .into_iter()
            .map(|r| StudentAttendanceRow {
                subject: r.subject,
                marked_at: display_time(r.marked_at),
            })
            .collect())
    }

    /// CSV export of a student's history. Header matches the original
    /// deployment's export.
    pub async fn student_attendance_csv(&self, roll_no: &str) -> ReportResult<String> {
        let rows = self.student_attendance(roll_no, None).await?;
        if rows.is_empty() {
            return Err(ReportError::NoRecords);
        }

        let mut csv = String::from("Subject,Marked At (IST)\n");
        for row in rows {
            csv.push_str(&csv_field(&row.subject));
            csv.push(',');
            csv.push_str(&csv_field(&row.marked_at));
            csv.push('\n');
        }
        Ok(csv)
    }

    /// All attendance marked against OTPs issued by a teacher.
    pub async fn teacher_attendance(
        &self,
        employee_id: &str,
    ) -> ReportResult<Vec<TeacherAttendanceRow>> {
        let employee_id = employee_id.to_uppercase();
        self.people
            .find_teacher(&employee_id, ApprovalState::Approved)
            .await?
            .ok_or(ReportError::TeacherNotFound)?;

        let codes = self.otps.codes_issued_by(&employee_id).await?;
        let records = self.attendance.list_for_codes(&codes).await?;
        Ok(records
            .into_iter()
            .map(|r| TeacherAttendanceRow {
                student_name: r.student_name,
                roll_no: r.roll_no,
                subject: r.subject,
                marked_at: display_time(r.marked_at),
            })
            .collect())
    }

    /// CSV export of a teacher's view.
    pub async fn teacher_attendance_csv(&self, employee_id: &str) -> ReportResult<String> {
        let rows = self.teacher_attendance(employee_id).await?;

        let mut csv = String::from("Student Name,Roll Number,Subject,Date/Time (IST)\n");
        for row in rows {
            csv.push_str(&csv_field(&row.student_name));
            csv.push(',');
            csv.push_str(&csv_field(&row.roll_no));
            csv.push(',');
            csv.push_str(&csv_field(&row.subject));
            csv.push(',');
            csv.push_str(&csv_field(&row.marked_at));
            csv.push('\n');
        }
        Ok(csv)
    }

    /// Subject and window of an OTP, for the student-facing code check.
    pub async fn otp_status(&self, code: &str) -> ReportResult<OtpStatus> {
        let otp = self
            .otps
            .find_by_code(code)
            .await?
            .ok_or(ReportError::OtpNotFound)?;
        Ok(OtpStatus {
            subject: otp.subject,
            start_time: display_time(otp.start_time),
            end_time: display_time(otp.end_time),
        })
    }
}

/// Minimal CSV quoting: fields with commas, quotes, or newlines are
/// wrapped and inner quotes doubled.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

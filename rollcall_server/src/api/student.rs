//! Student API handlers: attendance marking, history, OTP checks.
//!
//! # Examples
//!
//! Mark attendance:
//! ```bash
//! curl -X POST http://localhost:8000/api/v1/student/attendance \
//!   -H "Content-Type: application/json" \
//!   -d '{"roll_no": "101", "otp_code": "A1B2C3", "subject": "DSA",
//!        "device_fingerprint": "fp-abc123", "lat": 30.516, "lng": 76.660}'
//! ```

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use rollcall::MarkError;
use rollcall::marking::models::AttendanceClaim;
use rollcall::report::{OtpStatus, StudentAttendanceRow, display_time};
use serde::{Deserialize, Serialize};

use super::{
    AppState, ErrorResponse,
    teacher::{csv_attachment, report_error_response},
};

#[derive(Debug, Serialize)]
pub struct MarkResponse {
    pub message: String,
    pub subject: String,
    /// When the record was committed, in display time (IST).
    pub marked_at: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub subject: Option<String>,
}

fn mark_error_response(err: MarkError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        MarkError::StudentNotFound | MarkError::OtpNotFound => StatusCode::NOT_FOUND,
        MarkError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.client_message(),
        }),
    )
}

/// Mark attendance against an OTP.
///
/// The claim runs through the full validation chain; the first failing
/// check decides the response.
///
/// # Errors
///
/// - `404 Not Found`: unknown student or OTP code
/// - `400 Bad Request`: expired window, subject mismatch, duplicate,
///   missing location, outside the geofence, or device cooldown
/// - `500 Internal Server Error`: storage failure
pub async fn mark_attendance(
    State(state): State<AppState>,
    Json(claim): Json<AttendanceClaim>,
) -> Result<Json<MarkResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.validator.mark(claim).await {
        Ok(record) => Ok(Json(MarkResponse {
            message: "Attendance marked".to_string(),
            subject: record.subject,
            marked_at: display_time(record.marked_at),
        })),
        Err(e) => Err(mark_error_response(e)),
    }
}

/// A student's attendance history, optionally filtered with `?subject=`.
pub async fn view_attendance(
    State(state): State<AppState>,
    Path(roll_no): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<StudentAttendanceRow>>, (StatusCode, Json<ErrorResponse>)> {
    match state
        .reporter
        .student_attendance(&roll_no, query.subject.as_deref())
        .await
    {
        Ok(rows) => Ok(Json(rows)),
        Err(e) => Err(report_error_response(e)),
    }
}

/// Full history exported as a CSV attachment.
///
/// # Errors
///
/// - `404 Not Found`: the student has no attendance records
pub async fn export_attendance(
    State(state): State<AppState>,
    Path(roll_no): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    match state.reporter.student_attendance_csv(&roll_no).await {
        Ok(csv) => Ok(csv_attachment("my_attendance.csv", csv)),
        Err(e) => Err(report_error_response(e)),
    }
}

/// Subject and active window of an OTP, so a student can verify a code
/// before marking.
pub async fn check_otp(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<OtpStatus>, (StatusCode, Json<ErrorResponse>)> {
    match state.reporter.otp_status(&code).await {
        Ok(status) => Ok(Json(status)),
        Err(e) => Err(report_error_response(e)),
    }
}

/// Public profile of an approved student.
pub async fn profile(
    State(state): State<AppState>,
    Path(roll_no): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    match state.registry.student_profile(&roll_no).await {
        Ok(profile) => Ok(Json(profile)),
        Err(e) => Err(super::register::registry_error_response(e)),
    }
}

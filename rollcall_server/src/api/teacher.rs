//! Teacher API handlers: OTP issuance, attendance views, CSV export.
//!
//! # Examples
//!
//! Issue an OTP valid for 15 minutes:
//! ```bash
//! curl -X POST http://localhost:8000/api/v1/teacher/otp \
//!   -H "Content-Type: application/json" \
//!   -d '{"employee_id": "T100", "subject": "DSA", "duration_minutes": 15,
//!        "lat": 30.516, "lng": 76.660}'
//! ```

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use rollcall::marking::GeoPoint;
use rollcall::otp::OtpError;
use rollcall::report::{ReportError, TeacherAttendanceRow, display_time};
use serde::{Deserialize, Serialize};

use super::{AppState, ErrorResponse};

#[derive(Debug, Deserialize)]
pub struct GenerateOtpPayload {
    pub employee_id: String,
    pub subject: String,
    pub duration_minutes: i64,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize)]
pub struct GenerateOtpResponse {
    pub code: String,
    pub subject: String,
    /// End of the active window, in display time (IST).
    pub valid_till: String,
}

fn otp_error_response(err: OtpError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        OtpError::TeacherNotFound => StatusCode::NOT_FOUND,
        OtpError::InvalidSubject | OtpError::InvalidDuration => StatusCode::BAD_REQUEST,
        OtpError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.client_message(),
        }),
    )
}

pub(super) fn report_error_response(err: ReportError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        ReportError::InvalidSubject => StatusCode::BAD_REQUEST,
        ReportError::TeacherNotFound | ReportError::OtpNotFound | ReportError::NoRecords => {
            StatusCode::NOT_FOUND
        }
        ReportError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.client_message(),
        }),
    )
}

pub(super) fn csv_attachment(filename: &str, csv: String) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    )
}

/// Issue an OTP bound to a subject, a time window, and the teacher's
/// position.
///
/// # Errors
///
/// - `400 Bad Request`: subject not in the catalog (exact spelling) or
///   non-positive duration
/// - `404 Not Found`: no approved teacher matches
pub async fn generate_otp(
    State(state): State<AppState>,
    Json(payload): Json<GenerateOtpPayload>,
) -> Result<Json<GenerateOtpResponse>, (StatusCode, Json<ErrorResponse>)> {
    let location = GeoPoint::new(payload.lat, payload.lng);
    match state
        .issuer
        .issue(
            &payload.employee_id,
            &payload.subject,
            payload.duration_minutes,
            location,
        )
        .await
    {
        Ok(record) => Ok(Json(GenerateOtpResponse {
            code: record.code,
            subject: record.subject,
            valid_till: display_time(record.end_time),
        })),
        Err(e) => Err(otp_error_response(e)),
    }
}

/// Attendance marked against this teacher's OTPs.
pub async fn view_attendance(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
) -> Result<Json<Vec<TeacherAttendanceRow>>, (StatusCode, Json<ErrorResponse>)> {
    match state.reporter.teacher_attendance(&employee_id).await {
        Ok(rows) => Ok(Json(rows)),
        Err(e) => Err(report_error_response(e)),
    }
}

/// Same view, exported as a CSV attachment.
pub async fn export_attendance(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    match state.reporter.teacher_attendance_csv(&employee_id).await {
        Ok(csv) => Ok(csv_attachment("attendance.csv", csv)),
        Err(e) => Err(report_error_response(e)),
    }
}

/// Public profile of an approved teacher.
pub async fn profile(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    match state.registry.teacher_profile(&employee_id).await {
        Ok(profile) => Ok(Json(profile)),
        Err(e) => Err(super::register::registry_error_response(e)),
    }
}

//! Login API handlers.
//!
//! Students and teachers authenticate with their identity key and date of
//! birth, matching the original deployment's credential scheme. The admin
//! authenticates against credentials from server configuration.
//!
//! # Examples
//!
//! Student login:
//! ```bash
//! curl -X POST http://localhost:8000/api/v1/login/student \
//!   -H "Content-Type: application/json" \
//!   -d '{"roll_no": "101", "dob": "2004-03-14"}'
//! ```

use axum::{Json, extract::State, http::StatusCode};
use chrono::NaiveDate;
use rollcall::people::models::{Student, Teacher};
use serde::{Deserialize, Serialize};

use super::{AppState, ErrorResponse, register::registry_error_response};

#[derive(Debug, Deserialize)]
pub struct StudentLoginPayload {
    pub roll_no: String,
    pub dob: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct TeacherLoginPayload {
    pub employee_id: String,
    pub dob: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct AdminLoginPayload {
    pub admin_id: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct StudentLoginResponse {
    pub roll_no: String,
    pub full_name: String,
}

#[derive(Debug, Serialize)]
pub struct TeacherLoginResponse {
    pub employee_id: String,
    pub full_name: String,
}

#[derive(Debug, Serialize)]
pub struct AdminLoginResponse {
    pub message: String,
}

/// Student login with roll number and date of birth.
///
/// # Errors
///
/// - `401 Unauthorized`: unknown roll number, wrong DOB, or not yet approved
pub async fn login_student(
    State(state): State<AppState>,
    Json(payload): Json<StudentLoginPayload>,
) -> Result<Json<StudentLoginResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state
        .registry
        .login_student(&payload.roll_no, payload.dob)
        .await
    {
        Ok(Student {
            roll_no, full_name, ..
        }) => Ok(Json(StudentLoginResponse { roll_no, full_name })),
        Err(e) => Err(registry_error_response(e)),
    }
}

/// Teacher login with employee ID and date of birth.
pub async fn login_teacher(
    State(state): State<AppState>,
    Json(payload): Json<TeacherLoginPayload>,
) -> Result<Json<TeacherLoginResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state
        .registry
        .login_teacher(&payload.employee_id, payload.dob)
        .await
    {
        Ok(Teacher {
            employee_id,
            full_name,
            ..
        }) => Ok(Json(TeacherLoginResponse {
            employee_id,
            full_name,
        })),
        Err(e) => Err(registry_error_response(e)),
    }
}

/// Admin login against configured credentials.
///
/// # Errors
///
/// - `401 Unauthorized`: credentials do not match configuration
pub async fn login_admin(
    State(state): State<AppState>,
    Json(payload): Json<AdminLoginPayload>,
) -> Result<Json<AdminLoginResponse>, (StatusCode, Json<ErrorResponse>)> {
    if payload.admin_id == state.admin.admin_id && payload.password == state.admin.admin_password {
        Ok(Json(AdminLoginResponse {
            message: "Admin login successful".to_string(),
        }))
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "Invalid credentials".to_string(),
            }),
        ))
    }
}

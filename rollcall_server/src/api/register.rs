//! Registration API handlers.
//!
//! New students and teachers land in the pending queue; an administrator
//! approves or rejects them via the [`super::admin`] endpoints.
//!
//! # Examples
//!
//! Register a student:
//! ```bash
//! curl -X POST http://localhost:8000/api/v1/register/student \
//!   -H "Content-Type: application/json" \
//!   -d '{"full_name": "Asha Verma", "email": "asha@example.com",
//!        "phone": "9876543210", "dob": "2004-03-14", "gender": "F",
//!        "address": "Hostel 4", "roll_no": "101", "department": "ECE",
//!        "course": "B.Tech", "semester": 5, "section": "A"}'
//! ```

use axum::{Json, extract::State, http::StatusCode};
use rollcall::people::{
    RegistryError,
    models::{StudentRegistration, TeacherRegistration},
};
use serde::Serialize;

use super::{AppState, ErrorResponse};

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: i64,
    pub message: String,
}

/// Map registry errors onto HTTP statuses with a client-safe body.
pub(super) fn registry_error_response(err: RegistryError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        RegistryError::PersonNotFound(_) => StatusCode::NOT_FOUND,
        RegistryError::InvalidRegistration(_) => StatusCode::BAD_REQUEST,
        RegistryError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        RegistryError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.client_message(),
        }),
    )
}

/// Submit a student registration for admin review.
///
/// # Errors
///
/// - `400 Bad Request`: malformed field (empty name, bad email, non-numeric
///   roll number, phone not 10 digits)
/// - `500 Internal Server Error`: storage failure (including duplicate roll
///   number)
pub async fn register_student(
    State(state): State<AppState>,
    Json(registration): Json<StudentRegistration>,
) -> Result<Json<RegisterResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.registry.register_student(registration).await {
        Ok(id) => Ok(Json(RegisterResponse {
            id,
            message: "Registration submitted, pending admin approval".to_string(),
        })),
        Err(e) => Err(registry_error_response(e)),
    }
}

/// Submit a teacher registration for admin review.
pub async fn register_teacher(
    State(state): State<AppState>,
    Json(registration): Json<TeacherRegistration>,
) -> Result<Json<RegisterResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.registry.register_teacher(registration).await {
        Ok(id) => Ok(Json(RegisterResponse {
            id,
            message: "Registration submitted, pending admin approval".to_string(),
        })),
        Err(e) => Err(registry_error_response(e)),
    }
}

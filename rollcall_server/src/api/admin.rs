//! Admin API handlers: approval queue listings and decisions.
//!
//! Approval and rejection are terminal, at-most-once transitions; deciding
//! on a record that is no longer pending returns `404`.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rollcall::people::models::{ApprovalState, Student, Teacher};
use serde::Serialize;

use super::{AppState, ErrorResponse, register::registry_error_response};

#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    pub message: String,
}

fn parse_state(raw: &str) -> Result<ApprovalState, (StatusCode, Json<ErrorResponse>)> {
    raw.parse().map_err(|e: String| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse { error: e }),
        )
    })
}

/// List students in a given approval state (`pending`, `approved`, `rejected`).
pub async fn list_students(
    State(state): State<AppState>,
    Path(approval_state): Path<String>,
) -> Result<Json<Vec<Student>>, (StatusCode, Json<ErrorResponse>)> {
    let approval_state = parse_state(&approval_state)?;
    match state.registry.list_students(approval_state).await {
        Ok(students) => Ok(Json(students)),
        Err(e) => Err(registry_error_response(e)),
    }
}

/// List teachers in a given approval state.
pub async fn list_teachers(
    State(state): State<AppState>,
    Path(approval_state): Path<String>,
) -> Result<Json<Vec<Teacher>>, (StatusCode, Json<ErrorResponse>)> {
    let approval_state = parse_state(&approval_state)?;
    match state.registry.list_teachers(approval_state).await {
        Ok(teachers) => Ok(Json(teachers)),
        Err(e) => Err(registry_error_response(e)),
    }
}

/// Approve a pending student registration.
///
/// # Errors
///
/// - `404 Not Found`: no pending registration for this roll number
pub async fn approve_student(
    State(state): State<AppState>,
    Path(roll_no): Path<String>,
) -> Result<Json<DecisionResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.registry.approve_student(&roll_no).await {
        Ok(student) => Ok(Json(DecisionResponse {
            message: format!("Approved student {}", student.roll_no),
        })),
        Err(e) => Err(registry_error_response(e)),
    }
}

/// Reject a pending student registration.
pub async fn reject_student(
    State(state): State<AppState>,
    Path(roll_no): Path<String>,
) -> Result<Json<DecisionResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.registry.reject_student(&roll_no).await {
        Ok(student) => Ok(Json(DecisionResponse {
            message: format!("Rejected student {}", student.roll_no),
        })),
        Err(e) => Err(registry_error_response(e)),
    }
}

/// Approve a pending teacher registration.
pub async fn approve_teacher(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
) -> Result<Json<DecisionResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.registry.approve_teacher(&employee_id).await {
        Ok(teacher) => Ok(Json(DecisionResponse {
            message: format!("Approved teacher {}", teacher.employee_id),
        })),
        Err(e) => Err(registry_error_response(e)),
    }
}

/// Reject a pending teacher registration.
pub async fn reject_teacher(
    State(state): State<AppState>,
    Path(employee_id): Path<String>,
) -> Result<Json<DecisionResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.registry.reject_teacher(&employee_id).await {
        Ok(teacher) => Ok(Json(DecisionResponse {
            message: format!("Rejected teacher {}", teacher.employee_id),
        })),
        Err(e) => Err(registry_error_response(e)),
    }
}

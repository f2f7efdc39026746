//! HTTP API for the attendance server.
//!
//! # Modules
//!
//! - [`register`]: student and teacher registration
//! - [`auth`]: student, teacher, and admin login
//! - [`admin`]: approval queue listing and decisions
//! - [`teacher`]: OTP issuance and attendance views
//! - [`student`]: attendance marking, history, and OTP checks
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health                                       - Health check
//! GET  /api/v1/subjects                              - Subject catalog
//! POST /api/v1/register/student                      - Submit student registration
//! POST /api/v1/register/teacher                      - Submit teacher registration
//! POST /api/v1/login/student                         - Student login (roll no + DOB)
//! POST /api/v1/login/teacher                         - Teacher login (employee ID + DOB)
//! POST /api/v1/login/admin                           - Admin login (configured credentials)
//! GET  /api/v1/admin/students/{state}                - List students by approval state
//! GET  /api/v1/admin/teachers/{state}                - List teachers by approval state
//! POST /api/v1/admin/students/{roll_no}/approve      - Approve pending student
//! POST /api/v1/admin/students/{roll_no}/reject       - Reject pending student
//! POST /api/v1/admin/teachers/{employee_id}/approve  - Approve pending teacher
//! POST /api/v1/admin/teachers/{employee_id}/reject   - Reject pending teacher
//! POST /api/v1/teacher/otp                           - Issue OTP
//! GET  /api/v1/teacher/{employee_id}/attendance      - Attendance against teacher's OTPs
//! GET  /api/v1/teacher/{employee_id}/attendance/export - Same, as CSV
//! GET  /api/v1/teacher/{employee_id}/profile         - Teacher profile
//! POST /api/v1/student/attendance                    - Mark attendance
//! GET  /api/v1/student/{roll_no}/attendance          - Student history (?subject= filter)
//! GET  /api/v1/student/{roll_no}/attendance/export   - Same, as CSV
//! GET  /api/v1/student/{roll_no}/profile             - Student profile
//! GET  /api/v1/otp/{code}                            - OTP subject and window
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod admin;
pub mod auth;
pub mod register;
pub mod request_id;
pub mod student;
pub mod teacher;

use crate::config::AdminConfig;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use rollcall::{AttendanceValidator, OtpIssuer, RegistryManager, Reporter, SubjectCatalog};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
///
/// Cloned per request (cheap due to Arc wrappers).
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RegistryManager>,
    pub issuer: Arc<OtpIssuer>,
    pub validator: Arc<AttendanceValidator>,
    pub reporter: Arc<Reporter>,
    pub admin: Arc<AdminConfig>,
    pub catalog: SubjectCatalog,
    pub pool: Arc<PgPool>,
}

/// JSON error body returned by every handler on failure.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let v1_routes = create_v1_router();

    let root_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .merge(root_routes)
        .nest("/api/v1", v1_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/subjects", get(list_subjects))
        .route("/register/student", post(register::register_student))
        .route("/register/teacher", post(register::register_teacher))
        .route("/login/student", post(auth::login_student))
        .route("/login/teacher", post(auth::login_teacher))
        .route("/login/admin", post(auth::login_admin))
        .route("/admin/students/{state}", get(admin::list_students))
        .route("/admin/teachers/{state}", get(admin::list_teachers))
        .route(
            "/admin/students/{roll_no}/approve",
            post(admin::approve_student),
        )
        .route(
            "/admin/students/{roll_no}/reject",
            post(admin::reject_student),
        )
        .route(
            "/admin/teachers/{employee_id}/approve",
            post(admin::approve_teacher),
        )
        .route(
            "/admin/teachers/{employee_id}/reject",
            post(admin::reject_teacher),
        )
        .route("/teacher/otp", post(teacher::generate_otp))
        .route(
            "/teacher/{employee_id}/attendance",
            get(teacher::view_attendance),
        )
        .route(
            "/teacher/{employee_id}/attendance/export",
            get(teacher::export_attendance),
        )
        .route("/teacher/{employee_id}/profile", get(teacher::profile))
        .route("/student/attendance", post(student::mark_attendance))
        .route(
            "/student/{roll_no}/attendance",
            get(student::view_attendance),
        )
        .route(
            "/student/{roll_no}/attendance/export",
            get(student::export_attendance),
        )
        .route("/student/{roll_no}/profile", get(student::profile))
        .route("/otp/{code}", get(student::check_otp))
}

/// The subject catalog, in canonical order.
async fn list_subjects(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.catalog.names().to_vec())
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` if the database responds, `503` otherwise.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_healthy = sqlx::query("SELECT 1")
        .fetch_one(&*state.pool)
        .await
        .is_ok();

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}

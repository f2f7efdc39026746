//! # Rollcall
//!
//! A college attendance management library built around a single hard
//! invariant set: the attendance-marking validation pipeline. Teachers
//! issue short-lived one-time codes (OTPs) bound to a subject, a time
//! window, and their position; students mark attendance against an OTP
//! subject to an ordered chain of checks (subject, eligibility, OTP
//! existence, time window, subject match, duplicate prevention, geofence,
//! device cooldown).
//!
//! ## Core Modules
//!
//! - [`subjects`]: the canonical subject catalog
//! - [`people`]: registration, approval lifecycle, and lookups
//! - [`otp`]: OTP issuance
//! - [`marking`]: the attendance validator and geofence geometry
//! - [`report`]: display-timezone formatting and CSV export
//! - [`db`]: PostgreSQL pool and repository traits
//!
//! ## Example
//!
//! ```no_run
//! use rollcall::db::{Database, DatabaseConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sqlx::Error> {
//!     let db = Database::new(&DatabaseConfig::default()).await?;
//!     db.health_check().await?;
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod marking;
pub mod notify;
pub mod otp;
pub mod people;
pub mod report;
pub mod subjects;

pub use marking::{AttendanceValidator, MarkError, MarkingPolicy};
pub use otp::OtpIssuer;
pub use people::RegistryManager;
pub use report::Reporter;
pub use subjects::SubjectCatalog;

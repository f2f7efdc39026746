//! Registration, approval lifecycle, and person lookups.
//!
//! People register as students or teachers, land in a pending state, and
//! an administrator transitions each registration exactly once to
//! approved or rejected. Only approved people can log in, issue OTPs, or
//! mark attendance.

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{RegistryError, RegistryResult};
pub use manager::RegistryManager;
pub use models::{
    ApprovalState, Role, Student, StudentProfile, StudentRegistration, Teacher, TeacherProfile,
    TeacherRegistration,
};

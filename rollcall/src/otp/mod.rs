//! OTP issuance: short random codes bound to a subject, a teacher, a time
//! window, and the teacher's position at issuance.

pub mod errors;
pub mod issuer;
pub mod models;

pub use errors::{OtpError, OtpResult};
pub use issuer::{CODE_ALPHABET, DEFAULT_CODE_LENGTH, OtpIssuer, generate_code};
pub use models::OtpRecord;

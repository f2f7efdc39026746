//! Attendance marking: the validation chain, its error taxonomy, and the
//! geofence geometry.

pub mod errors;
pub mod geo;
pub mod models;
pub mod validator;

pub use errors::{MarkError, MarkResult};
pub use geo::{EARTH_RADIUS_M, GeoPoint, haversine_m};
pub use models::{AttendanceClaim, AttendanceRecord};
pub use validator::{AttendanceValidator, MarkingPolicy};

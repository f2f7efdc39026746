//! Registration and person data models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a registered person. Transitions exactly once:
/// `Pending -> Approved` or `Pending -> Rejected` (terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalState {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalState::Pending => "pending",
            ApprovalState::Approved => "approved",
            ApprovalState::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ApprovalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ApprovalState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApprovalState::Pending),
            "approved" => Ok(ApprovalState::Approved),
            "rejected" => Ok(ApprovalState::Rejected),
            other => Err(format!("unknown approval state: {other}")),
        }
    }
}

/// Role of a registered person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
}

/// Student model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub dob: NaiveDate,
    pub gender: String,
    pub address: String,
    pub roll_no: String,
    pub department: String,
    pub course: String,
    pub semester: i16,
    pub section: String,
    pub state: ApprovalState,
    pub created_at: DateTime<Utc>,
}

/// Teacher model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub dob: NaiveDate,
    pub gender: String,
    pub address: String,
    pub employee_id: String,
    pub subject: String,
    pub state: ApprovalState,
    pub created_at: DateTime<Utc>,
}

/// Student registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRegistration {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub dob: NaiveDate,
    pub gender: String,
    pub address: String,
    pub roll_no: String,
    pub department: String,
    pub course: String,
    pub semester: i16,
    pub section: String,
}

/// Teacher registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherRegistration {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub dob: NaiveDate,
    pub gender: String,
    pub address: String,
    pub employee_id: String,
    pub subject: String,
}

/// Public subset of student fields, safe to return to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentProfile {
    pub full_name: String,
    pub email: String,
    pub department: String,
    pub semester: i16,
    pub section: String,
}

impl From<&Student> for StudentProfile {
    fn from(student: &Student) -> Self {
        Self {
            full_name: student.full_name.clone(),
            email: student.email.clone(),
            department: student.department.clone(),
            semester: student.semester,
            section: student.section.clone(),
        }
    }
}

/// Public subset of teacher fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherProfile {
    pub full_name: String,
    pub email: String,
}

impl From<&Teacher> for TeacherProfile {
    fn from(teacher: &Teacher) -> Self {
        Self {
            full_name: teacher.full_name.clone(),
            email: teacher.email.clone(),
        }
    }
}

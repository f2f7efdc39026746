//! Registration and approval lifecycle manager.

use super::{
    errors::{RegistryError, RegistryResult},
    models::{
        ApprovalState, Role, Student, StudentProfile, StudentRegistration, Teacher,
        TeacherProfile, TeacherRegistration,
    },
};
use crate::db::PeopleRepository;
use crate::notify::ApprovalNotifier;
use chrono::NaiveDate;
use std::sync::Arc;

/// Registry manager
///
/// Owns the person lifecycle: registration lands in `Pending`, an
/// administrator transitions it exactly once to `Approved` or `Rejected`,
/// and logins/profile lookups only ever see approved records. Identity
/// keys are uppercase-normalized at this boundary.
#[derive(Clone)]
pub struct RegistryManager {
    people: Arc<dyn PeopleRepository>,
    notifier: Arc<dyn ApprovalNotifier>,
}

impl RegistryManager {
    pub fn new(people: Arc<dyn PeopleRepository>, notifier: Arc<dyn ApprovalNotifier>) -> Self {
        Self { people, notifier }
    }

    /// Submit a student registration for admin review.
    ///
    /// # Errors
    ///
    /// * `RegistryError::InvalidRegistration` - malformed field
    pub async fn register_student(&self, mut registration: StudentRegistration) -> RegistryResult<i64> {
        validate_common(&registration.full_name, &registration.email, &registration.phone)?;
        if !registration.roll_no.chars().all(|c| c.is_ascii_digit())
            || registration.roll_no.is_empty()
        {
            return Err(RegistryError::InvalidRegistration(
                "Roll number must be numeric".to_string(),
            ));
        }
        registration.roll_no = registration.roll_no.to_uppercase();

        let id = self.people.insert_pending_student(&registration).await?;
        log::info!("Student registration submitted: {}", registration.roll_no);
        Ok(id)
    }

    /// Submit a teacher registration for admin review.
    pub async fn register_teacher(&self, mut registration: TeacherRegistration) -> RegistryResult<i64> {
        validate_common(&registration.full_name, &registration.email, &registration.phone)?;
        if registration.employee_id.trim().is_empty() {
            return Err(RegistryError::InvalidRegistration(
                "Employee ID must not be empty".to_string(),
            ));
        }
        registration.employee_id = registration.employee_id.to_uppercase();

        let id = self.people.insert_pending_teacher(&registration).await?;
        log::info!("Teacher registration submitted: {}", registration.employee_id);
        Ok(id)
    }

    /// Approve a pending student. The transition happens at most once; a
    /// roll number with no pending registration is reported as not found.
    pub async fn approve_student(&self, roll_no: &str) -> RegistryResult<Student> {
        let roll_no = roll_no.to_uppercase();
        let student = self
            .people
            .find_student(&roll_no, ApprovalState::Pending)
            .await?
            .ok_or(RegistryError::PersonNotFound("Student"))?;

        let moved = self
            .people
            .set_student_state(&roll_no, ApprovalState::Pending, ApprovalState::Approved)
            .await?;
        if !moved {
            // Raced with another admin action.
            return Err(RegistryError::PersonNotFound("Student"));
        }

        self.notifier
            .registration_approved(Role::Student, &student.full_name, &student.email)
            .await;
        Ok(student)
    }

    /// Reject a pending student (terminal).
    pub async fn reject_student(&self, roll_no: &str) -> RegistryResult<Student> {
        let roll_no = roll_no.to_uppercase();
        let student = self
            .people
            .find_student(&roll_no, ApprovalState::Pending)
            .await?
            .ok_or(RegistryError::PersonNotFound("Student"))?;

        let moved = self
            .people
            .set_student_state(&roll_no, ApprovalState::Pending, ApprovalState::Rejected)
            .await?;
        if !moved {
            return Err(RegistryError::PersonNotFound("Student"));
        }

        self.notifier
            .registration_rejected(Role::Student, &student.full_name, &student.email)
            .await;
        Ok(student)
    }

    /// Approve a pending teacher.
    pub async fn approve_teacher(&self, employee_id: &str) -> RegistryResult<Teacher> {
        let employee_id = employee_id.to_uppercase();
        let teacher = self
            .people
            .find_teacher(&employee_id, ApprovalState::Pending)
            .await?
            .ok_or(RegistryError::PersonNotFound("Teacher"))?;

        let moved = self
            .people
            .set_teacher_state(&employee_id, ApprovalState::Pending, ApprovalState::Approved)
            .await?;
        if !moved {
            return Err(RegistryError::PersonNotFound("Teacher"));
        }

        self.notifier
            .registration_approved(Role::Teacher, &teacher.full_name, &teacher.email)
            .await;
        Ok(teacher)
    }

    /// Reject a pending teacher (terminal).
    pub async fn reject_teacher(&self, employee_id: &str) -> RegistryResult<Teacher> {
        let employee_id = employee_id.to_uppercase();
        let teacher = self
            .people
            .find_teacher(&employee_id, ApprovalState::Pending)
            .await?
            .ok_or(RegistryError::PersonNotFound("Teacher"))?;

        let moved = self
            .people
            .set_teacher_state(&employee_id, ApprovalState::Pending, ApprovalState::Rejected)
            .await?;
        if !moved {
            return Err(RegistryError::PersonNotFound("Teacher"));
        }

        self.notifier
            .registration_rejected(Role::Teacher, &teacher.full_name, &teacher.email)
            .await;
        Ok(teacher)
    }

    /// Student login: DOB compared against the approved record.
    ///
    /// DOB-as-credential is a known weakness of the original system,
    /// preserved as-is rather than hardened.
    pub async fn login_student(&self, roll_no: &str, dob: NaiveDate) -> RegistryResult<Student> {
        let roll_no = roll_no.to_uppercase();
        let student = self
            .people
            .find_student(&roll_no, ApprovalState::Approved)
            .await?;
        match student {
            Some(student) if student.dob == dob => Ok(student),
            _ => Err(RegistryError::InvalidCredentials),
        }
    }

    /// Teacher login, same credential scheme as students.
    pub async fn login_teacher(&self, employee_id: &str, dob: NaiveDate) -> RegistryResult<Teacher> {
        let employee_id = employee_id.to_uppercase();
        let teacher = self
            .people
            .find_teacher(&employee_id, ApprovalState::Approved)
            .await?;
        match teacher {
            Some(teacher) if teacher.dob == dob => Ok(teacher),
            _ => Err(RegistryError::InvalidCredentials),
        }
    }

    /// Public profile of an approved student.
    pub async fn student_profile(&self, roll_no: &str) -> RegistryResult<StudentProfile> {
        let roll_no = roll_no.to_uppercase();
        let student = self
            .people
            .find_student(&roll_no, ApprovalState::Approved)
            .await?
            .ok_or(RegistryError::PersonNotFound("Student"))?;
        Ok(StudentProfile::from(&student))
    }

    /// Public profile of an approved teacher.
    pub async fn teacher_profile(&self, employee_id: &str) -> RegistryResult<TeacherProfile> {
        let employee_id = employee_id.to_uppercase();
        let teacher = self
            .people
            .find_teacher(&employee_id, ApprovalState::Approved)
            .await?
            .ok_or(RegistryError::PersonNotFound("Teacher"))?;
        Ok(TeacherProfile::from(&teacher))
    }

    /// Admin listing of students in a given state.
    pub async fn list_students(&self, state: ApprovalState) -> RegistryResult<Vec<Student>> {
        Ok(self.people.list_students(state).await?)
    }

    /// Admin listing of teachers in a given state.
    pub async fn list_teachers(&self, state: ApprovalState) -> RegistryResult<Vec<Teacher>> {
        Ok(self.people.list_teachers(state).await?)
    }
}

fn validate_common(full_name: &str, email: &str, phone: &str) -> RegistryResult<()> {
    if full_name.trim().is_empty() {
        return Err(RegistryError::InvalidRegistration(
            "Full name must not be empty".to_string(),
        ));
    }
    if !email.contains('@') {
        return Err(RegistryError::InvalidRegistration(
            "Email address is malformed".to_string(),
        ));
    }
    if phone.len() != 10 || !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err(RegistryError::InvalidRegistration(
            "Phone must be exactly 10 digits".to_string(),
        ));
    }
    Ok(())
}

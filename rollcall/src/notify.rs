//! Approval notification seam.
//!
//! The original deployment mailed students and teachers when an
//! administrator approved or rejected their registration. Delivery
//! mechanics are out of scope here; the trait is the extension point and
//! the default implementation records the event in the log.

use crate::people::models::Role;
use async_trait::async_trait;

/// Receives approval lifecycle events for registered people.
#[async_trait]
pub trait ApprovalNotifier: Send + Sync {
    async fn registration_approved(&self, role: Role, full_name: &str, email: &str);

    async fn registration_rejected(&self, role: Role, full_name: &str, email: &str);
}

/// Notifier that only logs. Failures to deliver are not a concern the
/// approval flow should ever surface to the administrator.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl ApprovalNotifier for LogNotifier {
    async fn registration_approved(&self, role: Role, full_name: &str, email: &str) {
        log::info!("{role:?} registration approved: {full_name} <{email}>");
    }

    async fn registration_rejected(&self, role: Role, full_name: &str, email: &str) {
        log::info!("{role:?} registration rejected: {full_name} <{email}>");
    }
}

//! Registration and lifecycle error types.

use crate::db::StoreError;
use thiserror::Error;

/// Errors from registration, approval, login, and profile lookups.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No matching person in the expected state
    #[error("{0} not found")]
    PersonNotFound(&'static str),

    /// Registration field failed validation
    #[error("invalid registration: {0}")]
    InvalidRegistration(String),

    /// Login credentials do not match
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Storage failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RegistryError {
    /// Client-safe message; storage internals are not exposed.
    pub fn client_message(&self) -> String {
        match self {
            RegistryError::Store(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

//! Error types for credential manager operations.
//!
//! None of these variants carry a password or a raw secret record. Only the
//! lookup location, a backend name, or a description of the shape mismatch
//! is ever included, so every error is safe to log and return to callers.

use thiserror::Error;

/// Result type for credential manager operations.
pub type Result<T> = std::result::Result<T, CredentialError>;

/// Errors that can occur while selecting a backend or retrieving a password.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// Nothing is stored at the derived lookup location.
    #[error("not found: nothing exists at {location}")]
    NotFound { location: String },

    /// A record exists but the caller's IAM ARN is not on its allow-list.
    #[error("not authorized")]
    NotAuthorized,

    /// A record exists but does not decode into the expected shape.
    #[error("malformed secret record: {reason}")]
    MalformedRecord { reason: String },

    /// The backend could not be constructed or reached.
    #[error("{backend} unavailable: {message}")]
    BackendUnavailable { backend: String, message: String },

    /// Every candidate backend failed to initialize.
    #[error("no valid credential manager available, see debug-level logs for more information")]
    NoneAvailable,
}

impl CredentialError {
    /// Create a not found error.
    pub fn not_found(location: impl Into<String>) -> Self {
        Self::NotFound { location: location.into() }
    }

    /// Create a malformed record error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedRecord { reason: reason.into() }
    }

    /// Create a backend unavailable error.
    pub fn unavailable(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BackendUnavailable { backend: backend.into(), message: message.into() }
    }

    /// Whether this is a legitimate authorization denial.
    pub fn is_not_authorized(&self) -> bool {
        matches!(self, Self::NotAuthorized)
    }
}

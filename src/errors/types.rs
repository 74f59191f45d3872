//! # Error Types
//!
//! Startup and process-level error types for credbroker using `thiserror`.
//! Per-request failures live in [`crate::credmgrs::CredentialError`] and are
//! wrapped here only when they abort startup.

use crate::credmgrs::CredentialError;

/// Custom result type for credbroker operations
pub type Result<T> = std::result::Result<T, BrokerError>;

/// Main error type for credbroker
#[derive(thiserror::Error, Debug)]
pub enum BrokerError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String, field: Option<String> },

    /// Metrics instrument registration or exporter errors
    #[error("Metrics error: {message}")]
    Metrics { message: String },

    /// I/O errors with additional context
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },

    /// Credential manager errors that escaped to the process level
    #[error(transparent)]
    Credentials(#[from] CredentialError),
}

impl BrokerError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a validation error with field information
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    /// Create a metrics error
    pub fn metrics<S: Into<String>>(message: S) -> Self {
        Self::Metrics { message: message.into() }
    }

    /// Process exit code used by the binary when this error aborts startup
    pub fn exit_code(&self) -> i32 {
        match self {
            BrokerError::Config { .. } | BrokerError::Validation { .. } => 78,
            BrokerError::Metrics { .. } | BrokerError::Io { .. } => 70,
            BrokerError::Credentials(CredentialError::NotAuthorized) => 77,
            BrokerError::Credentials(_) => 69,
        }
    }
}

impl From<std::io::Error> for BrokerError {
    fn from(error: std::io::Error) -> Self {
        Self::Io { source: error, context: "I/O operation failed".to_string() }
    }
}

impl From<validator::ValidationErrors> for BrokerError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| {
                        e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string())
                    })
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        // Nested struct failures only show up in the Display form
        let message = if message.is_empty() { errors.to_string() } else { message };

        Self::validation(format!("Validation failed: {}", message))
    }
}

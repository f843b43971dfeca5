//! Schema error types
//!
//! Error codes:
//! - DIVFORMS_SCHEMA_COMPILE_ERROR (stored schema cannot be compiled)
//! - DIVFORMS_SCHEMA_REJECTED (schema refused at publish time)
//!
//! Both are operator data-quality problems, never payload problems.

use thiserror::Error;

use super::dialect::Dialect;

/// Schema errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The engine for `dialect` refused the stored schema
    #[error("Schema compile error ({dialect}): {message}")]
    Compile { dialect: Dialect, message: String },

    /// The schema document failed publish-time admission
    #[error("Schema rejected: {0}")]
    Rejected(String),
}

impl SchemaError {
    /// Returns the machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::Compile { .. } => "DIVFORMS_SCHEMA_COMPILE_ERROR",
            SchemaError::Rejected(_) => "DIVFORMS_SCHEMA_REJECTED",
        }
    }

    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        400
    }

    /// Underlying compiler or admission message
    pub fn detail(&self) -> &str {
        match self {
            SchemaError::Compile { message, .. } => message,
            SchemaError::Rejected(reason) => reason,
        }
    }
}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

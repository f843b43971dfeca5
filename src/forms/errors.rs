//! Form pipeline errors
//!
//! Error codes:
//! - DIVFORMS_FORM_UNAVAILABLE (no active definition)
//! - DIVFORMS_SCHEMA_COMPILE_ERROR (operator data problem)
//! - DIVFORMS_VALIDATION_FAILED (user input problem)
//! - DIVFORMS_PUBLISH_CONFLICT (retry budget exhausted)
//! - DIVFORMS_SCHEMA_REJECTED (publish-time admission)
//!
//! Compile and validation failures are separate variants with separate
//! codes and statuses.

use thiserror::Error;

use crate::auth::AuthError;
use crate::schema::{Dialect, SchemaError, Violation};
use crate::store::StoreError;

/// Result type for form operations
pub type FormResult<T> = Result<T, FormError>;

/// Form pipeline errors
#[derive(Debug, Error)]
pub enum FormError {
    /// No active definition for the (division, screen) pair
    #[error("Form not available")]
    FormUnavailable,

    /// The stored schema cannot be compiled
    #[error("Schema compile error ({dialect}): {message}")]
    SchemaCompile { dialect: Dialect, message: String },

    /// The payload does not satisfy the active schema
    #[error("Validation error: {} violation(s) against version {version}", .violations.len())]
    ValidationFailed {
        version: u32,
        violations: Vec<Violation>,
    },

    #[error("Concurrent publish conflict after {attempts} attempts")]
    ConcurrentPublishConflict { attempts: u32 },

    #[error("Schema rejected: {0}")]
    SchemaRejected(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    InvalidInput(String),

    /// Authentication or authorization failure, propagated unchanged
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl From<SchemaError> for FormError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::Compile { dialect, message } => FormError::SchemaCompile { dialect, message },
            SchemaError::Rejected(reason) => FormError::SchemaRejected(reason),
        }
    }
}

impl FormError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            FormError::FormUnavailable => 400,
            FormError::SchemaCompile { .. } => 400,
            FormError::ValidationFailed { .. } => 422,
            FormError::ConcurrentPublishConflict { .. } => 409,
            FormError::SchemaRejected(_) => 400,
            FormError::NotFound(_) => 404,
            FormError::InvalidInput(_) => 400,
            FormError::Auth(err) => err.status_code(),
            FormError::Storage(err) => err.status_code(),
        }
    }

    /// Returns the machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            FormError::FormUnavailable => "DIVFORMS_FORM_UNAVAILABLE",
            FormError::SchemaCompile { .. } => "DIVFORMS_SCHEMA_COMPILE_ERROR",
            FormError::ValidationFailed { .. } => "DIVFORMS_VALIDATION_FAILED",
            FormError::ConcurrentPublishConflict { .. } => "DIVFORMS_PUBLISH_CONFLICT",
            FormError::SchemaRejected(_) => "DIVFORMS_SCHEMA_REJECTED",
            FormError::NotFound(_) => "DIVFORMS_NOT_FOUND",
            FormError::InvalidInput(_) => "DIVFORMS_INVALID_INPUT",
            FormError::Auth(err) => err.code(),
            FormError::Storage(err) => err.code(),
        }
    }

    /// Violations carried by a validation failure
    pub fn violations(&self) -> Option<&[Violation]> {
        match self {
            FormError::ValidationFailed { violations, .. } => Some(violations),
            _ => None,
        }
    }
}

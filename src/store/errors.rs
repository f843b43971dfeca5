//! # Store Errors
//!
//! Error types for the document store boundary.

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by repositories
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A unique index would be violated
    #[error("{entity} with {field} '{value}' already exists")]
    Duplicate {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// Referenced record does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// An in-memory lock was poisoned by a panicking writer
    #[error("Storage lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    pub fn duplicate(entity: &'static str, field: &'static str, value: impl Into<String>) -> Self {
        StoreError::Duplicate {
            entity,
            field,
            value: value.into(),
        }
    }

    /// Returns the machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::Duplicate { .. } => "DIVFORMS_DUPLICATE",
            StoreError::NotFound(_) => "DIVFORMS_NOT_FOUND",
            StoreError::LockPoisoned => "DIVFORMS_STORAGE_FAILED",
        }
    }

    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::Duplicate { .. } => 409,
            StoreError::NotFound(_) => 404,
            StoreError::LockPoisoned => 500,
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        StoreError::LockPoisoned
    }
}

//! # Auth Errors
//!
//! Error types for authentication, role checks, access grants and the
//! user administration rules.

use thiserror::Error;

use crate::store::StoreError;

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Authentication and authorization errors
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    // ==================
    // Authentication Errors
    // ==================

    /// Unknown email or wrong password (generic - don't leak which)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Email already registered
    #[error("Email already in use")]
    EmailAlreadyExists,

    /// Password does not meet requirements
    #[error("Password does not meet requirements: {0}")]
    WeakPassword(String),

    /// Missing bearer token
    #[error("Authentication required")]
    AuthenticationRequired,

    // ==================
    // JWT Errors
    // ==================

    /// JWT token is malformed
    #[error("Malformed token")]
    MalformedToken,

    /// JWT token has expired
    #[error("Token expired")]
    TokenExpired,

    /// JWT signature is invalid
    #[error("Invalid token signature")]
    InvalidSignature,

    /// Token subject no longer exists
    #[error("Invalid user")]
    UnknownPrincipal,

    // ==================
    // Authorization Errors
    // ==================

    /// Caller's role is not permitted for the operation
    #[error("Forbidden")]
    Forbidden,

    /// Caller has no grant for the division/screen pair
    #[error("{0}")]
    AccessDenied(String),

    // ==================
    // Administration Errors
    // ==================

    /// The operation would leave the system without a superadmin
    #[error("Blocked: cannot {action} the last remaining superadmin")]
    LastSuperadminProtected { action: &'static str },

    #[error("User not found")]
    UserNotFound,

    #[error("Nothing to update")]
    NothingToUpdate,

    #[error("{0}")]
    InvalidInput(String),

    // ==================
    // Internal Errors
    // ==================

    /// Password hashing failed
    #[error("Internal error: password hashing failed")]
    HashingFailed,

    /// Token generation failed
    #[error("Internal error: token generation failed")]
    TokenGenerationFailed,

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl AuthError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            AuthError::InvalidCredentials => 400,
            AuthError::WeakPassword(_) => 400,
            AuthError::LastSuperadminProtected { .. } => 400,
            AuthError::NothingToUpdate => 400,
            AuthError::InvalidInput(_) => 400,

            // 401 Unauthorized
            AuthError::AuthenticationRequired => 401,
            AuthError::MalformedToken => 401,
            AuthError::TokenExpired => 401,
            AuthError::InvalidSignature => 401,
            AuthError::UnknownPrincipal => 401,

            // 403 Forbidden
            AuthError::Forbidden => 403,
            AuthError::AccessDenied(_) => 403,

            // 404 Not Found
            AuthError::UserNotFound => 404,

            // 409 Conflict
            AuthError::EmailAlreadyExists => 409,

            // 500 Internal Server Error
            AuthError::HashingFailed => 500,
            AuthError::TokenGenerationFailed => 500,

            AuthError::Storage(e) => e.status_code(),
        }
    }

    /// Returns the machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "DIVFORMS_INVALID_CREDENTIALS",
            AuthError::EmailAlreadyExists => "DIVFORMS_EMAIL_IN_USE",
            AuthError::WeakPassword(_) => "DIVFORMS_WEAK_PASSWORD",
            AuthError::AuthenticationRequired
            | AuthError::MalformedToken
            | AuthError::TokenExpired
            | AuthError::InvalidSignature
            | AuthError::UnknownPrincipal => "DIVFORMS_UNAUTHENTICATED",
            AuthError::Forbidden => "DIVFORMS_FORBIDDEN",
            AuthError::AccessDenied(_) => "DIVFORMS_ACCESS_DENIED",
            AuthError::LastSuperadminProtected { .. } => "DIVFORMS_LAST_SUPERADMIN_PROTECTED",
            AuthError::UserNotFound => "DIVFORMS_NOT_FOUND",
            AuthError::NothingToUpdate | AuthError::InvalidInput(_) => "DIVFORMS_INVALID_INPUT",
            AuthError::HashingFailed | AuthError::TokenGenerationFailed => "DIVFORMS_INTERNAL",
            AuthError::Storage(e) => e.code(),
        }
    }

    /// Returns whether this error should be logged at warn level
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(AuthError::InvalidCredentials.status_code(), 400);
        assert_eq!(AuthError::TokenExpired.status_code(), 401);
        assert_eq!(AuthError::AccessDenied("No access to screen".into()).status_code(), 403);
        assert_eq!(AuthError::EmailAlreadyExists.status_code(), 409);
        assert_eq!(AuthError::HashingFailed.status_code(), 500);
        assert!(!AuthError::HashingFailed.is_client_error());
    }

    #[test]
    fn test_error_messages_do_not_leak_info() {
        let err = AuthError::InvalidCredentials;
        assert!(!err.to_string().contains("password"));
        assert!(!err.to_string().contains("email"));
    }

    #[test]
    fn test_last_superadmin_message_names_action() {
        let err = AuthError::LastSuperadminProtected { action: "delete" };
        assert_eq!(
            err.to_string(),
            "Blocked: cannot delete the last remaining superadmin"
        );
        assert_eq!(err.code(), "DIVFORMS_LAST_SUPERADMIN_PROTECTED");
    }

    #[test]
    fn test_storage_errors_keep_their_status() {
        let err = AuthError::from(StoreError::LockPoisoned);
        assert_eq!(err.status_code(), 500);
    }
}

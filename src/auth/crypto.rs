//! # Cryptographic Utilities
//!
//! Password policy and Argon2id password hashing.
//!
//! ## Invariants
//! - Passwords only stored as Argon2id hashes

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use super::errors::{AuthError, AuthResult};

/// Password requirements configuration
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    /// When set, the password must be exactly this many characters
    pub exact_length: Option<usize>,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            exact_length: None,
        }
    }
}

impl PasswordPolicy {
    /// Policy applied to self-service registration and password changes
    pub fn self_service() -> Self {
        Self {
            min_length: 8,
            exact_length: Some(8),
        }
    }

    /// Policy applied to administrator resets (any non-empty password)
    pub fn admin_reset() -> Self {
        Self {
            min_length: 1,
            exact_length: None,
        }
    }

    /// Validate a password against this policy
    pub fn validate(&self, password: &str) -> AuthResult<()> {
        validate_password(password, self)
    }
}

/// Validate password against policy
pub fn validate_password(password: &str, policy: &PasswordPolicy) -> AuthResult<()> {
    let length = password.chars().count();

    if let Some(exact) = policy.exact_length {
        if length != exact {
            return Err(AuthError::WeakPassword(format!(
                "Password must be exactly {} characters",
                exact
            )));
        }
    }

    if length < policy.min_length {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {} characters",
            policy.min_length
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id
pub fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::HashingFailed)
}

/// Verify a password against its hash
///
/// Uses constant-time comparison internally (via argon2 crate).
pub fn verify_password(password: &str, hash: &str) -> AuthResult<bool> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

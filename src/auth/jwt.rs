//! # Access Tokens
//!
//! HS256 bearer tokens carrying the user id and the role held at issue
//! time. Validation only proves the token is genuine and unexpired; the
//! caller must still load the user record, so deleted accounts and role
//! changes take effect immediately.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{AuthError, AuthResult};
use super::user::{Role, User};

/// Claims embedded in every access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// User id
    pub sub: String,
    /// Role at issue time, informational only
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    pub aud: String,
    pub iss: String,
}

impl JwtClaims {
    /// The user id named by `sub`
    pub fn subject(&self) -> AuthResult<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::MalformedToken)
    }
}

/// Token signing settings
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_ttl: Duration,
    pub issuer: String,
    pub audience: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "CHANGE_THIS_SECRET_IN_PRODUCTION".to_string(),
            access_token_ttl: Duration::hours(12),
            issuer: "divforms".to_string(),
            audience: "divforms".to_string(),
        }
    }
}

/// Issues and checks access tokens
#[derive(Clone)]
pub struct JwtManager {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtManager {
    pub fn new(config: JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&config.audience]);
        validation.set_issuer(&[&config.issuer]);

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            config,
        }
    }

    /// Sign a token for `user`, valid for the configured lifetime
    pub fn generate_access_token(&self, user: &User) -> AuthResult<String> {
        let issued_at = Utc::now();
        let claims = JwtClaims {
            sub: user.id.to_string(),
            role: user.role,
            iat: issued_at.timestamp(),
            exp: (issued_at + self.config.access_token_ttl).timestamp(),
            aud: self.config.audience.clone(),
            iss: self.config.issuer.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|_| AuthError::TokenGenerationFailed)
    }

    /// Check signature, expiry, issuer and audience
    pub fn validate_token(&self, token: &str) -> AuthResult<JwtClaims> {
        decode::<JwtClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::MalformedToken,
            })
    }

    /// Token lifetime in seconds, reported to clients as `expiresIn`
    pub fn ttl_seconds(&self) -> i64 {
        self.config.access_token_ttl.num_seconds()
    }
}

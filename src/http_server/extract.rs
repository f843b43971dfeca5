//! Request extractors

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::errors::ApiError;
use super::server::AppState;
use crate::auth::{AuthError, AuthUser, Role};

/// Extract Bearer token from Authorization header
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// The authenticated caller, resolved to the current user record
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthUser);

impl CurrentUser {
    /// Fails with 403 unless the caller is a superadmin
    pub fn require_superadmin(&self) -> Result<&AuthUser, ApiError> {
        self.0.require_role(&[Role::Superadmin])?;
        Ok(&self.0)
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthError::AuthenticationRequired)?;
        let user = state.auth.authenticate(token).await?;
        Ok(CurrentUser(user))
    }
}

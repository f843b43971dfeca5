//! # Access Gate
//!
//! Answers "may this principal act on (division, screen)?" from the
//! access grant collection. The form pipeline only runs after the gate
//! returns `Ok`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use super::errors::{AuthError, AuthResult};
use super::user::{Role, User};
use crate::store::AccessGrantRepository;

/// Authenticated principal attached to a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
    pub full_name: String,
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            role: user.role,
            full_name: user.full_name.clone(),
        }
    }
}

impl AuthUser {
    /// Fails with `Forbidden` unless the principal holds one of `roles`
    pub fn require_role(&self, roles: &[Role]) -> AuthResult<()> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }
}

/// Division/screen authorization boundary
#[async_trait]
pub trait AccessGate: Send + Sync {
    async fn authorize(&self, user: &AuthUser, division_id: Uuid, screen_id: Uuid) -> AuthResult<()>;
}

/// Gate backed by the access grant collection
pub struct GrantAccessGate {
    grants: Arc<dyn AccessGrantRepository>,
}

impl GrantAccessGate {
    pub fn new(grants: Arc<dyn AccessGrantRepository>) -> Self {
        Self { grants }
    }
}

#[async_trait]
impl AccessGate for GrantAccessGate {
    async fn authorize(&self, user: &AuthUser, division_id: Uuid, screen_id: Uuid) -> AuthResult<()> {
        let grant = self
            .grants
            .find(user.id, division_id)
            .await?
            .ok_or_else(|| AuthError::AccessDenied("No access to division".to_string()))?;

        if !grant.allows(screen_id) {
            debug!(user = %user.id, division = %division_id, screen = %screen_id, "screen not granted");
            return Err(AuthError::AccessDenied("No access to screen".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryAccessGrantRepository;

    fn principal(role: Role) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            role,
            full_name: "Pat".to_string(),
        }
    }

    #[test]
    fn test_require_role() {
        let admin = principal(Role::Admin);
        assert!(admin.require_role(&[Role::Superadmin, Role::Admin]).is_ok());
        assert!(matches!(
            admin.require_role(&[Role::Superadmin]),
            Err(AuthError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_gate_distinguishes_division_and_screen() {
        let grants = Arc::new(InMemoryAccessGrantRepository::new());
        let gate = GrantAccessGate::new(grants.clone());
        let user = principal(Role::User);
        let (division, s1, s2) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        let err = gate.authorize(&user, division, s1).await.unwrap_err();
        assert_eq!(err.to_string(), "No access to division");

        grants.set_screens(user.id, division, &[s1]).await.unwrap();
        assert!(gate.authorize(&user, division, s1).await.is_ok());

        let err = gate.authorize(&user, division, s2).await.unwrap_err();
        assert_eq!(err.to_string(), "No access to screen");
    }

    #[tokio::test]
    async fn test_superadmin_still_needs_a_grant() {
        let gate = GrantAccessGate::new(Arc::new(InMemoryAccessGrantRepository::new()));
        let root = principal(Role::Superadmin);
        let result = gate.authorize(&root, Uuid::new_v4(), Uuid::new_v4()).await;
        assert!(matches!(result, Err(AuthError::AccessDenied(_))));
    }
}

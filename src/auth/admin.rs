//! # User Administration
//!
//! Superadmin-only user management.
//!
//! ## Invariant
//! At least one superadmin always exists: demoting or deleting the last one
//! is rejected with `LastSuperadminProtected`. The check runs inside the
//! repository's write, so concurrent demotions cannot both pass it.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::api::{apply_profile_update, email_conflict, ProfileUpdate};
use super::crypto::PasswordPolicy;
use super::errors::{AuthError, AuthResult};
use super::user::{Guarded, Role, User, UserRepository};
use crate::store::{AccessGrantRepository, Page, StoreError};

/// Default page size for user listings
pub const DEFAULT_USER_PAGE_LIMIT: usize = 50;

/// Upper bound on user listing page size
pub const MAX_USER_PAGE_LIMIT: usize = 100;

/// Administrator-created account
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

/// User listing query
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl UserQuery {
    pub fn page(&self) -> usize {
        self.page.filter(|p| *p > 0).unwrap_or(1)
    }

    pub fn limit(&self) -> usize {
        self.limit
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_USER_PAGE_LIMIT)
            .min(MAX_USER_PAGE_LIMIT)
    }
}

/// User management operations
#[derive(Clone)]
pub struct UserAdmin {
    users: Arc<dyn UserRepository>,
    grants: Arc<dyn AccessGrantRepository>,
}

impl UserAdmin {
    pub fn new(users: Arc<dyn UserRepository>, grants: Arc<dyn AccessGrantRepository>) -> Self {
        Self { users, grants }
    }

    pub async fn list(&self, query: &UserQuery) -> AuthResult<Page<User>> {
        Ok(self
            .users
            .search(query.q.as_deref(), query.page(), query.limit())
            .await?)
    }

    pub async fn get(&self, id: Uuid) -> AuthResult<User> {
        self.users.find_by_id(id).await?.ok_or(AuthError::UserNotFound)
    }

    /// Create an account; role defaults to `user`
    pub async fn create(&self, request: CreateUserRequest) -> AuthResult<User> {
        let user = User::new(
            &request.full_name,
            &request.email,
            &request.password,
            request.role.unwrap_or_default(),
            &PasswordPolicy::admin_reset(),
        )?;
        self.users.create(&user).await.map_err(email_conflict)?;
        info!(user = %user.id, role = %user.role, "user created by administrator");
        Ok(user)
    }

    /// Update name and/or email. An empty update returns the user unchanged.
    pub async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> AuthResult<User> {
        let mut user = self.get(id).await?;
        if apply_profile_update(&mut user, &update) {
            self.users.update(&user).await.map_err(email_conflict)?;
        }
        Ok(user)
    }

    /// Change a user's role
    pub async fn set_role(&self, id: Uuid, role: Role) -> AuthResult<User> {
        let changed = self.users.set_role_guarded(id, role).await.map_err(missing_user)?;
        let user = applied(changed, id, "change role of")?;
        info!(user = %user.id, role = %role, "role changed");
        Ok(user)
    }

    /// Reset a user's password without knowing the current one
    pub async fn reset_password(&self, id: Uuid, password: &str) -> AuthResult<()> {
        let mut user = self.get(id).await?;
        user.update_password(password, &PasswordPolicy::admin_reset())?;
        self.users.update(&user).await.map_err(email_conflict)?;
        Ok(())
    }

    /// Delete a user and their access grants
    pub async fn delete(&self, id: Uuid) -> AuthResult<User> {
        let removed = self.users.delete_guarded(id).await.map_err(missing_user)?;
        let user = applied(removed, id, "delete")?;

        let grants = self.grants.delete_for_user(id).await?;
        info!(user = %id, grants_removed = grants, "user deleted");
        Ok(user)
    }
}

fn missing_user(err: StoreError) -> AuthError {
    match err {
        StoreError::NotFound(_) => AuthError::UserNotFound,
        other => AuthError::Storage(other),
    }
}

fn applied(outcome: Guarded<User>, id: Uuid, action: &'static str) -> AuthResult<User> {
    match outcome {
        Guarded::Applied(user) => Ok(user),
        Guarded::LastSuperadmin => {
            warn!(user = %id, action, "refused to remove last superadmin");
            Err(AuthError::LastSuperadminProtected { action })
        }
    }
}

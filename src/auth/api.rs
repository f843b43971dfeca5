//! # Auth Service
//!
//! Self-service authentication: registration, login, bearer token
//! resolution and profile maintenance.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::access::AuthUser;
use super::crypto::PasswordPolicy;
use super::errors::{AuthError, AuthResult};
use super::jwt::JwtManager;
use super::user::{normalize_email, Role, User, UserRepository};
use crate::store::StoreError;

/// Registration request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

/// Login request
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Profile update; absent or blank fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Password change request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Maps a duplicate-email store error onto the auth taxonomy
pub(crate) fn email_conflict(err: StoreError) -> AuthError {
    match err {
        StoreError::Duplicate { .. } => AuthError::EmailAlreadyExists,
        StoreError::NotFound(_) => AuthError::UserNotFound,
        other => AuthError::Storage(other),
    }
}

/// Apply a profile update to `user`; returns whether anything changed
pub(crate) fn apply_profile_update(user: &mut User, update: &ProfileUpdate) -> bool {
    let mut changed = false;
    if let Some(name) = update.full_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        user.full_name = name.to_string();
        changed = true;
    }
    if let Some(email) = update.email.as_deref().map(normalize_email).filter(|e| !e.is_empty()) {
        user.email = email;
        changed = true;
    }
    if changed {
        user.updated_at = chrono::Utc::now();
    }
    changed
}

/// Auth service combining the user repository and token issuance
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    jwt_manager: JwtManager,
    password_policy: PasswordPolicy,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        jwt_manager: JwtManager,
        password_policy: PasswordPolicy,
    ) -> Self {
        Self {
            users,
            jwt_manager,
            password_policy,
        }
    }

    pub fn jwt(&self) -> &JwtManager {
        &self.jwt_manager
    }

    /// Register a new account. Self-registered accounts always get the
    /// `user` role.
    pub async fn register(&self, request: RegisterRequest) -> AuthResult<(User, String)> {
        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let user = User::new(
            &request.full_name,
            &request.email,
            &request.password,
            Role::User,
            &self.password_policy,
        )?;
        self.users.create(&user).await.map_err(email_conflict)?;
        info!(user = %user.id, "user registered");

        let token = self.jwt_manager.generate_access_token(&user)?;
        Ok((user, token))
    }

    /// Authenticate by email and password
    pub async fn login(&self, request: LoginRequest) -> AuthResult<(User, String)> {
        let user = self
            .users
            .find_by_email(&request.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.verify_password(&request.password)? {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.jwt_manager.generate_access_token(&user)?;
        Ok((user, token))
    }

    /// Resolve a bearer token to the current user record
    pub async fn authenticate(&self, token: &str) -> AuthResult<AuthUser> {
        let claims = self.jwt_manager.validate_token(token)?;
        let user_id = claims.subject()?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UnknownPrincipal)?;

        Ok(AuthUser::from(&user))
    }

    pub async fn get_user(&self, user_id: Uuid) -> AuthResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Update the caller's own name and/or email
    pub async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> AuthResult<User> {
        let mut user = self.get_user(user_id).await?;
        if !apply_profile_update(&mut user, &update) {
            return Err(AuthError::NothingToUpdate);
        }
        self.users.update(&user).await.map_err(email_conflict)?;
        Ok(user)
    }

    /// Change the caller's password after verifying the current one
    pub async fn change_password(
        &self,
        user_id: Uuid,
        request: ChangePasswordRequest,
    ) -> AuthResult<()> {
        let mut user = self.get_user(user_id).await?;

        if !user.verify_password(&request.current_password)? {
            return Err(AuthError::InvalidInput(
                "Current password is incorrect".to_string(),
            ));
        }

        user.update_password(&request.new_password, &self.password_policy)?;
        self.users.update(&user).await.map_err(email_conflict)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::JwtConfig;
    use crate::auth::user::InMemoryUserRepository;

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(InMemoryUserRepository::new()),
            JwtManager::new(JwtConfig::default()),
            PasswordPolicy::self_service(),
        )
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            full_name: "Casey".to_string(),
            email: email.to_string(),
            password: "abcd1234".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let service = service();
        let (user, token) = service.register(register_request("Casey@Example.com")).await.unwrap();
        assert_eq!(user.role, Role::User);
        assert_eq!(user.email, "casey@example.com");

        let principal = service.authenticate(&token).await.unwrap();
        assert_eq!(principal.id, user.id);

        let (logged_in, _) = service
            .login(LoginRequest {
                email: " casey@example.com".to_string(),
                password: "abcd1234".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let service = service();
        service.register(register_request("dup@example.com")).await.unwrap();
        let result = service.register(register_request("DUP@example.com")).await;
        assert!(matches!(result, Err(AuthError::EmailAlreadyExists)));
    }

    #[tokio::test]
    async fn test_register_enforces_exact_length() {
        let service = service();
        let mut request = register_request("short@example.com");
        request.password = "abc".to_string();
        assert!(matches!(
            service.register(request).await,
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[tokio::test]
    async fn test_wrong_password_is_generic() {
        let service = service();
        service.register(register_request("x@example.com")).await.unwrap();
        let result = service
            .login(LoginRequest {
                email: "x@example.com".to_string(),
                password: "nope1234".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));

        let unknown = service
            .login(LoginRequest {
                email: "ghost@example.com".to_string(),
                password: "abcd1234".to_string(),
            })
            .await;
        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_profile_update_rules() {
        let service = service();
        let (a, _) = service.register(register_request("a@example.com")).await.unwrap();
        service.register(register_request("b@example.com")).await.unwrap();

        let blank = ProfileUpdate {
            full_name: Some("   ".to_string()),
            email: None,
        };
        assert!(matches!(
            service.update_profile(a.id, blank).await,
            Err(AuthError::NothingToUpdate)
        ));

        let clash = ProfileUpdate {
            email: Some("B@example.com".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service.update_profile(a.id, clash).await,
            Err(AuthError::EmailAlreadyExists)
        ));

        let rename = ProfileUpdate {
            full_name: Some(" Casey Jones ".to_string()),
            ..Default::default()
        };
        assert_eq!(service.update_profile(a.id, rename).await.unwrap().full_name, "Casey Jones");
    }

    #[tokio::test]
    async fn test_change_password_checks_current() {
        let service = service();
        let (user, _) = service.register(register_request("p@example.com")).await.unwrap();

        let wrong = ChangePasswordRequest {
            current_password: "zzzzzzzz".to_string(),
            new_password: "newpass1".to_string(),
        };
        assert!(service.change_password(user.id, wrong).await.is_err());

        let ok = ChangePasswordRequest {
            current_password: "abcd1234".to_string(),
            new_password: "newpass1".to_string(),
        };
        service.change_password(user.id, ok).await.unwrap();
        let relogin = service
            .login(LoginRequest {
                email: "p@example.com".to_string(),
                password: "newpass1".to_string(),
            })
            .await;
        assert!(relogin.is_ok());
    }

    #[tokio::test]
    async fn test_deleted_user_token_is_rejected() {
        let users = Arc::new(InMemoryUserRepository::new());
        let service = AuthService::new(
            users.clone(),
            JwtManager::new(JwtConfig::default()),
            PasswordPolicy::self_service(),
        );
        let (user, token) = service.register(register_request("gone@example.com")).await.unwrap();
        users.delete(user.id).await.unwrap();

        assert!(matches!(
            service.authenticate(&token).await,
            Err(AuthError::UnknownPrincipal)
        ));
    }
}

//! # User Management
//!
//! User model and repository. Roles are a closed set; the system must always
//! keep at least one superadmin. The repository enforces that inside the
//! same critical section as the write, via the `*_guarded` operations.

use std::fmt;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::crypto::{hash_password, validate_password, verify_password, PasswordPolicy};
use super::errors::{AuthError, AuthResult};
use crate::store::{Page, StoreError, StoreResult};

/// Principal role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Superadmin,
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Superadmin => "superadmin",
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize an email for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// User model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    /// Unique, stored normalized
    pub email: String,
    pub role: Role,

    /// Argon2id password hash (never plaintext, never serialized)
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user, validating and hashing the password
    pub fn new(
        full_name: &str,
        email: &str,
        password: &str,
        role: Role,
        policy: &PasswordPolicy,
    ) -> AuthResult<Self> {
        let full_name = full_name.trim();
        let email = normalize_email(email);
        if full_name.is_empty() || email.is_empty() {
            return Err(AuthError::InvalidInput(
                "fullName, email, password are required".to_string(),
            ));
        }

        validate_password(password, policy)?;
        let password_hash = hash_password(password)?;
        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4(),
            full_name: full_name.to_string(),
            email,
            role,
            password_hash,
            created_at: now,
            updated_at: now,
        })
    }

    /// Verify a password against this user's stored hash
    pub fn verify_password(&self, password: &str) -> AuthResult<bool> {
        verify_password(password, &self.password_hash)
    }

    /// Update the user's password
    pub fn update_password(&mut self, new_password: &str, policy: &PasswordPolicy) -> AuthResult<()> {
        validate_password(new_password, policy)?;
        self.password_hash = hash_password(new_password)?;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn is_superadmin(&self) -> bool {
        self.role == Role::Superadmin
    }
}

/// Outcome of a write that may not remove the last superadmin
#[derive(Debug, Clone, PartialEq)]
pub enum Guarded<T> {
    Applied(T),
    /// Refused: the target is the only remaining superadmin
    LastSuperadmin,
}

/// User repository trait
///
/// Abstracts storage operations for users.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by their ID
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Find a user by their (normalized) email
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Create a new user; duplicate emails are rejected
    async fn create(&self, user: &User) -> StoreResult<()>;

    /// Replace an existing user; a clashing email is rejected
    async fn update(&self, user: &User) -> StoreResult<()>;

    /// Delete a user; returns whether it existed
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;

    /// Number of users holding `role`
    async fn count_by_role(&self, role: Role) -> StoreResult<usize>;

    /// Change a user's role unless that would leave no superadmin.
    ///
    /// The count and the write are one atomic step. Missing user is
    /// `StoreError::NotFound`.
    async fn set_role_guarded(&self, id: Uuid, role: Role) -> StoreResult<Guarded<User>>;

    /// Delete a user unless that would leave no superadmin; returns the
    /// removed record
    async fn delete_guarded(&self, id: Uuid) -> StoreResult<Guarded<User>>;

    /// Case-insensitive substring search on full name or email, sorted by
    /// full name
    async fn search(&self, q: Option<&str>, page: usize, limit: usize) -> StoreResult<Page<User>>;
}

/// In-memory user repository
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn position_of(users: &[User], id: Uuid) -> StoreResult<usize> {
    users
        .iter()
        .position(|u| u.id == id)
        .ok_or(StoreError::NotFound("User"))
}

/// Whether removing superadmin from `users[index]` leaves none
fn is_last_superadmin(users: &[User], index: usize) -> bool {
    users[index].is_superadmin() && users.iter().filter(|u| u.is_superadmin()).count() <= 1
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let users = self.users.read()?;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = normalize_email(email);
        let users = self.users.read()?;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn create(&self, user: &User) -> StoreResult<()> {
        let mut users = self.users.write()?;

        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::duplicate("User", "email", &user.email));
        }

        users.push(user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> StoreResult<()> {
        let mut users = self.users.write()?;

        if users.iter().any(|u| u.email == user.email && u.id != user.id) {
            return Err(StoreError::duplicate("User", "email", &user.email));
        }

        match users.iter_mut().find(|u| u.id == user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound("User")),
        }
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut users = self.users.write()?;
        let len_before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() != len_before)
    }

    async fn count_by_role(&self, role: Role) -> StoreResult<usize> {
        let users = self.users.read()?;
        Ok(users.iter().filter(|u| u.role == role).count())
    }

    async fn set_role_guarded(&self, id: Uuid, role: Role) -> StoreResult<Guarded<User>> {
        let mut users = self.users.write()?;
        let index = position_of(&users, id)?;

        if role != Role::Superadmin && is_last_superadmin(&users, index) {
            return Ok(Guarded::LastSuperadmin);
        }

        let user = &mut users[index];
        user.role = role;
        user.updated_at = Utc::now();
        Ok(Guarded::Applied(user.clone()))
    }

    async fn delete_guarded(&self, id: Uuid) -> StoreResult<Guarded<User>> {
        let mut users = self.users.write()?;
        let index = position_of(&users, id)?;

        if is_last_superadmin(&users, index) {
            return Ok(Guarded::LastSuperadmin);
        }
        Ok(Guarded::Applied(users.remove(index)))
    }

    async fn search(&self, q: Option<&str>, page: usize, limit: usize) -> StoreResult<Page<User>> {
        let pattern = q
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .and_then(|q| {
                RegexBuilder::new(&regex::escape(q))
                    .case_insensitive(true)
                    .build()
                    .ok()
            });

        let users = self.users.read()?;
        let mut matching: Vec<User> = users
            .iter()
            .filter(|u| {
                pattern
                    .as_ref()
                    .map_or(true, |re| re.is_match(&u.full_name) || re.is_match(&u.email))
            })
            .cloned()
            .collect();
        drop(users);

        matching.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(Page::from_sorted(matching, page, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_policy() -> PasswordPolicy {
        PasswordPolicy::default()
    }

    fn user(name: &str, email: &str, role: Role) -> User {
        User::new(name, email, "password", role, &default_policy()).unwrap()
    }

    #[test]
    fn test_user_creation_normalizes() {
        let user = user("  Alice  ", " Alice@Example.COM ", Role::User);

        assert_eq!(user.full_name, "Alice");
        assert_eq!(user.email, "alice@example.com");
        assert!(!user.password_hash.is_empty());
        assert_ne!(user.password_hash, "password");
    }

    #[test]
    fn test_password_verification() {
        let user = user("Alice", "a@example.com", Role::User);
        assert!(user.verify_password("password").unwrap());
        assert!(!user.verify_password("wrongpwd").unwrap());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Superadmin).unwrap(), "\"superadmin\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
        assert!(serde_json::from_str::<Role>("\"owner\"").is_err());
    }

    #[test]
    fn test_user_serialization_omits_password() {
        let user = user("Alice", "a@example.com", Role::User);
        let json = serde_json::to_string(&user).unwrap();

        assert!(!json.contains("passwordHash"));
        assert!(!json.contains(&user.password_hash));
        assert!(json.contains("\"fullName\":\"Alice\""));
    }

    #[tokio::test]
    async fn test_in_memory_repository() {
        let repo = InMemoryUserRepository::new();
        let alice = user("Alice", "alice@example.com", Role::Superadmin);
        repo.create(&alice).await.unwrap();

        assert!(repo.find_by_id(alice.id).await.unwrap().is_some());
        assert!(repo.find_by_email("ALICE@example.com").await.unwrap().is_some());

        let clash = user("Other", "alice@example.com", Role::User);
        assert!(matches!(
            repo.create(&clash).await,
            Err(StoreError::Duplicate { .. })
        ));

        assert_eq!(repo.count_by_role(Role::Superadmin).await.unwrap(), 1);
        assert!(repo.delete(alice.id).await.unwrap());
        assert!(repo.find_by_id(alice.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_guarded_writes_keep_one_superadmin() {
        let repo = InMemoryUserRepository::new();
        let root = user("Root", "root@example.com", Role::Superadmin);
        let clerk = user("Clerk", "clerk@example.com", Role::User);
        repo.create(&root).await.unwrap();
        repo.create(&clerk).await.unwrap();

        assert_eq!(
            repo.set_role_guarded(root.id, Role::Admin).await.unwrap(),
            Guarded::LastSuperadmin
        );
        assert_eq!(repo.delete_guarded(root.id).await.unwrap(), Guarded::LastSuperadmin);
        assert_eq!(repo.count_by_role(Role::Superadmin).await.unwrap(), 1);

        let promoted = repo.set_role_guarded(clerk.id, Role::Superadmin).await.unwrap();
        assert!(matches!(promoted, Guarded::Applied(ref u) if u.role == Role::Superadmin));
        assert!(matches!(
            repo.delete_guarded(root.id).await.unwrap(),
            Guarded::Applied(ref u) if u.id == root.id
        ));

        assert!(matches!(
            repo.delete_guarded(Uuid::new_v4()).await,
            Err(StoreError::NotFound("User"))
        ));
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_and_sorted() {
        let repo = InMemoryUserRepository::new();
        repo.create(&user("Zed", "zed@corp.io", Role::User)).await.unwrap();
        repo.create(&user("amy", "amy@corp.io", Role::User)).await.unwrap();
        repo.create(&user("Bob", "bob@else.io", Role::User)).await.unwrap();

        let page = repo.search(Some("CORP"), 1, 50).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].full_name, "Zed");

        // Regex metacharacters are matched literally
        assert_eq!(repo.search(Some(".*"), 1, 50).await.unwrap().total, 0);
        assert_eq!(repo.search(None, 1, 2).await.unwrap().pages, 2);
        assert!(repo.search(None, usize::MAX, 100).await.unwrap().items.is_empty());
    }
}

//! Superadmin Guard Tests
//!
//! At least one superadmin always exists. Demoting or deleting the last
//! one is refused before anything is written.

use std::sync::Arc;

use divforms::auth::crypto::PasswordPolicy;
use divforms::auth::user::InMemoryUserRepository;
use divforms::auth::{AuthError, Role, User, UserAdmin, UserRepository};
use divforms::store::{AccessGrantRepository, InMemoryAccessGrantRepository};
use uuid::Uuid;

// =============================================================================
// Helper Functions
// =============================================================================

struct Fixture {
    users: Arc<InMemoryUserRepository>,
    grants: Arc<InMemoryAccessGrantRepository>,
    admin: UserAdmin,
}

fn fixture() -> Fixture {
    let users = Arc::new(InMemoryUserRepository::new());
    let grants = Arc::new(InMemoryAccessGrantRepository::new());
    let admin = UserAdmin::new(users.clone(), grants.clone());
    Fixture { users, grants, admin }
}

async fn seed(users: &InMemoryUserRepository, email: &str, role: Role) -> User {
    let user = User::new("Seeded", email, "password", role, &PasswordPolicy::default()).unwrap();
    users.create(&user).await.unwrap();
    user
}

// =============================================================================
// Last Superadmin
// =============================================================================

/// The only superadmin cannot be demoted.
#[tokio::test]
async fn test_last_superadmin_cannot_be_demoted() {
    let f = fixture();
    let root = seed(&f.users, "root@example.com", Role::Superadmin).await;

    let err = f.admin.set_role(root.id, Role::Admin).await.unwrap_err();
    assert!(matches!(err, AuthError::LastSuperadminProtected { .. }));
    assert_eq!(err.status_code(), 400);

    let stored = f.users.find_by_id(root.id).await.unwrap().unwrap();
    assert_eq!(stored.role, Role::Superadmin);
}

/// The only superadmin cannot be deleted.
#[tokio::test]
async fn test_last_superadmin_cannot_be_deleted() {
    let f = fixture();
    let root = seed(&f.users, "root@example.com", Role::Superadmin).await;

    let err = f.admin.delete(root.id).await.unwrap_err();
    assert!(matches!(err, AuthError::LastSuperadminProtected { .. }));
    assert!(f.users.find_by_id(root.id).await.unwrap().is_some());
}

/// Re-asserting the superadmin role on the last one is a no-op, not an error.
#[tokio::test]
async fn test_last_superadmin_can_keep_role() {
    let f = fixture();
    let root = seed(&f.users, "root@example.com", Role::Superadmin).await;
    let user = f.admin.set_role(root.id, Role::Superadmin).await.unwrap();
    assert_eq!(user.role, Role::Superadmin);
}

/// With two superadmins, one may be demoted; the survivor is then protected.
#[tokio::test]
async fn test_demote_allowed_when_another_superadmin_exists() {
    let f = fixture();
    let first = seed(&f.users, "first@example.com", Role::Superadmin).await;
    let second = seed(&f.users, "second@example.com", Role::Superadmin).await;

    let demoted = f.admin.set_role(first.id, Role::User).await.unwrap();
    assert_eq!(demoted.role, Role::User);
    assert_eq!(f.users.count_by_role(Role::Superadmin).await.unwrap(), 1);

    let err = f.admin.delete(second.id).await.unwrap_err();
    assert!(matches!(err, AuthError::LastSuperadminProtected { .. }));
}

// =============================================================================
// Concurrent Removal
// =============================================================================

fn is_guard_refusal(result: &Result<User, AuthError>) -> bool {
    matches!(result, Err(AuthError::LastSuperadminProtected { .. }))
}

/// Two simultaneous demotions of the final two superadmins: exactly one wins.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_demotions_leave_one_superadmin() {
    for _ in 0..50 {
        let f = fixture();
        let a = seed(&f.users, "a@example.com", Role::Superadmin).await;
        let b = seed(&f.users, "b@example.com", Role::Superadmin).await;

        let (first, second) = (f.admin.clone(), f.admin.clone());
        let ta = tokio::spawn(async move { first.set_role(a.id, Role::User).await });
        let tb = tokio::spawn(async move { second.set_role(b.id, Role::User).await });
        let results = [ta.await.unwrap(), tb.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(results.iter().filter(|r| is_guard_refusal(r)).count(), 1);
        assert_eq!(f.users.count_by_role(Role::Superadmin).await.unwrap(), 1);
    }
}

/// Demotion racing a deletion still keeps one superadmin.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_demote_and_delete_leave_one_superadmin() {
    for _ in 0..50 {
        let f = fixture();
        let a = seed(&f.users, "a@example.com", Role::Superadmin).await;
        let b = seed(&f.users, "b@example.com", Role::Superadmin).await;

        let (first, second) = (f.admin.clone(), f.admin.clone());
        let ta = tokio::spawn(async move { first.set_role(a.id, Role::Admin).await });
        let tb = tokio::spawn(async move { second.delete(b.id).await });
        let results = [ta.await.unwrap(), tb.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(f.users.count_by_role(Role::Superadmin).await.unwrap(), 1);
    }
}

// =============================================================================
// Ordinary Users
// =============================================================================

/// Deleting a user removes their grants too.
#[tokio::test]
async fn test_delete_user_cascades_grants() {
    let f = fixture();
    seed(&f.users, "root@example.com", Role::Superadmin).await;
    let user = seed(&f.users, "user@example.com", Role::User).await;
    let division = Uuid::new_v4();
    f.grants
        .set_screens(user.id, division, &[Uuid::new_v4()])
        .await
        .unwrap();

    f.admin.delete(user.id).await.unwrap();

    assert!(f.users.find_by_id(user.id).await.unwrap().is_none());
    assert!(f.grants.list_for_user(user.id).await.unwrap().is_empty());
}

/// Unknown ids surface as not found.
#[tokio::test]
async fn test_unknown_user_is_not_found() {
    let f = fixture();
    let err = f.admin.delete(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AuthError::UserNotFound));
}

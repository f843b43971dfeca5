//! # Auth Module
//!
//! Authentication and authorization boundary for the form backend:
//! users and roles, password hashing, JWT access tokens, the division/screen
//! access gate and superadmin-only user administration.

pub mod access;
pub mod admin;
pub mod api;
pub mod crypto;
pub mod errors;
pub mod jwt;
pub mod user;

pub use access::{AccessGate, AuthUser, GrantAccessGate};
pub use admin::UserAdmin;
pub use api::AuthService;
pub use errors::{AuthError, AuthResult};
pub use jwt::{JwtClaims, JwtConfig, JwtManager};
pub use user::{Guarded, Role, User, UserRepository};

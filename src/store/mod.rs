//! # Document Store
//!
//! Repository traits for every persisted collection, plus in-memory
//! implementations. Repositories are object-safe so the service layer holds
//! them as `Arc<dyn ...>` and tests can swap them.
//!
//! Collections:
//! - divisions (unique name, unique code)
//! - screens (unique key)
//! - form definitions (indexed by division + screen + active)
//! - submissions (indexed by division + screen + created_at desc)
//! - access grants (unique per user + division)
//! - users (see [`crate::auth::user`])

pub mod definitions;
pub mod divisions;
pub mod errors;
pub mod grants;
pub mod screens;
pub mod submissions;

use std::sync::Arc;

use crate::auth::user::{InMemoryUserRepository, UserRepository};

pub use definitions::{FormDefinition, FormDefinitionRepository, InMemoryFormDefinitionRepository};
pub use divisions::{Division, DivisionRepository, InMemoryDivisionRepository};
pub use errors::{StoreError, StoreResult};
pub use grants::{AccessGrant, AccessGrantRepository, InMemoryAccessGrantRepository};
pub use screens::{InMemoryScreenRepository, Screen, ScreenRepository};
pub use submissions::{
    InMemorySubmissionRepository, Page, SortDirection, Submission, SubmissionQuery,
    SubmissionRepository,
};

/// Handles to every collection
#[derive(Clone)]
pub struct Repositories {
    pub divisions: Arc<dyn DivisionRepository>,
    pub screens: Arc<dyn ScreenRepository>,
    pub definitions: Arc<dyn FormDefinitionRepository>,
    pub submissions: Arc<dyn SubmissionRepository>,
    pub grants: Arc<dyn AccessGrantRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Repositories {
    /// All collections backed by process memory
    pub fn in_memory() -> Self {
        Self {
            divisions: Arc::new(InMemoryDivisionRepository::new()),
            screens: Arc::new(InMemoryScreenRepository::new()),
            definitions: Arc::new(InMemoryFormDefinitionRepository::new()),
            submissions: Arc::new(InMemorySubmissionRepository::new()),
            grants: Arc::new(InMemoryAccessGrantRepository::new()),
            users: Arc::new(InMemoryUserRepository::new()),
        }
    }
}

//! # Divisions
//!
//! Tenant-like groupings that own screens' form definitions, submissions
//! and access grants.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{StoreError, StoreResult};

/// Division document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Division {
    pub id: Uuid,
    /// Unique display name
    pub name: String,
    /// Unique short code
    pub code: String,
    pub created_at: DateTime<Utc>,
}

impl Division {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            code: code.into(),
            created_at: Utc::now(),
        }
    }
}

/// Division repository trait
#[async_trait]
pub trait DivisionRepository: Send + Sync {
    /// Insert a division, enforcing unique name and code
    async fn create(&self, division: &Division) -> StoreResult<()>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<Division>>;

    async fn list(&self) -> StoreResult<Vec<Division>>;

    /// Remove a division; returns whether it existed
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
}

/// In-memory division repository
#[derive(Debug, Default)]
pub struct InMemoryDivisionRepository {
    divisions: RwLock<Vec<Division>>,
}

impl InMemoryDivisionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DivisionRepository for InMemoryDivisionRepository {
    async fn create(&self, division: &Division) -> StoreResult<()> {
        let mut divisions = self.divisions.write()?;

        if divisions.iter().any(|d| d.name == division.name) {
            return Err(StoreError::duplicate("Division", "name", &division.name));
        }
        if divisions.iter().any(|d| d.code == division.code) {
            return Err(StoreError::duplicate("Division", "code", &division.code));
        }

        divisions.push(division.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Division>> {
        let divisions = self.divisions.read()?;
        Ok(divisions.iter().find(|d| d.id == id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Division>> {
        Ok(self.divisions.read()?.clone())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut divisions = self.divisions.write()?;
        let len_before = divisions.len();
        divisions.retain(|d| d.id != id);
        Ok(divisions.len() != len_before)
    }
}

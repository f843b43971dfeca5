//! # Form Definitions
//!
//! Versioned schema artifacts per (division, screen) pair.
//!
//! ## Invariants
//! - At most one definition per pair has `is_active == true`
//! - Versions are positive and strictly increasing per pair
//!
//! Activation goes through [`FormDefinitionRepository::swap_active`], a
//! compare-and-swap keyed on the identity of the currently active row.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::errors::StoreResult;

/// Form definition document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDefinition {
    pub id: Uuid,
    pub division_id: Uuid,
    pub screen_id: Uuid,
    pub version: u32,
    /// Validation contract for submissions
    pub schema: Value,
    /// Rendering hints, never validated
    pub ui_schema: Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl FormDefinition {
    /// Build a new active definition for the given pair and version
    pub fn new_active(
        division_id: Uuid,
        screen_id: Uuid,
        version: u32,
        schema: Value,
        ui_schema: Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            division_id,
            screen_id,
            version,
            schema,
            ui_schema,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn belongs_to(&self, division_id: Uuid, screen_id: Uuid) -> bool {
        self.division_id == division_id && self.screen_id == screen_id
    }
}

/// Form definition repository trait
#[async_trait]
pub trait FormDefinitionRepository: Send + Sync {
    /// Returns the active definition for the pair, if any
    async fn find_active(
        &self,
        division_id: Uuid,
        screen_id: Uuid,
    ) -> StoreResult<Option<FormDefinition>>;

    /// Atomically supersede the active definition of `definition`'s pair.
    ///
    /// Succeeds only when the pair's currently active id equals
    /// `expected_active` (`None` meaning "no active definition"). On success
    /// the previous row is deactivated and `definition` is inserted as
    /// active. Returns `false` without writing when the expectation is stale.
    async fn swap_active(
        &self,
        expected_active: Option<Uuid>,
        definition: &FormDefinition,
    ) -> StoreResult<bool>;

    /// All versions for the pair, newest first
    async fn list_versions(
        &self,
        division_id: Uuid,
        screen_id: Uuid,
    ) -> StoreResult<Vec<FormDefinition>>;

    async fn delete_for_division(&self, division_id: Uuid) -> StoreResult<usize>;

    async fn delete_for_screen(&self, screen_id: Uuid) -> StoreResult<usize>;
}

/// In-memory form definition repository
#[derive(Debug, Default)]
pub struct InMemoryFormDefinitionRepository {
    definitions: RwLock<Vec<FormDefinition>>,
}

impl InMemoryFormDefinitionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FormDefinitionRepository for InMemoryFormDefinitionRepository {
    async fn find_active(
        &self,
        division_id: Uuid,
        screen_id: Uuid,
    ) -> StoreResult<Option<FormDefinition>> {
        let definitions = self.definitions.read()?;
        Ok(definitions
            .iter()
            .find(|d| d.is_active && d.belongs_to(division_id, screen_id))
            .cloned())
    }

    async fn swap_active(
        &self,
        expected_active: Option<Uuid>,
        definition: &FormDefinition,
    ) -> StoreResult<bool> {
        let mut definitions = self.definitions.write()?;

        let current = definitions
            .iter_mut()
            .find(|d| d.is_active && d.belongs_to(definition.division_id, definition.screen_id));

        match (current, expected_active) {
            (None, None) => {}
            (Some(current), Some(expected)) if current.id == expected => {
                current.is_active = false;
            }
            _ => return Ok(false),
        }

        definitions.push(definition.clone());
        Ok(true)
    }

    async fn list_versions(
        &self,
        division_id: Uuid,
        screen_id: Uuid,
    ) -> StoreResult<Vec<FormDefinition>> {
        let definitions = self.definitions.read()?;
        let mut versions: Vec<_> = definitions
            .iter()
            .filter(|d| d.belongs_to(division_id, screen_id))
            .cloned()
            .collect();
        versions.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(versions)
    }

    async fn delete_for_division(&self, division_id: Uuid) -> StoreResult<usize> {
        let mut definitions = self.definitions.write()?;
        let len_before = definitions.len();
        definitions.retain(|d| d.division_id != division_id);
        Ok(len_before - definitions.len())
    }

    async fn delete_for_screen(&self, screen_id: Uuid) -> StoreResult<usize> {
        let mut definitions = self.definitions.write()?;
        let len_before = definitions.len();
        definitions.retain(|d| d.screen_id != screen_id);
        Ok(len_before - definitions.len())
    }
}

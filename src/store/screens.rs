//! # Screens
//!
//! Named form surfaces. A screen only carries identity; its schema lives in
//! versioned form definitions per division.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{StoreError, StoreResult};

/// Screen document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Screen {
    pub id: Uuid,
    /// Unique key, e.g. "sales" or "production"
    pub key: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl Screen {
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            key: key.into(),
            title: title.into(),
            created_at: Utc::now(),
        }
    }
}

/// Screen repository trait
#[async_trait]
pub trait ScreenRepository: Send + Sync {
    /// Insert a screen, enforcing a unique key
    async fn create(&self, screen: &Screen) -> StoreResult<()>;

    async fn get(&self, id: Uuid) -> StoreResult<Option<Screen>>;

    async fn list(&self) -> StoreResult<Vec<Screen>>;

    /// Remove a screen; returns whether it existed
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
}

/// In-memory screen repository
#[derive(Debug, Default)]
pub struct InMemoryScreenRepository {
    screens: RwLock<Vec<Screen>>,
}

impl InMemoryScreenRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScreenRepository for InMemoryScreenRepository {
    async fn create(&self, screen: &Screen) -> StoreResult<()> {
        let mut screens = self.screens.write()?;
        if screens.iter().any(|s| s.key == screen.key) {
            return Err(StoreError::duplicate("Screen", "key", &screen.key));
        }
        screens.push(screen.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StoreResult<Option<Screen>> {
        let screens = self.screens.read()?;
        Ok(screens.iter().find(|s| s.id == id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Screen>> {
        Ok(self.screens.read()?.clone())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut screens = self.screens.write()?;
        let len_before = screens.len();
        screens.retain(|s| s.id != id);
        Ok(screens.len() != len_before)
    }
}

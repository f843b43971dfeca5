//! # Access Grants
//!
//! One grant per (user, division) listing the screens the user may use in
//! that division. Screen references are weak: deleting a screen pulls it out
//! of every grant.
//!
//! Every mutation runs inside a single write-lock critical section so that
//! concurrent set/add/remove calls on the same grant never lose updates.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::StoreResult;

/// Access grant document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessGrant {
    pub id: Uuid,
    pub user_id: Uuid,
    pub division_id: Uuid,
    /// Permitted screens; unordered, duplicates never stored
    pub screens: Vec<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl AccessGrant {
    fn new(user_id: Uuid, division_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            division_id,
            screens: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Whether the grant covers the given screen
    pub fn allows(&self, screen_id: Uuid) -> bool {
        self.screens.contains(&screen_id)
    }

    fn is_for(&self, user_id: Uuid, division_id: Uuid) -> bool {
        self.user_id == user_id && self.division_id == division_id
    }

    fn add(&mut self, screen_ids: &[Uuid]) {
        for id in screen_ids {
            if !self.screens.contains(id) {
                self.screens.push(*id);
            }
        }
        self.updated_at = Utc::now();
    }

    fn remove(&mut self, screen_ids: &[Uuid]) {
        self.screens.retain(|id| !screen_ids.contains(id));
        self.updated_at = Utc::now();
    }
}

/// Access grant repository trait
#[async_trait]
pub trait AccessGrantRepository: Send + Sync {
    async fn find(&self, user_id: Uuid, division_id: Uuid) -> StoreResult<Option<AccessGrant>>;

    /// Replace the screen set, creating the grant if needed
    async fn set_screens(
        &self,
        user_id: Uuid,
        division_id: Uuid,
        screen_ids: &[Uuid],
    ) -> StoreResult<AccessGrant>;

    /// Union screens into an existing grant; `None` when there is no grant
    async fn add_screens(
        &self,
        user_id: Uuid,
        division_id: Uuid,
        screen_ids: &[Uuid],
    ) -> StoreResult<Option<AccessGrant>>;

    /// Remove screens from an existing grant; `None` when there is no grant
    async fn remove_screens(
        &self,
        user_id: Uuid,
        division_id: Uuid,
        screen_ids: &[Uuid],
    ) -> StoreResult<Option<AccessGrant>>;

    /// Delete the grant; returns the removed document
    async fn delete(&self, user_id: Uuid, division_id: Uuid) -> StoreResult<Option<AccessGrant>>;

    async fn list_for_user(&self, user_id: Uuid) -> StoreResult<Vec<AccessGrant>>;

    async fn delete_for_division(&self, division_id: Uuid) -> StoreResult<usize>;

    async fn delete_for_user(&self, user_id: Uuid) -> StoreResult<usize>;

    /// Pull a screen from every grant; returns the number of grants modified
    async fn pull_screen(&self, screen_id: Uuid) -> StoreResult<usize>;
}

/// In-memory access grant repository
#[derive(Debug, Default)]
pub struct InMemoryAccessGrantRepository {
    grants: RwLock<Vec<AccessGrant>>,
}

impl InMemoryAccessGrantRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn update_existing(
        &self,
        user_id: Uuid,
        division_id: Uuid,
        apply: impl FnOnce(&mut AccessGrant),
    ) -> StoreResult<Option<AccessGrant>> {
        let mut grants = self.grants.write()?;
        Ok(grants
            .iter_mut()
            .find(|g| g.is_for(user_id, division_id))
            .map(|grant| {
                apply(grant);
                grant.clone()
            }))
    }
}

#[async_trait]
impl AccessGrantRepository for InMemoryAccessGrantRepository {
    async fn find(&self, user_id: Uuid, division_id: Uuid) -> StoreResult<Option<AccessGrant>> {
        let grants = self.grants.read()?;
        Ok(grants.iter().find(|g| g.is_for(user_id, division_id)).cloned())
    }

    async fn set_screens(
        &self,
        user_id: Uuid,
        division_id: Uuid,
        screen_ids: &[Uuid],
    ) -> StoreResult<AccessGrant> {
        let mut grants = self.grants.write()?;

        let index = match grants.iter().position(|g| g.is_for(user_id, division_id)) {
            Some(index) => index,
            None => {
                grants.push(AccessGrant::new(user_id, division_id));
                grants.len() - 1
            }
        };

        let grant = &mut grants[index];
        grant.screens.clear();
        grant.add(screen_ids);
        Ok(grant.clone())
    }

    async fn add_screens(
        &self,
        user_id: Uuid,
        division_id: Uuid,
        screen_ids: &[Uuid],
    ) -> StoreResult<Option<AccessGrant>> {
        self.update_existing(user_id, division_id, |grant| grant.add(screen_ids))
    }

    async fn remove_screens(
        &self,
        user_id: Uuid,
        division_id: Uuid,
        screen_ids: &[Uuid],
    ) -> StoreResult<Option<AccessGrant>> {
        self.update_existing(user_id, division_id, |grant| grant.remove(screen_ids))
    }

    async fn delete(&self, user_id: Uuid, division_id: Uuid) -> StoreResult<Option<AccessGrant>> {
        let mut grants = self.grants.write()?;
        Ok(grants
            .iter()
            .position(|g| g.is_for(user_id, division_id))
            .map(|index| grants.remove(index)))
    }

    async fn list_for_user(&self, user_id: Uuid) -> StoreResult<Vec<AccessGrant>> {
        let grants = self.grants.read()?;
        Ok(grants.iter().filter(|g| g.user_id == user_id).cloned().collect())
    }

    async fn delete_for_division(&self, division_id: Uuid) -> StoreResult<usize> {
        let mut grants = self.grants.write()?;
        let len_before = grants.len();
        grants.retain(|g| g.division_id != division_id);
        Ok(len_before - grants.len())
    }

    async fn delete_for_user(&self, user_id: Uuid) -> StoreResult<usize> {
        let mut grants = self.grants.write()?;
        let len_before = grants.len();
        grants.retain(|g| g.user_id != user_id);
        Ok(len_before - grants.len())
    }

    async fn pull_screen(&self, screen_id: Uuid) -> StoreResult<usize> {
        let mut grants = self.grants.write()?;
        let mut modified = 0;
        for grant in grants.iter_mut().filter(|g| g.allows(screen_id)) {
            grant.remove(&[screen_id]);
            modified += 1;
        }
        Ok(modified)
    }
}

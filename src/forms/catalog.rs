//! Divisions, screens and access grants
//!
//! Thin management layer over the store. Deletions cascade:
//! - division: its definitions, submissions and grants
//! - screen: its definitions and submissions; pulled from every grant
//!
//! The validator cache is left alone on deletion; its keys embed ids that
//! are never reused.

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::errors::{FormError, FormResult};
use crate::store::{AccessGrant, Division, Repositories, Screen};

/// Counts removed by a division deletion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DivisionRemoval {
    pub form_definitions: usize,
    pub submissions: usize,
    pub access_grants: usize,
}

/// Counts removed by a screen deletion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenRemoval {
    pub form_definitions: usize,
    pub submissions: usize,
    pub pulled_from_grants: usize,
}

/// Screen-set mutation applied to a grant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantOp {
    /// Replace the set, creating the grant when missing
    #[default]
    Set,
    /// Union into an existing grant
    Add,
    /// Subtract from an existing grant
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DivisionRef {
    pub id: Uuid,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreenRef {
    pub id: Uuid,
    pub key: String,
    pub title: String,
}

/// Grant with its division and screens resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantView {
    pub id: Uuid,
    pub user_id: Uuid,
    /// `None` if the division no longer exists
    pub division: Option<DivisionRef>,
    pub screens: Vec<ScreenRef>,
}

/// Management of divisions, screens and grants
#[derive(Clone)]
pub struct Catalog {
    repos: Repositories,
}

fn require_text(value: &str, field: &str) -> FormResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FormError::InvalidInput(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

impl Catalog {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    // ==================
    // Divisions
    // ==================

    pub async fn create_division(&self, name: &str, code: &str) -> FormResult<Division> {
        let division = Division::new(require_text(name, "name")?, require_text(code, "code")?);
        self.repos.divisions.create(&division).await?;
        info!(division = %division.id, code = %division.code, "division created");
        Ok(division)
    }

    pub async fn list_divisions(&self) -> FormResult<Vec<Division>> {
        Ok(self.repos.divisions.list().await?)
    }

    /// Delete a division and everything it owns
    pub async fn delete_division(&self, id: Uuid) -> FormResult<DivisionRemoval> {
        if self.repos.divisions.get(id).await?.is_none() {
            return Err(FormError::NotFound("Division"));
        }

        let removal = DivisionRemoval {
            form_definitions: self.repos.definitions.delete_for_division(id).await?,
            submissions: self.repos.submissions.delete_for_division(id).await?,
            access_grants: self.repos.grants.delete_for_division(id).await?,
        };
        self.repos.divisions.delete(id).await?;

        info!(division = %id, ?removal, "division deleted");
        Ok(removal)
    }

    // ==================
    // Screens
    // ==================

    pub async fn create_screen(&self, key: &str, title: &str) -> FormResult<Screen> {
        let screen = Screen::new(require_text(key, "key")?, require_text(title, "title")?);
        self.repos.screens.create(&screen).await?;
        info!(screen = %screen.id, key = %screen.key, "screen created");
        Ok(screen)
    }

    pub async fn list_screens(&self) -> FormResult<Vec<Screen>> {
        Ok(self.repos.screens.list().await?)
    }

    /// Delete a screen, its definitions and submissions, and pull it from grants
    pub async fn delete_screen(&self, id: Uuid) -> FormResult<ScreenRemoval> {
        if self.repos.screens.get(id).await?.is_none() {
            return Err(FormError::NotFound("Screen"));
        }

        let removal = ScreenRemoval {
            form_definitions: self.repos.definitions.delete_for_screen(id).await?,
            submissions: self.repos.submissions.delete_for_screen(id).await?,
            pulled_from_grants: self.repos.grants.pull_screen(id).await?,
        };
        self.repos.screens.delete(id).await?;

        info!(screen = %id, ?removal, "screen deleted");
        Ok(removal)
    }

    /// Fails with `NotFound` unless both the division and the screen exist
    pub async fn ensure_pair(&self, division_id: Uuid, screen_id: Uuid) -> FormResult<()> {
        if self.repos.divisions.get(division_id).await?.is_none() {
            return Err(FormError::NotFound("Division"));
        }
        if self.repos.screens.get(screen_id).await?.is_none() {
            return Err(FormError::NotFound("Screen"));
        }
        Ok(())
    }

    // ==================
    // Access grants
    // ==================

    /// Apply a screen-set mutation. Only `Set` creates a missing grant.
    pub async fn update_grant(
        &self,
        user_id: Uuid,
        division_id: Uuid,
        op: GrantOp,
        screen_ids: &[Uuid],
    ) -> FormResult<Option<AccessGrant>> {
        let grants = &self.repos.grants;
        let grant = match op {
            GrantOp::Set => {
                if self.repos.users.find_by_id(user_id).await?.is_none() {
                    return Err(FormError::NotFound("User"));
                }
                if self.repos.divisions.get(division_id).await?.is_none() {
                    return Err(FormError::NotFound("Division"));
                }
                Some(grants.set_screens(user_id, division_id, screen_ids).await?)
            }
            GrantOp::Add => grants.add_screens(user_id, division_id, screen_ids).await?,
            GrantOp::Remove => grants.remove_screens(user_id, division_id, screen_ids).await?,
        };

        info!(user = %user_id, division = %division_id, ?op, applied = grant.is_some(), "grant updated");
        Ok(grant)
    }

    /// Remove a whole grant
    pub async fn revoke_grant(&self, user_id: Uuid, division_id: Uuid) -> FormResult<AccessGrant> {
        let removed = self
            .repos
            .grants
            .delete(user_id, division_id)
            .await?
            .ok_or(FormError::NotFound("Grant"))?;
        info!(user = %user_id, division = %division_id, "grant revoked");
        Ok(removed)
    }

    /// A user's grants with divisions and screens resolved
    pub async fn grants_for(&self, user_id: Uuid) -> FormResult<Vec<GrantView>> {
        let grants = self.repos.grants.list_for_user(user_id).await?;
        let mut views = Vec::with_capacity(grants.len());

        for grant in grants {
            let division = self
                .repos
                .divisions
                .get(grant.division_id)
                .await?
                .map(|d| DivisionRef {
                    id: d.id,
                    name: d.name,
                    code: d.code,
                });

            let mut screens = Vec::with_capacity(grant.screens.len());
            for screen_id in &grant.screens {
                if let Some(s) = self.repos.screens.get(*screen_id).await? {
                    screens.push(ScreenRef {
                        id: s.id,
                        key: s.key,
                        title: s.title,
                    });
                }
            }

            views.push(GrantView {
                id: grant.id,
                user_id: grant.user_id,
                division,
                screens,
            });
        }

        Ok(views)
    }
}

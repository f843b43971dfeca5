//! Form definition versioning
//!
//! ## Invariants
//! - Per (division, screen), versions are 1, 2, 3, ... with no duplicates
//! - At most one definition per pair is active
//!
//! Supersession is an optimistic loop: read the active row, build the next
//! version, then compare-and-swap on the active row's id. A lost race
//! re-reads and tries again until the attempt budget runs out.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::errors::{FormError, FormResult};
use crate::observability::MetricsRegistry;
use crate::schema::SchemaLimits;
use crate::store::{FormDefinition, FormDefinitionRepository};

/// Default compare-and-swap attempts per publish
pub const DEFAULT_PUBLISH_ATTEMPTS: u32 = 16;

/// Owns activation and lookup of form definitions
pub struct FormVersionManager {
    definitions: Arc<dyn FormDefinitionRepository>,
    limits: SchemaLimits,
    max_attempts: u32,
    metrics: Arc<MetricsRegistry>,
}

impl FormVersionManager {
    pub fn new(
        definitions: Arc<dyn FormDefinitionRepository>,
        limits: SchemaLimits,
        max_attempts: u32,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            definitions,
            limits,
            max_attempts: max_attempts.max(1),
            metrics,
        }
    }

    /// Publish a schema as the new active version for the pair
    pub async fn publish(
        &self,
        division_id: Uuid,
        screen_id: Uuid,
        schema: Value,
        ui_schema: Value,
    ) -> FormResult<FormDefinition> {
        self.limits.admit(&schema)?;

        for attempt in 1..=self.max_attempts {
            let current = self.definitions.find_active(division_id, screen_id).await?;
            let (expected, version) = match &current {
                Some(active) => (Some(active.id), active.version + 1),
                None => (None, 1),
            };

            let definition = FormDefinition::new_active(
                division_id,
                screen_id,
                version,
                schema.clone(),
                ui_schema.clone(),
            );

            if self.definitions.swap_active(expected, &definition).await? {
                self.metrics.increment_publishes();
                info!(
                    division = %division_id,
                    screen = %screen_id,
                    version,
                    "form definition published"
                );
                return Ok(definition);
            }

            debug!(division = %division_id, screen = %screen_id, attempt, "publish lost race");
            tokio::task::yield_now().await;
        }

        self.metrics.increment_publish_conflicts();
        warn!(
            division = %division_id,
            screen = %screen_id,
            attempts = self.max_attempts,
            "publish retry budget exhausted"
        );
        Err(FormError::ConcurrentPublishConflict {
            attempts: self.max_attempts,
        })
    }

    /// Active definition for the pair, if any. No side effects.
    pub async fn get_active(
        &self,
        division_id: Uuid,
        screen_id: Uuid,
    ) -> FormResult<Option<FormDefinition>> {
        Ok(self.definitions.find_active(division_id, screen_id).await?)
    }

    /// Every published version for the pair, newest first
    pub async fn history(
        &self,
        division_id: Uuid,
        screen_id: Uuid,
    ) -> FormResult<Vec<FormDefinition>> {
        Ok(self.definitions.list_versions(division_id, screen_id).await?)
    }
}

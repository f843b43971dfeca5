//! Form service
//!
//! Request-level entry points for the schema and submission paths. Every
//! operation on a (division, screen) pair runs the access gate first; no
//! form logic executes for an unauthorized caller.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use super::errors::FormResult;
use super::submission::SubmissionValidator;
use super::versions::FormVersionManager;
use crate::auth::{AccessGate, AuthUser};
use crate::observability::MetricsRegistry;
use crate::store::{FormDefinition, Page, Submission, SubmissionQuery, SubmissionRepository};

/// Stored submission plus the submitter's display name
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    #[serde(flatten)]
    pub submission: Submission,
    pub submitted_by_name: String,
}

/// Gated access to active schemas and submissions
pub struct FormService {
    gate: Arc<dyn AccessGate>,
    versions: Arc<FormVersionManager>,
    validator: SubmissionValidator,
    submissions: Arc<dyn SubmissionRepository>,
    metrics: Arc<MetricsRegistry>,
}

impl FormService {
    pub fn new(
        gate: Arc<dyn AccessGate>,
        versions: Arc<FormVersionManager>,
        validator: SubmissionValidator,
        submissions: Arc<dyn SubmissionRepository>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            gate,
            versions,
            validator,
            submissions,
            metrics,
        }
    }

    async fn authorize(&self, user: &AuthUser, division_id: Uuid, screen_id: Uuid) -> FormResult<()> {
        self.gate
            .authorize(user, division_id, screen_id)
            .await
            .inspect_err(|_| self.metrics.increment_access_denials())?;
        Ok(())
    }

    /// Active definition for the pair, or `None`
    pub async fn schema(
        &self,
        user: &AuthUser,
        division_id: Uuid,
        screen_id: Uuid,
    ) -> FormResult<Option<FormDefinition>> {
        self.authorize(user, division_id, screen_id).await?;
        self.versions.get_active(division_id, screen_id).await
    }

    /// Validate and persist a payload, stamped with the version it passed
    pub async fn submit(
        &self,
        user: &AuthUser,
        division_id: Uuid,
        screen_id: Uuid,
        payload: Value,
    ) -> FormResult<SubmissionReceipt> {
        self.authorize(user, division_id, screen_id).await?;

        let validated = self
            .validator
            .validate(division_id, screen_id, &payload)
            .await?;

        let submission = Submission::new(division_id, screen_id, validated.version, user.id, payload);
        self.submissions.insert(&submission).await?;
        self.metrics.increment_submissions_accepted();

        info!(
            division = %division_id,
            screen = %screen_id,
            version = validated.version,
            submission = %submission.id,
            "submission accepted"
        );

        Ok(SubmissionReceipt {
            submission,
            submitted_by_name: user.full_name.clone(),
        })
    }

    /// Paginated submissions for the pair
    pub async fn submissions(
        &self,
        user: &AuthUser,
        division_id: Uuid,
        screen_id: Uuid,
        query: &SubmissionQuery,
    ) -> FormResult<Page<Submission>> {
        self.authorize(user, division_id, screen_id).await?;
        Ok(self.submissions.list(division_id, screen_id, query).await?)
    }
}

//! Submission validation
//!
//! Resolves the active definition, fetches (or compiles) its validator
//! through the cache and runs it in all-errors mode. The payload is only
//! read; defaults and unknown fields are left exactly as submitted.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::errors::{FormError, FormResult};
use super::versions::FormVersionManager;
use crate::observability::MetricsRegistry;
use crate::schema::{CacheKey, CompiledValidator, Dialect, ValidatorCache};
use crate::store::FormDefinition;

/// Successful validation outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Validated {
    /// Version the payload was checked against
    pub version: u32,
    pub dialect: Dialect,
}

/// Validates payloads against the active form definition
pub struct SubmissionValidator {
    versions: Arc<FormVersionManager>,
    cache: Arc<dyn ValidatorCache>,
    metrics: Arc<MetricsRegistry>,
}

impl SubmissionValidator {
    pub fn new(
        versions: Arc<FormVersionManager>,
        cache: Arc<dyn ValidatorCache>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            versions,
            cache,
            metrics,
        }
    }

    /// Validate a payload for the pair's active definition
    pub async fn validate(
        &self,
        division_id: Uuid,
        screen_id: Uuid,
        payload: &Value,
    ) -> FormResult<Validated> {
        let definition = self
            .versions
            .get_active(division_id, screen_id)
            .await?
            .ok_or(FormError::FormUnavailable)?;

        self.check(&definition, payload)
    }

    /// Validate a payload against a specific definition
    pub fn check(&self, definition: &FormDefinition, payload: &Value) -> FormResult<Validated> {
        let key = CacheKey::new(definition.division_id, definition.screen_id, definition.version);

        let compile = || {
            self.metrics.increment_schema_compiles();
            CompiledValidator::compile(&definition.schema)
        };

        let lookup = self.cache.get_or_compile(&key, &compile).map_err(|err| {
            self.metrics.increment_schema_compile_failures();
            warn!(key = %key, error = %err, "stored schema failed to compile");
            FormError::from(err)
        })?;
        self.metrics.record_cache_lookup(lookup.hit);

        let validator = lookup.validator;
        let violations = validator.validate(payload);
        if !violations.is_empty() {
            self.metrics.increment_submissions_rejected();
            info!(key = %key, violations = violations.len(), "submission failed validation");
            return Err(FormError::ValidationFailed {
                version: definition.version,
                violations,
            });
        }

        debug!(key = %key, cache_hit = lookup.hit, "submission validated");
        Ok(Validated {
            version: definition.version,
            dialect: validator.dialect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{InMemoryValidatorCache, NoopValidatorCache, SchemaLimits};
    use crate::store::InMemoryFormDefinitionRepository;
    use serde_json::json;

    struct Fixture {
        versions: Arc<FormVersionManager>,
        validator: SubmissionValidator,
        metrics: Arc<MetricsRegistry>,
    }

    fn fixture(cache: Arc<dyn ValidatorCache>) -> Fixture {
        let metrics = Arc::new(MetricsRegistry::new());
        let versions = Arc::new(FormVersionManager::new(
            Arc::new(InMemoryFormDefinitionRepository::new()),
            SchemaLimits::default(),
            4,
            Arc::clone(&metrics),
        ));
        let validator = SubmissionValidator::new(Arc::clone(&versions), cache, Arc::clone(&metrics));
        Fixture {
            versions,
            validator,
            metrics,
        }
    }

    fn amount_schema() -> Value {
        json!({
            "type": "object",
            "required": ["amount"],
            "properties": {"amount": {"type": "number"}}
        })
    }

    #[tokio::test]
    async fn test_no_active_definition() {
        let fx = fixture(Arc::new(InMemoryValidatorCache::new()));

        let err = fx
            .validator
            .validate(Uuid::new_v4(), Uuid::new_v4(), &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, FormError::FormUnavailable));
    }

    #[tokio::test]
    async fn test_valid_payload_reports_version() {
        let fx = fixture(Arc::new(InMemoryValidatorCache::new()));
        let (d, s) = (Uuid::new_v4(), Uuid::new_v4());
        fx.versions.publish(d, s, amount_schema(), json!({})).await.unwrap();

        let ok = fx.validator.validate(d, s, &json!({"amount": 3})).await.unwrap();

        assert_eq!(ok.version, 1);
        assert_eq!(ok.dialect, Dialect::Legacy);
    }

    #[tokio::test]
    async fn test_second_submission_hits_cache() {
        let fx = fixture(Arc::new(InMemoryValidatorCache::new()));
        let (d, s) = (Uuid::new_v4(), Uuid::new_v4());
        fx.versions.publish(d, s, amount_schema(), json!({})).await.unwrap();

        fx.validator.validate(d, s, &json!({"amount": 1})).await.unwrap();
        fx.validator.validate(d, s, &json!({"amount": 2})).await.unwrap();

        let snapshot = fx.metrics.snapshot();
        assert_eq!(snapshot.schema_compiles, 1);
        assert_eq!(snapshot.validator_cache_misses, 1);
        assert_eq!(snapshot.validator_cache_hits, 1);
    }

    #[tokio::test]
    async fn test_noop_cache_recompiles() {
        let fx = fixture(Arc::new(NoopValidatorCache));
        let (d, s) = (Uuid::new_v4(), Uuid::new_v4());
        fx.versions.publish(d, s, amount_schema(), json!({})).await.unwrap();

        fx.validator.validate(d, s, &json!({"amount": 1})).await.unwrap();
        fx.validator.validate(d, s, &json!({"amount": 2})).await.unwrap();

        assert_eq!(fx.metrics.snapshot().schema_compiles, 2);
    }

    #[tokio::test]
    async fn test_compile_error_is_not_validation_error() {
        let fx = fixture(Arc::new(InMemoryValidatorCache::new()));
        let (d, s) = (Uuid::new_v4(), Uuid::new_v4());
        fx.versions
            .publish(d, s, json!({"type": 12}), json!({}))
            .await
            .unwrap();

        for _ in 0..2 {
            let err = fx.validator.validate(d, s, &json!({})).await.unwrap_err();
            assert!(matches!(err, FormError::SchemaCompile { .. }));
        }

        let snapshot = fx.metrics.snapshot();
        assert_eq!(snapshot.schema_compile_failures, 2);
        assert_eq!(snapshot.schema_compiles, 2);
    }

    #[tokio::test]
    async fn test_new_version_gets_new_validator() {
        let fx = fixture(Arc::new(InMemoryValidatorCache::new()));
        let (d, s) = (Uuid::new_v4(), Uuid::new_v4());
        fx.versions.publish(d, s, amount_schema(), json!({})).await.unwrap();
        fx.validator.validate(d, s, &json!({"amount": 1})).await.unwrap();

        fx.versions
            .publish(
                d,
                s,
                json!({"type": "object", "required": ["amount", "note"]}),
                json!({}),
            )
            .await
            .unwrap();

        let err = fx.validator.validate(d, s, &json!({"amount": 1})).await.unwrap_err();
        match err {
            FormError::ValidationFailed { version, violations } => {
                assert_eq!(version, 2);
                assert_eq!(violations.len(), 1);
                assert_eq!(violations[0].keyword, "required");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

//! Metrics registry for divforms
//!
//! - Counters only (no gauges, no histograms)
//! - Monotonic increase
//! - Reset only on process start
//! - Thread-safe but lock-minimal

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Metrics registry containing all operational counters
///
/// # Thread Safety
///
/// All counters use atomic operations with Relaxed ordering; metrics are
/// eventually consistent.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Submissions persisted
    submissions_accepted: AtomicU64,
    /// Submissions refused by the validator
    submissions_rejected: AtomicU64,
    validator_cache_hits: AtomicU64,
    validator_cache_misses: AtomicU64,
    /// Compiler invocations, successful or not
    schema_compiles: AtomicU64,
    schema_compile_failures: AtomicU64,
    /// Definitions activated
    publishes: AtomicU64,
    /// Publishes that exhausted their retry budget
    publish_conflicts: AtomicU64,
    /// AccessGate refusals
    access_denials: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    // Submission metrics

    pub fn increment_submissions_accepted(&self) {
        self.submissions_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_submissions_rejected(&self) {
        self.submissions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    // Validator cache metrics

    /// Record a cache lookup outcome
    pub fn record_cache_lookup(&self, hit: bool) {
        if hit {
            self.validator_cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.validator_cache_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn increment_schema_compiles(&self) {
        self.schema_compiles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_schema_compile_failures(&self) {
        self.schema_compile_failures.fetch_add(1, Ordering::Relaxed);
    }

    // Publish metrics

    pub fn increment_publishes(&self) {
        self.publishes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_publish_conflicts(&self) {
        self.publish_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    // Access metrics

    pub fn increment_access_denials(&self) {
        self.access_denials.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            submissions_accepted: self.submissions_accepted.load(Ordering::Relaxed),
            submissions_rejected: self.submissions_rejected.load(Ordering::Relaxed),
            validator_cache_hits: self.validator_cache_hits.load(Ordering::Relaxed),
            validator_cache_misses: self.validator_cache_misses.load(Ordering::Relaxed),
            schema_compiles: self.schema_compiles.load(Ordering::Relaxed),
            schema_compile_failures: self.schema_compile_failures.load(Ordering::Relaxed),
            publishes: self.publishes.load(Ordering::Relaxed),
            publish_conflicts: self.publish_conflicts.load(Ordering::Relaxed),
            access_denials: self.access_denials.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub submissions_accepted: u64,
    pub submissions_rejected: u64,
    pub validator_cache_hits: u64,
    pub validator_cache_misses: u64,
    pub schema_compiles: u64,
    pub schema_compile_failures: u64,
    pub publishes: u64,
    pub publish_conflicts: u64,
    pub access_denials: u64,
}

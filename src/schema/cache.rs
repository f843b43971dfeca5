//! Compiled validator cache
//!
//! Maps a `division:screen:vN` key to a compiled validator. A published
//! version's schema never changes, so entries are never invalidated; a new
//! version simply produces a new key. The in-memory cache is unbounded.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::debug;
use uuid::Uuid;

use super::compiler::CompiledValidator;
use super::errors::SchemaResult;

/// Identity of one compiled validator
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub division_id: Uuid,
    pub screen_id: Uuid,
    pub version: u32,
}

impl CacheKey {
    pub fn new(division_id: Uuid, screen_id: Uuid, version: u32) -> Self {
        Self {
            division_id,
            screen_id,
            version,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:v{}", self.division_id, self.screen_id, self.version)
    }
}

/// Outcome of a cache lookup
#[derive(Debug, Clone)]
pub struct Lookup {
    pub validator: Arc<CompiledValidator>,
    /// False when this call ran the compiler
    pub hit: bool,
}

/// Cache of compiled validators.
///
/// `compile` is only invoked on a miss. Failures are returned to the
/// caller and never stored, so the next lookup compiles again.
pub trait ValidatorCache: Send + Sync {
    fn get_or_compile(
        &self,
        key: &CacheKey,
        compile: &dyn Fn() -> SchemaResult<CompiledValidator>,
    ) -> SchemaResult<Lookup>;

    /// Number of cached validators
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-wide in-memory cache with single-flight compilation per key
#[derive(Default)]
pub struct InMemoryValidatorCache {
    entries: RwLock<HashMap<CacheKey, Arc<CompiledValidator>>>,
    compiling: Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>,
}

impl InMemoryValidatorCache {
    pub fn new() -> Self {
        Self::default()
    }

    // Cached validators are immutable, so a poisoned lock holds no torn state.
    fn cached(&self, key: &CacheKey) -> Option<Arc<CompiledValidator>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn compile_lock(&self, key: &CacheKey) -> Arc<Mutex<()>> {
        self.compiling
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key.clone())
            .or_default()
            .clone()
    }

    fn release_compile_lock(&self, key: &CacheKey) {
        self.compiling
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// Frees the compile slot for a key, including when the compiler panics
struct SlotRelease<'a> {
    cache: &'a InMemoryValidatorCache,
    key: &'a CacheKey,
}

impl Drop for SlotRelease<'_> {
    fn drop(&mut self) {
        self.cache.release_compile_lock(self.key);
    }
}

impl ValidatorCache for InMemoryValidatorCache {
    fn get_or_compile(
        &self,
        key: &CacheKey,
        compile: &dyn Fn() -> SchemaResult<CompiledValidator>,
    ) -> SchemaResult<Lookup> {
        if let Some(validator) = self.cached(key) {
            return Ok(Lookup {
                validator,
                hit: true,
            });
        }

        let lock = self.compile_lock(key);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Another task may have finished compiling while we waited
        if let Some(validator) = self.cached(key) {
            return Ok(Lookup {
                validator,
                hit: true,
            });
        }

        debug!(key = %key, "validator cache miss");
        let _slot = SlotRelease { cache: self, key };

        // The entry is published before `_slot` frees the key, so late
        // arrivals hit it instead of compiling again
        let compiled = compile().map(Arc::new);
        if let Ok(validator) = &compiled {
            self.entries
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(key.clone(), Arc::clone(validator));
        }

        Ok(Lookup {
            validator: compiled?,
            hit: false,
        })
    }

    fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Cache that never stores anything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopValidatorCache;

impl ValidatorCache for NoopValidatorCache {
    fn get_or_compile(
        &self,
        _key: &CacheKey,
        compile: &dyn Fn() -> SchemaResult<CompiledValidator>,
    ) -> SchemaResult<Lookup> {
        Ok(Lookup {
            validator: Arc::new(compile()?),
            hit: false,
        })
    }

    fn len(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::errors::SchemaError;
    use crate::schema::Dialect;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn key(version: u32) -> CacheKey {
        CacheKey::new(Uuid::nil(), Uuid::nil(), version)
    }

    fn compile_counting(calls: &AtomicUsize) -> SchemaResult<CompiledValidator> {
        calls.fetch_add(1, Ordering::SeqCst);
        CompiledValidator::compile(&json!({"type": "object", "required": ["a"]}))
    }

    #[test]
    fn test_key_format() {
        let d = Uuid::new_v4();
        let s = Uuid::new_v4();
        assert_eq!(CacheKey::new(d, s, 3).to_string(), format!("{}:{}:v3", d, s));
    }

    #[test]
    fn test_hit_does_not_recompile() {
        let cache = InMemoryValidatorCache::new();
        let calls = AtomicUsize::new(0);

        let first = cache.get_or_compile(&key(1), &|| compile_counting(&calls)).unwrap();
        let second = cache.get_or_compile(&key(1), &|| compile_counting(&calls)).unwrap();

        assert!(!first.hit);
        assert!(second.hit);
        assert!(Arc::ptr_eq(&first.validator, &second.validator));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_versions_are_distinct_entries() {
        let cache = InMemoryValidatorCache::new();
        let calls = AtomicUsize::new(0);

        cache.get_or_compile(&key(1), &|| compile_counting(&calls)).unwrap();
        cache.get_or_compile(&key(2), &|| compile_counting(&calls)).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_panicking_compile_frees_slot() {
        let cache = InMemoryValidatorCache::new();
        let exploding = || -> SchemaResult<CompiledValidator> { panic!("compiler bug") };

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            cache.get_or_compile(&key(1), &exploding)
        }));
        assert!(outcome.is_err());
        assert!(cache.compiling.lock().unwrap().is_empty());

        let calls = AtomicUsize::new(0);
        let lookup = cache.get_or_compile(&key(1), &|| compile_counting(&calls)).unwrap();
        assert!(!lookup.hit);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let cache = InMemoryValidatorCache::new();
        let calls = AtomicUsize::new(0);
        let failing = || -> SchemaResult<CompiledValidator> {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(SchemaError::Compile {
                dialect: Dialect::Legacy,
                message: "broken".into(),
            })
        };

        assert!(cache.get_or_compile(&key(1), &failing).is_err());
        assert!(cache.get_or_compile(&key(1), &failing).is_err());

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_misses_compile_once() {
        let cache = Arc::new(InMemoryValidatorCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                thread::spawn(move || {
                    cache
                        .get_or_compile(&key(7), &|| compile_counting(&calls))
                        .unwrap()
                        .validator
                })
            })
            .collect();

        let validators: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(validators.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn test_noop_always_compiles() {
        let cache = NoopValidatorCache;
        let calls = AtomicUsize::new(0);

        let first = cache.get_or_compile(&key(1), &|| compile_counting(&calls)).unwrap();
        let second = cache.get_or_compile(&key(1), &|| compile_counting(&calls)).unwrap();

        assert!(!first.hit && !second.hit);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }
}

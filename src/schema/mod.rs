//! Schema subsystem for divforms
//!
//! Stored form schemas are opaque documents. Before a payload can be checked
//! the schema goes through a fixed pipeline:
//!
//! 1. Dialect selection (`$schema` sniffing, closed set of dialects)
//! 2. Sanitization (unknown dialect identifiers are stripped)
//! 3. Compilation by the dialect's draft engine
//! 4. Caching under `division:screen:vN`
//!
//! Publish-time admission limits live here too.

mod cache;
mod compiler;
mod dialect;
mod errors;
mod limits;
mod sanitizer;

pub use cache::{CacheKey, InMemoryValidatorCache, Lookup, NoopValidatorCache, ValidatorCache};
pub use compiler::{CompiledValidator, Violation};
pub use dialect::{select_dialect, Dialect, DIALECT_KEYWORD};
pub use errors::{SchemaError, SchemaResult};
pub use limits::{SchemaLimits, DEFAULT_MAX_SCHEMA_BYTES, DEFAULT_MAX_SCHEMA_DEPTH};
pub use sanitizer::sanitize;

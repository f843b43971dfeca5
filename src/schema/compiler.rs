//! Schema compilation and payload validation
//!
//! A stored schema is sanitized, classified into a dialect and compiled by
//! that dialect's draft engine. The resulting [`CompiledValidator`] is
//! immutable and safe to share across tasks; it only checks payloads and
//! never rewrites them.
//!
//! The engine is built without its HTTP and file retrievers, so `$ref` only
//! resolves inside the document (and the bundled draft meta-schemas). Any
//! other reference fails compilation instead of reaching the network.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::dialect::{select_dialect, Dialect};
use super::errors::{SchemaError, SchemaResult};
use super::sanitizer::sanitize;

/// A single mismatch between a payload and a schema constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// JSON pointer into the payload ("" for the document root)
    pub path: String,
    /// Constraint keyword that failed (`required`, `type`, `enum`, ...)
    pub keyword: String,
    pub message: String,
    /// JSON pointer into the schema
    pub schema_path: String,
    pub dialect: Dialect,
}

/// Compiled, reusable validator for one form definition version
pub struct CompiledValidator {
    dialect: Dialect,
    validator: jsonschema::Validator,
}

impl fmt::Debug for CompiledValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledValidator")
            .field("dialect", &self.dialect)
            .finish_non_exhaustive()
    }
}

impl CompiledValidator {
    /// Sanitize, classify and compile a stored schema document
    pub fn compile(schema: &Value) -> SchemaResult<Self> {
        let dialect = select_dialect(schema);
        let sanitized = sanitize(schema);

        let validator = jsonschema::options()
            .with_draft(dialect.draft())
            .should_validate_formats(true)
            .build(&sanitized)
            .map_err(|err| SchemaError::Compile {
                dialect,
                message: err.to_string(),
            })?;

        debug!(%dialect, "compiled schema");
        Ok(Self { dialect, validator })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Check a payload, collecting every violation rather than the first
    pub fn validate(&self, payload: &Value) -> Vec<Violation> {
        self.validator
            .iter_errors(payload)
            .map(|err| {
                let schema_path = err.schema_path.to_string();
                Violation {
                    path: err.instance_path.to_string(),
                    keyword: keyword_of(&schema_path),
                    message: err.to_string(),
                    schema_path,
                    dialect: self.dialect,
                }
            })
            .collect()
    }

    pub fn is_valid(&self, payload: &Value) -> bool {
        self.validator.is_valid(payload)
    }
}

/// Last non-index segment of a schema pointer
fn keyword_of(schema_path: &str) -> String {
    schema_path
        .rsplit('/')
        .find(|segment| !segment.is_empty() && segment.parse::<usize>().is_err())
        .unwrap_or("schema")
        .to_string()
}

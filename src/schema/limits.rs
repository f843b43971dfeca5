//! Publish-time schema admission
//!
//! Pathologically large or deeply nested documents are refused before they
//! are versioned, which bounds the cost of later compiles.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{SchemaError, SchemaResult};

/// Default maximum serialized schema size (256 KiB)
pub const DEFAULT_MAX_SCHEMA_BYTES: usize = 256 * 1024;

/// Default maximum nesting depth
pub const DEFAULT_MAX_SCHEMA_DEPTH: usize = 64;

/// Size and depth bounds for stored schema documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaLimits {
    #[serde(default = "default_max_bytes")]
    pub max_schema_bytes: usize,

    #[serde(default = "default_max_depth")]
    pub max_schema_depth: usize,
}

fn default_max_bytes() -> usize {
    DEFAULT_MAX_SCHEMA_BYTES
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_SCHEMA_DEPTH
}

impl Default for SchemaLimits {
    fn default() -> Self {
        Self {
            max_schema_bytes: DEFAULT_MAX_SCHEMA_BYTES,
            max_schema_depth: DEFAULT_MAX_SCHEMA_DEPTH,
        }
    }
}

impl SchemaLimits {
    /// Admit or reject a schema document
    pub fn admit(&self, schema: &Value) -> SchemaResult<()> {
        if !schema.is_object() {
            return Err(SchemaError::Rejected(
                "schema must be a JSON object".to_string(),
            ));
        }

        let size = serde_json::to_vec(schema)
            .map_err(|e| SchemaError::Rejected(e.to_string()))?
            .len();
        if size > self.max_schema_bytes {
            return Err(SchemaError::Rejected(format!(
                "schema is {} bytes, limit is {}",
                size, self.max_schema_bytes
            )));
        }

        let depth = nesting_depth(schema);
        if depth > self.max_schema_depth {
            return Err(SchemaError::Rejected(format!(
                "schema nesting depth {} exceeds limit {}",
                depth, self.max_schema_depth
            )));
        }

        Ok(())
    }
}

/// Depth of the deepest container; scalars count as zero
fn nesting_depth(value: &Value) -> usize {
    let mut deepest = 0;
    let mut stack = vec![(value, 0usize)];

    while let Some((node, depth)) = stack.pop() {
        match node {
            Value::Object(map) => {
                deepest = deepest.max(depth + 1);
                stack.extend(map.values().map(|child| (child, depth + 1)));
            }
            Value::Array(items) => {
                deepest = deepest.max(depth + 1);
                stack.extend(items.iter().map(|child| (child, depth + 1)));
            }
            _ => {}
        }
    }

    deepest
}

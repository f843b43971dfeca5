//! Dialect selection
//!
//! A stored schema declares its grammar through the `$schema` keyword. The
//! declaration is classified once into a closed set of dialects, each
//! compiled by its own draft engine:
//!
//! - `Modern`: identifiers mentioning `2020-12`
//! - `Legacy`: everything else, including no declaration, `draft-07`,
//!   `2019-09` and unknown identifiers

use std::fmt;

use jsonschema::Draft;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keyword carrying the dialect identifier
pub const DIALECT_KEYWORD: &str = "$schema";

/// Identifier fragments the engines understand
const SUPPORTED_FAMILIES: [&str; 3] = ["draft-07", "2019-09", "2020-12"];

const MODERN_MARKER: &str = "2020-12";

/// Schema dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Draft-07 engine; also accepts most 2019-09 schemas
    Legacy,
    /// Draft 2020-12 engine
    Modern,
}

impl Dialect {
    /// Draft the engine for this dialect compiles with
    pub fn draft(&self) -> Draft {
        match self {
            Dialect::Legacy => Draft::Draft7,
            Dialect::Modern => Draft::Draft202012,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Legacy => "legacy",
            Dialect::Modern => "modern",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the declared dialect identifier, if it is a non-empty string
pub fn declared_identifier(schema: &Value) -> Option<&str> {
    schema
        .get(DIALECT_KEYWORD)
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
}

/// Whether an identifier belongs to a family the engines understand
pub fn is_supported_identifier(identifier: &str) -> bool {
    SUPPORTED_FAMILIES
        .iter()
        .any(|family| identifier.contains(family))
}

/// Classify a schema document into its dialect
pub fn select_dialect(schema: &Value) -> Dialect {
    match declared_identifier(schema) {
        Some(id) if id.contains(MODERN_MARKER) => Dialect::Modern,
        _ => Dialect::Legacy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_modern_identifier() {
        let schema = json!({"$schema": "https://json-schema.org/draft/2020-12/schema"});
        assert_eq!(select_dialect(&schema), Dialect::Modern);
    }

    #[test]
    fn test_everything_else_is_legacy() {
        for schema in [
            json!({}),
            json!({"$schema": ""}),
            json!({"$schema": "http://json-schema.org/draft-07/schema#"}),
            json!({"$schema": "https://json-schema.org/draft/2019-09/schema"}),
            json!({"$schema": "http://json-schema.org/draft-04/schema#"}),
            json!({"$schema": 7}),
            json!(true),
        ] {
            assert_eq!(select_dialect(&schema), Dialect::Legacy, "{}", schema);
        }
    }

    #[test]
    fn test_selection_is_pure() {
        let schema = json!({"$schema": "https://json-schema.org/draft/2020-12/schema", "type": "object"});
        let before = schema.clone();
        for _ in 0..10 {
            assert_eq!(select_dialect(&schema), Dialect::Modern);
        }
        assert_eq!(schema, before);
    }

    #[test]
    fn test_supported_families() {
        assert!(is_supported_identifier("http://json-schema.org/draft-07/schema#"));
        assert!(is_supported_identifier("https://json-schema.org/draft/2019-09/schema"));
        assert!(!is_supported_identifier("http://json-schema.org/draft-04/schema#"));
        assert!(!is_supported_identifier("urn:example:custom"));
    }

    #[test]
    fn test_dialect_drafts() {
        assert_eq!(Dialect::Legacy.draft(), Draft::Draft7);
        assert_eq!(Dialect::Modern.draft(), Draft::Draft202012);
    }
}

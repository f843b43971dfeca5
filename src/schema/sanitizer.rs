//! Schema sanitizer
//!
//! Strips a `$schema` declaration the engines do not understand so that
//! compilation never tries to resolve an unknown meta-schema. Only that one
//! keyword is ever removed, and the input is never mutated.

use std::borrow::Cow;

use serde_json::Value;

use super::dialect::{declared_identifier, is_supported_identifier, DIALECT_KEYWORD};

/// Normalize a stored schema for compilation.
///
/// Returns the input untouched when it declares no identifier or a
/// supported one; otherwise returns a shallow copy without `$schema`.
pub fn sanitize(schema: &Value) -> Cow<'_, Value> {
    match declared_identifier(schema) {
        None => Cow::Borrowed(schema),
        Some(id) if is_supported_identifier(id) => Cow::Borrowed(schema),
        Some(_) => {
            let mut stripped = schema.as_object().cloned().unwrap_or_default();
            stripped.remove(DIALECT_KEYWORD);
            Cow::Owned(Value::Object(stripped))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_no_identifier_is_borrowed() {
        let schema = json!({"type": "object"});
        assert!(matches!(sanitize(&schema), Cow::Borrowed(_)));
    }

    #[test]
    fn test_supported_identifier_is_kept() {
        let schema = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object"
        });
        let sanitized = sanitize(&schema);
        assert!(matches!(sanitized, Cow::Borrowed(_)));
        assert_eq!(sanitized.as_ref(), &schema);
    }

    #[test]
    fn test_unknown_identifier_is_stripped() {
        let schema = json!({
            "$schema": "http://json-schema.org/draft-04/schema#",
            "type": "object",
            "properties": {"$schema": {"type": "string"}},
            "required": ["a"]
        });
        let sanitized = sanitize(&schema);

        assert_eq!(
            sanitized.as_ref(),
            &json!({
                "type": "object",
                "properties": {"$schema": {"type": "string"}},
                "required": ["a"]
            })
        );
        // Input untouched
        assert!(schema.get("$schema").is_some());
    }

    #[test]
    fn test_idempotent() {
        for schema in [
            json!({}),
            json!({"$schema": "urn:custom", "type": "string"}),
            json!({"$schema": "https://json-schema.org/draft/2020-12/schema"}),
            json!({"$schema": ""}),
            json!(false),
        ] {
            let once = sanitize(&schema).into_owned();
            let twice = sanitize(&once).into_owned();
            assert_eq!(once, twice);
        }
    }
}

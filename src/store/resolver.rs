//! Dot-path resolution of `db.` references
//!
//! `db.tokens.0.access_token` strips the prefix, looks `tokens` up as a
//! top-level key, then walks `0` (array index) and `access_token` (object
//! property). Any segment that does not exist fails with the segment named;
//! the store is never consulted for anything but reads.

use serde_json::Value;

use super::ConfigStore;
use crate::common::{Error, Result};

/// Prefix that marks a dynamic reference
pub const REFERENCE_PREFIX: &str = "db.";

/// Whether `value` is a complete dynamic reference (`db.<segment>(.<segment>)*`)
pub fn is_reference(value: &str) -> bool {
    match value.strip_prefix(REFERENCE_PREFIX) {
        Some(path) => {
            !path.is_empty()
                && path
                    .split('.')
                    .all(|segment| !segment.is_empty() && !segment.contains(char::is_whitespace))
        }
        None => false,
    }
}

/// Resolve a reference against the store
///
/// The `db.` prefix is optional so that callers holding a bare path
/// (`user.id`) resolve the same way as those holding the full reference.
pub fn resolve(reference: &str, store: &ConfigStore) -> Result<Value> {
    let path = reference.strip_prefix(REFERENCE_PREFIX).unwrap_or(reference);
    let mut segments = path.split('.');

    let first = segments.next().unwrap_or_default();
    if first.is_empty() {
        return Err(Error::resolution(reference, first));
    }
    let mut current = store
        .get(first)
        .ok_or_else(|| Error::resolution(reference, first))?;

    for segment in segments {
        current = lookup(current, segment).ok_or_else(|| Error::resolution(reference, segment))?;
    }

    Ok(current.clone())
}

fn lookup<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    if segment.is_empty() {
        return None;
    }
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Render a resolved value the way it appears inside a URL or header
pub fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store(value: Value) -> ConfigStore {
        ConfigStore::from_value(value).unwrap()
    }

    #[test]
    fn test_resolve_nested_property() {
        let store = store(json!({"user": {"id": "42"}}));
        assert_eq!(resolve("db.user.id", &store).unwrap(), json!("42"));
    }

    #[test]
    fn test_resolve_array_index() {
        let store = store(json!({
            "tokens": [{"access_token": "345645567756567567657567"}]
        }));
        assert_eq!(
            resolve("db.tokens.0.access_token", &store).unwrap(),
            json!("345645567756567567657567")
        );
    }

    #[test]
    fn test_resolve_without_prefix() {
        let store = store(json!({"user": {"id": 7}}));
        assert_eq!(resolve("user.id", &store).unwrap(), json!(7));
    }

    #[test]
    fn test_resolve_whole_top_level_value() {
        let store = store(json!({"user": {"id": "42"}}));
        assert_eq!(resolve("db.user", &store).unwrap(), json!({"id": "42"}));
    }

    #[test]
    fn test_missing_nested_path_is_error() {
        let store = store(json!({"user": {"id": "42"}}));
        match resolve("db.user.missing.x", &store).unwrap_err() {
            Error::Resolution { reference, segment } => {
                assert_eq!(reference, "db.user.missing.x");
                assert_eq!(segment, "missing");
            }
            e => panic!("Expected Resolution error, got {e:?}"),
        }
    }

    #[test]
    fn test_missing_top_level_key_is_error() {
        let store = store(json!({"user": {"id": "42"}}));
        match resolve("db.account.id", &store).unwrap_err() {
            Error::Resolution { segment, .. } => assert_eq!(segment, "account"),
            e => panic!("Expected Resolution error, got {e:?}"),
        }
    }

    #[test]
    fn test_index_out_of_range_and_non_numeric_index() {
        let store = store(json!({"tokens": ["a"]}));
        assert!(resolve("db.tokens.1", &store).is_err());
        assert!(resolve("db.tokens.first", &store).is_err());
    }

    #[test]
    fn test_descending_into_scalar_is_error() {
        let store = store(json!({"user": {"id": "42"}}));
        assert!(resolve("db.user.id.length", &store).is_err());
    }

    #[test]
    fn test_explicit_null_resolves() {
        let store = store(json!({"user": {"nickname": null}}));
        assert_eq!(resolve("db.user.nickname", &store).unwrap(), Value::Null);
    }

    #[test]
    fn test_empty_reference_is_error() {
        let store = store(json!({"user": 1}));
        assert!(resolve("db.", &store).is_err());
        assert!(resolve("db.user..id", &store).is_err());
    }

    #[test]
    fn test_is_reference() {
        assert!(is_reference("db.user.id"));
        assert!(is_reference("db.token"));
        assert!(!is_reference("db."));
        assert!(!is_reference("db.user..id"));
        assert!(!is_reference("database.user"));
        assert!(!is_reference("application/json"));
        assert!(!is_reference("db.some value"));
    }

    #[test]
    fn test_to_text() {
        assert_eq!(to_text(&json!("abc")), "abc");
        assert_eq!(to_text(&json!(42)), "42");
        assert_eq!(to_text(&json!(true)), "true");
    }
}

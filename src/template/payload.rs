//! Payload templating
//!
//! Request bodies are JSON documents in which any string value of the exact
//! form `"db.<path>"` is a dynamic reference. The document is parsed first
//! and the tree walked, so substitutions can never break the JSON or be
//! substituted a second time, and a resolved number stays a number.

use std::path::Path;

use serde_json::Value;

use crate::common::{Error, Result};
use crate::store::{is_reference, resolve, ConfigStore};

/// Read `<dir>/<name>.json` and template it
pub async fn load_payload(dir: &Path, name: &str, store: &ConfigStore) -> Result<Value> {
    let path = dir.join(format!("{name}.json"));
    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| Error::payload(name, format!("{}: {e}", path.display())))?;
    template_payload(name, &content, store)
}

/// Parse a payload document and substitute every dynamic reference in it
pub fn template_payload(name: &str, document: &str, store: &ConfigStore) -> Result<Value> {
    let mut payload: Value =
        serde_json::from_str(document).map_err(|e| Error::payload(name, e))?;

    substitute(&mut payload, store).map_err(|e| Error::PayloadTemplating {
        name: name.to_string(),
        reason: e.to_string(),
    })?;

    Ok(payload)
}

fn substitute(value: &mut Value, store: &ConfigStore) -> Result<()> {
    match value {
        Value::String(s) if is_reference(s) => {
            let resolved = resolve(s, store)?;
            *value = resolved;
        }
        Value::Array(items) => {
            for item in items {
                substitute(item, store)?;
            }
        }
        Value::Object(map) => {
            for item in map.values_mut() {
                substitute(item, store)?;
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_store() -> ConfigStore {
        ConfigStore::from_value(json!({
            "user": {"id": "345765675678678", "name": "John Doe"}
        }))
        .unwrap()
    }

    #[test]
    fn test_single_level_dynamic_values() {
        let document = json!({
            "user_id": "db.user.id",
            "timestamp": 1460043522252u64,
            "type": "test",
            "test": "db.user.name"
        })
        .to_string();
        let payload = template_payload("user", &document, &user_store()).unwrap();
        assert_eq!(
            payload,
            json!({
                "user_id": "345765675678678",
                "timestamp": 1460043522252u64,
                "type": "test",
                "test": "John Doe"
            })
        );
    }

    #[test]
    fn test_nested_dynamic_values() {
        let document = r#"{"test": {"name": "db.user.name"}}"#;
        let payload = template_payload("nested", document, &user_store()).unwrap();
        assert_eq!(payload, json!({"test": {"name": "John Doe"}}));
    }

    #[test]
    fn test_repeated_reference_is_replaced_everywhere() {
        let document = r#"{"a": "db.user.id", "b": ["db.user.id", {"c": "db.user.id"}]}"#;
        let payload = template_payload("repeat", document, &user_store()).unwrap();
        assert_eq!(
            payload,
            json!({
                "a": "345765675678678",
                "b": ["345765675678678", {"c": "345765675678678"}]
            })
        );
    }

    #[test]
    fn test_resolved_types_are_preserved() {
        let store = ConfigStore::from_value(json!({
            "limits": {"max": 10, "tags": ["a", "b"]}
        }))
        .unwrap();
        let document = r#"{"max": "db.limits.max", "tags": "db.limits.tags"}"#;
        let payload = template_payload("typed", document, &store).unwrap();
        assert_eq!(payload, json!({"max": 10, "tags": ["a", "b"]}));
    }

    #[test]
    fn test_keys_and_embedded_text_are_untouched() {
        let document = r#"{"db.user.id": "see db.user.id for details"}"#;
        let payload = template_payload("text", document, &user_store()).unwrap();
        assert_eq!(payload, json!({"db.user.id": "see db.user.id for details"}));
    }

    #[test]
    fn test_resolved_value_is_not_rescanned() {
        let store = ConfigStore::from_value(json!({"alias": "db.alias"})).unwrap();
        let payload = template_payload("alias", r#"{"x": "db.alias"}"#, &store).unwrap();
        assert_eq!(payload, json!({"x": "db.alias"}));
    }

    #[test]
    fn test_invalid_document_is_payload_error() {
        let err = template_payload("broken", "{\"user_id\": ", &user_store()).unwrap_err();
        match err {
            Error::Payload { name, .. } => assert_eq!(name, "broken"),
            e => panic!("Expected Payload error, got {e:?}"),
        }
    }

    #[test]
    fn test_unresolvable_reference_is_templating_error() {
        let err = template_payload("user", r#"{"id": "db.account.id"}"#, &user_store()).unwrap_err();
        match err {
            Error::PayloadTemplating { name, reason } => {
                assert_eq!(name, "user");
                assert!(reason.contains("db.account.id"));
            }
            e => panic!("Expected PayloadTemplating error, got {e:?}"),
        }
    }

    #[tokio::test]
    async fn test_load_payload_reads_named_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("create_user.json"), r#"{"user_id": "db.user.id"}"#)
            .unwrap();
        let payload = load_payload(dir.path(), "create_user", &user_store())
            .await
            .unwrap();
        assert_eq!(payload, json!({"user_id": "345765675678678"}));
    }

    #[tokio::test]
    async fn test_load_payload_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_payload(dir.path(), "absent", &user_store())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Payload { .. }));
    }
}

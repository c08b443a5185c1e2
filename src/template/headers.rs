//! Header templating
//!
//! The headers cell holds `key=value` pairs separated by commas, often spread
//! over several lines. Values that are dynamic references are resolved
//! against the store.

use std::collections::BTreeMap;

use crate::common::{Error, Result};
use crate::store::{is_reference, resolve, to_text, ConfigStore};

/// Build the header mapping for one request
pub fn template_headers(raw: &str, store: &ConfigStore) -> Result<BTreeMap<String, String>> {
    let mut headers = BTreeMap::new();

    for pair in raw.split(',') {
        if pair.trim().is_empty() {
            continue;
        }

        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| Error::MalformedHeader(pair.trim().to_string()))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::MalformedHeader(pair.trim().to_string()));
        }

        let value = value.trim();
        let value = if is_reference(value) {
            to_text(&resolve(value, store)?)
        } else {
            value.to_string()
        };

        headers.insert(key.to_string(), value);
    }

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sets_literal_headers() {
        let raw = "
            content-type=application/json,
            username=services
        ";
        let headers = template_headers(raw, &ConfigStore::new()).unwrap();
        assert_eq!(headers["content-type"], "application/json");
        assert_eq!(headers["username"], "services");
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn test_sets_access_token_header() {
        let raw = "
            content-type=application/json,
            username=services,
            x-access-token=5467567865586876587567
        ";
        let headers = template_headers(raw, &ConfigStore::new()).unwrap();
        assert_eq!(headers["x-access-token"], "5467567865586876587567");
    }

    #[test]
    fn test_resolves_dynamic_values() {
        let store = ConfigStore::from_value(json!({
            "tokens": [{"access_token": "345645567756567567657567"}],
            "session": {"ttl": 30}
        }))
        .unwrap();
        let raw = "x-access-token=db.tokens.0.access_token, x-ttl = db.session.ttl";
        let headers = template_headers(raw, &store).unwrap();
        assert_eq!(
            headers.keys().collect::<Vec<_>>(),
            vec!["x-access-token", "x-ttl"]
        );
        assert_eq!(headers["x-access-token"], "345645567756567567657567");
        assert_eq!(headers["x-ttl"], "30");
    }

    #[test]
    fn test_value_may_contain_equals() {
        let headers =
            template_headers("authorization=Basic dXNlcjpwYXNz==", &ConfigStore::new()).unwrap();
        assert_eq!(headers["authorization"], "Basic dXNlcjpwYXNz==");
    }

    #[test]
    fn test_blank_input_gives_empty_mapping() {
        assert!(template_headers("", &ConfigStore::new()).unwrap().is_empty());
        assert!(template_headers(" ,\n ", &ConfigStore::new())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_missing_equals_is_malformed() {
        let err = template_headers("content-type=application/json, bogus", &ConfigStore::new())
            .unwrap_err();
        match err {
            Error::MalformedHeader(pair) => assert_eq!(pair, "bogus"),
            e => panic!("Expected MalformedHeader, got {e:?}"),
        }
    }

    #[test]
    fn test_empty_key_is_malformed() {
        assert!(matches!(
            template_headers("=value", &ConfigStore::new()).unwrap_err(),
            Error::MalformedHeader(_)
        ));
    }

    #[test]
    fn test_unresolvable_reference_fails() {
        let err = template_headers("x-access-token=db.token", &ConfigStore::new()).unwrap_err();
        assert!(matches!(err, Error::Resolution { .. }));
    }
}

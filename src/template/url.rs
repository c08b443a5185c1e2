//! URL templating
//!
//! `{db.<path>}` placeholders are replaced by the resolved value and the
//! result is appended to the server's base URL.

use std::sync::OnceLock;

use regex::Regex;

use crate::common::Result;
use crate::store::{resolve, to_text, ConfigStore};

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{(db\.[^{}\s]+?)\}").expect("static regex"))
}

/// Expand every placeholder in `template` and prepend `base_url`
pub fn template_url(template: &str, base_url: &str, store: &ConfigStore) -> Result<String> {
    let mut url = String::with_capacity(base_url.len() + template.len());
    url.push_str(base_url);

    let mut last = 0;
    for captures in placeholder().captures_iter(template) {
        let (Some(whole), Some(reference)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        url.push_str(&template[last..whole.start()]);
        url.push_str(&to_text(&resolve(reference.as_str(), store)?));
        last = whole.end();
    }
    url.push_str(&template[last..]);

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;
    use serde_json::json;

    const BASE: &str = "http://localhost:4000";

    #[test]
    fn test_injects_dynamic_config() {
        let store = ConfigStore::from_value(json!({
            "server_url": BASE,
            "user": {"id": "4565676784353456567"}
        }))
        .unwrap();
        let url = template_url("/api/v1/test/{db.user.id}", BASE, &store).unwrap();
        assert_eq!(url, "http://localhost:4000/api/v1/test/4565676784353456567");
    }

    #[test]
    fn test_injects_multiple_dynamic_values() {
        let store = ConfigStore::from_value(json!({
            "user": {"id": "4565676784353456567"},
            "user2": {"id": "34557667867823434232"}
        }))
        .unwrap();
        let url = template_url("/api/v1/test/{db.user.id}/{db.user2.id}", BASE, &store).unwrap();
        assert_eq!(
            url,
            "http://localhost:4000/api/v1/test/4565676784353456567/34557667867823434232"
        );
    }

    #[test]
    fn test_passes_back_non_dynamic_url() {
        let url = template_url("/api/v1/test", BASE, &ConfigStore::new()).unwrap();
        assert_eq!(url, format!("{BASE}/api/v1/test"));
    }

    #[test]
    fn test_numeric_values_are_rendered() {
        let store = ConfigStore::from_value(json!({"page": {"size": 25}})).unwrap();
        let url = template_url("/items?limit={db.page.size}", BASE, &store).unwrap();
        assert_eq!(url, "http://localhost:4000/items?limit=25");
    }

    #[test]
    fn test_non_reference_braces_are_kept() {
        let url = template_url("/items/{id}", BASE, &ConfigStore::new()).unwrap();
        assert_eq!(url, "http://localhost:4000/items/{id}");
    }

    #[test]
    fn test_missing_placeholder_value_fails() {
        let err = template_url("/api/v1/test/{db.user.id}", BASE, &ConfigStore::new()).unwrap_err();
        assert!(matches!(err, Error::Resolution { .. }));
    }
}

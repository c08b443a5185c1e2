//! Scenario workbook types
//!
//! A workbook has two sheets: `configuration`, a list of `[key, value]`
//! rows seeding the config store, and `apis`, one row per scenario. Cells
//! come from spreadsheets and are loosely typed, so numeric and boolean
//! columns also accept their string spellings and blank cells count as
//! absent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::time::Duration;

use crate::common::{Error, Result};
use crate::store::ConfigStore;

/// A complete workbook loaded from a YAML file
#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct Workbook {
    /// Rows of `[key, value]`
    #[serde(default)]
    pub configuration: Vec<Vec<Value>>,
    /// Scenarios, in execution order
    #[serde(default)]
    pub apis: Vec<Scenario>,
}

/// One API test case
#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
pub struct Scenario {
    /// Path template appended to `server_url`; may hold `{db.<path>}` placeholders
    pub url: String,
    /// HTTP method
    pub method: String,
    /// Human-readable description, used in reports
    #[serde(default, deserialize_with = "cell::optional_text")]
    pub description: Option<String>,
    /// Comma separated `key=value` pairs; values may be `db.` references
    #[serde(default, deserialize_with = "cell::text")]
    pub headers: String,
    /// Name of the payload document sent as the JSON body
    #[serde(default, deserialize_with = "cell::optional_text")]
    pub payload: Option<String>,
    /// Exact expected `content-type` header
    #[serde(deserialize_with = "cell::text")]
    pub response_content_type: String,
    /// Expected status code
    #[serde(deserialize_with = "cell::status_code")]
    pub response_status_code: u16,
    /// Expected `message` property of the response body
    #[serde(default, deserialize_with = "cell::optional_text")]
    pub response_message: Option<String>,
    /// Name of the schema `data` must conform to
    #[serde(default, deserialize_with = "cell::optional_text")]
    pub response_data: Option<String>,
    /// Store key receiving the response's `data` (or whole body)
    #[serde(default, deserialize_with = "cell::optional_text")]
    pub save_to_db: Option<String>,
    /// Restore the test data set before this scenario
    #[serde(default, deserialize_with = "cell::flag")]
    pub restore_db: bool,
    /// Milliseconds to wait before sending the request
    #[serde(default, deserialize_with = "cell::optional_millis")]
    pub delay: Option<u64>,
}

impl Scenario {
    /// `"<url>: <description>"`, or just the url
    pub fn label(&self) -> String {
        match &self.description {
            Some(description) => format!("{}: {}", self.url, description),
            None => self.url.clone(),
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay.unwrap_or(0))
    }
}

impl Workbook {
    /// Load a workbook from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read workbook '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse workbook: {}", e)))
    }

    /// Seed a config store from the configuration sheet
    pub fn seed_store(&self) -> ConfigStore {
        ConfigStore::from_rows(self.configuration.iter().cloned())
    }

    /// JSON view of the workbook with the configuration sheet reduced to a mapping
    pub fn snapshot(&self) -> Result<Value> {
        let mut sheets = Map::new();
        sheets.insert("configuration".to_string(), self.seed_store().to_json());
        sheets.insert("apis".to_string(), serde_json::to_value(&self.apis)?);
        Ok(Value::Object(sheets))
    }
}

/// Lenient deserializers for spreadsheet cells
mod cell {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Cell {
        Bool(bool),
        Int(u64),
        Float(f64),
        Text(String),
    }

    impl Cell {
        fn into_text(self) -> Option<String> {
            let text = match self {
                Cell::Bool(b) => b.to_string(),
                Cell::Int(n) => n.to_string(),
                Cell::Float(f) => f.to_string(),
                Cell::Text(s) => s,
            };
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
    }

    pub fn optional_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(Option::<Cell>::deserialize(d)?.and_then(Cell::into_text))
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(optional_text(d)?.unwrap_or_default())
    }

    pub fn status_code<'de, D: Deserializer<'de>>(d: D) -> Result<u16, D::Error> {
        let text = optional_text(d)?.ok_or_else(|| D::Error::custom("missing status code"))?;
        text.parse::<u16>()
            .map_err(|_| D::Error::custom(format!("invalid status code '{text}'")))
    }

    pub fn optional_millis<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        match optional_text(d)? {
            Some(text) => text
                .parse::<u64>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("invalid delay '{text}'"))),
            None => Ok(None),
        }
    }

    pub fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        match optional_text(d)?.map(|s| s.to_ascii_lowercase()).as_deref() {
            None | Some("false" | "no" | "0") => Ok(false),
            Some("true" | "yes" | "1") => Ok(true),
            Some(other) => Err(D::Error::custom(format!("invalid flag '{other}'"))),
        }
    }
}

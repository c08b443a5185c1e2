//! Runtime configuration store
//!
//! Seeded once from the workbook's configuration sheet, then grows with the
//! values scenarios save from their responses. Keys are overwritten, never
//! removed.

mod resolver;

pub use resolver::{is_reference, resolve, to_text, REFERENCE_PREFIX};

use serde_json::{Map, Value};

use crate::common::{Error, Result};

/// Key holding the base URL every scenario URL is appended to
pub const SERVER_URL_KEY: &str = "server_url";

/// Mutable key/value state threaded through a run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigStore {
    entries: Map<String, Value>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from configuration-sheet rows of `[key, value]`
    ///
    /// The first row for a key wins. Rows without a key are skipped and a
    /// missing value cell seeds `null`.
    pub fn from_rows<R>(rows: R) -> Self
    where
        R: IntoIterator<Item = Vec<Value>>,
    {
        let mut entries = Map::new();
        for row in rows {
            let mut cells = row.into_iter();
            let key = match cells.next() {
                Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
                Some(Value::Number(n)) => n.to_string(),
                _ => continue,
            };
            let value = cells.next().unwrap_or(Value::Null);
            entries.entry(key).or_insert(value);
        }
        Self { entries }
    }

    /// Seed from a JSON object
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(entries) => Ok(Self { entries }),
            other => Err(Error::Config(format!(
                "config store must be seeded from an object, got {other}"
            ))),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Store a value, replacing any previous value under the key
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    /// The base URL scenarios are issued against
    pub fn server_url(&self) -> Result<String> {
        self.get(SERVER_URL_KEY)
            .map(to_text)
            .ok_or_else(|| Error::resolution(SERVER_URL_KEY, SERVER_URL_KEY))
    }

    /// Snapshot of the whole store as a JSON object
    pub fn to_json(&self) -> Value {
        Value::Object(self.entries.clone())
    }
}

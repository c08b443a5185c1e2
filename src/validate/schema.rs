//! JSON-schema conformance of response data
//!
//! Schemas are draft-04 documents. Older workbooks still mark required
//! properties the draft-03 way (`"required": true` on the property itself),
//! so schemas are normalized into draft-04 form before compilation.

use std::fmt;
use std::path::{Path, PathBuf};

use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, JSONSchema, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::common::{Error, Result};

/// Root name violations are reported under
const ROOT_FIELD: &str = "data";

/// A single schema conformance failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Dotted path of the offending field, rooted at `data`
    pub field: String,
    pub message: String,
    /// Type the schema expects at this field, when it declares one
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    /// Offending value; absent for missing fields
    pub value: Option<Value>,
    /// Path of the failing schema node
    pub schema_path: Vec<String>,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)?;
        if let Some(type_name) = &self.type_name {
            write!(f, " (expected {type_name})")?;
        }
        if let Some(value) = &self.value {
            write!(f, ", got {value}")?;
        }
        Ok(())
    }
}

/// Validates an instance against a schema, reporting every violation at once
pub trait SchemaValidator: Send + Sync {
    fn validate(&self, name: &str, schema: &Value, instance: &Value) -> Result<Vec<Violation>>;
}

/// Draft-04 validator backed by the `jsonschema` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct Draft4Validator;

impl SchemaValidator for Draft4Validator {
    fn validate(&self, name: &str, schema: &Value, instance: &Value) -> Result<Vec<Violation>> {
        let schema = normalize_legacy_schema(schema);

        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft4)
            .compile(&schema)
            .map_err(|e| Error::schema_load(name, format!("invalid schema: {e}")))?;

        let violations = match compiled.validate(instance) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.map(|error| to_violation(&schema, error)).collect(),
        };
        Ok(violations)
    }
}

fn to_violation(schema: &Value, error: ValidationError<'_>) -> Violation {
    let message = describe(&error);
    let mut field_path = pointer_segments(&error.instance_path.to_string());
    let mut schema_path = pointer_segments(&error.schema_path.to_string());

    let value = match &error.kind {
        ValidationErrorKind::Required { property } => {
            let property = property
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| property.to_string());
            schema_path.pop();
            schema_path.push("properties".to_string());
            schema_path.push(property.clone());
            field_path.push(property);
            None
        }
        _ => {
            schema_path.pop();
            Some(error.instance.into_owned())
        }
    };

    let type_name = schema_node(schema, &schema_path)
        .and_then(|node| node.get("type"))
        .map(|t| match t {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });

    let mut field = ROOT_FIELD.to_string();
    for segment in &field_path {
        field.push('.');
        field.push_str(segment);
    }

    Violation {
        field,
        message,
        type_name,
        value,
        schema_path,
    }
}

fn describe(error: &ValidationError<'_>) -> String {
    let message = match &error.kind {
        ValidationErrorKind::Required { .. } => "is required",
        ValidationErrorKind::Type { .. } => "is the wrong type",
        ValidationErrorKind::AdditionalProperties { .. } => "has additional properties",
        ValidationErrorKind::Enum { .. } => "must be an enum value",
        ValidationErrorKind::Pattern { .. } => "pattern mismatch",
        ValidationErrorKind::Format { .. } => "has an invalid format",
        ValidationErrorKind::MinLength { .. } => "has less length than allowed",
        ValidationErrorKind::MaxLength { .. } => "has longer length than allowed",
        ValidationErrorKind::Minimum { .. } => "is less than minimum",
        ValidationErrorKind::Maximum { .. } => "is more than maximum",
        ValidationErrorKind::MinItems { .. } => "has less items than allowed",
        ValidationErrorKind::MaxItems { .. } => "has more items than allowed",
        ValidationErrorKind::UniqueItems => "must be unique",
        _ => return error.to_string(),
    };
    message.to_string()
}

/// Split a JSON pointer (`/a/b~1c`) into unescaped segments
fn pointer_segments(pointer: &str) -> Vec<String> {
    pointer
        .split('/')
        .skip(1)
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect()
}

fn schema_node<'a>(schema: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(schema, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Base for schemas identified by a bare name such as `"id": "update"`
const RELATIVE_ID_BASE: &str = "json-schema:///";

/// Rewrite draft-03 idioms into their draft-04 equivalents
///
/// - `"required": true` on a property moves into the parent's `required` array
/// - boolean property schemas become `{}` (true) or `{"not": {}}` (false)
/// - a relative top-level `id` is made absolute so the schema can be compiled
pub fn normalize_legacy_schema(schema: &Value) -> Value {
    let mut schema = schema.clone();
    if let Some(Value::String(id)) = schema.get_mut("id") {
        if !id.contains(':') {
            *id = format!("{RELATIVE_ID_BASE}{}", id.trim_start_matches('/'));
        }
    }
    normalize_node(&mut schema);
    schema
}

fn normalize_node(node: &mut Value) {
    match node {
        Value::Object(map) => {
            normalize_properties(map);
            for (key, child) in map.iter_mut() {
                match key.as_str() {
                    // Keys of these maps are names, every value is a schema
                    "properties" | "patternProperties" | "definitions" => {
                        if let Value::Object(schemas) = child {
                            for schema in schemas.values_mut() {
                                normalize_node(schema);
                            }
                        }
                    }
                    "enum" | "default" | "examples" => {}
                    _ => normalize_node(child),
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                normalize_node(item);
            }
        }
        _ => {}
    }
}

fn normalize_properties(map: &mut Map<String, Value>) {
    let mut required = Vec::new();

    if let Some(Value::Object(properties)) = map.get_mut("properties") {
        for (name, property) in properties.iter_mut() {
            match property {
                Value::Bool(true) => *property = Value::Object(Map::new()),
                Value::Bool(false) => {
                    let mut never = Map::new();
                    never.insert("not".to_string(), Value::Object(Map::new()));
                    *property = Value::Object(never);
                }
                Value::Object(inner) => {
                    if let Some(Value::Bool(flag)) = inner.get("required") {
                        if *flag {
                            required.push(name.clone());
                        }
                        inner.remove("required");
                    }
                }
                _ => {}
            }
        }
    }

    if required.is_empty() {
        return;
    }
    match map.get_mut("required") {
        Some(Value::Array(existing)) => {
            for name in required {
                if !existing.iter().any(|v| v.as_str() == Some(name.as_str())) {
                    existing.push(Value::String(name));
                }
            }
        }
        _ => {
            map.insert(
                "required".to_string(),
                Value::Array(required.into_iter().map(Value::String).collect()),
            );
        }
    }
}

/// Loads named schemas from a directory and checks instances against them
pub struct SchemaCatalog {
    dir: PathBuf,
    validator: Box<dyn SchemaValidator>,
}

impl SchemaCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_validator(dir, Box::new(Draft4Validator))
    }

    pub fn with_validator(dir: impl Into<PathBuf>, validator: Box<dyn SchemaValidator>) -> Self {
        Self {
            dir: dir.into(),
            validator,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read and parse `<dir>/<name>.json`
    pub async fn load(&self, name: &str) -> Result<Value> {
        let path = self.dir.join(format!("{name}.json"));
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| Error::schema_load(name, format!("{}: {e}", path.display())))?;
        serde_json::from_str(&content).map_err(|e| Error::schema_load(name, e))
    }

    /// Validate `instance` against the named schema
    pub async fn check(&self, name: &str, instance: &Value) -> Result<Vec<Violation>> {
        let schema = self.load(name).await?;
        self.validator.validate(name, &schema, instance)
    }
}

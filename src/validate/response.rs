//! Response assertions
//!
//! Checks run in a fixed order and the first mismatch fails the scenario:
//! content type, status code, response message, then schema conformance of
//! `body.data`.

use serde_json::Value;

use super::schema::SchemaCatalog;
use crate::common::{Error, Result};
use crate::http::HttpResponse;
use crate::store::to_text;
use crate::testing::Scenario;

/// A response that passed every check
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedResponse {
    /// Parsed body, or the raw text as a JSON string when it is not JSON
    pub body: Value,
}

impl ValidatedResponse {
    /// The value a scenario saves: `body.data` when present, else the whole body
    pub fn extracted(&self) -> Value {
        match &self.body {
            Value::Object(map) if map.contains_key("data") => {
                map.get("data").cloned().unwrap_or(Value::Null)
            }
            other => other.clone(),
        }
    }
}

/// Parse a body as JSON, falling back to the raw text
pub fn parse_body(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

pub struct ResponseValidator {
    schemas: SchemaCatalog,
}

impl ResponseValidator {
    pub fn new(schemas: SchemaCatalog) -> Self {
        Self { schemas }
    }

    /// Run every check for `scenario` against `response` from `target`
    pub async fn validate(
        &self,
        scenario: &Scenario,
        target: &str,
        response: &HttpResponse,
    ) -> Result<ValidatedResponse> {
        let body = parse_body(&response.body);

        let actual_type = response.header("content-type");
        if actual_type != Some(scenario.response_content_type.as_str()) {
            return Err(Error::validation(
                target,
                format!(
                    "Content-type must match the returned content-type. Expected: {}, Actual: {}",
                    scenario.response_content_type,
                    actual_type.unwrap_or("<none>")
                ),
            ));
        }

        if response.status != scenario.response_status_code {
            return Err(Error::validation(
                target,
                format!(
                    "status code doesn't match. Expected: {}, Actual: {}",
                    scenario.response_status_code, response.status
                ),
            ));
        }

        if let Some(expected) = &scenario.response_message {
            let actual = body.get("message");
            if actual.and_then(Value::as_str) != Some(expected.as_str()) {
                return Err(Error::validation(
                    target,
                    format!(
                        "response message doesn't match. Expected: {}, Actual: {}",
                        expected,
                        actual.map(to_text).unwrap_or_else(|| "<none>".to_string())
                    ),
                ));
            }
        }

        if let Some(schema) = &scenario.response_data {
            let data = body.get("data").cloned().unwrap_or(Value::Null);
            let violations = self.schemas.check(schema, &data).await?;
            if !violations.is_empty() {
                return Err(Error::SchemaMismatch {
                    target: target.to_string(),
                    schema: schema.clone(),
                    violations,
                });
            }
        }

        Ok(ValidatedResponse { body })
    }
}

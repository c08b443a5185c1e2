//! Error types for the scenario runner
//!
//! Every scenario failure names the reference, document or URL involved and,
//! for assertions, both the expected and actual values, so a cascade of
//! failures across dependent scenarios can be traced back to its root.

use std::io;
use thiserror::Error;

use crate::validate::Violation;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the scenario runner
#[derive(Error, Debug)]
pub enum Error {
    // === Templating Errors ===
    #[error("Cannot resolve '{reference}': segment '{segment}' not found in the config store")]
    Resolution { reference: String, segment: String },

    #[error("Malformed header pair '{0}': expected key=value")]
    MalformedHeader(String),

    #[error("Payload '{name}' could not be loaded: {reason}")]
    Payload { name: String, reason: String },

    #[error("Payload '{name}' could not be templated: {reason}")]
    PayloadTemplating { name: String, reason: String },

    // === Transport Errors ===
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Invalid request for {url}: {message}")]
    InvalidRequest { url: String, message: String },

    // === Validation Errors ===
    #[error("{target}: {message}")]
    Validation { target: String, message: String },

    #[error("{target}: API response should match schema '{schema}' ({} violation(s)): {}", .violations.len(), describe_violations(.violations))]
    SchemaMismatch {
        target: String,
        schema: String,
        violations: Vec<Violation>,
    },

    #[error("Schema '{name}' could not be loaded: {reason}")]
    SchemaLoad { name: String, reason: String },

    // === Hook Errors ===
    #[error("Test data restore failed: {0}")]
    Restore(String),

    // === Timeout Errors ===
    #[error("Scenario timed out after {budget_ms} ms while {state}")]
    Timeout { budget_ms: u64, state: String },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Create a resolution error for a reference and the segment that was missing
    pub fn resolution(reference: &str, segment: &str) -> Self {
        Self::Resolution {
            reference: reference.to_string(),
            segment: segment.to_string(),
        }
    }

    /// Create a transport error for a target URL
    pub fn transport(url: &str, message: impl ToString) -> Self {
        Self::Transport {
            url: url.to_string(),
            message: message.to_string(),
        }
    }

    /// Create an invalid request error for a target URL
    pub fn invalid_request(url: &str, message: impl ToString) -> Self {
        Self::InvalidRequest {
            url: url.to_string(),
            message: message.to_string(),
        }
    }

    /// Create an assertion failure against a target URL
    pub fn validation(target: &str, message: impl ToString) -> Self {
        Self::Validation {
            target: target.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a payload load error
    pub fn payload(name: &str, reason: impl ToString) -> Self {
        Self::Payload {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a schema load error
    pub fn schema_load(name: &str, reason: impl ToString) -> Self {
        Self::SchemaLoad {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Stable machine-readable code, used in JSON reports
    pub fn code(&self) -> &'static str {
        match self {
            Error::Resolution { .. } => "RESOLUTION_ERROR",
            Error::MalformedHeader(_) => "MALFORMED_HEADER",
            Error::Payload { .. } => "PAYLOAD_ERROR",
            Error::PayloadTemplating { .. } => "PAYLOAD_TEMPLATING_ERROR",
            Error::Transport { .. } => "TRANSPORT_ERROR",
            Error::InvalidRequest { .. } => "INVALID_REQUEST",
            Error::Validation { .. } | Error::SchemaMismatch { .. } => "VALIDATION_ERROR",
            Error::SchemaLoad { .. } => "SCHEMA_LOAD_ERROR",
            Error::Restore(_) => "RESTORE_ERROR",
            Error::Timeout { .. } => "TIMEOUT",
            Error::Config(_) | Error::ConfigParse(_) => "CONFIG_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }
}

fn describe_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_message_names_path() {
        let err = Error::resolution("db.user.missing.x", "missing");
        assert_eq!(
            err.to_string(),
            "Cannot resolve 'db.user.missing.x': segment 'missing' not found in the config store"
        );
        assert_eq!(err.code(), "RESOLUTION_ERROR");
    }

    #[test]
    fn test_schema_mismatch_lists_every_violation() {
        let violations = vec![
            Violation {
                field: "data.a".to_string(),
                message: "is required".to_string(),
                type_name: Some("string".to_string()),
                value: None,
                schema_path: vec!["properties".to_string(), "a".to_string()],
            },
            Violation {
                field: "data.b".to_string(),
                message: "is the wrong type".to_string(),
                type_name: Some("number".to_string()),
                value: Some(serde_json::json!("x")),
                schema_path: vec!["properties".to_string(), "b".to_string()],
            },
        ];
        let err = Error::SchemaMismatch {
            target: "http://localhost:4000/a".to_string(),
            schema: "user".to_string(),
            violations,
        };
        let message = err.to_string();
        assert!(message.contains("2 violation(s)"));
        assert!(message.contains("data.a is required"));
        assert!(message.contains("data.b is the wrong type"));
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }
}

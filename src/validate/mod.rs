//! Response validation: assertions and JSON-schema conformance

mod response;
mod schema;

pub use response::{parse_body, ResponseValidator, ValidatedResponse};
pub use schema::{normalize_legacy_schema, Draft4Validator, SchemaCatalog, SchemaValidator, Violation};

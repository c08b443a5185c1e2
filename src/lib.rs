//! apirun - sequential HTTP API scenario runner
//!
//! Scenarios from a workbook are sent one after another against a running
//! service. Responses are checked for content type, status, message and
//! schema conformance, and values saved from earlier responses can be
//! referenced by later scenarios as `db.<path>`.

pub mod cli;
pub mod commands;
pub mod common;
pub mod http;
pub mod store;
pub mod template;
pub mod testing;
pub mod validate;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use store::ConfigStore;
pub use testing::{Scenario, ScenarioRunner, Workbook};

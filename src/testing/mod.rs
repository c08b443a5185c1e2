//! Scenario workbooks and the runner that drives them
//!
//! A workbook's scenarios run top to bottom against one config store.
//! Each scenario's request, assertions and store update happen before the
//! next one starts.

mod config;
mod restore;
mod runner;

pub use config::{Scenario, Workbook};
pub use restore::RestoreHook;
pub use runner::{RunOptions, RunReport, ScenarioOutcome, ScenarioRunner, ScenarioState};

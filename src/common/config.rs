//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::{Error, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Where payload and schema documents live
    #[serde(default)]
    pub fixtures: FixturesConfig,

    /// Timeout budget settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Test data restore hook
    #[serde(default)]
    pub restore: RestoreConfig,
}

/// Fixture directories
///
/// Relative paths are resolved against the workbook's directory.
#[derive(Debug, Deserialize, Clone)]
pub struct FixturesConfig {
    /// Directory holding `<payload>.json` request bodies
    #[serde(default = "default_payloads_dir")]
    pub payloads_dir: PathBuf,

    /// Directory holding `<response_data>.json` schemas
    #[serde(default = "default_schemas_dir")]
    pub schemas_dir: PathBuf,
}

impl Default for FixturesConfig {
    fn default() -> Self {
        Self {
            payloads_dir: default_payloads_dir(),
            schemas_dir: default_schemas_dir(),
        }
    }
}

fn default_payloads_dir() -> PathBuf {
    PathBuf::from("payloads")
}

fn default_schemas_dir() -> PathBuf {
    PathBuf::from("schemas")
}

/// Timeout settings in milliseconds
#[derive(Debug, Deserialize, Clone)]
pub struct Timeouts {
    /// Budget every scenario starts with
    #[serde(default = "default_base")]
    pub base_ms: u64,

    /// Added when the scenario restores test data first
    #[serde(default = "default_restore")]
    pub restore_ms: u64,

    /// Added for the request itself, on top of the scenario's delay
    #[serde(default = "default_request_slack")]
    pub request_slack_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            base_ms: default_base(),
            restore_ms: default_restore(),
            request_slack_ms: default_request_slack(),
        }
    }
}

fn default_base() -> u64 {
    2000
}
fn default_restore() -> u64 {
    10_000
}
fn default_request_slack() -> u64 {
    2000
}

impl Timeouts {
    /// Total budget for one scenario
    pub fn budget(&self, restore: bool, delay: Duration) -> Duration {
        let mut ms = self.base_ms + self.request_slack_ms;
        if restore {
            ms += self.restore_ms;
        }
        Duration::from_millis(ms) + delay
    }
}

/// Restore hook configuration
#[derive(Debug, Deserialize, Default, Clone)]
pub struct RestoreConfig {
    /// Shell command that resets the backing data set
    pub command: Option<String>,
}

impl Config {
    /// Load configuration from an explicit path, or the default config file
    ///
    /// Returns default configuration if no path is given and the default file doesn't exist
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }
        Ok(Self::default())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Resolve fixture directories against the workbook's directory
    pub fn anchor_fixtures(&mut self, base: &Path) {
        if self.fixtures.payloads_dir.is_relative() {
            self.fixtures.payloads_dir = base.join(&self.fixtures.payloads_dir);
        }
        if self.fixtures.schemas_dir.is_relative() {
            self.fixtures.schemas_dir = base.join(&self.fixtures.schemas_dir);
        }
    }
}

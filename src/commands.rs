//! CLI command definitions
//!
//! Defines the clap commands for the scenario runner.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run every scenario in a workbook against the configured server
    Run {
        /// Path to the YAML workbook
        workbook: PathBuf,

        /// Configuration file (default: the user config file, if present)
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Directory holding payload documents
        #[arg(long)]
        payloads: Option<PathBuf>,

        /// Directory holding response schemas
        #[arg(long)]
        schemas: Option<PathBuf>,

        /// Shell command that restores the test data set
        #[arg(long)]
        restore_command: Option<String>,

        /// Only run scenarios whose label contains this text
        #[arg(long)]
        filter: Option<String>,

        /// Stop at the first failing scenario
        #[arg(long)]
        bail: bool,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,

        /// Verbose output
        #[arg(long, short)]
        verbose: bool,

        /// Also write logs to this file
        #[arg(long)]
        log_file: Option<PathBuf>,
    },

    /// Print a workbook as JSON, with the configuration sheet as a mapping
    Snapshot {
        /// Path to the YAML workbook
        workbook: PathBuf,

        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

impl Commands {
    /// Verbosity and log file requested on the command line
    pub fn logging(&self) -> (bool, Option<PathBuf>) {
        match self {
            Commands::Run {
                verbose, log_file, ..
            } => (*verbose, log_file.clone()),
            Commands::Snapshot { .. } => (false, None),
        }
    }
}

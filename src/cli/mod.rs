//! CLI command handling
//!
//! Builds a runner from the configuration file and command-line overrides,
//! drives the workbook, and formats the report.

use colored::Colorize;
use std::path::Path;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::http::ReqwestTransport;
use crate::testing::{RunOptions, RunReport, ScenarioRunner, Workbook};

/// Dispatch a CLI command
///
/// Returns `false` when the command ran but scenarios failed.
pub async fn dispatch(command: Commands) -> Result<bool> {
    match command {
        Commands::Run {
            workbook,
            config,
            payloads,
            schemas,
            restore_command,
            filter,
            bail,
            json,
            ..
        } => {
            let mut config = Config::load(config.as_deref())?;
            config.anchor_fixtures(workbook_dir(&workbook));
            if let Some(dir) = payloads {
                config.fixtures.payloads_dir = dir;
            }
            if let Some(dir) = schemas {
                config.fixtures.schemas_dir = dir;
            }
            if let Some(command) = restore_command {
                config.restore.command = Some(command);
            }

            let workbook = Workbook::load(&workbook)?;
            tracing::debug!(
                scenarios = workbook.apis.len(),
                payloads = %config.fixtures.payloads_dir.display(),
                schemas = %config.fixtures.schemas_dir.display(),
                "Loaded workbook"
            );

            let mut runner =
                ScenarioRunner::new(workbook.seed_store(), ReqwestTransport::new()?, &config);
            let report = runner
                .run_all(&workbook.apis, &RunOptions { filter, bail })
                .await;

            if json {
                println!("{}", serde_json::to_string_pretty(&report.to_json())?);
            } else {
                print_report(&report);
            }

            Ok(report.all_passed())
        }

        Commands::Snapshot { workbook, output } => {
            let snapshot = Workbook::load(&workbook)?.snapshot()?;
            let rendered = serde_json::to_string_pretty(&snapshot)?;

            match output {
                Some(path) => {
                    std::fs::write(&path, rendered + "\n").map_err(|e| {
                        Error::Config(format!(
                            "Failed to write snapshot '{}': {}",
                            path.display(),
                            e
                        ))
                    })?;
                    println!("Wrote snapshot to {}", path.display());
                }
                None => println!("{}", rendered),
            }

            Ok(true)
        }
    }
}

/// Directory relative fixture paths are resolved against
fn workbook_dir(workbook: &Path) -> &Path {
    match workbook.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn print_report(report: &RunReport) {
    println!();
    for outcome in &report.outcomes {
        let millis = outcome.duration.as_millis();
        match &outcome.error {
            None => println!(
                "  {} {} {}",
                "✓".green(),
                outcome.label,
                format!("({millis} ms)").dimmed()
            ),
            Some(e) => {
                println!(
                    "  {} {} {}",
                    "✗".red(),
                    outcome.label.bold(),
                    format!("({}, {millis} ms)", outcome.state).dimmed()
                );
                println!("      {}", e.to_string().red());
            }
        }
    }

    let summary = format!(
        "{} passed, {} failed, {} skipped",
        report.passed(),
        report.failed(),
        report.skipped
    );
    if report.all_passed() {
        println!("\n{} {}\n", "✓".green().bold(), summary.green().bold());
    } else {
        println!("\n{} {}\n", "✗".red().bold(), summary.red().bold());
    }
}

//! Test data restore hook
//!
//! Runs a configured shell command before scenarios flagged `restore_db`.
//! A non-zero exit or anything written to stderr fails the scenario. The
//! command runs in its own process group, which is killed if the run is
//! abandoned.

use std::process::Stdio;

use tokio::process::Command as TokioCommand;

use crate::common::{Error, Result};

#[derive(Debug, Clone)]
pub struct RestoreHook {
    command: String,
}

impl RestoreHook {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Run the command once, returning its stdout
    pub async fn run(&self) -> Result<String> {
        tracing::info!(command = %self.command, "Restoring test data");

        let mut command = TokioCommand::new("sh");
        command
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let child = command.spawn().map_err(|e| {
            Error::Restore(format!("'{}' failed to execute: {}", self.command, e))
        })?;
        let mut group = ProcessGroup(child.id());

        let output = child.wait_with_output().await.map_err(|e| {
            Error::Restore(format!("'{}' failed to execute: {}", self.command, e))
        })?;
        group.0 = None;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(Error::Restore(format!(
                "'{}' exited with code {:?}: {}",
                self.command,
                output.status.code(),
                stderr.trim()
            )));
        }
        if !stderr.trim().is_empty() {
            return Err(Error::Restore(format!(
                "'{}' wrote to stderr: {}",
                self.command,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Kills the restore command's whole process group if it is abandoned
/// mid-run, e.g. when the scenario budget runs out
struct ProcessGroup(Option<u32>);

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        #[cfg(unix)]
        if let Some(pid) = self.0 {
            // The group id equals the leader's pid
            unsafe {
                libc::kill(-(pid as libc::pid_t), libc::SIGKILL);
            }
        }
    }
}

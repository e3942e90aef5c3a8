//! Execution of the configured lint/test and build commands

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

use crate::error::{ReleaseError, Result};

/// Runs a configured shell command to completion
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command`; any non-zero exit is a `ReleaseError::Command`
    async fn run(&self, command: &str) -> Result<()>;
}

/// Runs commands through the platform shell with inherited stdio
///
/// Output goes straight to the job log.
pub struct ShellRunner {
    workdir: PathBuf,
}

impl ShellRunner {
    /// Runner whose commands start in `workdir`
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }
}

fn shell_command(command: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command: &str) -> Result<()> {
        debug!(%command, "Spawning shell");

        let status = shell_command(command)
            .current_dir(&self.workdir)
            .status()
            .await
            .map_err(|_| ReleaseError::Command {
                command: command.to_string(),
                code: None,
            })?;

        if !status.success() {
            return Err(ReleaseError::Command {
                command: command.to_string(),
                code: status.code(),
            });
        }

        Ok(())
    }
}

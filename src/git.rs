//! Git operations used by the release preconditions
//!
//! This module provides:
//! - Working tree status queries
//! - Current branch lookup
//! - Arbitrary git invocations with captured stdout

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;

use crate::error::{ReleaseError, Result};

/// Read-only view of the local repository
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Output of `git status --porcelain`; empty when the tree is clean
    async fn status(&self) -> Result<String>;

    /// Name of the checked-out branch
    async fn current_branch(&self) -> Result<String>;
}

/// Source control backed by the system `git` binary
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    /// Run git inside `workdir`
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Run `git <args>` and return trimmed stdout
    ///
    /// # Errors
    ///
    /// * Git is not installed or not in PATH
    /// * Git exits with a non-zero status
    ///
    /// # Example
    ///
    /// ```no_run
    /// use commit_release::git::GitCli;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> commit_release::error::Result<()> {
    /// let head = GitCli::new(".").run(&["rev-parse", "HEAD"]).await?;
    /// println!("HEAD is {}", head);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .await
            .map_err(|e| {
                ReleaseError::SourceControl(format!(
                    "Failed to execute git. Make sure git is installed and in PATH: {}",
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(ReleaseError::SourceControl(format!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl SourceControl for GitCli {
    async fn status(&self) -> Result<String> {
        self.run(&["status", "--porcelain"]).await
    }

    async fn current_branch(&self) -> Result<String> {
        self.run(&["rev-parse", "--abbrev-ref", "HEAD"]).await
    }
}

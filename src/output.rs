//! Run results and CI-facing output
//!
//! This module provides:
//! - [`ReleaseReport`], serialized for `--json` output
//! - Step outputs appended to the `GITHUB_OUTPUT` file
//! - Workflow commands (`::error::`, `::warning::`) for annotations

use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::error::{ReleaseError, Result};

/// Summary of a published release
///
/// # Example
///
/// ```
/// use commit_release::output::ReleaseReport;
///
/// let report = ReleaseReport {
///     tag: "0.1.0".to_string(),
///     previous_tag: None,
///     release_url: "https://github.com/acme/rocket/releases/tag/0.1.0".to_string(),
///     assets: vec![],
///     non_conventional: vec![],
/// };
///
/// let json = serde_json::to_string(&report).unwrap();
/// assert!(json.starts_with(r#"{"tag":"0.1.0","previous_tag":null"#));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseReport {
    /// Tag created for this release
    pub tag: String,
    /// Tag of the release before this one
    pub previous_tag: Option<String>,
    pub release_url: String,
    /// File names uploaded as release assets, in upload order
    pub assets: Vec<String>,
    /// Titles of commits that do not follow conventional commits
    pub non_conventional: Vec<String>,
}

impl ReleaseReport {
    /// Key/value pairs exposed as step outputs
    pub fn step_outputs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("tag", self.tag.clone()),
            ("previous_tag", self.previous_tag.clone().unwrap_or_default()),
            ("release_url", self.release_url.clone()),
        ]
    }
}

/// Append `key=value` lines to a step output file
pub fn write_step_outputs(path: &Path, outputs: &[(&str, String)]) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ReleaseError::filesystem(path, e))?;

    for (key, value) in outputs {
        writeln!(file, "{}={}", key, value).map_err(|e| ReleaseError::filesystem(path, e))?;
    }

    Ok(())
}

/// Escape a message for use in a workflow command
pub fn escape_workflow_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Format the workflow command that marks the job as failed
pub fn failure_annotation(message: &str) -> String {
    format!("::error::{}", escape_workflow_data(message))
}

/// Emit a `::warning::` annotation when running inside GitHub Actions
pub fn workflow_warning(message: &str) {
    if std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true") {
        println!("::warning::{}", escape_workflow_data(message));
    }
}

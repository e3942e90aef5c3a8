//! Changelog assembly
//!
//! Every commit becomes one bullet line. When a summarizer is available
//! a short prose summary is prepended; failures there only drop the
//! summary.

use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{info, warn};

use crate::commit::CommitRecord;
use crate::error::Result;
use crate::output::workflow_warning;

static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("think regex is valid"));

/// Produces a prose summary from a changelog bullet list
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize the bullet list
    ///
    /// Implementations report every failure as `ReleaseError::Summary`.
    async fn summarize(&self, bullets: &str) -> Result<String>;
}

/// Release notes built for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangelogDocument {
    /// Optional summary placed above the bullet list
    pub summary: Option<String>,
    /// One line per commit, in commit order
    pub bullets: Vec<String>,
}

impl ChangelogDocument {
    /// Render the release body as markdown
    pub fn render(&self) -> String {
        let mut body = String::new();
        if let Some(summary) = &self.summary {
            body.push_str("## Changelog Summary\n\n");
            body.push_str(summary);
            body.push_str("\n\n");
        }
        body.push_str("## What's Changed\n\n");
        body.push_str(&self.bullets.join("\n"));
        body
    }
}

/// Format one changelog bullet
///
/// # Example
///
/// ```
/// use commit_release::changelog::format_bullet;
/// use commit_release::commit::CommitRecord;
///
/// let commit = CommitRecord {
///     sha: "abcdef1234567".to_string(),
///     message: "fix: crash".to_string(),
///     author_name: "Alice".to_string(),
///     author_login: Some("alice".to_string()),
/// };
/// assert_eq!(format_bullet(&commit), "- fix: crash (abcdef1) by @alice");
/// ```
pub fn format_bullet(commit: &CommitRecord) -> String {
    format!(
        "- {} ({}) by @{}",
        commit.title(),
        commit.short_sha(),
        commit.display_author()
    )
}

/// Remove `<think>...</think>` reasoning blocks and trim
pub fn strip_think_blocks(input: &str) -> String {
    THINK_BLOCK.replace_all(input, "").trim().to_string()
}

/// Build the changelog for a set of commits
///
/// The bullet list is always produced. A summarizer error, or an empty
/// summary, leaves `summary` as `None` and logs a warning.
pub async fn build_changelog(
    commits: &[CommitRecord],
    summarizer: Option<&dyn Summarizer>,
) -> ChangelogDocument {
    let bullets: Vec<String> = commits.iter().map(format_bullet).collect();

    let summary = match summarizer {
        Some(summarizer) => {
            info!("Requesting changelog summary");
            match summarizer.summarize(&bullets.join("\n")).await {
                Ok(text) => Some(strip_think_blocks(&text)).filter(|s| !s.is_empty()),
                Err(e) => {
                    warn!("{}", e);
                    workflow_warning(&e.to_string());
                    None
                }
            }
        }
        None => None,
    };

    ChangelogDocument { summary, bullets }
}

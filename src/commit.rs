//! Commit records and commit message classification
//!
//! This module recognizes the `!release: <kind>` trigger and checks
//! commit titles against the conventional commits prefixes.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::{ReleaseError, Result};
use crate::version::ReleaseType;

static TRIGGER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)!release:\s*(major|minor|patch)").expect("trigger regex is valid")
});

static CONVENTIONAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(feat|fix|docs|chore|refactor|style|perf)(\(.+\))?:")
        .expect("conventional regex is valid")
});

/// Literal marker that signals an intended release
const TRIGGER_MARKER: &str = "!release";

/// A commit as reported by the repository host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Full commit hash
    pub sha: String,
    /// Full message; the first line is the title
    pub message: String,
    /// Author name recorded in the commit
    pub author_name: String,
    /// Host account of the author, when the host could resolve one
    pub author_login: Option<String>,
}

impl CommitRecord {
    /// First line of the message
    pub fn title(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// First seven characters of the hash
    pub fn short_sha(&self) -> &str {
        let end = self
            .sha
            .char_indices()
            .nth(7)
            .map(|(i, _)| i)
            .unwrap_or(self.sha.len());
        &self.sha[..end]
    }

    /// Login when known, author name otherwise
    pub fn display_author(&self) -> &str {
        self.author_login
            .as_deref()
            .filter(|login| !login.is_empty())
            .unwrap_or(&self.author_name)
    }
}

/// Extract the release kind from a commit message
///
/// # Example
///
/// ```
/// use commit_release::commit::parse_release_trigger;
/// use commit_release::version::ReleaseType;
///
/// assert_eq!(parse_release_trigger("fix: bug !release: patch"), Some(ReleaseType::Patch));
/// assert_eq!(parse_release_trigger("normal commit"), None);
/// ```
pub fn parse_release_trigger(message: &str) -> Option<ReleaseType> {
    TRIGGER
        .captures(message)
        .and_then(|caps| caps.get(1))
        .and_then(|kind| kind.as_str().parse().ok())
}

/// Decide whether a commit message requests a release
///
/// # Returns
///
/// * `Ok(Some(kind))` - a valid trigger is present
/// * `Ok(None)` - no trigger at all, nothing to do
///
/// # Errors
///
/// * The message mentions `!release` without a valid kind
pub fn detect_trigger(message: &str) -> Result<Option<ReleaseType>> {
    match parse_release_trigger(message) {
        Some(kind) => Ok(Some(kind)),
        None if message.contains(TRIGGER_MARKER) => Err(ReleaseError::Configuration(
            "Commit message mentions !release but no valid kind was found \
             (expected !release: major, minor or patch)"
                .to_string(),
        )),
        None => Ok(None),
    }
}

/// Result of checking a message against the conventional prefixes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conventionality {
    Compliant,
    NonCompliant,
}

/// Classify a commit message by its first line
pub fn classify_conventional(message: &str) -> Conventionality {
    let title = message.lines().next().unwrap_or("");
    if CONVENTIONAL.is_match(title) {
        Conventionality::Compliant
    } else {
        Conventionality::NonCompliant
    }
}

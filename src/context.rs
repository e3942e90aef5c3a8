//! Run context provided by the CI environment
//!
//! Identifies the repository, the commit being released and the message
//! that carries the release trigger.

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{ReleaseError, Result};

/// Default REST endpoint when `GITHUB_API_URL` is not set
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// An `owner/name` repository identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Repository {
    /// Parse `owner/name`
    ///
    /// # Example
    ///
    /// ```
    /// use commit_release::context::Repository;
    ///
    /// let repo = Repository::parse("acme/rocket").unwrap();
    /// assert_eq!(repo.owner, "acme");
    /// assert_eq!(repo.name, "rocket");
    /// ```
    pub fn parse(slug: &str) -> Result<Self> {
        match slug.trim().split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(ReleaseError::Configuration(format!(
                "Repository must be given as owner/name, got '{}'",
                slug
            ))),
        }
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Everything the run knows about the triggering push
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionContext {
    pub repository: Repository,
    /// Commit the tag is created at
    pub sha: String,
    /// Message of the head commit; empty when unknown
    pub commit_message: String,
    pub api_url: String,
}

#[derive(Debug, Deserialize)]
struct PushEvent {
    #[serde(default)]
    head_commit: Option<HeadCommit>,
}

#[derive(Debug, Deserialize)]
struct HeadCommit {
    #[serde(default)]
    message: String,
}

impl ActionContext {
    /// Assemble the context
    ///
    /// An explicit `commit_message` wins; otherwise the head commit message
    /// is read from the event payload at `event_path`.
    ///
    /// # Errors
    ///
    /// * `repository` or `sha` is missing or malformed
    /// * The event payload cannot be read or parsed
    pub fn resolve(
        repository: Option<&str>,
        sha: Option<&str>,
        commit_message: Option<&str>,
        event_path: Option<&Path>,
        api_url: Option<&str>,
    ) -> Result<Self> {
        let repository = repository
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                ReleaseError::Configuration("GITHUB_REPOSITORY is not set".to_string())
            })
            .and_then(Repository::parse)?;

        let sha = sha
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ReleaseError::Configuration("GITHUB_SHA is not set".to_string()))?
            .to_string();

        let commit_message = match (commit_message, event_path) {
            (Some(message), _) => message.to_string(),
            (None, Some(path)) => read_head_commit_message(path)?,
            (None, None) => String::new(),
        };

        let api_url = api_url
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_API_URL)
            .to_string();

        Ok(Self {
            repository,
            sha,
            commit_message,
            api_url,
        })
    }
}

/// Read `head_commit.message` from a push event payload
pub fn read_head_commit_message(path: &Path) -> Result<String> {
    let content = fs::read_to_string(path).map_err(|e| ReleaseError::filesystem(path, e))?;
    let event: PushEvent = serde_json::from_str(&content).map_err(|e| {
        ReleaseError::Configuration(format!(
            "Failed to parse event payload {}: {}",
            path.display(),
            e
        ))
    })?;

    Ok(event.head_commit.map(|c| c.message).unwrap_or_default())
}

//! Advisory validation of commit messages
//!
//! Commits whose titles do not follow the conventional commits format
//! are collected and logged. They never block a release.

use tracing::warn;

use crate::commit::{CommitRecord, Conventionality, classify_conventional};

/// Collect the titles of non-conventional commits
///
/// Logs one warning listing every offending title when any are found.
///
/// # Arguments
///
/// * `commits` - Commits included in the release
///
/// # Returns
///
/// * `Vec<String>` - Titles of non-compliant commits, in input order
///
/// # Example
///
/// ```
/// use commit_release::commit::CommitRecord;
/// use commit_release::validation::validate_commit_messages;
///
/// let commits = vec![CommitRecord {
///     sha: "abc1234".to_string(),
///     message: "updated stuff".to_string(),
///     author_name: "Bob".to_string(),
///     author_login: None,
/// }];
///
/// assert_eq!(validate_commit_messages(&commits), vec!["updated stuff".to_string()]);
/// ```
pub fn validate_commit_messages(commits: &[CommitRecord]) -> Vec<String> {
    let invalid: Vec<String> = commits
        .iter()
        .filter(|c| classify_conventional(&c.message) == Conventionality::NonCompliant)
        .map(|c| c.title().to_string())
        .collect();

    if !invalid.is_empty() {
        warn!(
            count = invalid.len(),
            "Found non-conventional commit messages:\n{}",
            invalid.join("\n")
        );
    }

    invalid
}

//! Error types for the release pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while preparing or publishing a release
#[derive(Error, Debug)]
pub enum ReleaseError {
    /// Missing or malformed input, or a malformed release trigger
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Working tree or branch state does not allow a release
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Previous tag could not be parsed or incremented
    #[error("Version error: {0}")]
    Version(String),

    /// Repository host call failed
    #[error("Repository host error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    HostApi {
        status: Option<u16>,
        message: String,
    },

    /// Configured lint/test/build command failed
    #[error("Command `{command}` failed with exit code {}", .code.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string()))]
    Command { command: String, code: Option<i32> },

    /// Git binary could not be run or returned non-zero
    #[error("Git command failed: {0}")]
    SourceControl(String),

    /// Changelog summarization failed (non-fatal)
    #[error("Changelog summary unavailable: {0}")]
    Summary(String),

    /// Webhook notification failed (non-fatal)
    #[error("Notification failed: {0}")]
    Notification(String),

    /// Directory traversal or asset read failed
    #[error("Filesystem error at {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReleaseError {
    /// Whether this error must abort the run.
    ///
    /// Summary and notification failures only degrade the release.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ReleaseError::Summary(_) | ReleaseError::Notification(_)
        )
    }

    pub(crate) fn host(status: Option<u16>, message: impl Into<String>) -> Self {
        ReleaseError::HostApi {
            status,
            message: message.into(),
        }
    }

    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReleaseError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

impl From<reqwest::Error> for ReleaseError {
    fn from(err: reqwest::Error) -> Self {
        ReleaseError::HostApi {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, ReleaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_summary_and_notification_are_non_fatal() {
        assert!(!ReleaseError::Summary("x".into()).is_fatal());
        assert!(!ReleaseError::Notification("x".into()).is_fatal());
        assert!(ReleaseError::Configuration("x".into()).is_fatal());
        assert!(ReleaseError::Precondition("x".into()).is_fatal());
        assert!(
            ReleaseError::Command {
                command: "make".into(),
                code: Some(2)
            }
            .is_fatal()
        );
    }

    #[test]
    fn test_host_error_message_includes_status() {
        // Arrange
        let err = ReleaseError::host(Some(422), "Reference already exists");

        // Act
        let message = err.to_string();

        // Assert
        assert_eq!(
            message,
            "Repository host error (422): Reference already exists"
        );
    }

    #[test]
    fn test_command_error_without_exit_code() {
        let err = ReleaseError::Command {
            command: "npm test".into(),
            code: None,
        };
        assert_eq!(err.to_string(), "Command `npm test` failed with exit code none");
    }
}

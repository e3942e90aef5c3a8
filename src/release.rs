//! Release orchestration
//!
//! A run goes through these steps, strictly in order:
//!
//! 1. Read the release trigger from the head commit message
//! 2. Check the working tree is clean and the branch is allowed
//! 3. Look up the last release tag and compute the next version
//! 4. Create the tag at the head commit
//! 5. Collect commits since the last tag and validate their messages
//! 6. Run the lint/test and build commands
//! 7. Build the changelog
//! 8. Create the release
//! 9. Upload assets
//! 10. Send the notification
//!
//! The first failing step ends the run. Nothing already created on the
//! host (tag, release) is rolled back.

use std::path::PathBuf;
use tracing::{info, warn};

use crate::assets::{resolve_asset_paths, upload_assets};
use crate::changelog::{Summarizer, build_changelog};
use crate::command::CommandRunner;
use crate::commit::{CommitRecord, detect_trigger};
use crate::config::Config;
use crate::context::ActionContext;
use crate::error::{ReleaseError, Result};
use crate::git::SourceControl;
use crate::github::{ReleaseRequest, RepositoryHost};
use crate::notify::{Notifier, release_message};
use crate::output::{ReleaseReport, workflow_warning};
use crate::validation::validate_commit_messages;
use crate::version::bump_version;

/// How a successful run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The release was published
    Succeeded(ReleaseReport),
    /// The commit message carries no release trigger
    Skipped,
}

/// Drives one release run against its collaborators
pub struct Releaser<'a> {
    config: &'a Config,
    context: &'a ActionContext,
    scm: &'a dyn SourceControl,
    host: &'a dyn RepositoryHost,
    runner: &'a dyn CommandRunner,
    summarizer: Option<&'a dyn Summarizer>,
    notifier: Option<&'a dyn Notifier>,
    workdir: PathBuf,
}

impl<'a> Releaser<'a> {
    /// Create a releaser working in the current directory
    pub fn new(
        config: &'a Config,
        context: &'a ActionContext,
        scm: &'a dyn SourceControl,
        host: &'a dyn RepositoryHost,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        Self {
            config,
            context,
            scm,
            host,
            runner,
            summarizer: None,
            notifier: None,
            workdir: PathBuf::from("."),
        }
    }

    /// Ask `summarizer` for a short overview above the changelog bullets
    pub fn with_summarizer(mut self, summarizer: &'a dyn Summarizer) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Announce each published release through `notifier`
    pub fn with_notifier(mut self, notifier: &'a dyn Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Directory asset patterns are resolved against
    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = workdir.into();
        self
    }

    /// Run the whole release
    ///
    /// # Returns
    ///
    /// * `Outcome::Skipped` - no trigger in the commit message
    /// * `Outcome::Succeeded` - the release was published
    ///
    /// # Errors
    ///
    /// Any fatal step failure, see [`ReleaseError::is_fatal`].
    pub async fn run(&self) -> Result<Outcome> {
        let Some(release_type) = detect_trigger(&self.context.commit_message)? else {
            info!("No release trigger in commit message, nothing to do");
            return Ok(Outcome::Skipped);
        };
        info!(%release_type, "Release requested");

        self.check_preconditions().await?;

        let last_tag = self.host.latest_release_tag().await?;
        info!("Last tag: {}", last_tag.as_deref().unwrap_or("not found"));

        let tag = bump_version(last_tag.as_deref(), Some(release_type))?;
        info!("New tag: {}", tag);

        self.host.create_tag(&tag, &self.context.sha).await?;
        info!(sha = %self.context.sha, "Created tag {}", tag);

        self.publish(tag.clone(), last_tag).await.inspect_err(|_| {
            warn!(
                "Tag {} was created but the release did not complete; the tag is left in place",
                tag
            );
        })
    }

    /// Steps that run once the tag exists
    async fn publish(&self, tag: String, last_tag: Option<String>) -> Result<Outcome> {
        let commits = self.collect_commits(last_tag.as_deref()).await?;
        let non_conventional = validate_commit_messages(&commits);

        self.run_commands().await?;

        let changelog = build_changelog(&commits, self.summarizer).await;

        let request = ReleaseRequest {
            tag_name: tag.clone(),
            name: format!("Release {}", tag),
            body: changelog.render(),
            draft: self.config.draft_release,
            prerelease: self.config.prerelease,
        };
        let release = self.host.create_release(&request).await?;
        info!(url = %release.html_url, "Created release {}", request.name);

        let assets = if self.config.asset_patterns.is_empty() {
            Vec::new()
        } else {
            let paths = resolve_asset_paths(&self.config.asset_patterns, &self.workdir)?;
            upload_assets(self.host, &release, &paths).await?
        };

        self.notify(&tag).await;

        info!("Release {} published", tag);
        Ok(Outcome::Succeeded(ReleaseReport {
            tag,
            previous_tag: last_tag,
            release_url: release.html_url,
            assets,
            non_conventional,
        }))
    }

    async fn check_preconditions(&self) -> Result<()> {
        let status = self.scm.status().await?;
        if !status.trim().is_empty() {
            return Err(ReleaseError::Precondition(
                "Working directory is not clean (unstaged or uncommitted changes)".to_string(),
            ));
        }

        let branch = self.scm.current_branch().await?;
        let branch = branch.trim();
        if branch != self.config.allowed_branch {
            return Err(ReleaseError::Precondition(format!(
                "Releases are only allowed from branch '{}', current branch is '{}'",
                self.config.allowed_branch, branch
            )));
        }

        Ok(())
    }

    async fn collect_commits(&self, last_tag: Option<&str>) -> Result<Vec<CommitRecord>> {
        let commits = match last_tag {
            Some(base) => self.host.compare_commits(base, &self.context.sha).await?,
            None => self.host.list_commits(&self.context.sha).await?,
        };
        info!(count = commits.len(), "Collected commits");
        Ok(commits)
    }

    async fn run_commands(&self) -> Result<()> {
        if let Some(command) = &self.config.lint_and_tests_command {
            info!("Running lint and tests: {}", command);
            self.runner.run(command).await?;
        }
        if let Some(command) = &self.config.build_command {
            info!("Running build: {}", command);
            self.runner.run(command).await?;
        }
        Ok(())
    }

    async fn notify(&self, tag: &str) {
        let Some(notifier) = self.notifier else {
            return;
        };

        let message = release_message(
            tag,
            &self.context.repository.owner,
            &self.context.repository.name,
        );
        if let Err(e) = notifier.notify(&message).await {
            warn!("{}", e);
            workflow_warning(&e.to_string());
        }
    }
}

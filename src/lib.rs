//! Commit Release - Release automation driven by commit messages
//!
//! A commit whose message contains `!release: major|minor|patch` is turned
//! into a tagged, published release: the next semantic version is computed,
//! build and test commands are run, a changelog is assembled (optionally with
//! an AI summary), matching files are uploaded as assets and a webhook is
//! notified.
//!
//! # Modules
//!
//! - [`release`] - The release pipeline
//! - [`glob`] - Asset pattern matching and directory traversal
//! - [`version`] - Semantic version bumps
//! - [`commit`] - Commit records, release trigger and conventional commits
//! - [`validation`] - Advisory commit message validation
//! - [`changelog`] - Release notes assembly
//! - [`prompt`] - Summary prompt construction
//! - [`openai`] - Chat completion client
//! - [`github`] - Repository host client
//! - [`git`] - Local git queries
//! - [`command`] - Lint/test/build command execution
//! - [`assets`] - Asset resolution and upload
//! - [`notify`] - Webhook notifications
//! - [`config`] - Input loading
//! - [`context`] - CI run context
//! - [`output`] - Run reports and workflow commands
//! - [`telemetry`] - Tracing setup
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```no_run
//! use commit_release::{
//!     command::ShellRunner, config::Config, context::ActionContext, git::GitCli,
//!     github::GitHubClient, release::Releaser,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config::load(None)?;
//! let context = ActionContext::resolve(Some("acme/rocket"), Some("abc123"), Some("fix: x !release: patch"), None, None)?;
//! let host = GitHubClient::new(reqwest::Client::new(), &context.api_url, &config.github_token, context.repository.clone());
//! let git = GitCli::new(".");
//! let runner = ShellRunner::new(".");
//!
//! let outcome = Releaser::new(&config, &context, &git, &host, &runner).run().await?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

pub mod assets;
pub mod changelog;
pub mod command;
pub mod commit;
pub mod config;
pub mod context;
pub mod error;
pub mod git;
pub mod github;
pub mod glob;
pub mod notify;
pub mod openai;
pub mod output;
pub mod prompt;
pub mod release;
pub mod telemetry;
pub mod validation;
pub mod version;

pub use error::{ReleaseError, Result};
pub use release::{Outcome, Releaser};

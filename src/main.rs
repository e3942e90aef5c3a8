//! CI entry point that publishes a release when the head commit asks for one
//!
//! Reads action inputs from the environment, checks the head commit for a
//! `!release: <kind>` trigger and runs the release pipeline.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

use commit_release::{
    changelog::Summarizer,
    command::ShellRunner,
    config::Config,
    context::ActionContext,
    git::GitCli,
    github::GitHubClient,
    notify::{DiscordWebhook, Notifier},
    openai::OpenAiClient,
    output::{failure_annotation, write_step_outputs},
    release::{Outcome, Releaser},
    telemetry::init_tracing,
};

/// Command-line arguments
#[derive(Parser)]
#[command(name = "commit_release")]
#[command(about = "Tag, build and publish a release from a commit message trigger", long_about = None)]
struct Args {
    /// Print the release report as JSON
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Optional settings file (TOML); environment inputs take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Repository as owner/name
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: Option<String>,

    /// Commit to tag
    #[arg(long, env = "GITHUB_SHA")]
    sha: Option<String>,

    /// Commit message to read the trigger from (defaults to the event payload)
    #[arg(long)]
    commit_message: Option<String>,

    /// Path to the triggering event payload
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    event_path: Option<PathBuf>,

    /// REST API base URL
    #[arg(long, env = "GITHUB_API_URL")]
    api_url: Option<String>,

    /// Step output file
    #[arg(long, env = "GITHUB_OUTPUT")]
    output_file: Option<PathBuf>,

    /// Directory to run commands in and resolve asset patterns against
    #[arg(long, default_value = ".")]
    workdir: PathBuf,
}

/// Main entry point
///
/// Exits with status 0 on success or when no release was requested, and
/// with status 1 after printing an `::error::` annotation otherwise.
#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.json_logs, Level::INFO);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            println!("{}", failure_annotation(&format!("{:#}", e)));
            ExitCode::FAILURE
        }
    }
}

/// Load inputs, wire the collaborators and run the release
///
/// # Process flow
///
/// 1. Load configuration (file + environment inputs)
/// 2. Resolve the run context (repository, sha, commit message)
/// 3. Build the host, summary and notification clients
/// 4. Run the release pipeline
/// 5. Report the outcome (JSON and step outputs)
async fn run(args: Args) -> Result<()> {
    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;

    let context = ActionContext::resolve(
        args.repository.as_deref(),
        args.sha.as_deref(),
        args.commit_message.as_deref(),
        args.event_path.as_deref(),
        args.api_url.as_deref(),
    )
    .context("Failed to resolve run context")?;

    let http = reqwest::Client::builder()
        .user_agent(concat!("commit_release/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")?;

    let host = GitHubClient::new(
        http.clone(),
        &context.api_url,
        &config.github_token,
        context.repository.clone(),
    );
    let git = GitCli::new(&args.workdir);
    let runner = ShellRunner::new(&args.workdir);

    let summarizer = config
        .openai
        .as_ref()
        .map(|ai| OpenAiClient::new(http.clone(), &ai.api_key, &ai.model, &ai.base_url));
    let notifier = config
        .discord_webhook
        .as_deref()
        .map(|url| DiscordWebhook::new(http.clone(), url));

    let mut releaser =
        Releaser::new(&config, &context, &git, &host, &runner).with_workdir(&args.workdir);
    if let Some(summarizer) = &summarizer {
        releaser = releaser.with_summarizer(summarizer as &dyn Summarizer);
    }
    if let Some(notifier) = &notifier {
        releaser = releaser.with_notifier(notifier as &dyn Notifier);
    }

    match releaser.run().await? {
        Outcome::Skipped => {
            if let Some(path) = &args.output_file {
                write_step_outputs(path, &[("skipped", "true".to_string())])?;
            }
        }
        Outcome::Succeeded(report) => {
            if let Some(path) = &args.output_file {
                write_step_outputs(path, &report.step_outputs())?;
            }
            if args.json {
                println!("{}", serde_json::to_string(&report)?);
            }
        }
    }

    Ok(())
}

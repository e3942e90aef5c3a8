//! Configuration management for commit_release
//!
//! Settings come from two places, in increasing priority:
//! 1. An optional TOML file (`--config release.toml`)
//! 2. Action inputs in the environment (`INPUT_<NAME>`, then `<NAME>`)
//!
//! The result is an immutable [`Config`] built once per run.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{ReleaseError, Result};

pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_ALLOWED_BRANCH: &str = "main";

/// Optional settings file structure
///
/// # Example TOML
///
/// ```toml
/// lint_and_tests_command = "cargo test"
/// build_command = "cargo build --release"
/// asset_patterns = "target/release/mytool dist/**/*.tar.gz"
/// allowed_branch = "main"
/// prerelease = "false"
/// ```
///
/// Booleans are written as strings, like the action inputs they mirror.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub github_token: Option<String>,
    pub lint_and_tests_command: Option<String>,
    pub build_command: Option<String>,
    pub asset_patterns: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_api_model: Option<String>,
    pub openai_api_base_url: Option<String>,
    pub discord_webhook: Option<String>,
    pub allowed_branch: Option<String>,
    pub draft_release: Option<String>,
    pub prerelease: Option<String>,
}

impl ConfigFile {
    /// Value for an input name such as `BUILD_COMMAND`
    fn get(&self, name: &str) -> Option<&str> {
        let value = match name {
            "GITHUB_TOKEN" => &self.github_token,
            "LINT_AND_TESTS_COMMAND" => &self.lint_and_tests_command,
            "BUILD_COMMAND" => &self.build_command,
            "ASSET_PATTERNS" => &self.asset_patterns,
            "OPENAI_API_KEY" => &self.openai_api_key,
            "OPENAI_API_MODEL" => &self.openai_api_model,
            "OPENAI_API_BASE_URL" => &self.openai_api_base_url,
            "DISCORD_WEBHOOK" => &self.discord_webhook,
            "ALLOWED_BRANCH" => &self.allowed_branch,
            "DRAFT_RELEASE" => &self.draft_release,
            "PRERELEASE" => &self.prerelease,
            _ => &None,
        };
        value.as_deref()
    }
}

/// Read and parse a settings file
///
/// # Errors
///
/// * File does not exist or cannot be read
/// * Invalid TOML or unknown keys
pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = fs::read_to_string(path).map_err(|e| ReleaseError::filesystem(path, e))?;
    toml::from_str(&content).map_err(|e| {
        ReleaseError::Configuration(format!(
            "Failed to parse config file {} as TOML: {}",
            path.display(),
            e
        ))
    })
}

/// Language model settings for changelog summaries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiSettings {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

/// Run parameters, read once at start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub github_token: String,
    pub lint_and_tests_command: Option<String>,
    pub build_command: Option<String>,
    pub asset_patterns: Vec<String>,
    /// Present only when an API key is configured
    pub openai: Option<OpenAiSettings>,
    pub discord_webhook: Option<String>,
    pub allowed_branch: String,
    pub draft_release: bool,
    pub prerelease: bool,
}

impl Config {
    /// Build a config from an input lookup
    ///
    /// `lookup` receives upper-case input names (`GITHUB_TOKEN`, ...) and
    /// returns the raw value if any. Values are trimmed; empty means unset.
    ///
    /// # Errors
    ///
    /// * `GITHUB_TOKEN` is missing
    /// * `DRAFT_RELEASE` or `PRERELEASE` is not `true`/`false`
    pub fn from_inputs<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let input = |name: &str| -> Option<String> {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let github_token = input("GITHUB_TOKEN").ok_or_else(|| {
            ReleaseError::Configuration("Input required and not supplied: GITHUB_TOKEN".to_string())
        })?;

        let asset_patterns = input("ASSET_PATTERNS")
            .map(|raw| raw.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        let openai = input("OPENAI_API_KEY").map(|api_key| OpenAiSettings {
            api_key,
            model: input("OPENAI_API_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: input("OPENAI_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
        });

        Ok(Self {
            github_token,
            lint_and_tests_command: input("LINT_AND_TESTS_COMMAND"),
            build_command: input("BUILD_COMMAND"),
            asset_patterns,
            openai,
            discord_webhook: input("DISCORD_WEBHOOK"),
            allowed_branch: input("ALLOWED_BRANCH")
                .unwrap_or_else(|| DEFAULT_ALLOWED_BRANCH.to_string()),
            draft_release: parse_bool("DRAFT_RELEASE", input("DRAFT_RELEASE"))?,
            prerelease: parse_bool("PRERELEASE", input("PRERELEASE"))?,
        })
    }

    /// Build the config from an optional file plus the process environment
    ///
    /// # Example
    ///
    /// ```no_run
    /// use commit_release::config::Config;
    ///
    /// # fn main() -> commit_release::error::Result<()> {
    /// let config = Config::load(None)?;
    /// println!("Releasing from {}", config.allowed_branch);
    /// # Ok(())
    /// # }
    /// ```
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let file = match file {
            Some(path) => load_config_file(path)?,
            None => ConfigFile::default(),
        };

        Self::from_inputs(|name| {
            env_input(name).or_else(|| file.get(name).map(str::to_string))
        })
    }
}

/// Look up an action input: `INPUT_<NAME>` first, then `<NAME>`
fn env_input(name: &str) -> Option<String> {
    lookup_input(name, |key| std::env::var(key).ok())
}

/// Blank values count as unset so they never shadow a file value
fn lookup_input<F>(name: &str, var: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    var(&format!("INPUT_{}", name))
        .filter(|v| !v.trim().is_empty())
        .or_else(|| var(name).filter(|v| !v.trim().is_empty()))
}

fn parse_bool(name: &str, value: Option<String>) -> Result<bool> {
    match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(false),
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(_) => Err(ReleaseError::Configuration(format!(
            "Input {} must be 'true' or 'false'",
            name
        ))),
    }
}

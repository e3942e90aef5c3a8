//! Integration tests for the release pipeline with in-memory collaborators.

use async_trait::async_trait;
use std::fs;
use std::sync::Mutex;
use tempfile::TempDir;

use commit_release::changelog::Summarizer;
use commit_release::command::CommandRunner;
use commit_release::commit::CommitRecord;
use commit_release::config::Config;
use commit_release::context::{ActionContext, Repository};
use commit_release::git::SourceControl;
use commit_release::github::{ReleaseHandle, ReleaseRequest, RepositoryHost};
use commit_release::notify::Notifier;
use commit_release::{Outcome, ReleaseError, Releaser, Result};

const HEAD_SHA: &str = "fedcba9876543210";

struct FakeGit {
    status: String,
    branch: String,
}

impl FakeGit {
    fn clean(branch: &str) -> Self {
        Self {
            status: String::new(),
            branch: branch.to_string(),
        }
    }
}

#[async_trait]
impl SourceControl for FakeGit {
    async fn status(&self) -> Result<String> {
        Ok(self.status.clone())
    }

    async fn current_branch(&self) -> Result<String> {
        Ok(self.branch.clone())
    }
}

/// Records every call in order; writes are prefixed with `write:`
#[derive(Default)]
struct FakeHost {
    latest: Option<String>,
    commits: Vec<CommitRecord>,
    fail_create_tag: bool,
    calls: Mutex<Vec<String>>,
    releases: Mutex<Vec<ReleaseRequest>>,
    uploads: Mutex<Vec<(String, String, usize)>>,
}

impl FakeHost {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn writes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with("write:"))
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RepositoryHost for FakeHost {
    async fn latest_release_tag(&self) -> Result<Option<String>> {
        self.record("latest_release".to_string());
        Ok(self.latest.clone())
    }

    async fn create_tag(&self, tag: &str, sha: &str) -> Result<()> {
        self.record(format!("write:tag {} {}", tag, sha));
        if self.fail_create_tag {
            return Err(ReleaseError::HostApi {
                status: Some(422),
                message: "Reference already exists".to_string(),
            });
        }
        Ok(())
    }

    async fn compare_commits(&self, base: &str, head: &str) -> Result<Vec<CommitRecord>> {
        self.record(format!("compare {}...{}", base, head));
        Ok(self.commits.clone())
    }

    async fn list_commits(&self, head: &str) -> Result<Vec<CommitRecord>> {
        self.record(format!("list {}", head));
        Ok(self.commits.clone())
    }

    async fn create_release(&self, request: &ReleaseRequest) -> Result<ReleaseHandle> {
        self.record(format!("write:release {}", request.tag_name));
        self.releases.lock().unwrap().push(request.clone());
        Ok(ReleaseHandle {
            id: 7,
            html_url: format!("https://github.com/acme/rocket/releases/tag/{}", request.tag_name),
            upload_url: "https://uploads.github.com/repos/acme/rocket/releases/7/assets{?name,label}"
                .to_string(),
        })
    }

    async fn upload_asset(
        &self,
        release: &ReleaseHandle,
        name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<()> {
        assert_eq!(release.id, 7);
        self.record(format!("write:upload {}", name));
        self.uploads
            .lock()
            .unwrap()
            .push((name.to_string(), content_type.to_string(), data.len()));
        Ok(())
    }
}

/// Runs nothing; fails any command listed in `failing`
#[derive(Default)]
struct FakeRunner {
    failing: Vec<String>,
    ran: Mutex<Vec<String>>,
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, command: &str) -> Result<()> {
        self.ran.lock().unwrap().push(command.to_string());
        if self.failing.iter().any(|c| c == command) {
            return Err(ReleaseError::Command {
                command: command.to_string(),
                code: Some(1),
            });
        }
        Ok(())
    }
}

struct FakeSummarizer {
    result: std::result::Result<String, String>,
}

#[async_trait]
impl Summarizer for FakeSummarizer {
    async fn summarize(&self, _bullets: &str) -> Result<String> {
        self.result.clone().map_err(ReleaseError::Summary)
    }
}

#[derive(Default)]
struct FakeNotifier {
    fail: bool,
    messages: Mutex<Vec<String>>,
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        self.messages.lock().unwrap().push(message.to_string());
        if self.fail {
            return Err(ReleaseError::Notification("webhook returned 500".to_string()));
        }
        Ok(())
    }
}

fn config() -> Config {
    Config::from_inputs(|name| match name {
        "GITHUB_TOKEN" => Some("ghs_test".to_string()),
        _ => None,
    })
    .unwrap()
}

fn context(message: &str) -> ActionContext {
    ActionContext {
        repository: Repository {
            owner: "acme".to_string(),
            name: "rocket".to_string(),
        },
        sha: HEAD_SHA.to_string(),
        commit_message: message.to_string(),
        api_url: "https://api.github.com".to_string(),
    }
}

fn commit(sha: &str, message: &str, login: Option<&str>) -> CommitRecord {
    CommitRecord {
        sha: sha.to_string(),
        message: message.to_string(),
        author_name: "Alice Doe".to_string(),
        author_login: login.map(str::to_string),
    }
}

fn sample_commits() -> Vec<CommitRecord> {
    vec![
        commit("abcdef1234567", "fix: crash", Some("alice")),
        commit("1111111aaaaaa", "feat: launch !release: minor", None),
    ]
}

/// Test: first release with no extras produces 0.1.0 and a bare changelog
#[tokio::test]
async fn test_first_minor_release() {
    // Arrange
    let config = config();
    let context = context("feat: launch !release: minor");
    let git = FakeGit::clean("main");
    let host = FakeHost {
        commits: sample_commits(),
        ..Default::default()
    };
    let runner = FakeRunner::default();

    // Act
    let outcome = Releaser::new(&config, &context, &git, &host, &runner)
        .run()
        .await
        .expect("release failed");

    // Assert
    let Outcome::Succeeded(report) = outcome else {
        panic!("expected a published release");
    };
    assert_eq!(report.tag, "0.1.0");
    assert_eq!(report.previous_tag, None);
    assert!(report.assets.is_empty());
    assert!(report.non_conventional.is_empty());

    let releases = host.releases.lock().unwrap();
    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0].tag_name, "0.1.0");
    assert_eq!(releases[0].name, "Release 0.1.0");
    assert!(!releases[0].draft);
    assert!(!releases[0].prerelease);
    assert_eq!(
        releases[0].body,
        "## What's Changed\n\n- fix: crash (abcdef1) by @alice\n- feat: launch !release: minor (1111111) by @Alice Doe"
    );

    assert_eq!(
        host.calls(),
        vec![
            "latest_release".to_string(),
            format!("write:tag 0.1.0 {}", HEAD_SHA),
            format!("list {}", HEAD_SHA),
            "write:release 0.1.0".to_string(),
        ]
    );
    assert!(runner.ran.lock().unwrap().is_empty());
}

/// Test: a later release compares against the previous tag; its leading `v` is not reused
#[tokio::test]
async fn test_follow_up_release_compares_with_last_tag() {
    let config = config();
    let context = context("fix: thing\n\n!release: patch");
    let git = FakeGit::clean("main");
    let host = FakeHost {
        latest: Some("v1.2.3".to_string()),
        commits: vec![commit("2222222bbbbbb", "Quick fix", Some("bob"))],
        ..Default::default()
    };
    let runner = FakeRunner::default();

    let outcome = Releaser::new(&config, &context, &git, &host, &runner)
        .run()
        .await
        .unwrap();

    let Outcome::Succeeded(report) = outcome else {
        panic!("expected a published release");
    };
    assert_eq!(report.tag, "1.2.4");
    assert_eq!(report.previous_tag.as_deref(), Some("v1.2.3"));
    assert_eq!(report.non_conventional, vec!["Quick fix".to_string()]);
    assert!(host.calls().contains(&format!("compare v1.2.3...{}", HEAD_SHA)));
}

/// Test: no trigger means nothing touches git or the host
#[tokio::test]
async fn test_no_trigger_skips() {
    let config = config();
    let context = context("docs: typo");
    let git = FakeGit {
        status: " M dirty.txt".to_string(),
        branch: "feature".to_string(),
    };
    let host = FakeHost::default();
    let runner = FakeRunner::default();

    let outcome = Releaser::new(&config, &context, &git, &host, &runner)
        .run()
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Skipped);
    assert!(host.calls().is_empty());
}

/// Test: a malformed trigger is a configuration error
#[tokio::test]
async fn test_malformed_trigger_fails() {
    let config = config();
    let context = context("oops !release without kind");
    let git = FakeGit::clean("main");
    let host = FakeHost::default();
    let runner = FakeRunner::default();

    let result = Releaser::new(&config, &context, &git, &host, &runner)
        .run()
        .await;

    assert!(matches!(result, Err(ReleaseError::Configuration(_))));
    assert!(host.calls().is_empty());
}

/// Test: a dirty working tree aborts before any host write
#[tokio::test]
async fn test_dirty_tree_aborts_before_host_writes() {
    // Arrange
    let config = config();
    let context = context("fix: x !release: patch");
    let git = FakeGit {
        status: " M src/lib.rs\n?? notes.txt".to_string(),
        branch: "main".to_string(),
    };
    let host = FakeHost::default();
    let runner = FakeRunner::default();

    // Act
    let result = Releaser::new(&config, &context, &git, &host, &runner)
        .run()
        .await;

    // Assert
    let err = result.unwrap_err();
    assert!(matches!(err, ReleaseError::Precondition(_)));
    assert!(err.is_fatal());
    assert!(host.writes().is_empty());
    assert!(host.calls().is_empty());
}

/// Test: releasing from the wrong branch is refused
#[tokio::test]
async fn test_wrong_branch_aborts() {
    let config = config();
    let context = context("fix: x !release: patch");
    let git = FakeGit::clean("feature/login");
    let host = FakeHost::default();
    let runner = FakeRunner::default();

    let err = Releaser::new(&config, &context, &git, &host, &runner)
        .run()
        .await
        .unwrap_err();

    assert!(err.to_string().contains("feature/login"));
    assert!(host.writes().is_empty());
}

/// Test: an unparseable previous tag fails before a tag is created
#[tokio::test]
async fn test_bad_previous_tag_aborts_before_tag() {
    let config = config();
    let context = context("fix: x !release: patch");
    let git = FakeGit::clean("main");
    let host = FakeHost {
        latest: Some("nightly".to_string()),
        ..Default::default()
    };
    let runner = FakeRunner::default();

    let err = Releaser::new(&config, &context, &git, &host, &runner)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, ReleaseError::Version(_)));
    assert!(host.writes().is_empty());
}

/// Test: tag creation failure stops the run
#[tokio::test]
async fn test_tag_creation_failure_is_fatal() {
    let config = config();
    let context = context("fix: x !release: patch");
    let git = FakeGit::clean("main");
    let host = FakeHost {
        fail_create_tag: true,
        ..Default::default()
    };
    let runner = FakeRunner::default();

    let err = Releaser::new(&config, &context, &git, &host, &runner)
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, ReleaseError::HostApi { status: Some(422), .. }));
    assert_eq!(host.writes(), vec![format!("write:tag 0.0.1 {}", HEAD_SHA)]);
}

/// Test: commands run in order and a failing build stops before publishing
#[tokio::test]
async fn test_failing_build_aborts_before_release() {
    // Arrange
    let mut config = config();
    config.lint_and_tests_command = Some("npm test".to_string());
    config.build_command = Some("npm run build".to_string());
    let context = context("feat: y !release: major");
    let git = FakeGit::clean("main");
    let host = FakeHost {
        commits: sample_commits(),
        ..Default::default()
    };
    let runner = FakeRunner {
        failing: vec!["npm run build".to_string()],
        ..Default::default()
    };

    // Act
    let err = Releaser::new(&config, &context, &git, &host, &runner)
        .run()
        .await
        .unwrap_err();

    // Assert - tag exists (no rollback), release was never created
    assert!(matches!(err, ReleaseError::Command { .. }));
    assert_eq!(
        *runner.ran.lock().unwrap(),
        vec!["npm test".to_string(), "npm run build".to_string()]
    );
    assert_eq!(host.writes(), vec![format!("write:tag 1.0.0 {}", HEAD_SHA)]);
    assert!(host.releases.lock().unwrap().is_empty());
}

/// Test: a failing lint step prevents the build from running
#[tokio::test]
async fn test_failing_lint_skips_build() {
    let mut config = config();
    config.lint_and_tests_command = Some("make lint".to_string());
    config.build_command = Some("make".to_string());
    let context = context("fix: z !release: patch");
    let git = FakeGit::clean("main");
    let host = FakeHost::default();
    let runner = FakeRunner {
        failing: vec!["make lint".to_string()],
        ..Default::default()
    };

    let result = Releaser::new(&config, &context, &git, &host, &runner)
        .run()
        .await;

    assert!(result.is_err());
    assert_eq!(*runner.ran.lock().unwrap(), vec!["make lint".to_string()]);
}

/// Test: summary is prepended when available and dropped on failure
#[tokio::test]
async fn test_summary_success_and_failure() {
    let config = config();
    let context = context("feat: y !release: minor");
    let git = FakeGit::clean("main");
    let runner = FakeRunner::default();

    // Summary available
    let host = FakeHost {
        commits: sample_commits(),
        ..Default::default()
    };
    let summarizer = FakeSummarizer {
        result: Ok("<think>drafting</think>A crash fix and a launch.".to_string()),
    };
    Releaser::new(&config, &context, &git, &host, &runner)
        .with_summarizer(&summarizer)
        .run()
        .await
        .unwrap();
    let body = host.releases.lock().unwrap()[0].body.clone();
    assert!(body.starts_with("## Changelog Summary\n\nA crash fix and a launch.\n\n## What's Changed\n\n"));

    // Summary failing
    let host = FakeHost {
        commits: sample_commits(),
        ..Default::default()
    };
    let summarizer = FakeSummarizer {
        result: Err("timeout".to_string()),
    };
    let outcome = Releaser::new(&config, &context, &git, &host, &runner)
        .with_summarizer(&summarizer)
        .run()
        .await;
    assert!(matches!(outcome, Ok(Outcome::Succeeded(_))));
    let body = host.releases.lock().unwrap()[0].body.clone();
    assert!(body.starts_with("## What's Changed\n\n"));
}

/// Test: matched regular files are uploaded after the release is created
#[tokio::test]
async fn test_assets_are_uploaded_in_order() {
    // Arrange
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("dist/nested")).unwrap();
    fs::write(dir.path().join("dist/rocket.zip"), b"zipdata").unwrap();
    fs::write(dir.path().join("dist/nested/rocket.bin"), b"bin").unwrap();
    fs::write(dir.path().join("README.md"), b"readme").unwrap();

    let mut config = config();
    config.asset_patterns = vec!["dist/*.zip".to_string(), "dist/**/*.bin".to_string()];
    let context = context("feat: y !release: minor");
    let git = FakeGit::clean("main");
    let host = FakeHost::default();
    let runner = FakeRunner::default();

    // Act
    let outcome = Releaser::new(&config, &context, &git, &host, &runner)
        .with_workdir(dir.path())
        .run()
        .await
        .unwrap();

    // Assert
    let Outcome::Succeeded(report) = outcome else {
        panic!("expected a published release");
    };
    assert_eq!(
        report.assets,
        vec!["rocket.zip".to_string(), "rocket.bin".to_string()]
    );
    assert_eq!(
        *host.uploads.lock().unwrap(),
        vec![
            ("rocket.zip".to_string(), "application/zip".to_string(), 7),
            ("rocket.bin".to_string(), "application/octet-stream".to_string(), 3),
        ]
    );
    assert_eq!(
        host.writes(),
        vec![
            format!("write:tag 0.1.0 {}", HEAD_SHA),
            "write:release 0.1.0".to_string(),
            "write:upload rocket.zip".to_string(),
            "write:upload rocket.bin".to_string(),
        ]
    );
}

/// Test: draft and prerelease flags reach the release request
#[tokio::test]
async fn test_release_flags() {
    let mut config = config();
    config.draft_release = true;
    config.prerelease = true;
    let context = context("feat: y !release: minor");
    let git = FakeGit::clean("main");
    let host = FakeHost::default();
    let runner = FakeRunner::default();

    Releaser::new(&config, &context, &git, &host, &runner)
        .run()
        .await
        .unwrap();

    let releases = host.releases.lock().unwrap();
    assert!(releases[0].draft);
    assert!(releases[0].prerelease);
}

/// Test: notification is sent, and its failure does not fail the release
#[tokio::test]
async fn test_notification_failure_is_not_fatal() {
    let config = config();
    let context = context("feat: y !release: minor");
    let git = FakeGit::clean("main");
    let host = FakeHost::default();
    let runner = FakeRunner::default();
    let notifier = FakeNotifier {
        fail: true,
        ..Default::default()
    };

    let outcome = Releaser::new(&config, &context, &git, &host, &runner)
        .with_notifier(&notifier)
        .run()
        .await;

    assert!(matches!(outcome, Ok(Outcome::Succeeded(_))));
    assert_eq!(
        *notifier.messages.lock().unwrap(),
        vec![":tada: Released 0.1.0 in acme/rocket".to_string()]
    );
}

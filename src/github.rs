//! Repository host access (GitHub REST API)
//!
//! This module provides the host operations a release needs:
//! - Latest release lookup
//! - Tag reference creation
//! - Commit listing and comparison
//! - Release creation and asset upload

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::commit::CommitRecord;
use crate::context::Repository;
use crate::error::{ReleaseError, Result};

const API_VERSION: &str = "2022-11-28";
const PER_PAGE: usize = 100;

/// Parameters for a new release
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseRequest {
    pub tag_name: String,
    pub name: String,
    pub body: String,
    pub draft: bool,
    pub prerelease: bool,
}

/// A created release and its upload endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseHandle {
    pub id: u64,
    #[serde(default)]
    pub html_url: String,
    /// Upload URL template, e.g. `https://uploads.github.com/.../assets{?name,label}`
    pub upload_url: String,
}

/// Operations the release pipeline needs from the repository host
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Tag of the latest published release; `None` when there is none yet
    async fn latest_release_tag(&self) -> Result<Option<String>>;

    /// Create `refs/tags/<tag>` pointing at `sha`
    async fn create_tag(&self, tag: &str, sha: &str) -> Result<()>;

    /// Commits reachable from `head` but not from `base`
    async fn compare_commits(&self, base: &str, head: &str) -> Result<Vec<CommitRecord>>;

    /// Every commit reachable from `head`
    async fn list_commits(&self, head: &str) -> Result<Vec<CommitRecord>>;

    async fn create_release(&self, request: &ReleaseRequest) -> Result<ReleaseHandle>;

    async fn upload_asset(
        &self,
        release: &ReleaseHandle,
        name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct LatestRelease {
    tag_name: String,
}

#[derive(Debug, Deserialize)]
struct ApiCommit {
    sha: String,
    commit: ApiCommitDetail,
    #[serde(default)]
    author: Option<ApiUser>,
}

#[derive(Debug, Deserialize)]
struct ApiCommitDetail {
    message: String,
    #[serde(default)]
    author: Option<ApiGitAuthor>,
}

#[derive(Debug, Deserialize)]
struct ApiGitAuthor {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct Comparison {
    #[serde(default)]
    commits: Vec<ApiCommit>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl From<ApiCommit> for CommitRecord {
    fn from(api: ApiCommit) -> Self {
        CommitRecord {
            sha: api.sha,
            message: api.commit.message,
            author_name: api.commit.author.map(|a| a.name).unwrap_or_default(),
            author_login: api.author.map(|u| u.login),
        }
    }
}

/// GitHub REST client bound to one repository
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
    repository: Repository,
}

impl GitHubClient {
    /// Create a client for `repository` against `api_url` (usually `https://api.github.com`)
    pub fn new(http: reqwest::Client, api_url: &str, token: &str, repository: Repository) -> Self {
        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            repository,
        }
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_url, self.repository.owner, self.repository.name, path
        )
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static(API_VERSION),
        );
        headers
    }

    async fn get(&self, url: &str) -> Result<Response> {
        debug!(%url, "GET");
        let response = self
            .http
            .get(url)
            .headers(self.headers())
            .bearer_auth(&self.token)
            .send()
            .await?;
        Ok(response)
    }

    async fn post_json<T: Serialize + ?Sized + Sync>(&self, url: &str, body: &T) -> Result<Response> {
        debug!(%url, "POST");
        let response = self
            .http
            .post(url)
            .headers(self.headers())
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        Ok(response)
    }
}

/// Turn a non-success response into a host error
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&text)
        .map(|body| body.message)
        .unwrap_or(text);

    Err(ReleaseError::host(Some(status.as_u16()), message))
}

/// Strip the RFC 6570 `{?name,label}` suffix from an upload URL template
pub fn upload_endpoint(upload_url: &str) -> &str {
    upload_url.split('{').next().unwrap_or(upload_url)
}

#[async_trait]
impl RepositoryHost for GitHubClient {
    async fn latest_release_tag(&self) -> Result<Option<String>> {
        let response = self.get(&self.repo_url("releases/latest")).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let latest: LatestRelease = ensure_success(response).await?.json().await?;
        Ok(Some(latest.tag_name))
    }

    async fn create_tag(&self, tag: &str, sha: &str) -> Result<()> {
        let body = serde_json::json!({
            "ref": format!("refs/tags/{}", tag),
            "sha": sha,
        });
        let response = self.post_json(&self.repo_url("git/refs"), &body).await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn compare_commits(&self, base: &str, head: &str) -> Result<Vec<CommitRecord>> {
        let url = self.repo_url(&format!("compare/{}...{}", base, head));
        let comparison: Comparison = ensure_success(self.get(&url).await?).await?.json().await?;
        Ok(comparison.commits.into_iter().map(CommitRecord::from).collect())
    }

    async fn list_commits(&self, head: &str) -> Result<Vec<CommitRecord>> {
        let mut commits = Vec::new();
        let mut page = 1;

        loop {
            let url = format!(
                "{}?sha={}&per_page={}&page={}",
                self.repo_url("commits"),
                head,
                PER_PAGE,
                page
            );
            let batch: Vec<ApiCommit> = ensure_success(self.get(&url).await?).await?.json().await?;
            let count = batch.len();
            commits.extend(batch.into_iter().map(CommitRecord::from));

            if count < PER_PAGE {
                break;
            }
            page += 1;
        }

        Ok(commits)
    }

    async fn create_release(&self, request: &ReleaseRequest) -> Result<ReleaseHandle> {
        let response = self.post_json(&self.repo_url("releases"), request).await?;
        let handle: ReleaseHandle = ensure_success(response).await?.json().await?;
        Ok(handle)
    }

    async fn upload_asset(
        &self,
        release: &ReleaseHandle,
        name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<()> {
        let url = upload_endpoint(&release.upload_url);
        debug!(%url, %name, size = data.len(), "Uploading asset");

        let content_type = HeaderValue::from_str(content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

        let response = self
            .http
            .post(url)
            .headers(self.headers())
            .bearer_auth(&self.token)
            .query(&[("name", name)])
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, data.len())
            .body(data)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

//! Release notifications over a chat webhook

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{ReleaseError, Result};

/// Delivers a one-line release announcement
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send `message`; any delivery failure is a notification error
    async fn notify(&self, message: &str) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

/// Discord-compatible webhook (`POST {"content": ...}`)
pub struct DiscordWebhook {
    http: reqwest::Client,
    url: String,
}

impl DiscordWebhook {
    /// Webhook posting to `url` (the full Discord webhook URL, token included)
    pub fn new(http: reqwest::Client, url: &str) -> Self {
        Self {
            http,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for DiscordWebhook {
    async fn notify(&self, message: &str) -> Result<()> {
        let response = self
            .http
            .post(&self.url)
            .json(&WebhookPayload { content: message })
            .send()
            .await
            .map_err(|e| ReleaseError::Notification(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReleaseError::Notification(format!(
                "Webhook returned {}",
                status
            )));
        }

        Ok(())
    }
}

/// Announcement text for a published release
pub fn release_message(tag: &str, owner: &str, repo: &str) -> String {
    format!(":tada: Released {} in {}/{}", tag, owner, repo)
}

//! Push notifications through an ntfy server

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{error, info};

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// ntfy message priority (1 = min, 5 = max)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Priority(u8);

impl Priority {
    pub const LOG: Priority = Priority(3);
    pub const URGENT: Priority = Priority(5);

    /// Clamp into the 1–5 range ntfy accepts
    pub fn new(level: u8) -> Self {
        Self(level.clamp(1, 5))
    }

    pub fn level(self) -> u8 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub topic: String,
    pub title: String,
    pub message: String,
    pub priority: Priority,
}

/// Fire-and-forget notification delivery.
///
/// `send` reports delivery as a boolean and never fails the caller.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, notification: &Notification) -> bool;
}

/// Credentials and server of an ntfy instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NtfyCredentials {
    pub server_url: String,
    pub username: String,
    pub password: String,
}

pub struct NtfyNotifier {
    client: Client,
    credentials: NtfyCredentials,
}

impl NtfyNotifier {
    pub fn new(credentials: NtfyCredentials) -> Self {
        Self {
            client: Client::new(),
            credentials,
        }
    }

    fn publish_url(&self, topic: &str) -> String {
        format!("{}/{}", self.credentials.server_url.trim_end_matches('/'), topic)
    }
}

/// Header values cannot carry line breaks
fn header_safe(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

#[async_trait]
impl NotificationSink for NtfyNotifier {
    async fn send(&self, notification: &Notification) -> bool {
        let creds = &self.credentials;
        let required = [
            creds.server_url.as_str(),
            creds.username.as_str(),
            creds.password.as_str(),
            notification.topic.as_str(),
            notification.title.as_str(),
            notification.message.as_str(),
        ];
        if required.iter().any(|v| v.is_empty()) {
            error!("Missing required arguments for sending notification");
            return false;
        }

        let url = self.publish_url(&notification.topic);
        info!("Sending notification to {}", url);

        let result = self
            .client
            .post(&url)
            .basic_auth(&creds.username, Some(&creds.password))
            .header("Title", header_safe(&notification.title))
            .header("Priority", notification.priority.level().to_string())
            .body(notification.message.clone())
            .timeout(SEND_TIMEOUT)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                info!("Notification sent (status {})", response.status());
                true
            }
            Ok(response) => {
                error!(
                    "Notification to {} rejected with status {}",
                    url,
                    response.status()
                );
                false
            }
            Err(e) => {
                error!("Request failed sending notification to {}: {}", url, e);
                false
            }
        }
    }
}

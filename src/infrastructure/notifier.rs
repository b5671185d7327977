//! Outbound restock notifications
//!
//! The core only needs a fire-and-forget `notify(name, url)` contract.
//! Delivery failures are reported to the caller, which logs them and moves on.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::constants::notify;

#[derive(Error, Debug, Clone)]
pub enum NotifyError {
    #[error("Webhook request failed: {0}")]
    Transport(String),

    #[error("Webhook rejected the message with status {status}")]
    Status { status: u16 },

    #[error("Notifier configuration error: {0}")]
    Configuration(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, product_name: &str, url: &str) -> Result<(), NotifyError>;
}

/// Notifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    /// Webhook endpoint; when unset notifications are only logged
    pub webhook_url: Option<String>,
    /// Display name attached to webhook posts
    pub username: String,
    pub timeout_seconds: u64,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            username: notify::WEBHOOK_USERNAME.to_string(),
            timeout_seconds: 10,
        }
    }
}

/// Discord-compatible webhook message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookMessage {
    pub content: String,
    pub username: String,
}

impl WebhookMessage {
    #[must_use]
    pub fn restock(product_name: &str, url: &str, username: &str) -> Self {
        Self {
            content: format!("🔔 **{product_name} is back in stock!**\n{url}"),
            username: username.to_string(),
        }
    }
}

/// Posts restock messages to a webhook
pub struct WebhookNotifier {
    client: Client,
    webhook_url: String,
    username: String,
}

impl WebhookNotifier {
    pub fn new(webhook_url: impl Into<String>, config: &NotifierConfig) -> Result<Self, NotifyError> {
        let webhook_url = webhook_url.into();
        url::Url::parse(&webhook_url)
            .map_err(|e| NotifyError::Configuration(format!("invalid webhook URL: {e}")))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| NotifyError::Configuration(e.to_string()))?;

        Ok(Self {
            client,
            webhook_url,
            username: config.username.clone(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, product_name: &str, url: &str) -> Result<(), NotifyError> {
        let message = WebhookMessage::restock(product_name, url, &self.username);

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&message)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status {
                status: status.as_u16(),
            });
        }

        info!("✅ Alert sent for {}: {}", product_name, status.as_u16());
        Ok(())
    }
}

/// Stand-in used when no webhook is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, product_name: &str, url: &str) -> Result<(), NotifyError> {
        info!("🔔 {} is back in stock! {}", product_name, url);
        debug!("No webhook configured; notification logged only");
        Ok(())
    }
}

/// Build the notifier described by the configuration
pub fn build_notifier(config: &NotifierConfig) -> Result<Box<dyn Notifier>, NotifyError> {
    match config.webhook_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => Ok(Box::new(WebhookNotifier::new(url, config)?)),
        _ => Ok(Box::new(LogNotifier)),
    }
}

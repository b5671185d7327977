//! HTTP document fetcher with rate limiting and error classification
//!
//! Fetches product pages with a browser-like client identification and a
//! fixed timeout. Every failure is reported as a [`FetchError`]; nothing
//! panics and nothing is retried here. Retry policy belongs to the caller,
//! which simply tries again next cycle.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, direct::NotKeyed},
};
use reqwest::{
    Client,
    header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::constants::polling;

/// HTTP client configuration for document fetching
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    /// Aggregate request budget shared by every check
    pub max_requests_per_minute: u32,
    pub follow_redirects: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: polling::USER_AGENT.to_string(),
            timeout_seconds: polling::REQUEST_TIMEOUT_SECONDS,
            max_requests_per_minute: polling::MAX_REQUESTS_PER_MINUTE,
            follow_redirects: true,
        }
    }
}

/// One fetched document, owned by a single check cycle
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub url: String,
    pub body: String,
    pub fetched_at: DateTime<Utc>,
    pub http_status: u16,
}

impl RawDocument {
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
            fetched_at: Utc::now(),
            http_status: 200,
        }
    }

    #[must_use]
    pub const fn with_fetched_at(mut self, fetched_at: DateTime<Utc>) -> Self {
        self.fetched_at = fetched_at;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Network,
    Timeout,
    HttpStatus,
    Cancelled,
}

#[derive(Error, Debug, Clone)]
pub enum FetchError {
    #[error("Network error while fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("Request timed out after {timeout_seconds}s: {url}")]
    Timeout { url: String, timeout_seconds: u64 },

    #[error("HTTP request failed with status {status}: {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Request cancelled: {url}")]
    Cancelled { url: String },
}

impl FetchError {
    #[must_use]
    pub const fn kind(&self) -> FetchErrorKind {
        match self {
            Self::Network { .. } => FetchErrorKind::Network,
            Self::Timeout { .. } => FetchErrorKind::Timeout,
            Self::HttpStatus { .. } => FetchErrorKind::HttpStatus,
            Self::Cancelled { .. } => FetchErrorKind::Cancelled,
        }
    }

    /// Whether the next cycle has a reasonable chance of succeeding
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Network { .. } | Self::Timeout { .. } => true,
            Self::HttpStatus { status, .. } => *status >= 500 || *status == 429 || *status == 403,
            Self::Cancelled { .. } => false,
        }
    }

    fn from_reqwest(url: &str, timeout_seconds: u64, error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
                timeout_seconds,
            }
        } else if let Some(status) = error.status() {
            Self::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            Self::Network {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

/// Anything that can produce the raw document behind a product locator
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(
        &self,
        locator: &str,
        cancellation_token: &CancellationToken,
    ) -> Result<RawDocument, FetchError>;
}

/// Rate-limited HTTP client for product pages
pub struct HttpClient {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration
    pub fn new(config: HttpClientConfig) -> anyhow::Result<Self> {
        use anyhow::Context;

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .context("Failed to create HTTP client")?;

        // Evenly spaced requests, no initial burst
        let quota = Quota::per_minute(
            NonZeroU32::new(config.max_requests_per_minute)
                .context("Rate limit must be greater than 0")?,
        )
        .allow_burst(NonZeroU32::MIN);

        info!(
            "HTTP client ready: timeout={}s, budget={} req/min",
            config.timeout_seconds, config.max_requests_per_minute
        );

        Ok(Self {
            client,
            rate_limiter: RateLimiter::direct(quota),
            config,
        })
    }

    async fn fetch_uncancelled(&self, url: &str) -> Result<RawDocument, FetchError> {
        let timeout_seconds = self.config.timeout_seconds;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, timeout_seconds, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, timeout_seconds, &e))?;

        Ok(RawDocument {
            url: url.to_string(),
            body,
            fetched_at: Utc::now(),
            http_status: status.as_u16(),
        })
    }
}

#[async_trait]
impl DocumentSource for HttpClient {
    async fn fetch(
        &self,
        locator: &str,
        cancellation_token: &CancellationToken,
    ) -> Result<RawDocument, FetchError> {
        let cancelled = || FetchError::Cancelled {
            url: locator.to_string(),
        };

        if cancellation_token.is_cancelled() {
            return Err(cancelled());
        }

        tokio::select! {
            () = self.rate_limiter.until_ready() => {},
            () = cancellation_token.cancelled() => return Err(cancelled()),
        }

        debug!("Fetching URL: {}", locator);

        let document = tokio::select! {
            result = self.fetch_uncancelled(locator) => result,
            () = cancellation_token.cancelled() => {
                warn!("🛑 HTTP request cancelled for URL: {}", locator);
                Err(cancelled())
            }
        }?;

        debug!(
            "Successfully fetched: {} ({}, {} chars)",
            locator,
            document.http_status,
            document.body.len()
        );
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one connection on loopback. `respond` gets the raw request
    /// head; `None` keeps the connection open without answering.
    async fn serve_once<F>(respond: F) -> String
    where
        F: FnOnce(&str) -> Option<String> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }

            match respond(&String::from_utf8_lossy(&request)) {
                Some(response) => {
                    socket.write_all(response.as_bytes()).await.unwrap();
                    let _ = socket.shutdown().await;
                }
                None => tokio::time::sleep(Duration::from_secs(5)).await,
            }
        });

        format!("http://{addr}/p/-/A-1")
    }

    fn http_response(status_line: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    #[tokio::test]
    async fn test_server_error_becomes_status_error() {
        let url = serve_once(|_| Some(http_response("503 Service Unavailable", "busy"))).await;
        let client = HttpClient::new(HttpClientConfig::default()).unwrap();

        let err = client.fetch(&url, &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, FetchError::HttpStatus { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_stalled_server_times_out() {
        let url = serve_once(|_| None).await;
        let client = HttpClient::new(HttpClientConfig {
            timeout_seconds: 1,
            ..Default::default()
        })
        .unwrap();

        let err = client.fetch(&url, &CancellationToken::new()).await.unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_request_budget_has_no_initial_burst() {
        let first = serve_once(|_| Some(http_response("200 OK", "one"))).await;
        let second = serve_once(|_| Some(http_response("200 OK", "two"))).await;
        let client = HttpClient::new(HttpClientConfig {
            max_requests_per_minute: 120,
            ..Default::default()
        })
        .unwrap();
        let token = CancellationToken::new();

        let started = std::time::Instant::now();
        client.fetch(&first, &token).await.unwrap();
        client.fetch(&second, &token).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_configured_user_agent_is_sent() {
        let url = serve_once(|request| Some(http_response("200 OK", request))).await;
        let client = HttpClient::new(HttpClientConfig {
            user_agent: "restock-test-agent/1.0".to_string(),
            ..Default::default()
        })
        .unwrap();

        let document = client.fetch(&url, &CancellationToken::new()).await.unwrap();
        assert_eq!(document.http_status, 200);
        assert!(document
            .body
            .to_lowercase()
            .contains("user-agent: restock-test-agent/1.0"));
    }

    #[tokio::test]
    async fn test_http_client_creation() {
        let client = HttpClient::new(HttpClientConfig::default());
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_zero_rate_limit_is_rejected() {
        let config = HttpClientConfig {
            max_requests_per_minute: 0,
            ..Default::default()
        };
        assert!(HttpClient::new(config).is_err());
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits() {
        let client = HttpClient::new(HttpClientConfig::default()).unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let err = client
            .fetch("https://www.target.com/p/-/A-1", &token)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FetchErrorKind::Cancelled);
    }

    #[test]
    fn test_status_errors_are_classified() {
        let unavailable = FetchError::HttpStatus {
            url: "u".into(),
            status: 503,
        };
        let not_found = FetchError::HttpStatus {
            url: "u".into(),
            status: 404,
        };
        assert_eq!(unavailable.kind(), FetchErrorKind::HttpStatus);
        assert!(unavailable.is_recoverable());
        assert!(!not_found.is_recoverable());
        assert!(unavailable.to_string().contains("503"));
    }
}

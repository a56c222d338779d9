//! HTTP client trait and implementations.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::FetchError;

use super::is_host_allowed;
use super::rate_limiter::RateLimiter;

/// Trait for HTTP clients, enabling mockability in tests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetch the complete body of a URL. Never returns a partial body.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Configuration for [`WebClient`].
#[derive(Clone)]
pub struct WebClientBuilder {
    rate_limit_ms: u64,
    timeout: Duration,
    user_agent: String,
    max_body_bytes: usize,
    allowed_hosts: Option<Vec<String>>,
}

impl Default for WebClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WebClientBuilder {
    /// Create a new builder with default settings.
    ///
    /// Environment variables:
    /// - `ESSENSPLAN_HTTP_TIMEOUT_SECS`: request timeout (default 30)
    /// - `ESSENSPLAN_FETCH_ALLOWED_HOSTS`: comma-separated allow-list of hosts
    pub fn new() -> Self {
        let timeout_secs = std::env::var("ESSENSPLAN_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        let allowed_hosts = std::env::var("ESSENSPLAN_FETCH_ALLOWED_HOSTS")
            .ok()
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            });

        Self {
            rate_limit_ms: 200,
            timeout: Duration::from_secs(timeout_secs),
            user_agent: "Mozilla/5.0 (compatible; Essensplan/1.0)".to_string(),
            max_body_bytes: crate::image::DEFAULT_MAX_IMAGE_BYTES,
            allowed_hosts,
        }
    }

    /// Set the rate limit delay in milliseconds. 0 disables rate limiting.
    pub fn rate_limit_ms(mut self, ms: u64) -> Self {
        self.rate_limit_ms = ms;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Reject bodies larger than this many bytes.
    pub fn max_body_bytes(mut self, max: usize) -> Self {
        self.max_body_bytes = max;
        self
    }

    /// Restrict fetches to these hosts (`host` or `host:port`).
    pub fn allowed_hosts(mut self, hosts: Option<Vec<String>>) -> Self {
        self.allowed_hosts = hosts;
        self
    }

    pub fn build(self) -> Result<WebClient, FetchError> {
        let inner = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()?;

        Ok(WebClient {
            inner,
            rate_limiter: RateLimiter::new(Duration::from_millis(self.rate_limit_ms)),
            max_body_bytes: self.max_body_bytes,
            allowed_hosts: self.allowed_hosts,
        })
    }
}

/// Production HTTP client with per-host rate limiting and a body size cap.
pub struct WebClient {
    inner: reqwest::Client,
    rate_limiter: RateLimiter,
    max_body_bytes: usize,
    allowed_hosts: Option<Vec<String>>,
}

impl WebClient {
    /// Create a new client with default configuration.
    pub fn new() -> Result<Self, FetchError> {
        WebClientBuilder::new().build()
    }

    pub fn builder() -> WebClientBuilder {
        WebClientBuilder::new()
    }
}

#[async_trait]
impl HttpClient for WebClient {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        is_host_allowed(url, self.allowed_hosts.as_deref())?;
        let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        if let Some(host) = parsed.host_str() {
            self.rate_limiter.wait(host).await;
        }

        tracing::debug!(url, "network: fetching");
        let response = self.inner.get(parsed).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url, status = %status, "network: request failed");
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        if let Some(len) = response.content_length() {
            if len as usize > self.max_body_bytes {
                return Err(FetchError::TooLarge {
                    size: len as usize,
                    max: self.max_body_bytes,
                });
            }
        }

        // bytes() only resolves once the whole body has arrived
        let bytes = response.bytes().await?.to_vec();
        if bytes.len() > self.max_body_bytes {
            return Err(FetchError::TooLarge {
                size: bytes.len(),
                max: self.max_body_bytes,
            });
        }

        tracing::debug!(url, size = bytes.len(), "network: fetched successfully");
        Ok(bytes)
    }
}

/// Mock response for testing.
#[derive(Clone)]
pub enum MockResponse {
    Bytes(Vec<u8>),
    Status(u16),
    Error(String),
}

/// Mock HTTP client for testing.
pub struct MockClient {
    responses: HashMap<String, MockResponse>,
}

impl MockClient {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
        }
    }

    /// Add a response for a URL.
    pub fn with_response(mut self, url: &str, response: MockResponse) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    pub fn with_bytes(self, url: &str, bytes: Vec<u8>) -> Self {
        self.with_response(url, MockResponse::Bytes(bytes))
    }

    /// Respond to a URL with a non-success HTTP status.
    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.with_response(url, MockResponse::Status(status))
    }

    pub fn with_error(self, url: &str, error: &str) -> Self {
        self.with_response(url, MockResponse::Error(error.to_string()))
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for MockClient {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        match self.responses.get(url) {
            Some(MockResponse::Bytes(bytes)) => Ok(bytes.clone()),
            Some(MockResponse::Status(status)) => Err(FetchError::Status {
                status: *status,
                url: url.to_string(),
            }),
            Some(MockResponse::Error(e)) => Err(FetchError::Unavailable(e.clone())),
            None => Err(FetchError::Status {
                status: 404,
                url: url.to_string(),
            }),
        }
    }
}

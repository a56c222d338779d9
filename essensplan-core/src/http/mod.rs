//! Outbound HTTP for remote images.
//!
//! All outgoing fetches go through [`HttpClient`] so that staging can be
//! exercised against [`MockClient`] in tests.

mod client;
mod rate_limiter;

pub use client::{HttpClient, MockClient, MockResponse, WebClient, WebClientBuilder};
pub use rate_limiter::RateLimiter;

use crate::error::FetchError;

/// Check that a URL is http(s) with a host, and that the host is on the
/// allow-list when one is configured.
pub fn is_host_allowed(url: &str, allowed_hosts: Option<&[String]>) -> Result<(), FetchError> {
    let parsed = url::Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(FetchError::InvalidUrl(format!(
            "Unsupported scheme: {}",
            parsed.scheme()
        )));
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| FetchError::InvalidUrl("No host in URL".to_string()))?;

    if let Some(allowed) = allowed_hosts {
        let host_with_port = match parsed.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        if !allowed
            .iter()
            .any(|h| *h == host_with_port || *h == host)
        {
            return Err(FetchError::HostNotAllowed(host_with_port));
        }
    }

    Ok(())
}

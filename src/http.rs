//! HTTP fetch capability.
//!
//! Remote calls go through the [`HttpFetch`] trait so the platform client,
//! token probing and the content cache can be exercised against fakes.
//! [`ReqwestFetcher`] is the production implementation over a blocking
//! reqwest client.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::error::{PagemirrorError, Result};

/// Response from a remote GET.
///
/// Non-2xx statuses are data, not errors: decoding decides what they mean.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, decoded as text.
    pub body: String,
    /// Content-Type header if present.
    pub content_type: Option<String>,
}

impl HttpResponse {
    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking HTTP GET supplied by the host.
///
/// Implementations return `Err` only for transport failures (DNS, refused
/// connection, timeout); an HTTP error status is a successful fetch.
pub trait HttpFetch: Send + Sync {
    /// Fetch `url` with the given request headers.
    fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse>;
}

/// Production fetcher over `reqwest::blocking`.
pub struct ReqwestFetcher {
    client: Client,
    timeout: Duration,
}

impl ReqwestFetcher {
    /// Create a fetcher with the default 30-second timeout.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create a fetcher with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .user_agent(concat!("pagemirror/", env!("CARGO_PKG_VERSION")))
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            timeout,
        }
    }

    /// Get the configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for ReqwestFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetch for ReqwestFetcher {
    fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = request.send().map_err(|e| PagemirrorError::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let body = response.text().map_err(|e| PagemirrorError::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        tracing::debug!("GET {} -> {}", url, status);

        Ok(HttpResponse {
            status,
            body,
            content_type,
        })
    }
}

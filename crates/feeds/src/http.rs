//! Shared HTTP client for all fetchers.
//!
//! Every request is bounded by the configured timeout. Retries are off by
//! default; when enabled only transient failures are retried, with
//! exponential backoff and random jitter.

use crate::error::{truncate_body, FetchError, FetchResult, MAX_ERROR_BODY_CHARS};
use rand::Rng;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Default User-Agent for API requests.
pub const USER_AGENT: &str = concat!("usd1-report/", env!("CARGO_PKG_VERSION"));

/// Headers for endpoints that reject non-browser clients.
pub const BROWSER_HEADERS: &[(&str, &str)] = &[
    ("User-Agent", "Mozilla/5.0"),
    ("Accept", "application/json"),
];

/// Backoff curve between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    pub base: Duration,
    pub factor: f64,
    pub max: Duration,
    /// Add up to 50% random extra delay
    pub jitter: bool,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            factor: 2.0,
            max: Duration::from_secs(8),
            jitter: true,
        }
    }
}

impl Backoff {
    /// Delay before retry number `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let seconds = self.base.as_secs_f64() * self.factor.powi(attempt as i32);
        let capped = seconds.min(self.max.as_secs_f64());
        let scale = if self.jitter {
            1.0 + rand::thread_rng().gen_range(0.0..=0.5)
        } else {
            1.0
        };
        Duration::from_secs_f64(capped * scale)
    }
}

/// Retry policy applied to every GET.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RetryPolicy {
    /// Retries after the first attempt; zero disables retrying
    pub max_retries: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }
}

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Per-request timeout
    pub timeout: Duration,
    pub user_agent: String,
    pub retry: RetryPolicy,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            user_agent: USER_AGENT.to_string(),
            retry: RetryPolicy::none(),
        }
    }
}

/// JSON-over-HTTP client shared by the fetchers.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(config: &HttpConfig) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Network {
                url: String::new(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            retry: config.retry,
        })
    }

    /// GET a URL and parse the body as JSON.
    pub async fn get_json(&self, url: &str) -> FetchResult<Value> {
        self.get_json_with_headers(url, &[]).await
    }

    /// GET a URL with extra headers and parse the body as JSON.
    pub async fn get_json_with_headers(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> FetchResult<Value> {
        let mut attempt = 0;
        loop {
            match self.get_once(url, headers).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    let floor = e.suggested_retry_delay().unwrap_or_default();
                    let delay = self.retry.backoff.delay(attempt).max(floor);
                    warn!(
                        url = url,
                        attempt = attempt + 1,
                        max_retries = self.retry.max_retries,
                        error = %e,
                        "Request failed, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_once(&self, url: &str, headers: &[(&str, &str)]) -> FetchResult<Value> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: truncate_body(&body, MAX_ERROR_BODY_CHARS),
            });
        }

        debug!(url = url, bytes = body.len(), "Fetched");
        parse_json(url, &body)
    }
}

/// Parse a response body, mapping syntax errors to `FetchError::Malformed`.
pub fn parse_json(url: &str, body: &str) -> FetchResult<Value> {
    serde_json::from_str(body).map_err(|e| FetchError::Malformed {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

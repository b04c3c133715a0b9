//! Page fetching with retry, pacing and identity rotation.
//!
//! [`PageSource`] is the seam the collector and processor depend on; tests
//! substitute in-memory sources. [`HttpFetcher`] is the production source.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, DNT, HeaderMap, HeaderValue, UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};

use crate::config::FetchConfig;
use crate::error::{Error, FetchError, FetchFailure, Result};
use crate::retry::retry_with_backoff;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Fallback identity when the configured pool is empty
const FALLBACK_USER_AGENT: &str = concat!("lyrics-harvest/", env!("CARGO_PKG_VERSION"));

/// Abstraction over page retrieval, enabling testability.
///
/// Implementations own their retry behaviour and never panic: every failure
/// comes back as a [`FetchFailure`].
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the page at `url` and return its decoded body
    async fn fetch(&self, url: &str) -> std::result::Result<String, FetchFailure>;
}

/// Production [`PageSource`] over HTTP GET.
pub struct HttpFetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Build a fetcher with browser-like default headers and the configured timeout
    pub fn new(config: FetchConfig) -> Result<Self> {
        let accept_language =
            HeaderValue::from_str(&config.accept_language).map_err(|e| Error::Config {
                message: format!("invalid Accept-Language value: {}", e),
                key: Some("fetch.accept_language".to_string()),
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, accept_language);
        headers.insert(DNT, HeaderValue::from_static("1"));
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    fn pick_user_agent(&self) -> &str {
        self.config
            .user_agents
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or(FALLBACK_USER_AGENT)
    }

    async fn attempt(&self, url: &str) -> std::result::Result<String, FetchError> {
        self.config.request_delay.sleep().await;

        let user_agent = self.pick_user_agent();
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl PageSource for HttpFetcher {
    async fn fetch(&self, url: &str) -> std::result::Result<String, FetchFailure> {
        retry_with_backoff(&self.config.retry, |attempt| async move {
            tracing::debug!(url, attempt, "Fetching page");
            self.attempt(url).await
        })
        .await
        .map_err(|e| FetchFailure {
            url: url.to_string(),
            attempts: e.attempts,
            last_error: e.error,
        })
    }
}

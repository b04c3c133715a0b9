//! Configuration types for lyrics-harvest
//!
//! Every knob has a default tuned for the erlar.ru catalog, so
//! `Config::default()` is a working configuration. Durations are serialized as
//! fractional seconds.

use crate::error::{Error, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration
///
/// Fields are grouped by the component that reads them:
/// - [`collect`](CollectConfig): catalog location and pagination
/// - [`fetch`](FetchConfig): HTTP behaviour, retries, identity rotation
/// - [`process`](ProcessConfig): artifact output and per-item pacing
/// - [`batch`](BatchConfig): orchestrator limits
/// - [`persistence`](PersistenceConfig): record store and index locations
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Catalog discovery settings
    #[serde(default)]
    pub collect: CollectConfig,

    /// HTTP fetch settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Item processing settings
    #[serde(default)]
    pub process: ProcessConfig,

    /// Batch orchestration settings
    #[serde(default)]
    pub batch: BatchConfig,

    /// Storage locations
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl Config {
    /// Load configuration from a JSON file and validate it
    ///
    /// Missing fields take their defaults, so a file containing `{}` is valid.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.fetch.retry.max_attempts == 0 {
            return Err(config_error(
                "max_attempts must be at least 1",
                "fetch.retry.max_attempts",
            ));
        }
        if self.fetch.user_agents.is_empty() {
            return Err(config_error(
                "user agent pool must not be empty",
                "fetch.user_agents",
            ));
        }
        for (key, range) in [
            ("fetch.request_delay", &self.fetch.request_delay),
            ("fetch.retry.backoff", &self.fetch.retry.backoff),
            ("collect.page_delay", &self.collect.page_delay),
        ] {
            if range.min > range.max {
                return Err(config_error("delay range min exceeds max", key));
            }
        }
        if self.collect.start_page > self.collect.max_page {
            return Err(config_error(
                "start_page must not exceed max_page",
                "collect.start_page",
            ));
        }
        if self.batch.batch_size == 0 {
            return Err(config_error(
                "batch_size must be at least 1",
                "batch.batch_size",
            ));
        }
        url::Url::parse(&self.collect.base_url).map_err(|e| Error::Config {
            message: format!("invalid base_url: {}", e),
            key: Some("collect.base_url".to_string()),
        })?;
        Ok(())
    }

    /// Zero every deliberate pause and backoff
    ///
    /// Used by tests and when harvesting from a local mirror.
    pub fn without_delays(mut self) -> Self {
        self.fetch.request_delay = DelayRange::ZERO;
        self.fetch.retry.backoff = DelayRange::ZERO;
        self.collect.page_delay = DelayRange::ZERO;
        self.process.item_delay = Duration::ZERO;
        self.batch.pause = Duration::ZERO;
        self
    }
}

fn config_error(message: &str, key: &str) -> Error {
    Error::Config {
        message: message.to_string(),
        key: Some(key.to_string()),
    }
}

/// Uniform random delay range
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    /// Lower bound (inclusive)
    #[serde(with = "duration_serde")]
    pub min: Duration,

    /// Upper bound (inclusive)
    #[serde(with = "duration_serde")]
    pub max: Duration,
}

impl DelayRange {
    /// A range that always yields zero
    pub const ZERO: DelayRange = DelayRange {
        min: Duration::ZERO,
        max: Duration::ZERO,
    };

    /// Range between two fractional second values
    pub fn from_secs_f64(min: f64, max: f64) -> Self {
        Self {
            min: Duration::from_secs_f64(min),
            max: Duration::from_secs_f64(max),
        }
    }

    /// Draw a delay uniformly from the range
    pub fn sample(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let secs = rand::thread_rng().gen_range(self.min.as_secs_f64()..=self.max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    /// Sleep for a sampled delay, skipping the timer entirely for zero
    pub async fn sleep(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Retry policy for page fetches
///
/// `max_attempts` counts every request, the first one included: with the
/// default of 3 an always-failing endpoint sees exactly three requests.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts per fetch (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Randomized pause between attempts (default: 2–5 seconds)
    #[serde(default = "default_backoff")]
    pub backoff: DelayRange,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff: default_backoff(),
        }
    }
}

/// Catalog discovery configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollectConfig {
    /// Listing URL; pages are addressed as `{base_url}?page={n}`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// First page index (inclusive, default: 0)
    #[serde(default)]
    pub start_page: u32,

    /// Last page index (exclusive, default: 268)
    #[serde(default = "default_max_page")]
    pub max_page: u32,

    /// Path prefix identifying item links in listing pages (default: "/node/")
    #[serde(default = "default_item_link_prefix")]
    pub item_link_prefix: String,

    /// Randomized pause between catalog pages (default: 1–3 seconds)
    #[serde(default = "default_page_delay")]
    pub page_delay: DelayRange,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            start_page: 0,
            max_page: default_max_page(),
            item_link_prefix: default_item_link_prefix(),
            page_delay: default_page_delay(),
        }
    }
}

/// HTTP fetch configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Retry policy
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Randomized pause before every request (default: 0.5–2.0 seconds)
    #[serde(default = "default_request_delay")]
    pub request_delay: DelayRange,

    /// Per-request timeout (default: 8 seconds)
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// User-Agent pool; one is picked at random for every request
    #[serde(default = "default_user_agents")]
    pub user_agents: Vec<String>,

    /// Accept-Language header value
    #[serde(default = "default_accept_language")]
    pub accept_language: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            request_delay: default_request_delay(),
            timeout: default_timeout(),
            user_agents: default_user_agents(),
            accept_language: default_accept_language(),
        }
    }
}

/// Item processing configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessConfig {
    /// Directory receiving one markdown artifact per processed item (default: "tat")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Fixed pause between items (default: 0.3 seconds)
    #[serde(default = "default_item_delay", with = "duration_serde")]
    pub item_delay: Duration,

    /// Size of the random sample used by `--test-sample` (default: 100)
    #[serde(default = "default_sample_size")]
    pub sample_size: u32,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            item_delay: default_item_delay(),
            sample_size: default_sample_size(),
        }
    }
}

/// Batch orchestrator configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Items per batch (default: 100)
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Stop after this many batches (None = until nothing is pending)
    #[serde(default)]
    pub max_batches: Option<u32>,

    /// Wall-clock limit for a single batch (default: 600 seconds)
    #[serde(default = "default_batch_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// Pause between successful batches (default: 2 seconds)
    #[serde(default = "default_batch_pause", with = "duration_serde")]
    pub pause: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_batches: None,
            timeout: default_batch_timeout(),
            pause: default_batch_pause(),
        }
    }
}

/// Storage locations
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// SQLite record store (default: "songs.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Directory receiving README.md and SONGS_n.md (default: ".")
    #[serde(default = "default_index_dir")]
    pub index_dir: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            index_dir: default_index_dir(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff() -> DelayRange {
    DelayRange::from_secs_f64(2.0, 5.0)
}

fn default_base_url() -> String {
    "https://erlar.ru/asongs".to_string()
}

fn default_max_page() -> u32 {
    268
}

fn default_item_link_prefix() -> String {
    "/node/".to_string()
}

fn default_page_delay() -> DelayRange {
    DelayRange::from_secs_f64(1.0, 3.0)
}

fn default_request_delay() -> DelayRange {
    DelayRange::from_secs_f64(0.5, 2.0)
}

fn default_timeout() -> Duration {
    Duration::from_secs(8)
}

fn default_user_agents() -> Vec<String> {
    [
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_accept_language() -> String {
    "ru-RU,ru;q=0.8,en-US;q=0.5,en;q=0.3".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("tat")
}

fn default_item_delay() -> Duration {
    Duration::from_millis(300)
}

fn default_sample_size() -> u32 {
    100
}

fn default_batch_size() -> u32 {
    100
}

fn default_batch_timeout() -> Duration {
    Duration::from_secs(600)
}

fn default_batch_pause() -> Duration {
    Duration::from_secs(2)
}

fn default_database_path() -> PathBuf {
    PathBuf::from("songs.db")
}

fn default_index_dir() -> PathBuf {
    PathBuf::from(".")
}

// Duration serialization helper (fractional seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

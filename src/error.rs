//! Error types for lyrics-harvest
//!
//! Two families live here:
//! - [`Error`], the crate-wide error for store, filesystem, configuration and
//!   batch failures. These abort the running collector, processor or batch.
//! - [`FetchError`] / [`FetchFailure`], the typed outcome of a page fetch.
//!   These never abort a run: the collector skips the page and the processor
//!   marks the record failed.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for lyrics-harvest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for lyrics-harvest
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "fetch.max_attempts")
        key: Option<String>,
    },

    /// Record store operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error outside the retrying fetcher (client construction)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Invalid URL in configuration or discovered links
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A batch stopped with an error, a panic or a timeout
    #[error("batch {batch} failed: {reason}")]
    Batch {
        /// 1-based number of the batch that failed
        batch: u32,
        /// What went wrong
        reason: BatchFailure,
    },

    /// The run was stopped by SIGINT or SIGTERM
    #[error("interrupted by signal")]
    Interrupted,

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Record store errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}

/// Reason a single batch invocation stopped the orchestrator
#[derive(Debug, Error)]
pub enum BatchFailure {
    /// The processor returned an error
    #[error("{0}")]
    Processor(Box<Error>),

    /// The processor task panicked or was cancelled
    #[error("processor task aborted: {0}")]
    Aborted(String),

    /// The processor exceeded the wall-clock limit
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

/// Error from a single fetch attempt
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (timeout, connection refused, reset, body read)
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a non-2xx status
    #[error("unexpected HTTP status {status}")]
    Status {
        /// The HTTP status code received
        status: u16,
    },
}

/// Terminal outcome of a fetch after all attempts are exhausted
#[derive(Debug, Error)]
#[error("failed to fetch {url} after {attempts} attempt(s): {last_error}")]
pub struct FetchFailure {
    /// URL that could not be fetched
    pub url: String,
    /// Number of attempts made
    pub attempts: u32,
    /// Error from the final attempt
    pub last_error: FetchError,
}

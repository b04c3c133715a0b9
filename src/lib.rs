//! # lyrics-harvest
//!
//! Resumable crawler that harvests song lyrics from a paginated catalog site
//! into normalized markdown files.
//!
//! ## Pipeline
//!
//! - **Collect**: walk the catalog listing pages and record every item link
//!   in the SQLite record store as `pending`. Rediscovering a link is a no-op.
//! - **Process**: fetch each pending item page, extract its lyrics, write a
//!   deterministically named artifact and mark the record `processed` (or
//!   `failed`, with a reason).
//! - **Batch**: repeat bounded processing runs, each under a timeout, until
//!   nothing is pending. Every transition is committed on its own, so a
//!   crashed or interrupted run resumes where it stopped.
//!
//! ## Quick Start
//!
//! ```no_run
//! use lyrics_harvest::{Collector, Config, Database, HttpFetcher, PendingSelection, Processor};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let db = Arc::new(Database::new(&config.persistence.database_path).await?);
//!     let fetcher = Arc::new(HttpFetcher::new(config.fetch.clone())?);
//!
//!     let collected = Collector::new(db.clone(), fetcher.clone(), config.collect.clone())
//!         .run()
//!         .await?;
//!     println!("{} new items", collected.new_items);
//!
//!     let processed = Processor::new(db, fetcher, config.process.clone())
//!         .run(PendingSelection::ALL)
//!         .await?;
//!     println!("{} processed, {} failed", processed.processed, processed.failed);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Batch orchestration with per-batch timeouts
pub mod batch;
/// Catalog crawl and item discovery
pub mod collector;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Error types
pub mod error;
/// HTML extraction for listing and item pages
pub mod extract;
/// Page fetching with retry and identity rotation
pub mod fetcher;
/// README and paginated song list generation
pub mod index;
/// Deterministic artifact naming and transliteration
pub mod naming;
/// Item processing and artifact rendering
pub mod processor;
/// Retry logic with randomized backoff
pub mod retry;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;

#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use batch::{BatchOrchestrator, BatchReport, StopReason};
pub use collector::{CollectReport, Collector};
pub use config::{Config, DelayRange, RetryPolicy};
pub use db::{Completion, Database, Item, PendingSelection, StatusCounts};
pub use error::{BatchFailure, DatabaseError, Error, FetchError, FetchFailure, Result};
pub use fetcher::{HttpFetcher, PageSource};
pub use index::{IndexReport, write_index};
pub use processor::{ProcessReport, Processor};
pub use types::{FailureReason, ItemId, ItemStatus};

/// Run `operation` until it finishes or a termination signal arrives.
///
/// On a signal the operation is dropped and [`Error::Interrupted`] is
/// returned. Every committed status change survives; a record that was being
/// processed stays `pending` for the next run.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use lyrics_harvest::{Config, Database, run_until_signal};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config::default();
///     let db = Database::new(&config.persistence.database_path).await?;
///
///     let counts = run_until_signal(db.status_counts()).await?;
///     println!("{} pending", counts.pending);
///
///     Ok(())
/// }
/// ```
pub async fn run_until_signal<T, F>(operation: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    tokio::select! {
        result = operation => result,
        _ = wait_for_signal() => Err(Error::Interrupted),
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn run_until_signal_returns_the_operation_result() {
        let value = run_until_signal(async { Ok::<_, Error>(7) }).await.unwrap();
        assert_eq!(value, 7);

        let err = run_until_signal(async { Err::<(), _>(Error::Other("boom".to_string())) })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Other(msg) if msg == "boom"));
    }
}

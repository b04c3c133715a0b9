//! Database layer for lyrics-harvest
//!
//! The record store is a single SQLite file holding one row per discovered
//! item. It is the only state shared between the collector and the processor,
//! and the only thing a restarted run needs to resume.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`]: Database lifecycle, schema migrations
//! - [`items`]: Item discovery, selection, status transitions and counts

use crate::types::{FailureReason, ItemId, ItemStatus};
use serde::Serialize;
use sqlx::{FromRow, sqlite::SqlitePool};

mod items;
mod migrations;

/// Item record from database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Item {
    /// Unique database ID, assigned at first insertion
    pub id: ItemId,
    /// Absolute URL of the item page; unique across the store
    pub source_url: String,
    /// Title; replaced by the page title when processed
    pub title: String,
    /// Composer, possibly empty
    pub composer: String,
    /// Lyricist, possibly empty
    pub lyricist: String,
    /// Lifecycle status
    pub status: ItemStatus,
    /// Unix timestamp of first discovery
    pub discovered_at: i64,
    /// Unix timestamp of the terminal transition
    pub completed_at: Option<i64>,
    /// Lyrics, set when processed
    pub body: Option<String>,
    /// Artifact file name relative to the output directory, set when processed
    pub artifact_name: Option<String>,
    /// Why the record failed, set when failed
    pub failure_reason: Option<FailureReason>,
}

/// Outcome of a successful processing, stored by [`Database::mark_processed`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Title after merging page and discovery values
    pub title: String,
    /// Composer after merging page and discovery values
    pub composer: String,
    /// Lyricist after merging page and discovery values
    pub lyricist: String,
    /// Extracted lyrics
    pub body: String,
    /// Artifact file name relative to the output directory
    pub artifact_name: String,
}

/// Which pending records a processing run selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingSelection {
    /// Ascending insertion order, optionally capped
    InsertionOrder {
        /// Maximum number of records, `None` for all
        limit: Option<u32>,
    },
    /// Uniform random sample without replacement (test mode)
    RandomSample {
        /// Number of records to draw; fewer if fewer are pending
        size: u32,
    },
}

impl PendingSelection {
    /// Every pending record in insertion order
    pub const ALL: PendingSelection = PendingSelection::InsertionOrder { limit: None };
}

/// Record counts per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    /// Records waiting to be processed
    pub pending: u64,
    /// Records with a written artifact
    pub processed: u64,
    /// Records that failed
    pub failed: u64,
}

impl StatusCounts {
    /// Total number of records
    pub fn total(&self) -> u64 {
        self.pending + self.processed + self.failed
    }
}

/// Database handle for lyrics-harvest
pub struct Database {
    pool: SqlitePool,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

//! Item discovery, selection and status transitions.

use crate::error::DatabaseError;
use crate::extract::ListingEntry;
use crate::types::{FailureReason, ItemId, ItemStatus};
use crate::{Error, Result};

use super::{Completion, Database, Item, PendingSelection, StatusCounts};

const ITEM_COLUMNS: &str = "id, source_url, title, composer, lyricist, status, \
     discovered_at, completed_at, body, artifact_name, failure_reason";

impl Database {
    /// Insert every entry whose source URL is not yet stored
    ///
    /// Existing records are left untouched, whatever their status. All
    /// inserts happen in one transaction. Returns how many records were new.
    pub async fn upsert_discovered(&self, entries: &[ListingEntry]) -> Result<u64> {
        if entries.is_empty() {
            return Ok(0);
        }

        let now = chrono::Utc::now().timestamp();

        let mut tx = self.pool.begin().await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to begin transaction: {}",
                e
            )))
        })?;

        let mut inserted = 0;
        for entry in entries {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO items (
                    source_url, title, composer, lyricist, status, discovered_at
                ) VALUES (?, ?, ?, ?, 'pending', ?)
                "#,
            )
            .bind(&entry.source_url)
            .bind(&entry.title)
            .bind(&entry.composer)
            .bind(&entry.lyricist)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to insert discovered item: {}",
                    e
                )))
            })?;
            inserted += result.rows_affected();
        }

        tx.commit().await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to commit discovered items: {}",
                e
            )))
        })?;

        Ok(inserted)
    }

    /// Pending records chosen by `selection`
    pub async fn list_pending(&self, selection: PendingSelection) -> Result<Vec<Item>> {
        // SQLite treats a negative LIMIT as no limit
        let (order, limit) = match selection {
            PendingSelection::InsertionOrder { limit } => ("id ASC", limit.map_or(-1, i64::from)),
            PendingSelection::RandomSample { size } => ("RANDOM()", i64::from(size)),
        };

        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM items WHERE status = 'pending' ORDER BY {order} LIMIT ?"
        );

        sqlx::query_as::<_, Item>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to list pending items: {}",
                    e
                )))
            })
    }

    /// Record a successful processing
    ///
    /// Stores the merged metadata, body, artifact name and completion time.
    /// Only a pending record transitions. Returns false when the record does
    /// not exist or is already terminal.
    pub async fn mark_processed(&self, id: ItemId, completion: &Completion) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            UPDATE items
            SET status = 'processed', completed_at = ?,
                title = ?, composer = ?, lyricist = ?,
                body = ?, artifact_name = ?, failure_reason = NULL
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(now)
        .bind(&completion.title)
        .bind(&completion.composer)
        .bind(&completion.lyricist)
        .bind(&completion.body)
        .bind(&completion.artifact_name)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to mark item processed: {}",
                e
            )))
        })?;

        Ok(result.rows_affected() > 0)
    }

    /// Record a permanent failure for this run
    ///
    /// Only a pending record transitions. Returns false when the record does
    /// not exist or is already terminal.
    pub async fn mark_failed(&self, id: ItemId, reason: FailureReason) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            UPDATE items
            SET status = 'failed', completed_at = ?, failure_reason = ?
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(now)
        .bind(reason)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to mark item failed: {}",
                e
            )))
        })?;

        Ok(result.rows_affected() > 0)
    }

    /// Move every failed record back to pending
    ///
    /// Clears the failure reason and completion time. Returns how many
    /// records were reset.
    pub async fn reset_failed(&self) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE items
            SET status = 'pending', completed_at = NULL, failure_reason = NULL
            WHERE status = 'failed'
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to reset failed items: {}",
                e
            )))
        })?;

        Ok(result.rows_affected())
    }

    /// Number of records with the given status
    pub async fn count_by_status(&self, status: ItemStatus) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items WHERE status = ?")
            .bind(status)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to count {} items: {}",
                    status, e
                )))
            })?;

        Ok(count.max(0) as u64)
    }

    /// Total number of records
    pub async fn count_all(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to count items: {}",
                    e
                )))
            })?;

        Ok(count.max(0) as u64)
    }

    /// Counts for every status in one query
    pub async fn status_counts(&self) -> Result<StatusCounts> {
        let rows: Vec<(ItemStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM items GROUP BY status")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to count items by status: {}",
                        e
                    )))
                })?;

        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            let count = count.max(0) as u64;
            match status {
                ItemStatus::Pending => counts.pending = count,
                ItemStatus::Processed => counts.processed = count,
                ItemStatus::Failed => counts.failed = count,
            }
        }
        Ok(counts)
    }

    /// Every processed record, in insertion order
    pub async fn list_processed(&self) -> Result<Vec<Item>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE status = 'processed' ORDER BY id");

        sqlx::query_as::<_, Item>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to list processed items: {}",
                    e
                )))
            })
    }

    /// Get an item by ID
    pub async fn get_item(&self, id: ItemId) -> Result<Option<Item>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?");

        sqlx::query_as::<_, Item>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to get item: {}",
                    e
                )))
            })
    }

    /// Get an item by its source URL
    pub async fn get_item_by_url(&self, source_url: &str) -> Result<Option<Item>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items WHERE source_url = ?");

        sqlx::query_as::<_, Item>(&sql)
            .bind(source_url)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to get item by URL: {}",
                    e
                )))
            })
    }
}

//! Batch orchestration: repeated bounded processing runs until nothing is pending.
//!
//! Each batch runs the [`Processor`] as its own tokio task under a wall-clock
//! limit. A batch that errors, panics or times out stops the loop; there is no
//! automatic retry. Work committed before the stop stays committed, and a
//! record that was in flight when a batch was cut off is still `pending`, so
//! the next invocation picks it up.

use crate::config::BatchConfig;
use crate::db::{Database, PendingSelection};
use crate::error::BatchFailure;
use crate::processor::Processor;
use crate::types::ItemStatus;
use crate::{Error, Result};
use serde::Serialize;
use std::sync::Arc;

/// Why the orchestrator stopped cleanly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// No pending records remain
    NothingPending,
    /// The configured batch cap was reached
    MaxBatches,
}

/// Outcome of a clean orchestrator run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Batches that ran to completion
    pub batches: u32,
    /// Records processed across all batches
    pub processed: u64,
    /// Records failed across all batches
    pub failed: u64,
    /// Pending records left when the loop stopped
    pub remaining: u64,
    /// Why the loop stopped
    pub stop: StopReason,
}

/// Runs the processor in bounded batches
pub struct BatchOrchestrator {
    db: Arc<Database>,
    processor: Processor,
    config: BatchConfig,
}

impl BatchOrchestrator {
    /// Create an orchestrator; `processor` must share `db`
    pub fn new(db: Arc<Database>, processor: Processor, config: BatchConfig) -> Self {
        Self {
            db,
            processor,
            config,
        }
    }

    /// Run batches until nothing is pending, the cap is reached, or a batch fails
    pub async fn run(&self) -> Result<BatchReport> {
        let mut batches = 0u32;
        let mut processed = 0u64;
        let mut failed = 0u64;

        let stop = loop {
            let pending = self.db.count_by_status(ItemStatus::Pending).await?;
            if pending == 0 {
                break StopReason::NothingPending;
            }
            if let Some(max) = self.config.max_batches
                && batches >= max
            {
                break StopReason::MaxBatches;
            }

            if batches > 0 && !self.config.pause.is_zero() {
                tokio::time::sleep(self.config.pause).await;
            }

            let batch = batches + 1;
            tracing::info!(batch, pending, batch_size = self.config.batch_size, "Starting batch");

            let report = self.run_one(batch).await?;
            batches = batch;
            processed += report.processed;
            failed += report.failed;

            tracing::info!(
                batch,
                processed = report.processed,
                failed = report.failed,
                "Batch complete"
            );

            // Pending records that the processor could not select would loop forever
            if report.selected == 0 {
                break StopReason::NothingPending;
            }
        };

        let remaining = self.db.count_by_status(ItemStatus::Pending).await?;
        tracing::info!(batches, processed, failed, remaining, ?stop, "Batch run finished");

        Ok(BatchReport {
            batches,
            processed,
            failed,
            remaining,
            stop,
        })
    }

    async fn run_one(&self, batch: u32) -> Result<crate::processor::ProcessReport> {
        let processor = self.processor.clone();
        let selection = PendingSelection::InsertionOrder {
            limit: Some(self.config.batch_size),
        };

        let handle = tokio::spawn(async move { processor.run(selection).await });
        // Dropping the orchestrator mid-batch (signal, outer timeout) must not orphan the task
        let guard = AbortOnDrop(handle.abort_handle());

        let batch_error = |reason| Error::Batch { batch, reason };

        match tokio::time::timeout(self.config.timeout, handle).await {
            Ok(Ok(Ok(report))) => Ok(report),
            Ok(Ok(Err(e))) => {
                tracing::error!(batch, error = %e, "Batch failed");
                Err(batch_error(BatchFailure::Processor(Box::new(e))))
            }
            Ok(Err(join_error)) => {
                tracing::error!(batch, error = %join_error, "Batch task aborted");
                Err(batch_error(BatchFailure::Aborted(join_error.to_string())))
            }
            Err(_) => {
                guard.0.abort();
                tracing::error!(batch, timeout = ?self.config.timeout, "Batch timed out");
                Err(batch_error(BatchFailure::TimedOut(self.config.timeout)))
            }
        }
    }
}

/// Aborts the spawned batch task when dropped
struct AbortOnDrop(tokio::task::AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

//! Item processing: fetch each pending record, extract its lyrics and write
//! the artifact.
//!
//! Every record ends in exactly one terminal transition per run. Per-record
//! problems (fetch, empty body, write) mark the record failed and the run
//! continues; store errors end the run.

use crate::config::ProcessConfig;
use crate::db::{Completion, Database, Item, PendingSelection};
use crate::extract::extract_item;
use crate::fetcher::PageSource;
use crate::naming::{display_heading, stem_for, with_extension};
use crate::types::FailureReason;
use crate::utils::write_atomic;
use crate::Result;
use serde::Serialize;
use std::sync::Arc;

/// Heading line that opens every artifact
pub const ARTIFACT_HEADER: &str = "# Оригинал";

/// Outcome of one processing run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessReport {
    /// Pending records selected for this run
    pub selected: u64,
    /// Records that reached `processed`
    pub processed: u64,
    /// Records that reached `failed`
    pub failed: u64,
}

impl ProcessReport {
    fn absorb(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Processed => self.processed += 1,
            Outcome::Failed => self.failed += 1,
            Outcome::AlreadyTerminal => {}
        }
    }
}

/// What happened to a single record
#[derive(Debug)]
enum Outcome {
    Processed,
    Failed,
    /// The record left `pending` under us; nothing was changed
    AlreadyTerminal,
}

/// Turns pending records into artifacts
///
/// Cheap to clone; the batch orchestrator moves a clone into each spawned batch.
#[derive(Clone)]
pub struct Processor {
    db: Arc<Database>,
    source: Arc<dyn PageSource>,
    config: Arc<ProcessConfig>,
}

impl Processor {
    /// Create a processor over the given store and page source
    pub fn new(db: Arc<Database>, source: Arc<dyn PageSource>, config: ProcessConfig) -> Self {
        Self {
            db,
            source,
            config: Arc::new(config),
        }
    }

    /// Process every pending record chosen by `selection`
    pub async fn run(&self, selection: PendingSelection) -> Result<ProcessReport> {
        let items = self.db.list_pending(selection).await?;
        let mut report = ProcessReport {
            selected: items.len() as u64,
            ..ProcessReport::default()
        };

        tracing::info!(
            selected = report.selected,
            output_dir = %self.config.output_dir.display(),
            "Processing pending items"
        );

        let total = items.len();
        for (index, item) in items.iter().enumerate() {
            tracing::debug!(
                id = %item.id,
                position = index + 1,
                total,
                title = %item.title,
                "Processing item"
            );

            let outcome = self.process_item(item).await?;
            report.absorb(&outcome);

            if index + 1 < total && !self.config.item_delay.is_zero() {
                tokio::time::sleep(self.config.item_delay).await;
            }
        }

        tracing::info!(
            selected = report.selected,
            processed = report.processed,
            failed = report.failed,
            "Processing finished"
        );

        Ok(report)
    }

    async fn process_item(&self, item: &Item) -> Result<Outcome> {
        let html = match self.source.fetch(&item.source_url).await {
            Ok(html) => html,
            Err(failure) => {
                tracing::warn!(id = %item.id, error = %failure, "Item fetch failed");
                return self.fail(item, FailureReason::Fetch).await;
            }
        };

        let page = extract_item(&html);
        if page.body.trim().is_empty() {
            tracing::warn!(id = %item.id, url = %item.source_url, "No lyrics found on item page");
            return self.fail(item, FailureReason::EmptyBody).await;
        }

        let title = prefer(page.title, &item.title);
        let composer = prefer(page.composer, &item.composer);
        let lyricist = prefer(page.lyricist, &item.lyricist);

        let mut stem = stem_for(&title, &composer, &lyricist);
        if stem.is_empty() {
            stem = format!("item_{}", item.id);
        }
        let artifact_name = with_extension(&stem);

        let content = render_artifact(&display_heading(&title, &composer, &lyricist), &page.body);
        if let Err(e) = write_atomic(&self.config.output_dir, &artifact_name, &content).await {
            tracing::warn!(id = %item.id, artifact = %artifact_name, error = %e, "Artifact write failed");
            return self.fail(item, FailureReason::Write).await;
        }

        let completion = Completion {
            title,
            composer,
            lyricist,
            body: page.body,
            artifact_name,
        };
        if !self.db.mark_processed(item.id, &completion).await? {
            tracing::warn!(id = %item.id, "Item was no longer pending; leaving it unchanged");
            return Ok(Outcome::AlreadyTerminal);
        }

        tracing::info!(id = %item.id, artifact = %completion.artifact_name, "Saved artifact");
        Ok(Outcome::Processed)
    }

    async fn fail(&self, item: &Item, reason: FailureReason) -> Result<Outcome> {
        if self.db.mark_failed(item.id, reason).await? {
            Ok(Outcome::Failed)
        } else {
            tracing::warn!(id = %item.id, "Item was no longer pending; leaving it unchanged");
            Ok(Outcome::AlreadyTerminal)
        }
    }
}

/// Page value when it has content, otherwise the discovery value
fn prefer(page_value: String, discovered: &str) -> String {
    if page_value.trim().is_empty() {
        discovered.to_string()
    } else {
        page_value
    }
}

/// Artifact markdown: fixed header, heading line, lyrics in a fenced block
pub fn render_artifact(heading: &str, body: &str) -> String {
    format!("{ARTIFACT_HEADER}\n\n### {heading}\n\n```\n{body}\n```\n")
}

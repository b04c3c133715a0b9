//! Catalog crawl: walk the paginated listing and record every item link.

use crate::config::CollectConfig;
use crate::db::Database;
use crate::extract::extract_listing;
use crate::fetcher::PageSource;
use crate::Result;
use serde::Serialize;
use std::sync::Arc;
use url::Url;

/// Outcome of one collection run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectReport {
    /// Listing pages fetched successfully
    pub pages_fetched: u32,
    /// Listing pages skipped after exhausting retries
    pub pages_skipped: u32,
    /// Item links found across all fetched pages, duplicates included
    pub entries_found: u64,
    /// Records inserted by this run
    pub new_items: u64,
    /// Records in the store after the run
    pub total_items: u64,
}

/// Discovers items on catalog listing pages and upserts them as pending records
pub struct Collector {
    db: Arc<Database>,
    source: Arc<dyn PageSource>,
    config: CollectConfig,
}

impl Collector {
    /// Create a collector over the given store and page source
    pub fn new(db: Arc<Database>, source: Arc<dyn PageSource>, config: CollectConfig) -> Self {
        Self { db, source, config }
    }

    /// URL of listing page `page`: the base URL with a `page` query parameter
    pub fn page_url(&self, page: u32) -> Result<Url> {
        let mut url = Url::parse(&self.config.base_url)?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string());
        Ok(url)
    }

    /// Crawl pages `start_page..max_page`
    ///
    /// A page that cannot be fetched is skipped with a warning. Store errors
    /// end the run.
    pub async fn run(&self) -> Result<CollectReport> {
        let base_url = Url::parse(&self.config.base_url)?;
        let pages = self.config.start_page..self.config.max_page;
        let mut report = CollectReport::default();

        tracing::info!(
            base_url = %base_url,
            start_page = pages.start,
            end_page = pages.end,
            "Collecting item links"
        );

        for page in pages {
            let page_url = self.page_url(page)?;

            let html = match self.source.fetch(page_url.as_str()).await {
                Ok(html) => html,
                Err(failure) => {
                    tracing::warn!(page, error = %failure, "Skipping listing page");
                    report.pages_skipped += 1;
                    continue;
                }
            };

            let entries = extract_listing(&html, &base_url, &self.config.item_link_prefix);
            let inserted = self.db.upsert_discovered(&entries).await?;

            report.pages_fetched += 1;
            report.entries_found += entries.len() as u64;
            report.new_items += inserted;

            tracing::info!(page, found = entries.len(), new = inserted, "Listing page collected");

            if page + 1 < self.config.max_page {
                self.config.page_delay.sleep().await;
            }
        }

        report.total_items = self.db.count_all().await?;

        tracing::info!(
            pages_fetched = report.pages_fetched,
            pages_skipped = report.pages_skipped,
            new_items = report.new_items,
            total_items = report.total_items,
            "Collection finished"
        );

        Ok(report)
    }
}

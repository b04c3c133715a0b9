//! Shared test helpers: an in-memory page source and a throwaway record store.

use crate::db::Database;
use crate::error::{FetchError, FetchFailure};
use crate::fetcher::PageSource;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// [`PageSource`] serving canned bodies; unknown URLs fail like an exhausted 404
#[derive(Default)]
pub(crate) struct StaticSource {
    pages: HashMap<String, String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl StaticSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_page(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.pages.insert(url.into(), body.into());
        self
    }

    /// Sleep before answering every fetch
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// URLs requested so far, in order
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageSource for StaticSource {
    async fn fetch(&self, url: &str) -> Result<String, FetchFailure> {
        self.calls.lock().unwrap().push(url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.pages.get(url).cloned().ok_or_else(|| FetchFailure {
            url: url.to_string(),
            attempts: 3,
            last_error: FetchError::Status { status: 404 },
        })
    }
}

/// Fresh record store in a temp directory; keep the directory alive
pub(crate) async fn temp_db() -> (Arc<Database>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::new(&temp_dir.path().join("test.db"))
        .await
        .unwrap();
    (Arc::new(db), temp_dir)
}

/// Item page markup with one stanza per entry of `stanzas`
pub(crate) fn item_html(title: &str, composer: &str, lyricist: &str, stanzas: &[&str]) -> String {
    let segments: String = stanzas
        .iter()
        .map(|s| format!("<p class=\"line_one\">{}</p>", s.replace('\n', "<br/>")))
        .collect();
    format!(
        r#"<html><body>
        <h1 class="title">{title}</h1>
        <div class="songinfo">
          <span class="composer"><a href="/taxonomy/term/1">{composer}</a></span>
          <span class="autor"><a href="/taxonomy/term/2">{lyricist}</a></span>
        </div>
        <div class="song">{segments}</div>
        </body></html>"#
    )
}

/// Listing page markup with one table row per `(href, title, composer)`
pub(crate) fn listing_html(rows: &[(&str, &str, &str)]) -> String {
    let rows: String = rows
        .iter()
        .map(|(href, title, composer)| {
            format!(
                r#"<tr>
                  <td class="views-field views-field-title"><a href="{href}">{title}</a></td>
                  <td class="views-field views-field-tid"><a href="/taxonomy/term/1">{composer}</a></td>
                  <td class="views-field views-field-tid-1"></td>
                </tr>"#
            )
        })
        .collect();
    format!("<html><body><table><tbody>{rows}</tbody></table></body></html>")
}

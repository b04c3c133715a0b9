//! Song index: a `README.md` landing page plus `SONGS_{n}.md` list pages.
//!
//! Built from processed records. Entries are sorted case-insensitively by
//! their display heading and split into pages of [`SONGS_PER_PAGE`].

use crate::db::Database;
use crate::naming::display_heading;
use crate::utils::{link_path, write_atomic};
use crate::Result;
use serde::Serialize;
use std::path::Path;

/// Songs listed on each `SONGS_{n}.md` page
pub const SONGS_PER_PAGE: usize = 50;

const SITE_TITLE: &str = "Татарские песни";
const README: &str = "README.md";

/// One line of the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Display heading, `"{label} - {title}"` or the title alone
    pub heading: String,
    /// Link target of the artifact
    pub link: String,
}

/// Outcome of an index rebuild
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    /// Songs listed
    pub songs: usize,
    /// `SONGS_{n}.md` pages written
    pub pages: usize,
}

/// File name of list page `n` (1-based)
pub fn page_file_name(n: usize) -> String {
    format!("SONGS_{n}.md")
}

/// Rebuild the index in `index_dir` from every processed record
///
/// Artifact links point into `output_dir`, relative to `index_dir` when it
/// lies inside it. List pages left over from a larger previous index are
/// removed.
pub async fn write_index(db: &Database, index_dir: &Path, output_dir: &Path) -> Result<IndexReport> {
    let mut entries: Vec<IndexEntry> = db
        .list_processed()
        .await?
        .into_iter()
        .filter_map(|item| {
            let artifact = item.artifact_name?;
            Some(IndexEntry {
                heading: display_heading(&item.title, &item.composer, &item.lyricist),
                link: link_path(index_dir, &output_dir.join(artifact)),
            })
        })
        .collect();
    sort_entries(&mut entries);

    let pages = render_pages(&entries);
    for (n, content) in pages.iter().enumerate() {
        write_atomic(index_dir, &page_file_name(n + 1), content).await?;
    }
    write_atomic(index_dir, README, &render_readme(entries.len())).await?;

    // Drop stale pages from an earlier, longer index
    let mut stale = pages.len() + 1;
    while tokio::fs::try_exists(index_dir.join(page_file_name(stale))).await? {
        tokio::fs::remove_file(index_dir.join(page_file_name(stale))).await?;
        stale += 1;
    }

    tracing::info!(
        songs = entries.len(),
        pages = pages.len(),
        index_dir = %index_dir.display(),
        "Index written"
    );

    Ok(IndexReport {
        songs: entries.len(),
        pages: pages.len(),
    })
}

/// Case-insensitive order by heading, link as a tie-breaker
pub fn sort_entries(entries: &mut [IndexEntry]) {
    entries.sort_by_cached_key(|e| (e.heading.to_lowercase(), e.link.clone()));
}

/// Render every list page for already sorted entries
pub fn render_pages(entries: &[IndexEntry]) -> Vec<String> {
    let total = entries.len();
    let page_count = total.div_ceil(SONGS_PER_PAGE);

    entries
        .chunks(SONGS_PER_PAGE)
        .enumerate()
        .map(|(index, chunk)| {
            let n = index + 1;
            let first = index * SONGS_PER_PAGE + 1;
            let last = first + chunk.len() - 1;
            let nav = navigation(n, page_count);

            let mut page = format!("# {SITE_TITLE} - Страница {n}\n\n");
            page.push_str(&format!(
                "## Список песен (песни {first}-{last} из {total})\n\n"
            ));
            if let Some(nav) = &nav {
                page.push_str(nav);
                page.push_str("\n\n");
            }
            for entry in chunk {
                page.push_str(&format!("- [{}]({})\n", entry.heading, entry.link));
            }
            if let Some(nav) = &nav {
                page.push_str("\n---\n\n");
                page.push_str(nav);
                page.push('\n');
            }
            page
        })
        .collect()
}

/// Previous / home / next links; `None` for a single page
fn navigation(n: usize, page_count: usize) -> Option<String> {
    if page_count <= 1 {
        return None;
    }
    let mut links = Vec::with_capacity(3);
    if n > 1 {
        links.push(format!("[← Предыдущая страница]({})", page_file_name(n - 1)));
    }
    links.push(format!("[Главная страница]({README})"));
    if n < page_count {
        links.push(format!("[Следующая страница →]({})", page_file_name(n + 1)));
    }
    Some(links.join(" | "))
}

/// Render the landing page for `total` songs
pub fn render_readme(total: usize) -> String {
    let page_count = total.div_ceil(SONGS_PER_PAGE);

    let mut readme = format!("# {SITE_TITLE}\n\nВсего песен: {total}\n\n## Список песен\n\n");
    if page_count == 1 {
        readme.push_str(&format!("- [Все песни]({})\n", page_file_name(1)));
    } else {
        for n in 1..=page_count {
            let first = (n - 1) * SONGS_PER_PAGE + 1;
            let last = (n * SONGS_PER_PAGE).min(total);
            readme.push_str(&format!("- [Песни {first}-{last}]({})\n", page_file_name(n)));
        }
    }
    readme.push_str("\n---\n\n*Эта страница автоматически генерируется командой `lyrics-harvest index`*\n");
    readme
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Completion;
    use crate::extract::ListingEntry;
    use crate::test_helpers::temp_db;

    fn entries(count: usize) -> Vec<IndexEntry> {
        (1..=count)
            .map(|n| IndexEntry {
                heading: format!("Җыр {n:03}"),
                link: format!("tat/cir_{n:03}.md"),
            })
            .collect()
    }

    #[test]
    fn single_page_has_no_navigation() {
        let pages = render_pages(&entries(2));
        assert_eq!(pages.len(), 1);
        assert_eq!(
            pages[0],
            "# Татарские песни - Страница 1\n\n\
             ## Список песен (песни 1-2 из 2)\n\n\
             - [Җыр 001](tat/cir_001.md)\n\
             - [Җыр 002](tat/cir_002.md)\n"
        );
    }

    #[test]
    fn pages_hold_fifty_and_link_to_neighbours() {
        let pages = render_pages(&entries(120));
        assert_eq!(pages.len(), 3);

        assert!(pages[0].contains("(песни 1-50 из 120)"));
        assert!(pages[0].contains("[Главная страница](README.md) | [Следующая страница →](SONGS_2.md)"));
        assert!(!pages[0].contains("Предыдущая"));

        assert!(pages[1].contains(
            "[← Предыдущая страница](SONGS_1.md) | [Главная страница](README.md) | [Следующая страница →](SONGS_3.md)"
        ));

        assert!(pages[2].contains("(песни 101-120 из 120)"));
        assert!(!pages[2].contains("Следующая"));
        assert_eq!(pages[2].matches("- [Җыр").count(), 20);
    }

    #[test]
    fn readme_links_every_page() {
        let readme = render_readme(120);
        assert!(readme.starts_with("# Татарские песни\n\nВсего песен: 120\n"));
        assert!(readme.contains("- [Песни 1-50](SONGS_1.md)\n"));
        assert!(readme.contains("- [Песни 51-100](SONGS_2.md)\n"));
        assert!(readme.contains("- [Песни 101-120](SONGS_3.md)\n"));

        assert!(render_readme(7).contains("- [Все песни](SONGS_1.md)\n"));
        assert!(!render_readme(0).contains("SONGS_"));
    }

    #[test]
    fn sorting_ignores_case() {
        let mut list = vec![
            IndexEntry {
                heading: "бака".to_string(),
                link: "b.md".to_string(),
            },
            IndexEntry {
                heading: "Алма".to_string(),
                link: "a.md".to_string(),
            },
            IndexEntry {
                heading: "Бабай".to_string(),
                link: "c.md".to_string(),
            },
        ];
        sort_entries(&mut list);
        let headings: Vec<_> = list.iter().map(|e| e.heading.as_str()).collect();
        assert_eq!(headings, vec!["Алма", "Бабай", "бака"]);
    }

    #[tokio::test]
    async fn index_lists_processed_records_only() {
        let (db, dir) = temp_db().await;
        let entries: Vec<_> = [("1", "Сагыну"), ("2", "Әлфия"), ("3", "Ак каен")]
            .iter()
            .map(|(n, title)| ListingEntry {
                source_url: format!("https://erlar.ru/node/{n}"),
                title: title.to_string(),
                composer: "Радик".to_string(),
                lyricist: String::new(),
            })
            .collect();
        db.upsert_discovered(&entries).await.unwrap();

        for (n, title, name) in [("1", "Сагыну", "radik_-_saginu.md"), ("3", "Ак каен", "radik_-_ak_kaen.md")] {
            let item = db
                .get_item_by_url(&format!("https://erlar.ru/node/{n}"))
                .await
                .unwrap()
                .unwrap();
            db.mark_processed(
                item.id,
                &Completion {
                    title: title.to_string(),
                    composer: "Радик".to_string(),
                    lyricist: String::new(),
                    body: "юл".to_string(),
                    artifact_name: name.to_string(),
                },
            )
            .await
            .unwrap();
        }

        let index_dir = dir.path().join("site");
        let report = write_index(&db, &index_dir, &index_dir.join("tat"))
            .await
            .unwrap();
        assert_eq!(report, IndexReport { songs: 2, pages: 1 });

        let page = std::fs::read_to_string(index_dir.join("SONGS_1.md")).unwrap();
        assert!(page.contains(
            "- [Радик - Ак каен](tat/radik_-_ak_kaen.md)\n- [Радик - Сагыну](tat/radik_-_saginu.md)\n"
        ));
        assert!(!page.contains("Әлфия"));

        let readme = std::fs::read_to_string(index_dir.join("README.md")).unwrap();
        assert!(readme.contains("Всего песен: 2"));
    }

    #[tokio::test]
    async fn stale_pages_are_removed() {
        let (db, dir) = temp_db().await;
        let index_dir = dir.path().join("site");
        std::fs::create_dir_all(&index_dir).unwrap();
        std::fs::write(index_dir.join("SONGS_1.md"), "old").unwrap();
        std::fs::write(index_dir.join("SONGS_2.md"), "old").unwrap();

        let report = write_index(&db, &index_dir, &index_dir.join("tat"))
            .await
            .unwrap();

        assert_eq!(report, IndexReport { songs: 0, pages: 0 });
        assert!(!index_dir.join("SONGS_1.md").exists());
        assert!(!index_dir.join("SONGS_2.md").exists());
        assert!(index_dir.join("README.md").exists());
    }
}

//! Markup extraction for catalog listing pages and item pages.
//!
//! Pure functions over HTML text. A missing structure is never an error: it
//! shows up as an absent entry or an empty field, and callers decide what an
//! empty field means.

use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

/// CSS class of the star-rating widget embedded in lyric blocks
const RATING_CLASS: &str = "fivestar";

struct Selectors {
    listing_link: Selector,
    listing_composer: Selector,
    listing_lyricist: Selector,
    item_title: Selector,
    item_info: Selector,
    item_composer: Selector,
    item_lyricist: Selector,
    item_body: Selector,
    item_segment: Selector,
}

// Selector literals are fixed and covered by the tests below
#[allow(clippy::expect_used)]
fn compile(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector must parse")
}

static SELECTORS: LazyLock<Selectors> = LazyLock::new(|| Selectors {
    listing_link: compile(".views-field-title a"),
    listing_composer: compile(".views-field-tid a"),
    listing_lyricist: compile(".views-field-tid-1 a"),
    item_title: compile("h1.title"),
    item_info: compile("div.songinfo"),
    item_composer: compile(".composer a"),
    item_lyricist: compile(".autor a"),
    item_body: compile(".song"),
    item_segment: compile("p.line_one, p.line_two"),
});

/// One row of a catalog listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    /// Absolute URL of the item page
    pub source_url: String,
    /// Song title as shown in the listing
    pub title: String,
    /// Composer ("music" column), possibly empty
    pub composer: String,
    /// Lyricist ("words" column), possibly empty
    pub lyricist: String,
}

/// Content extracted from a single item page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPage {
    /// Title heading, empty when absent
    pub title: String,
    /// Composer, empty when absent
    pub composer: String,
    /// Lyricist, empty when absent
    pub lyricist: String,
    /// Lyrics: stanzas separated by a blank line, empty when no body block exists
    pub body: String,
}

/// Extract item links from a catalog listing page
///
/// Only links whose path starts with `item_link_prefix` are kept; they are
/// resolved against `base_url`. Rows without such a link, or with an empty
/// title, are dropped.
pub fn extract_listing(html: &str, base_url: &Url, item_link_prefix: &str) -> Vec<ListingEntry> {
    let document = Html::parse_document(html);
    let selectors = &*SELECTORS;
    let mut entries = Vec::new();

    for link in document.select(&selectors.listing_link) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if !href.starts_with(item_link_prefix) {
            continue;
        }
        let Ok(source_url) = base_url.join(href) else {
            tracing::debug!(href, "Skipping unresolvable listing link");
            continue;
        };
        let title = element_text(link);
        if title.is_empty() {
            continue;
        }

        let row = link
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "tr");
        let (composer, lyricist) = match row {
            Some(row) => (
                first_text(row, &selectors.listing_composer),
                first_text(row, &selectors.listing_lyricist),
            ),
            None => (String::new(), String::new()),
        };

        entries.push(ListingEntry {
            source_url: source_url.to_string(),
            title,
            composer,
            lyricist,
        });
    }

    entries
}

/// Extract title, attribution and lyrics from an item page
pub fn extract_item(html: &str) -> ItemPage {
    let document = Html::parse_document(html);
    let selectors = &*SELECTORS;

    let title = document
        .select(&selectors.item_title)
        .next()
        .map(element_text)
        .unwrap_or_default();

    let (composer, lyricist) = match document.select(&selectors.item_info).next() {
        Some(info) => (
            first_text(info, &selectors.item_composer),
            first_text(info, &selectors.item_lyricist),
        ),
        None => (String::new(), String::new()),
    };

    let body = document
        .select(&selectors.item_body)
        .next()
        .map(|song| {
            song.select(&selectors.item_segment)
                .filter(|p| !inside_rating_widget(*p))
                .map(segment_text)
                .filter(|segment| !segment.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n")
        })
        .unwrap_or_default();

    ItemPage {
        title,
        composer,
        lyricist,
        body,
    }
}

/// Text of the first match of `selector` under `scope`, or empty
fn first_text(scope: ElementRef<'_>, selector: &Selector) -> String {
    scope
        .select(selector)
        .next()
        .map(element_text)
        .unwrap_or_default()
}

/// All text of an element with whitespace runs collapsed to single spaces
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// One lyric stanza: each text node trimmed, one per line, rating widgets skipped
fn segment_text(segment: ElementRef<'_>) -> String {
    let mut lines = Vec::new();
    collect_lines(segment, &mut lines);
    lines.join("\n")
}

fn collect_lines<'a>(element: ElementRef<'a>, lines: &mut Vec<&'a str>) {
    if is_rating_widget(element) {
        return;
    }
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let line = text.trim();
                if !line.is_empty() {
                    lines.push(line);
                }
            }
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_lines(child, lines);
                }
            }
            _ => {}
        }
    }
}

fn is_rating_widget(element: ElementRef<'_>) -> bool {
    element.value().classes().any(|class| class == RATING_CLASS)
}

fn inside_rating_widget(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(is_rating_widget)
}

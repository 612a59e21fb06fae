//! Main-content text and metadata extraction from HTML documents.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::api::models::{Metadata, MetadataValue};

// Create static selectors to avoid recompiling them each time
static STRIP_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("script, style").expect("Failed to parse script/style selector")
});
static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("title").expect("Failed to parse title selector")
});
static META_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("meta").expect("Failed to parse meta selector")
});
static MAIN_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("main").expect("Failed to parse main selector")
});
static ARTICLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("article").expect("Failed to parse article selector")
});
static DIV_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div[class]").expect("Failed to parse div selector")
});
static BODY_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("body").expect("Failed to parse body selector")
});

/// Class-name fragments that mark a `div` as the main content container.
const CONTENT_CLASS_HINTS: &[&str] = &["content", "main", "article"];

const OG_PREFIX: &str = "og:";

/// Result of running the extraction heuristic over a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedPage {
    pub text: String,
    pub title: Option<String>,
    pub metadata: Metadata,
}

/// Extracts readable text, the title and page metadata from `html`.
///
/// `_url` is accepted for callers that know the document origin; relative
/// links are not rewritten.
pub fn extract_page(html: &str, _url: &str) -> ExtractedPage {
    let mut document = Html::parse_document(html);
    strip_non_content(&mut document);

    let root = document.root_element();
    let title = root
        .select(&TITLE_SELECTOR)
        .next()
        .map(|title| title.text().collect::<String>().trim().to_string());
    let metadata = collect_metadata(root);
    let text = normalize_whitespace(&main_region(root).text().collect::<String>());

    ExtractedPage {
        text,
        title,
        metadata,
    }
}

/// Detaches `script` and `style` elements so their text never reaches output.
fn strip_non_content(document: &mut Html) {
    let ids: Vec<_> = document
        .root_element()
        .select(&STRIP_SELECTOR)
        .map(|element| element.id())
        .collect();

    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

fn collect_metadata(root: ElementRef<'_>) -> Metadata {
    let mut metadata = Metadata::new();

    for name in ["description", "keywords"] {
        let tag = root
            .select(&META_SELECTOR)
            .find(|meta| meta.value().attr("name") == Some(name));
        if let Some(tag) = tag {
            let content = tag.value().attr("content").unwrap_or_default();
            metadata.insert(name.to_string(), MetadataValue::Text(content.to_string()));
        }
    }

    for meta in root.select(&META_SELECTOR) {
        let Some(suffix) = meta
            .value()
            .attr("property")
            .and_then(|property| property.strip_prefix(OG_PREFIX))
        else {
            continue;
        };
        let content = meta.value().attr("content").unwrap_or_default();
        if !suffix.is_empty() && !content.is_empty() {
            metadata.insert(format!("og_{suffix}"), MetadataValue::Text(content.to_string()));
        }
    }

    metadata
}

/// Picks the element most likely to hold the page's primary content.
fn main_region(root: ElementRef<'_>) -> ElementRef<'_> {
    root.select(&MAIN_SELECTOR)
        .next()
        .or_else(|| root.select(&ARTICLE_SELECTOR).next())
        .or_else(|| {
            root.select(&DIV_SELECTOR).find(|div| {
                div.value()
                    .attr("class")
                    .is_some_and(|class| CONTENT_CLASS_HINTS.iter().any(|hint| class.contains(hint)))
            })
        })
        .or_else(|| root.select(&BODY_SELECTOR).next())
        .unwrap_or(root)
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Flattens text into a single line of fragments separated by one space.
///
/// Each line is trimmed and further split on double spaces; empty fragments
/// are dropped. Applying it to its own output is a no-op.
pub fn normalize_whitespace(text: &str) -> String {
    text.split(is_line_break)
        .map(str::trim)
        .flat_map(|line| line.split("  "))
        .map(str::trim)
        .filter(|fragment| !fragment.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

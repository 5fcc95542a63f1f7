//! HTML parser for extracting readable text and outbound links
//!
//! This module turns a fetched HTML document into:
//! - The page title
//! - The readable text of its main content
//! - Every followable `<a href>` link with its anchor text

use crate::collab::text::collapse_whitespace;
use crate::model::Link;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Elements whose text is navigation chrome or code, never content
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "iframe", "nav", "footer", "header", "aside", "form",
    "template", "svg",
];

/// Candidates for the main content root, in order of preference
const MAIN_CONTENT_SELECTORS: &[&str] = &["main", "[role=main]", "article", "body"];

/// Extracted information from an HTML page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Readable text, one block per line
    pub text: String,

    /// All followable links found on the page (absolute URLs)
    pub links: Vec<Link>,
}

/// Parses HTML content and extracts title, text and links
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document, including navigation
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs and fragment-only links
/// - Anything that is not http(s) after resolution
///
/// Fragments are stripped so `/faq#billing` and `/faq` are the same page.
///
/// # Example
///
/// ```
/// use ripple_qa::collab::parse_page;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><p>Hi</p><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_page(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links[0].href, "https://example.com/page");
/// ```
pub fn parse_page(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        text: extract_main_text(&document),
        links: extract_links(&document, base_url),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

/// Extracts the readable text of the main content region
fn extract_main_text(document: &Html) -> String {
    for selector in MAIN_CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(selector) else {
            continue;
        };
        if let Some(root) = document.select(&selector).next() {
            let text = collect_text(root);
            if !text.is_empty() {
                return text;
            }
        }
    }

    collect_text(document.root_element())
}

/// Collects text nodes under `root`, skipping chrome subtrees
fn collect_text(root: ElementRef<'_>) -> String {
    let mut lines = Vec::new();

    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let in_skipped = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| SKIPPED_TAGS.contains(&element.name()))
        });
        if in_skipped {
            continue;
        }

        let line = collapse_whitespace(text);
        if !line.is_empty() {
            lines.push(line);
        }
    }

    lines.join("\n")
}

/// Extracts all valid links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<Link> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            // Skip if it has the download attribute
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    let text = collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "));
                    links.push(Link::new(text, absolute_url));
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }
    absolute_url.set_fragment(None);
    Some(absolute_url.to_string())
}

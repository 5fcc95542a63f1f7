//! Text helpers shared by the prompt-based collaborators

use once_cell::sync::Lazy;
use regex::Regex;

static MARKDOWN_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([^\]]+)\]\((https?://[^)]+)\)").expect("markdown link regex should compile")
});
static BARE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://\S+").expect("bare url regex should compile"));
static BLANK_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("blank line regex should compile"));
static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").expect("fenced block regex should compile")
});
static JSON_ARRAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[\s\S]*\]").expect("json array regex should compile"));
static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex should compile"));

/// Strips link noise from page text before it is shown to a model
///
/// Markdown links become their label, bare URLs are removed and runs of
/// blank lines collapse to one.
pub fn clean_markdown(text: &str) -> String {
    let text = MARKDOWN_LINK.replace_all(text, "$1");
    let text = BARE_URL.replace_all(&text, "");
    let text = BLANK_RUNS.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Finds the JSON array in a model reply
///
/// Prefers the contents of a fenced code block, then the widest `[...]` span.
pub fn extract_json_array(text: &str) -> Option<&str> {
    if let Some(captures) = FENCED_BLOCK.captures(text) {
        return captures.get(1).map(|m| m.as_str());
    }
    JSON_ARRAY.find(text).map(|m| m.as_str())
}

/// Collapses every whitespace run to a single space
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Truncates to at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_markdown_keeps_link_labels() {
        let text = "See [the pricing page](https://example.com/pricing) for details.";
        assert_eq!(clean_markdown(text), "See the pricing page for details.");
    }

    #[test]
    fn test_clean_markdown_drops_bare_urls_and_blank_runs() {
        let text = "Visit https://example.com/x now\n\n\n\nNext";
        assert_eq!(clean_markdown(text), "Visit  now\n\nNext");
    }

    #[test]
    fn test_extract_json_from_fenced_block() {
        let reply = "Here you go:\n```json\n[{\"href\": \"https://a.com\"}]\n```";
        assert_eq!(
            extract_json_array(reply),
            Some("[{\"href\": \"https://a.com\"}]")
        );
    }

    #[test]
    fn test_extract_bare_json_array() {
        let reply = "Best links: [{\"href\": \"https://a.com\"}] hope that helps";
        assert_eq!(
            extract_json_array(reply),
            Some("[{\"href\": \"https://a.com\"}]")
        );
    }

    #[test]
    fn test_extract_json_none() {
        assert_eq!(extract_json_array("no links are relevant"), None);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Our\n   pricing\tplans "), "Our pricing plans");
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }
}

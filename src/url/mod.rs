//! URL handling module for Ripple-QA
//!
//! This module provides domain-scope extraction and the candidate link filter
//! that decides which outbound links of a page may be followed.

mod domain;

use crate::model::Link;
use std::collections::HashSet;

pub use domain::{domain_of, extract_domain, is_same_domain, normalize_domain};

/// Returns true for absolute `http://` or `https://` hrefs
pub fn is_http_url(href: &str) -> bool {
    let lower = href.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Filters a page's outbound links down to the ones worth following
///
/// A link survives when:
/// 1. its href is an absolute http(s) URL
/// 2. `is_visited` reports it has not been visited
/// 3. its domain scope equals `original_domain` exactly
///
/// Duplicate hrefs keep their first occurrence, so filtering an already
/// filtered list with the same visited set and domain yields the same list.
///
/// # Examples
///
/// ```
/// use ripple_qa::model::Link;
/// use ripple_qa::url::filter_candidate_links;
///
/// let links = vec![
///     Link::new("Pricing", "https://example.com/pricing"),
///     Link::new("Blog", "https://blog.example.com/"),
///     Link::new("Home", "https://example.com/"),
/// ];
/// let kept = filter_candidate_links(&links, |href| href == "https://example.com/", "example.com");
/// assert_eq!(kept.len(), 1);
/// assert_eq!(kept[0].href, "https://example.com/pricing");
/// ```
pub fn filter_candidate_links<F>(links: &[Link], is_visited: F, original_domain: &str) -> Vec<Link>
where
    F: Fn(&str) -> bool,
{
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for link in links {
        if !is_http_url(&link.href) {
            tracing::trace!("Skipping non-http link {}", link.href);
            continue;
        }
        if is_visited(&link.href) {
            tracing::trace!("Skipping visited link {}", link.href);
            continue;
        }
        if !is_same_domain(&link.href, original_domain) {
            tracing::trace!("Skipping off-domain link {}", link.href);
            continue;
        }
        if !seen.insert(link.href.as_str()) {
            continue;
        }
        candidates.push(link.clone());
    }

    candidates
}

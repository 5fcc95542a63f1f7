//! HTTP page fetcher
//!
//! This module handles all HTTP requests made while hopping, including:
//! - Building HTTP clients with the configured user agent and timeouts
//! - GET requests with redirect following
//! - Content-Type checks (HTML and plain text only)
//! - Error classification into [`RippleError`] variants

use crate::collab::parser::parse_page;
use crate::collab::PageFetcher;
use crate::config::FetcherConfig;
use crate::model::FetchedPage;
use crate::RippleError;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use url::Url;

/// Maximum redirect hops followed for a single fetch
const MAX_REDIRECTS: usize = 10;

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```
/// use ripple_qa::collab::build_http_client;
/// use ripple_qa::config::FetcherConfig;
///
/// let client = build_http_client(&FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.timeout())
        .connect_timeout(config.connect_timeout())
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`PageFetcher`] backed by `reqwest` and `scraper`
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: Client,
    max_body_bytes: usize,
}

impl HttpPageFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self, RippleError> {
        Ok(Self {
            client: build_http_client(config)?,
            max_body_bytes: config.max_body_bytes,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    /// Fetches a URL and extracts its text and links
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | 2xx `text/html` or XHTML | parsed page |
    /// | 2xx `text/plain` | body as text, no links |
    /// | 2xx other type | `ContentMismatch` |
    /// | non-2xx | `HttpStatus` |
    /// | timeout | `Timeout` |
    /// | other transport error | `Http` |
    async fn fetch(&self, url: &str) -> Result<FetchedPage, RippleError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                RippleError::Timeout {
                    url: url.to_string(),
                }
            } else {
                RippleError::Http {
                    url: url.to_string(),
                    source: e,
                }
            }
        })?;

        let status = response.status();
        let final_url = response.url().clone();

        if !status.is_success() {
            return Err(RippleError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_ascii_lowercase();

        let is_html = content_type.contains("text/html") || content_type.contains("xhtml");
        let is_plain = content_type.contains("text/plain");
        if !is_html && !is_plain {
            return Err(RippleError::ContentMismatch {
                url: url.to_string(),
                content_type,
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                RippleError::Timeout {
                    url: url.to_string(),
                }
            } else {
                RippleError::Http {
                    url: url.to_string(),
                    source: e,
                }
            }
        })?;
        let body = truncate_body(&body, self.max_body_bytes);

        if is_plain {
            return Ok(FetchedPage {
                final_url: final_url.to_string(),
                text: body.trim().to_string(),
                links: Vec::new(),
            });
        }

        Ok(page_from_html(body, &final_url))
    }
}

/// Builds a [`FetchedPage`] from an HTML body
fn page_from_html(body: &str, final_url: &Url) -> FetchedPage {
    let parsed = parse_page(body, final_url);
    let text = match parsed.title {
        Some(title) if !parsed.text.starts_with(&title) => format!("# {}\n\n{}", title, parsed.text),
        _ => parsed.text,
    };

    FetchedPage {
        final_url: final_url.to_string(),
        text,
        links: parsed.links,
    }
}

/// Truncates a body to at most `max_bytes`, on a char boundary
fn truncate_body(body: &str, max_bytes: usize) -> &str {
    if body.len() <= max_bytes {
        return body;
    }
    let mut end = max_bytes;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    tracing::debug!("Truncating {} byte body to {} bytes", body.len(), end);
    &body[..end]
}

//! Ripple-QA: multi-hop question answering over a single website
//!
//! This crate answers a question about a website by reading one page and, when
//! that page is not enough, following same-domain links breadth-first until a
//! sufficient answer is found or the run's budgets are spent.

pub mod collab;
pub mod config;
pub mod events;
pub mod hop;
pub mod model;
pub mod output;
pub mod url;

use thiserror::Error;

/// Main error type for Ripple-QA operations
#[derive(Debug, Error)]
pub enum RippleError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Expected HTML from {url}, got {content_type}")]
    ContentMismatch { url: String, content_type: String },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Link selection error: {0}")]
    Selection(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Missing environment variable: {0}")]
    MissingEnv(String),
}

/// Result type alias for Ripple-QA operations
pub type Result<T> = std::result::Result<T, RippleError>;

// Re-export commonly used types
pub use config::{Config, MultiSufficientPolicy, RunBudgets};
pub use events::{ChannelSink, EventSink, NoopSink, RunEvent, TracingSink};
pub use hop::{Collaborators, Orchestrator};
pub use model::{Answer, Link, PageNode, PageQAResult, RunOutcome, RunRequest, StopReason};
pub use url::{extract_domain, filter_candidate_links, is_same_domain, normalize_domain};

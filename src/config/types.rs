use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_MAX_HOPS: u32 = 3;
pub const DEFAULT_K_LINKS: usize = 5;
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;
pub const DEFAULT_TOTAL_PAGE_BUDGET: usize = 25;

/// Main configuration structure for Ripple-QA
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub budgets: RunBudgets,
    pub fetcher: FetcherConfig,
    pub selector: SelectorConfig,
    pub model: ModelConfig,
}

/// What to return when several children of one expansion are sufficient
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MultiSufficientPolicy {
    /// Merge every sufficient sibling into one multi-page answer
    #[default]
    Synthesize,
    /// Return whichever sufficient sibling finished first
    FirstCompleted,
}

/// Budgets governing a single run
///
/// Read-only while a run is in progress. Exceeding any of them stops
/// expansion; the run still returns through the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RunBudgets {
    /// Pages at this depth or deeper are answered but not expanded
    pub max_hops: u32,

    /// Maximum number of children selected per page
    pub k_links: usize,

    /// Width of the worker pool
    pub max_concurrency: usize,

    /// Hard cap on pages answered across the whole run
    pub total_page_budget: usize,

    /// Optional wall-clock limit for the whole run, in seconds
    pub wall_clock_secs: Option<u64>,

    /// Policy for simultaneously sufficient siblings
    pub multi_sufficient: MultiSufficientPolicy,
}

impl Default for RunBudgets {
    fn default() -> Self {
        Self {
            max_hops: DEFAULT_MAX_HOPS,
            k_links: DEFAULT_K_LINKS,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            total_page_budget: DEFAULT_TOTAL_PAGE_BUDGET,
            wall_clock_secs: None,
            multi_sufficient: MultiSufficientPolicy::default(),
        }
    }
}

impl RunBudgets {
    pub fn wall_clock(&self) -> Option<Duration> {
        self.wall_clock_secs.map(Duration::from_secs)
    }
}

/// HTTP page fetcher configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FetcherConfig {
    /// Per-fetch timeout (milliseconds)
    pub timeout_ms: u64,

    /// Connection timeout (milliseconds)
    pub connect_timeout_ms: u64,

    /// User agent sent with every request
    pub user_agent: String,

    /// Bodies larger than this are truncated before parsing
    pub max_body_bytes: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 12_000,
            connect_timeout_ms: 5_000,
            user_agent: format!("ripple-qa/{}", env!("CARGO_PKG_VERSION")),
            max_body_bytes: 2_000_000,
        }
    }
}

impl FetcherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Link selector configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SelectorConfig {
    /// Number of candidate links judged per model call
    pub chunk_size: usize,

    /// Chunks judged concurrently
    pub max_parallel_chunks: usize,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            chunk_size: 30,
            max_parallel_chunks: 4,
        }
    }
}

/// Chat-completions model configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ModelConfig {
    /// Base URL of an OpenAI-compatible API (without `/chat/completions`)
    pub endpoint: String,

    /// Model name sent with each request
    pub model: String,

    /// Name of the environment variable holding the API key
    pub api_key_env: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Per-call timeout (milliseconds)
    pub timeout_ms: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.2,
            timeout_ms: 60_000,
        }
    }
}

impl ModelConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

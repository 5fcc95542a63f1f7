//! Configuration module for Ripple-QA
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; a missing file section falls back to the defaults
//! observed in production (3 hops, 5 links, 5 workers, 25 pages).
//!
//! # Example
//!
//! ```no_run
//! use ripple_qa::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("ripple.toml")).unwrap();
//! println!("Max hops: {}", config.budgets.max_hops);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, FetcherConfig, ModelConfig, MultiSufficientPolicy, RunBudgets, SelectorConfig,
    DEFAULT_K_LINKS, DEFAULT_MAX_CONCURRENCY, DEFAULT_MAX_HOPS, DEFAULT_TOTAL_PAGE_BUDGET,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{validate, validate_budgets};

use crate::config::types::{Config, FetcherConfig, ModelConfig, RunBudgets, SelectorConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on worker pool width
const MAX_CONCURRENCY_LIMIT: usize = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_budgets(&config.budgets)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_selector_config(&config.selector)?;
    validate_model_config(&config.model)?;
    Ok(())
}

/// Validates run budgets
///
/// Also used for budgets overridden per call, which never pass through a file.
pub fn validate_budgets(budgets: &RunBudgets) -> Result<(), ConfigError> {
    // max_hops == 0 is legal: answer the initial page only

    if budgets.max_concurrency < 1 || budgets.max_concurrency > MAX_CONCURRENCY_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY_LIMIT, budgets.max_concurrency
        )));
    }

    if budgets.k_links < 1 {
        return Err(ConfigError::Validation(format!(
            "k_links must be >= 1, got {}",
            budgets.k_links
        )));
    }

    if budgets.total_page_budget < 1 {
        return Err(ConfigError::Validation(format!(
            "total_page_budget must be >= 1, got {}",
            budgets.total_page_budget
        )));
    }

    if budgets.wall_clock_secs == Some(0) {
        return Err(ConfigError::Validation(
            "wall_clock_secs must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "fetcher timeout_ms must be >= 100ms, got {}ms",
            config.timeout_ms
        )));
    }

    if config.connect_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "fetcher connect_timeout_ms must be >= 100ms, got {}ms",
            config.connect_timeout_ms
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.max_body_bytes == 0 {
        return Err(ConfigError::Validation(
            "max_body_bytes must be > 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_selector_config(config: &SelectorConfig) -> Result<(), ConfigError> {
    if config.chunk_size < 1 {
        return Err(ConfigError::Validation(format!(
            "chunk_size must be >= 1, got {}",
            config.chunk_size
        )));
    }

    if config.max_parallel_chunks < 1 {
        return Err(ConfigError::Validation(format!(
            "max_parallel_chunks must be >= 1, got {}",
            config.max_parallel_chunks
        )));
    }

    Ok(())
}

fn validate_model_config(config: &ModelConfig) -> Result<(), ConfigError> {
    let endpoint = Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid model endpoint: {}", e)))?;

    if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Model endpoint '{}' must use http or https",
            config.endpoint
        )));
    }

    if config.model.is_empty() {
        return Err(ConfigError::Validation("model cannot be empty".to_string()));
    }

    if !(0.0..=2.0).contains(&config.temperature) {
        return Err(ConfigError::Validation(format!(
            "temperature must be between 0.0 and 2.0, got {}",
            config.temperature
        )));
    }

    if config.timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "model timeout_ms must be >= 100ms, got {}ms",
            config.timeout_ms
        )));
    }

    Ok(())
}

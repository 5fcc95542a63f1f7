//! Ripple-QA main entry point
//!
//! This is the command-line interface for multi-hop website question answering.

use clap::Parser;
use ripple_qa::collab::{
    ChatCompletionsModel, ChunkedLinkSelector, CompletionModel, HttpPageFetcher, PageFetcher,
    PromptAnswerer, PromptChunkJudge, PromptSynthesizer,
};
use ripple_qa::config::{load_config_with_hash, validate_budgets, Config};
use ripple_qa::output::{format_json, format_text};
use ripple_qa::{Collaborators, Orchestrator, RunOutcome, RunRequest, StopReason, TracingSink};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Ripple-QA: answers a question about a website
///
/// Reads the page at URL and, when it does not answer the question, follows
/// the most relevant same-site links breadth-first until an answer is found
/// or the budgets run out.
#[derive(Parser, Debug)]
#[command(name = "ripple-qa")]
#[command(version)]
#[command(about = "Multi-hop question answering over a single website", long_about = None)]
struct Cli {
    /// Page to start from
    #[arg(value_name = "URL")]
    url: String,

    /// Question to answer
    #[arg(value_name = "QUESTION")]
    question: String,

    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,

    /// Maximum link depth below the starting page
    #[arg(long, value_name = "N")]
    max_hops: Option<u32>,

    /// Links explored per expanded page
    #[arg(long, value_name = "N")]
    k_links: Option<usize>,

    /// Child pages fetched at once
    #[arg(long, value_name = "N")]
    max_concurrency: Option<usize>,

    /// Total pages answered per run
    #[arg(long, value_name = "N")]
    page_budget: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    cfg
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => {
            tracing::debug!("No configuration file given, using defaults");
            Config::default()
        }
    };

    apply_overrides(&mut config, &cli);
    validate_budgets(&config.budgets)?;

    let outcome = handle_ask(&config, &cli.url, &cli.question).await?;

    if cli.json {
        println!("{}", format_json(&outcome)?);
    } else {
        print!("{}", format_text(&outcome));
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ripple_qa=info,warn"),
            1 => EnvFilter::new("ripple_qa=debug,info"),
            2 => EnvFilter::new("ripple_qa=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Applies budget flags on top of the loaded configuration
fn apply_overrides(config: &mut Config, cli: &Cli) {
    let budgets = &mut config.budgets;

    if let Some(max_hops) = cli.max_hops {
        budgets.max_hops = max_hops;
    }
    if let Some(k_links) = cli.k_links {
        budgets.k_links = k_links;
    }
    if let Some(max_concurrency) = cli.max_concurrency {
        budgets.max_concurrency = max_concurrency;
    }
    if let Some(page_budget) = cli.page_budget {
        budgets.total_page_budget = page_budget;
    }
}

/// Fetches the starting page and runs the orchestrator on it
async fn handle_ask(
    config: &Config,
    url: &str,
    question: &str,
) -> Result<RunOutcome, Box<dyn std::error::Error>> {
    let fetcher = Arc::new(HttpPageFetcher::new(&config.fetcher)?);
    let model: Arc<dyn CompletionModel> =
        Arc::new(ChatCompletionsModel::from_config(&config.model)?);

    let initial = match fetcher.fetch(url).await {
        Ok(page) => page,
        Err(e) => {
            tracing::error!("Failed to fetch starting page: {}", e);
            return Ok(RunOutcome::fallback(Vec::new(), 0, StopReason::QueueExhausted));
        }
    };

    tracing::info!(
        "Fetched {} ({} chars, {} links)",
        initial.final_url,
        initial.text.len(),
        initial.links.len()
    );

    let collaborators = Collaborators {
        answerer: Arc::new(PromptAnswerer::new(Arc::clone(&model))),
        selector: Arc::new(ChunkedLinkSelector::new(
            Arc::new(PromptChunkJudge::new(Arc::clone(&model))),
            &config.selector,
        )),
        fetcher,
        synthesizer: Some(Arc::new(PromptSynthesizer::new(model))),
    };

    let orchestrator = Orchestrator::new(collaborators, config.budgets.clone())
        .with_fetch_timeout(config.fetcher.timeout());
    let request = RunRequest::new(question, initial.final_url, initial.text, initial.links);

    Ok(orchestrator.run(request, Arc::new(TracingSink)).await)
}

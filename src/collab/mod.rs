//! Collaborator contracts consumed by the orchestrator, and their adapters
//!
//! The orchestrator only ever talks to the traits defined here:
//! - [`PageAnswerer`] turns page text and a question into an [`Answer`]
//! - [`LinkRelevanceSelector`] picks at most `k` promising links
//! - [`PageFetcher`] downloads a page and extracts its text and links
//! - [`Synthesizer`] merges several sufficient answers into one
//!
//! The adapters ([`HttpPageFetcher`], [`PromptAnswerer`],
//! [`ChunkedLinkSelector`], [`PromptSynthesizer`]) are thin shims over
//! `reqwest`/`scraper` and over any [`CompletionModel`].

mod answerer;
mod completion;
mod fetcher;
mod parser;
mod selector;
mod synthesizer;
pub mod text;

pub use answerer::{build_answer_prompt, parse_answer_output, PromptAnswerer};
pub use completion::ChatCompletionsModel;
pub use fetcher::{build_http_client, HttpPageFetcher};
pub use parser::{parse_page, ParsedPage};
pub use selector::{
    build_selection_prompt, parse_selection_output, ChunkJudge, ChunkedLinkSelector,
    PromptChunkJudge,
};
pub use synthesizer::{tagged_answers, PromptSynthesizer};

use crate::model::{Answer, FetchedPage, Link, PageQAResult};
use crate::RippleError;
use async_trait::async_trait;

/// Answers a question from one page's text
#[async_trait]
pub trait PageAnswerer: Send + Sync {
    async fn answer(&self, text: &str, question: &str, url: &str) -> Result<Answer, RippleError>;
}

/// Ranks and filters candidate links against a question
///
/// Implementations return at most `k` links, possibly none. An empty result
/// means nothing looked promising enough and is not an error.
#[async_trait]
pub trait LinkRelevanceSelector: Send + Sync {
    async fn select(
        &self,
        question: &str,
        candidates: &[Link],
        k: usize,
    ) -> Result<Vec<Link>, RippleError>;
}

/// Fetches a page and extracts its text and outbound links
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, RippleError>;
}

/// Merges several individually sufficient answers into one
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(
        &self,
        question: &str,
        results: &[PageQAResult],
    ) -> Result<String, RippleError>;
}

/// A text-in, text-out language model
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, RippleError>;
}

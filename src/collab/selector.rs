//! Chunked link relevance selection
//!
//! Candidate lists can run into the hundreds, so they are split into
//! fixed-size chunks that are judged concurrently. Every chunk has to be
//! judged before the global top-k can be assembled, so there is no early
//! cancellation here.

use crate::collab::text::{extract_json_array, truncate_chars};
use crate::collab::{CompletionModel, LinkRelevanceSelector};
use crate::config::SelectorConfig;
use crate::model::Link;
use crate::RippleError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Anchor text shown to the model per link
const MAX_LINK_TEXT_CHARS: usize = 80;

/// Judges one chunk of candidate links
///
/// Returns the chunk's relevant links, most relevant first.
#[async_trait]
pub trait ChunkJudge: Send + Sync {
    async fn judge(
        &self,
        question: &str,
        chunk: &[Link],
        k: usize,
    ) -> Result<Vec<Link>, RippleError>;
}

/// [`LinkRelevanceSelector`] that fans chunks out to a [`ChunkJudge`]
#[derive(Clone)]
pub struct ChunkedLinkSelector {
    judge: Arc<dyn ChunkJudge>,
    chunk_size: usize,
    max_parallel: usize,
}

impl ChunkedLinkSelector {
    pub fn new(judge: Arc<dyn ChunkJudge>, config: &SelectorConfig) -> Self {
        Self {
            judge,
            chunk_size: config.chunk_size.max(1),
            max_parallel: config.max_parallel_chunks.max(1),
        }
    }
}

#[async_trait]
impl LinkRelevanceSelector for ChunkedLinkSelector {
    async fn select(
        &self,
        question: &str,
        candidates: &[Link],
        k: usize,
    ) -> Result<Vec<Link>, RippleError> {
        if candidates.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let chunks: Vec<Vec<Link>> = candidates
            .chunks(self.chunk_size)
            .map(|chunk| chunk.to_vec())
            .collect();
        let chunk_count = chunks.len();
        tracing::debug!(
            "Judging {} candidate links in {} chunks",
            candidates.len(),
            chunk_count
        );

        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let mut tasks = JoinSet::new();

        for (index, chunk) in chunks.into_iter().enumerate() {
            let judge = Arc::clone(&self.judge);
            let semaphore = Arc::clone(&semaphore);
            let question = question.to_string();
            tasks.spawn(async move {
                let picked = match semaphore.acquire_owned().await {
                    Ok(_permit) => judge.judge(&question, &chunk, k).await,
                    Err(_) => Err(RippleError::Selection("selector semaphore closed".to_string())),
                };
                (index, chunk, picked)
            });
        }

        let mut per_chunk: Vec<Vec<Link>> = vec![Vec::new(); chunk_count];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, chunk, Ok(picked))) => {
                    per_chunk[index] = restrict_to_chunk(picked, &chunk);
                }
                Ok((index, _, Err(e))) => {
                    tracing::warn!("Link selection failed for chunk {}: {}", index, e);
                }
                Err(e) => {
                    tracing::warn!("Link selection task panicked: {}", e);
                }
            }
        }

        Ok(merge_selections(per_chunk, k))
    }
}

/// Keeps only picks whose href was actually offered in the chunk
///
/// The offered link is returned, so anchor text comes from the page rather
/// than from the judge.
fn restrict_to_chunk(picked: Vec<Link>, chunk: &[Link]) -> Vec<Link> {
    picked
        .into_iter()
        .filter_map(|pick| chunk.iter().find(|offered| offered.href == pick.href).cloned())
        .collect()
}

/// Merges per-chunk picks in chunk order, first occurrence of a URL wins
fn merge_selections(per_chunk: Vec<Vec<Link>>, k: usize) -> Vec<Link> {
    let mut seen = HashSet::new();
    per_chunk
        .into_iter()
        .flatten()
        .filter(|link| seen.insert(link.href.clone()))
        .take(k)
        .collect()
}

/// [`ChunkJudge`] that prompts a [`CompletionModel`]
#[derive(Clone)]
pub struct PromptChunkJudge {
    model: Arc<dyn CompletionModel>,
}

impl PromptChunkJudge {
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl ChunkJudge for PromptChunkJudge {
    async fn judge(
        &self,
        question: &str,
        chunk: &[Link],
        k: usize,
    ) -> Result<Vec<Link>, RippleError> {
        let prompt = build_selection_prompt(question, chunk, k);
        let reply = self.model.complete(&prompt).await?;
        parse_selection_output(&reply)
    }
}

/// Builds the selection prompt for one chunk
pub fn build_selection_prompt(question: &str, chunk: &[Link], k: usize) -> String {
    let listing = chunk
        .iter()
        .map(|link| {
            format!(
                "- {} ({})",
                truncate_chars(link.text.trim(), MAX_LINK_TEXT_CHARS),
                link.href
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Question: {}\n\
         Here are available links from the page:\n{}\n\n\
         Which of these links are most likely to contain the answer? Only include a link if \
         you are highly confident it leads to the answer; an empty array is a good reply when \
         none do. Reply with a JSON array of up to {} objects with 'text' and 'href', most \
         relevant first.",
        question, listing, k
    )
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SelectedLink {
    Object {
        href: String,
        #[serde(default)]
        text: String,
    },
    Href(String),
}

/// Parses a selection reply into links
///
/// A reply without any JSON array selects nothing. A reply whose array does
/// not parse is a [`RippleError::Selection`].
///
/// # Examples
///
/// ```
/// use ripple_qa::collab::parse_selection_output;
///
/// let links = parse_selection_output(r#"[{"text": "Pricing", "href": "https://example.com/pricing"}]"#).unwrap();
/// assert_eq!(links[0].href, "https://example.com/pricing");
/// assert!(parse_selection_output("None of these look relevant.").unwrap().is_empty());
/// ```
pub fn parse_selection_output(reply: &str) -> Result<Vec<Link>, RippleError> {
    let Some(json) = extract_json_array(reply) else {
        return Ok(Vec::new());
    };

    let selected: Vec<SelectedLink> = serde_json::from_str(json)
        .map_err(|e| RippleError::Selection(format!("unparseable selection: {}", e)))?;

    Ok(selected
        .into_iter()
        .map(|item| match item {
            SelectedLink::Object { href, text } => Link::new(text, href),
            SelectedLink::Href(href) => Link::new("", href),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn links(n: usize) -> Vec<Link> {
        (0..n)
            .map(|i| Link::new(format!("Page {}", i), format!("https://example.com/p{}", i)))
            .collect()
    }

    /// Picks every link whose index is a multiple of 3, failing on chunks
    /// that contain `fail_on`
    struct EveryThirdJudge {
        fail_on: Option<String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChunkJudge for EveryThirdJudge {
        async fn judge(
            &self,
            _question: &str,
            chunk: &[Link],
            k: usize,
        ) -> Result<Vec<Link>, RippleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(bad) = &self.fail_on {
                if chunk.iter().any(|l| &l.href == bad) {
                    return Err(RippleError::Selection("garbled".to_string()));
                }
            }
            Ok(chunk
                .iter()
                .filter(|l| {
                    let n: usize = l.href.trim_start_matches("https://example.com/p").parse().unwrap();
                    n % 3 == 0
                })
                .take(k)
                .cloned()
                .collect())
        }
    }

    struct InventingJudge;

    #[async_trait]
    impl ChunkJudge for InventingJudge {
        async fn judge(
            &self,
            _question: &str,
            chunk: &[Link],
            _k: usize,
        ) -> Result<Vec<Link>, RippleError> {
            Ok(vec![
                Link::new("made up", "https://elsewhere.com/"),
                Link::new("renamed", chunk[0].href.clone()),
                Link::new("again", chunk[0].href.clone()),
            ])
        }
    }

    fn selector(judge: Arc<dyn ChunkJudge>, chunk_size: usize) -> ChunkedLinkSelector {
        ChunkedLinkSelector::new(
            judge,
            &SelectorConfig {
                chunk_size,
                max_parallel_chunks: 2,
            },
        )
    }

    #[tokio::test]
    async fn test_chunks_are_merged_in_order_and_truncated() {
        let judge = Arc::new(EveryThirdJudge {
            fail_on: None,
            calls: AtomicUsize::new(0),
        });
        let selector = selector(judge.clone(), 4);

        let selected = selector.select("q", &links(20), 4).await.unwrap();
        let hrefs: Vec<&str> = selected.iter().map(|l| l.href.as_str()).collect();

        assert_eq!(judge.calls.load(Ordering::SeqCst), 5);
        assert_eq!(
            hrefs,
            vec![
                "https://example.com/p0",
                "https://example.com/p3",
                "https://example.com/p6",
                "https://example.com/p9"
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_chunk_contributes_nothing() {
        let judge = Arc::new(EveryThirdJudge {
            fail_on: Some("https://example.com/p0".to_string()),
            calls: AtomicUsize::new(0),
        });
        let selector = selector(judge, 4);

        let selected = selector.select("q", &links(8), 5).await.unwrap();
        let hrefs: Vec<&str> = selected.iter().map(|l| l.href.as_str()).collect();
        assert_eq!(hrefs, vec!["https://example.com/p6"]);
    }

    #[tokio::test]
    async fn test_picks_outside_the_chunk_are_dropped() {
        let selector = selector(Arc::new(InventingJudge), 10);
        let selected = selector.select("q", &links(3), 5).await.unwrap();
        assert_eq!(selected, vec![Link::new("Page 0", "https://example.com/p0")]);
    }

    #[tokio::test]
    async fn test_empty_candidates_skip_the_judge() {
        let judge = Arc::new(EveryThirdJudge {
            fail_on: None,
            calls: AtomicUsize::new(0),
        });
        let selector = selector(judge.clone(), 4);
        assert!(selector.select("q", &[], 3).await.unwrap().is_empty());
        assert_eq!(judge.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_parse_selection_accepts_plain_hrefs() {
        let links = parse_selection_output(r#"["https://example.com/a"]"#).unwrap();
        assert_eq!(links, vec![Link::new("", "https://example.com/a")]);
    }

    #[test]
    fn test_parse_selection_from_fenced_block() {
        let reply = "```json\n[{\"text\": \"FAQ\", \"href\": \"https://example.com/faq\"}]\n```";
        let links = parse_selection_output(reply).unwrap();
        assert_eq!(links, vec![Link::new("FAQ", "https://example.com/faq")]);
    }

    #[test]
    fn test_parse_selection_rejects_garbage_array() {
        assert!(matches!(
            parse_selection_output("[{\"nope\": 1}]"),
            Err(RippleError::Selection(_))
        ));
    }

    #[test]
    fn test_selection_prompt_truncates_anchor_text() {
        let long = "x".repeat(200);
        let prompt = build_selection_prompt("q", &[Link::new(long, "https://example.com/")], 3);
        assert!(prompt.contains(&format!("- {} (https://example.com/)", "x".repeat(80))));
        assert!(prompt.contains("up to 3 objects"));
    }
}

//! Frontier orchestrator - the breadth-first hop loop
//!
//! One [`Orchestrator::run`] call owns its frontier outright: the queue, the
//! visited set, the page count and the best partial answer are only touched
//! here, one node at a time. Concurrency lives inside a single expansion step,
//! in the [`WorkerPool`].

use crate::collab::{LinkRelevanceSelector, PageAnswerer, PageFetcher, Synthesizer};
use crate::config::RunBudgets;
use crate::events::{EventSink, RunEvent};
use crate::hop::aggregator::synthesize;
use crate::hop::frontier::Frontier;
use crate::hop::pool::{Batch, WorkerPool};
use crate::model::{
    Answer, Link, PageNode, PageQAResult, RunOutcome, RunRequest, StopReason, FALLBACK_ANSWER,
};
use crate::url::{extract_domain, filter_candidate_links, normalize_domain};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// The external services a run depends on
#[derive(Clone)]
pub struct Collaborators {
    pub answerer: Arc<dyn PageAnswerer>,
    pub selector: Arc<dyn LinkRelevanceSelector>,
    pub fetcher: Arc<dyn PageFetcher>,

    /// Merges simultaneously sufficient pages; without one their answers are
    /// concatenated with source tags
    pub synthesizer: Option<Arc<dyn Synthesizer>>,
}

/// Runs multi-hop question answering
pub struct Orchestrator {
    collaborators: Collaborators,
    pool: WorkerPool,
    budgets: RunBudgets,
}

impl Orchestrator {
    /// Creates an orchestrator
    ///
    /// # Arguments
    ///
    /// * `collaborators` - Answerer, selector, fetcher and optional synthesizer
    /// * `budgets` - Budgets used when a request carries none of its own
    pub fn new(collaborators: Collaborators, budgets: RunBudgets) -> Self {
        let pool = WorkerPool::new(
            Arc::clone(&collaborators.fetcher),
            Arc::clone(&collaborators.answerer),
        );

        Self {
            collaborators,
            pool,
            budgets,
        }
    }

    /// Sets the timeout applied to each child page fetch
    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.pool = self.pool.with_fetch_timeout(fetch_timeout);
        self
    }

    /// Answers `request.question` starting from the initial page
    ///
    /// Never fails: fetch, selection and answer errors degrade to the best
    /// answer found so far, or to a fixed fallback when nothing was answered.
    ///
    /// # Arguments
    ///
    /// * `request` - Question, initial page and optional per-run overrides
    /// * `sink` - Receives progress events for this run only
    pub async fn run(&self, request: RunRequest, sink: Arc<dyn EventSink>) -> RunOutcome {
        let budgets = request
            .budgets
            .clone()
            .unwrap_or_else(|| self.budgets.clone());
        let domain = request
            .original_domain
            .clone()
            .and_then(|d| normalize_domain(&d))
            .or_else(|| extract_domain(&request.initial_url))
            .unwrap_or_default();
        let deadline = budgets.wall_clock().map(|limit| Instant::now() + limit);

        let RunRequest {
            question,
            initial_url,
            initial_text,
            initial_links,
            ..
        } = request;

        tracing::info!(
            "Starting run on {} (domain {:?}, max hops {}, budget {} pages)",
            initial_url,
            domain,
            budgets.max_hops,
            budgets.total_page_budget
        );
        sink.emit(&RunEvent::RunStarted {
            question: question.clone(),
            initial_url: initial_url.clone(),
            domain: domain.clone(),
            max_hops: budgets.max_hops,
            k_links: budgets.k_links,
            max_concurrency: budgets.max_concurrency,
            total_page_budget: budgets.total_page_budget,
        });

        let mut frontier = Frontier::new(PageNode::seed(initial_url, initial_text, initial_links));
        let mut stop_reason = StopReason::QueueExhausted;
        let mut budget_reported = false;

        while let Some(node) = frontier.pop() {
            frontier.mark_visited(&node.url);

            if frontier.pages_seen() >= budgets.total_page_budget {
                tracing::info!(
                    "Page budget of {} reached, stopping",
                    budgets.total_page_budget
                );
                report_budget(&*sink, &mut budget_reported, frontier.pages_seen());
                stop_reason = StopReason::PageBudget;
                break;
            }

            if deadline_passed(deadline) {
                tracing::info!("Wall-clock budget spent, stopping");
                stop_reason = StopReason::WallClock;
                break;
            }

            // Children arrive already answered and counted by the pool
            if node.answer.is_none() {
                let answering = self
                    .collaborators
                    .answerer
                    .answer(&node.text, &question, &node.url);
                let answer = match within(deadline, answering).await {
                    Some(Ok(answer)) => answer,
                    Some(Err(e)) => {
                        tracing::warn!("Failed to answer {}: {}", node.url, e);
                        Answer::failed()
                    }
                    None => {
                        stop_reason = StopReason::WallClock;
                        break;
                    }
                };
                frontier.record_page();

                tracing::debug!(
                    "Answered {} at depth {} (sufficient: {}, confidence: {:?})",
                    node.url,
                    node.depth,
                    answer.sufficient,
                    answer.confidence
                );
                sink.emit(&RunEvent::PageAnswered {
                    url: node.url.clone(),
                    depth: node.depth,
                    sufficient: answer.sufficient,
                    confidence: answer.confidence,
                });

                let result = PageQAResult::new(
                    node.url.clone(),
                    node.text.clone(),
                    answer.clone(),
                    node.links.clone(),
                );
                if answer.sufficient {
                    tracing::info!("Sufficient answer on {}", node.url);
                    return self
                        .finish_sufficient(&question, vec![result], &frontier, &*sink)
                        .await;
                }
                frontier.offer_partial(result);
            }

            if node.depth >= budgets.max_hops {
                tracing::debug!("Not expanding {}: hop limit {}", node.url, budgets.max_hops);
                continue;
            }

            let candidates =
                filter_candidate_links(&node.links, |href| frontier.is_visited(href), &domain);
            sink.emit(&RunEvent::CandidatesFiltered {
                depth: node.depth,
                count: candidates.len(),
            });
            if candidates.is_empty() {
                tracing::debug!("No candidate links on {}", node.url);
                continue;
            }

            let remaining = frontier.remaining_budget(budgets.total_page_budget);
            if remaining == 0 {
                tracing::debug!("No page budget left to expand {}", node.url);
                report_budget(&*sink, &mut budget_reported, frontier.pages_seen());
                stop_reason = StopReason::PageBudget;
                continue;
            }
            let k = budgets.k_links.min(remaining);
            if k == 0 {
                continue;
            }

            let selecting = self.collaborators.selector.select(&question, &candidates, k);
            let picked = match within(deadline, selecting).await {
                Some(Ok(picked)) => picked,
                Some(Err(e)) => {
                    tracing::warn!("Link selection failed on {}: {}", node.url, e);
                    Vec::new()
                }
                None => {
                    stop_reason = StopReason::WallClock;
                    break;
                }
            };
            let selected = restrict_to_candidates(picked, &candidates, k);

            if selected.is_empty() {
                tracing::debug!("Selector chose no links on {}", node.url);
                continue;
            }

            tracing::info!(
                "Hop {} from {}: exploring {} of {} links",
                node.depth + 1,
                node.url,
                selected.len(),
                candidates.len()
            );
            sink.emit(&RunEvent::LinksSelected {
                depth: node.depth,
                links: selected.clone(),
            });

            let batch = Batch {
                links: selected.clone(),
                question: &question,
                original_domain: &domain,
                visited: frontier.visited().to_set(),
                max_concurrency: budgets.max_concurrency,
                policy: budgets.multi_sufficient,
            };
            let expansion = self.pool.run(batch, Arc::clone(&sink));
            let children = match within(deadline, expansion).await {
                Some(children) => children,
                None => {
                    tracing::info!("Wall-clock budget spent during expansion, stopping");
                    stop_reason = StopReason::WallClock;
                    break;
                }
            };

            // A page reached again through a redirect keeps its first result
            let children: Vec<PageQAResult> = children
                .into_iter()
                .filter(|child| frontier.mark_visited(&child.url))
                .collect();
            for child in &children {
                frontier.record_page();
                frontier.offer_partial(child.clone());
            }

            let sufficient: Vec<PageQAResult> =
                children.iter().filter(|c| c.sufficient()).cloned().collect();
            if !sufficient.is_empty() {
                tracing::info!(
                    "{} sufficient answer(s) at depth {}",
                    sufficient.len(),
                    node.depth + 1
                );
                return self
                    .finish_sufficient(&question, sufficient, &frontier, &*sink)
                    .await;
            }

            // Redirected children are visited under both addresses
            for link in &selected {
                frontier.mark_visited(&link.href);
            }
            for child in children {
                frontier.push(PageNode::from_result(child, node.depth + 1));
            }
        }

        self.finish_partial(frontier, stop_reason, &*sink)
    }

    async fn finish_sufficient(
        &self,
        question: &str,
        results: Vec<PageQAResult>,
        frontier: &Frontier,
        sink: &dyn EventSink,
    ) -> RunOutcome {
        let merged = synthesize(self.collaborators.synthesizer.as_deref(), question, results).await;

        let outcome = RunOutcome {
            answer: merged.answer,
            sources: merged.sources,
            visited_urls: frontier.visited().to_vec(),
            sufficient: true,
            confidence: merged.confidence,
            multi_page: merged.multi_page,
            pages_seen: frontier.pages_seen(),
            stop_reason: StopReason::Sufficient,
        };
        report_finished(sink, &outcome);
        outcome
    }

    fn finish_partial(
        &self,
        mut frontier: Frontier,
        stop_reason: StopReason,
        sink: &dyn EventSink,
    ) -> RunOutcome {
        let visited_urls = frontier.visited().to_vec();
        let pages_seen = frontier.pages_seen();

        let outcome = match frontier.take_best_partial() {
            Some(best) => {
                tracing::info!(
                    "No sufficient answer; returning best partial from {} (confidence {:?})",
                    best.url,
                    best.confidence()
                );
                let answer = if best.answer.text.trim().is_empty() {
                    FALLBACK_ANSWER.to_string()
                } else {
                    best.answer.text
                };
                let sources = if best.url.is_empty() {
                    Vec::new()
                } else {
                    vec![best.url]
                };
                RunOutcome {
                    answer,
                    sources,
                    visited_urls,
                    sufficient: false,
                    confidence: best.answer.confidence,
                    multi_page: false,
                    pages_seen,
                    stop_reason,
                }
            }
            None => {
                tracing::info!("No page was answered; returning fallback");
                RunOutcome::fallback(visited_urls, pages_seen, stop_reason)
            }
        };

        report_finished(sink, &outcome);
        outcome
    }
}

/// Keeps selector picks that are real candidates, first occurrence wins, at most `k`
fn restrict_to_candidates(picked: Vec<Link>, candidates: &[Link], k: usize) -> Vec<Link> {
    let allowed: HashSet<&str> = candidates.iter().map(|c| c.href.as_str()).collect();
    let mut seen = HashSet::new();

    picked
        .into_iter()
        .filter(|link| allowed.contains(link.href.as_str()))
        .filter(|link| seen.insert(link.href.clone()))
        .take(k)
        .collect()
}

fn deadline_passed(deadline: Option<Instant>) -> bool {
    deadline.map_or(false, |d| Instant::now() >= d)
}

/// Awaits `fut` unless the deadline passes first
async fn within<F: Future>(deadline: Option<Instant>, fut: F) -> Option<F::Output> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut).await.ok(),
        None => Some(fut.await),
    }
}

fn report_budget(sink: &dyn EventSink, reported: &mut bool, pages_seen: usize) {
    if !*reported {
        sink.emit(&RunEvent::BudgetExhausted { pages_seen });
        *reported = true;
    }
}

fn report_finished(sink: &dyn EventSink, outcome: &RunOutcome) {
    tracing::info!(
        "Run finished: sufficient={}, pages={}, visited={}, stop={:?}",
        outcome.sufficient,
        outcome.pages_seen,
        outcome.visited_urls.len(),
        outcome.stop_reason
    );
    sink.emit(&RunEvent::RunFinished {
        sufficient: outcome.sufficient,
        pages_seen: outcome.pages_seen,
        visited: outcome.visited_urls.len(),
    });
}

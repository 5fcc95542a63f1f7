//! Bounded worker pool for child pages
//!
//! Each selected link becomes one task: fetch, check the domain scope, answer.
//! A semaphore caps how many tasks do I/O at once. The first sufficient
//! result settles the batch and the remaining tasks are aborted.
//!
//! A page reached twice in one batch (two links redirecting to it) is answered
//! only by the task that lands on it first.

use crate::collab::{PageAnswerer, PageFetcher};
use crate::config::MultiSufficientPolicy;
use crate::events::{EventSink, RunEvent};
use crate::model::{Answer, Link, PageQAResult};
use crate::url::is_same_domain;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{self, JoinSet};

/// Default per-child fetch timeout
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Runs fetch-and-answer tasks for one expansion
#[derive(Clone)]
pub struct WorkerPool {
    fetcher: Arc<dyn PageFetcher>,
    answerer: Arc<dyn PageAnswerer>,
    fetch_timeout: Duration,
}

/// One expansion's worth of links and the limits they run under
pub struct Batch<'a> {
    pub links: Vec<Link>,
    pub question: &'a str,
    pub original_domain: &'a str,

    /// URLs already answered before this batch; a child landing on one is dropped
    pub visited: HashSet<String>,
    pub max_concurrency: usize,
    pub policy: MultiSufficientPolicy,
}

/// Everything one task needs, cloned out of the pool
struct ChildTask {
    fetcher: Arc<dyn PageFetcher>,
    answerer: Arc<dyn PageAnswerer>,
    sink: Arc<dyn EventSink>,
    question: Arc<str>,
    domain: Arc<str>,
    claimed: Arc<Mutex<HashSet<String>>>,
    fetch_timeout: Duration,
}

impl WorkerPool {
    pub fn new(fetcher: Arc<dyn PageFetcher>, answerer: Arc<dyn PageAnswerer>) -> Self {
        Self {
            fetcher,
            answerer,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    /// Fetches and answers the batch links with at most `max_concurrency` in flight
    ///
    /// Returns every result when none is sufficient. Otherwise returns only
    /// the sufficient ones: the first to finish, plus (under
    /// [`MultiSufficientPolicy::Synthesize`]) any sibling that had already
    /// finished sufficient by then. Tasks still running are aborted.
    ///
    /// A task that panics still yields a failed result for its link. A child
    /// whose final URL was visited before, or was already reached by a
    /// sibling, yields nothing.
    ///
    /// Result order follows completion, not input order.
    pub async fn run(&self, batch: Batch<'_>, sink: Arc<dyn EventSink>) -> Vec<PageQAResult> {
        if batch.links.is_empty() {
            return Vec::new();
        }

        let semaphore = Arc::new(Semaphore::new(batch.max_concurrency.max(1)));
        let question: Arc<str> = Arc::from(batch.question);
        let domain: Arc<str> = Arc::from(batch.original_domain);
        let claimed = Arc::new(Mutex::new(batch.visited));
        let mut hrefs: HashMap<task::Id, String> = HashMap::new();
        let mut tasks = JoinSet::new();

        for link in batch.links {
            let semaphore = Arc::clone(&semaphore);
            let href = link.href.clone();
            let task = ChildTask {
                fetcher: Arc::clone(&self.fetcher),
                answerer: Arc::clone(&self.answerer),
                sink: Arc::clone(&sink),
                question: Arc::clone(&question),
                domain: Arc::clone(&domain),
                claimed: Arc::clone(&claimed),
                fetch_timeout: self.fetch_timeout,
            };

            let handle = tasks.spawn(async move {
                // Held until the task finishes; the semaphore is never closed
                let _permit = semaphore.acquire_owned().await.ok();
                task.run(link).await
            });
            hrefs.insert(handle.id(), href);
        }

        let mut results = Vec::new();

        while let Some(joined) = tasks.join_next_with_id().await {
            let result = match joined {
                Ok((_, Some(result))) => result,
                Ok((_, None)) => continue,
                Err(e) => {
                    let href = hrefs.remove(&e.id()).unwrap_or_default();
                    tracing::warn!("Child task for {} failed to complete: {}", href, e);
                    sink.emit(&RunEvent::ChildFetchFinished {
                        url: href.clone(),
                        sufficient: false,
                        failed: true,
                    });
                    PageQAResult::failure(href, format!("worker failed: {}", e))
                }
            };

            if !result.sufficient() {
                results.push(result);
                continue;
            }

            tracing::debug!("Sufficient answer from {}, settling batch", result.url);
            let mut winners = vec![result];

            if batch.policy == MultiSufficientPolicy::Synthesize {
                while let Some(joined) = tasks.try_join_next() {
                    if let Ok(Some(sibling)) = joined {
                        if sibling.sufficient() {
                            winners.push(sibling);
                        }
                    }
                }
            }

            tasks.abort_all();
            return winners;
        }

        results
    }
}

impl ChildTask {
    async fn run(self, link: Link) -> Option<PageQAResult> {
        self.sink.emit(&RunEvent::ChildFetchStarted {
            url: link.href.clone(),
        });

        let result = self.fetch_and_answer(&link.href).await?;

        if let Some(error) = &result.error {
            tracing::debug!("Child {} failed: {}", link.href, error);
        }
        self.sink.emit(&RunEvent::ChildFetchFinished {
            url: result.url.clone(),
            sufficient: result.sufficient(),
            failed: result.is_failure(),
        });

        Some(result)
    }

    /// Claims `url` for this task; false when it was visited or claimed before
    fn claim(&self, url: &str) -> bool {
        match self.claimed.lock() {
            Ok(mut claimed) => claimed.insert(url.to_string()),
            // A sibling panicked while holding the lock; the orchestrator still dedups
            Err(poisoned) => poisoned.into_inner().insert(url.to_string()),
        }
    }

    async fn fetch_and_answer(&self, href: &str) -> Option<PageQAResult> {
        let page = match tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(href)).await {
            Ok(Ok(page)) => page,
            Ok(Err(e)) => return Some(PageQAResult::failure(href, e.to_string())),
            Err(_) => {
                return Some(PageQAResult::failure(
                    href,
                    format!("fetch timed out after {}ms", self.fetch_timeout.as_millis()),
                ))
            }
        };

        if !is_same_domain(&page.final_url, &self.domain) {
            return Some(PageQAResult::failure(
                href,
                format!("redirected outside {} to {}", self.domain, page.final_url),
            ));
        }

        if !self.claim(&page.final_url) {
            tracing::debug!("Skipping {}: {} already reached", href, page.final_url);
            return None;
        }

        let answered = match self
            .answerer
            .answer(&page.text, &self.question, &page.final_url)
            .await
        {
            Ok(answer) => PageQAResult::new(page.final_url, page.text, answer, page.links),
            Err(e) => {
                // Links stay usable for expansion even when the answer failed
                let mut result =
                    PageQAResult::new(page.final_url, page.text, Answer::failed(), page.links);
                result.error = Some(format!("answer failed: {}", e));
                result
            }
        };
        Some(answered)
    }
}

//! Frontier state for a single run
//!
//! Owned by the orchestrator's single thread of control for the lifetime of
//! one run and dropped when it returns. Workers never touch it; they hand
//! results back by value.

use crate::hop::aggregator::update_best;
use crate::model::{PageNode, PageQAResult};
use std::collections::{HashSet, VecDeque};

/// Visited URLs in first-visit order
#[derive(Debug, Clone, Default)]
pub struct VisitedUrls {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl VisitedUrls {
    /// Marks a URL visited; returns false if it already was
    ///
    /// Empty URLs (an initial page with no address) are never recorded.
    pub fn insert(&mut self, url: &str) -> bool {
        if url.is_empty() || self.seen.contains(url) {
            return false;
        }
        self.seen.insert(url.to_string());
        self.order.push(url.to_string());
        true
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    /// Snapshot of the set, for workers that must not touch the frontier
    pub fn to_set(&self) -> HashSet<String> {
        self.seen.clone()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.order.clone()
    }
}

/// BFS queue, visited set, page count and best partial answer
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<PageNode>,
    visited: VisitedUrls,
    pages_seen: usize,
    best_partial: Option<PageQAResult>,
}

impl Frontier {
    /// Creates a frontier seeded with the initial page, already marked visited
    pub fn new(seed: PageNode) -> Self {
        let mut visited = VisitedUrls::default();
        visited.insert(&seed.url);

        let mut queue = VecDeque::new();
        queue.push_back(seed);

        Self {
            queue,
            visited,
            pages_seen: 0,
            best_partial: None,
        }
    }

    /// Pops the oldest node (FIFO)
    pub fn pop(&mut self) -> Option<PageNode> {
        self.queue.pop_front()
    }

    /// Appends a node behind everything already queued
    pub fn push(&mut self, node: PageNode) {
        self.queue.push_back(node);
    }

    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.visited.insert(url)
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn visited(&self) -> &VisitedUrls {
        &self.visited
    }

    /// Counts one answered page
    pub fn record_page(&mut self) {
        self.pages_seen += 1;
    }

    pub fn pages_seen(&self) -> usize {
        self.pages_seen
    }

    /// Pages that may still be answered under `total_budget`
    pub fn remaining_budget(&self, total_budget: usize) -> usize {
        total_budget.saturating_sub(self.pages_seen)
    }

    /// Offers an answered page as the new best partial
    pub fn offer_partial(&mut self, candidate: PageQAResult) {
        self.best_partial = update_best(self.best_partial.take(), candidate);
    }

    pub fn take_best_partial(&mut self) -> Option<PageQAResult> {
        self.best_partial.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Answer;

    fn node(url: &str, depth: u32) -> PageNode {
        PageNode {
            url: url.to_string(),
            text: String::new(),
            links: vec![],
            depth,
            answer: None,
        }
    }

    fn answered(url: &str, confidence: u8) -> PageQAResult {
        PageQAResult::new(url, "", Answer::new("a", false, Some(confidence)), vec![])
    }

    #[test]
    fn test_seed_is_visited_and_queued() {
        let mut frontier = Frontier::new(node("https://example.com/", 0));
        assert!(frontier.is_visited("https://example.com/"));
        assert_eq!(frontier.pages_seen(), 0);
        assert_eq!(frontier.pop().unwrap().url, "https://example.com/");
        assert!(frontier.pop().is_none());
    }

    #[test]
    fn test_queue_is_fifo() {
        let mut frontier = Frontier::new(node("https://example.com/", 0));
        frontier.push(node("https://example.com/a", 1));
        frontier.push(node("https://example.com/b", 1));

        let order: Vec<String> = std::iter::from_fn(|| frontier.pop()).map(|n| n.url).collect();
        assert_eq!(
            order,
            vec![
                "https://example.com/",
                "https://example.com/a",
                "https://example.com/b"
            ]
        );
    }

    #[test]
    fn test_visited_once_in_first_visit_order() {
        let mut visited = VisitedUrls::default();
        assert!(visited.insert("https://example.com/b"));
        assert!(visited.insert("https://example.com/a"));
        assert!(!visited.insert("https://example.com/b"));
        assert!(!visited.insert(""));
        assert_eq!(
            visited.to_vec(),
            vec!["https://example.com/b", "https://example.com/a"]
        );
        assert!(visited.to_set().contains("https://example.com/a"));
        assert_eq!(visited.to_set().len(), 2);
    }

    #[test]
    fn test_remaining_budget_saturates() {
        let mut frontier = Frontier::new(node("https://example.com/", 0));
        frontier.record_page();
        frontier.record_page();
        assert_eq!(frontier.remaining_budget(5), 3);
        assert_eq!(frontier.remaining_budget(1), 0);
    }

    #[test]
    fn test_best_partial_keeps_highest() {
        let mut frontier = Frontier::new(node("https://example.com/", 0));
        frontier.offer_partial(answered("https://example.com/", 40));
        frontier.offer_partial(answered("https://example.com/a", 70));
        frontier.offer_partial(answered("https://example.com/b", 70));
        frontier.offer_partial(answered("https://example.com/c", 10));
        assert_eq!(frontier.take_best_partial().unwrap().url, "https://example.com/a");
        assert!(frontier.take_best_partial().is_none());
    }
}

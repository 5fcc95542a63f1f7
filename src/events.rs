//! Run events and the sinks that receive them
//!
//! The orchestrator reports progress through an [`EventSink`] passed into each
//! run. Delivery is the sink's business; the search never waits on it and
//! never fails because of it.

use crate::model::Link;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;

/// Progress notification emitted during a run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    RunStarted {
        question: String,
        initial_url: String,
        domain: String,
        max_hops: u32,
        k_links: usize,
        max_concurrency: usize,
        total_page_budget: usize,
    },
    PageAnswered {
        url: String,
        depth: u32,
        sufficient: bool,
        confidence: Option<u8>,
    },
    CandidatesFiltered {
        depth: u32,
        count: usize,
    },
    /// Links chosen for the next expansion, the "here's what I'm exploring" hook
    LinksSelected {
        depth: u32,
        links: Vec<Link>,
    },
    ChildFetchStarted {
        url: String,
    },
    ChildFetchFinished {
        url: String,
        sufficient: bool,
        failed: bool,
    },
    BudgetExhausted {
        pages_seen: usize,
    },
    RunFinished {
        sufficient: bool,
        pages_seen: usize,
        visited: usize,
    },
}

/// Receives run events
///
/// Implementations must not block: `emit` is called inline from the
/// orchestrator and from worker tasks.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &RunEvent);
}

/// Drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: &RunEvent) {}
}

/// Forwards events to `tracing` at debug level, as JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &RunEvent) {
        match serde_json::to_string(event) {
            Ok(json) => tracing::debug!(target: "ripple_qa::events", "{}", json),
            Err(e) => tracing::warn!("Failed to serialize run event: {}", e),
        }
    }
}

/// Forwards events to a channel owned by the caller
///
/// A closed receiver is ignored; the run carries on without a listener.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: UnboundedSender<RunEvent>,
}

impl ChannelSink {
    pub fn new(sender: UnboundedSender<RunEvent>) -> Self {
        Self { sender }
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: &RunEvent) {
        let _ = self.sender.send(event.clone());
    }
}

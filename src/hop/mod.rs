//! Multi-hop search over one website
//!
//! This module handles:
//! - The breadth-first frontier loop ([`Orchestrator`])
//! - Bounded, early-stopping fan-out over selected links ([`WorkerPool`])
//! - Best-partial tracking and multi-page synthesis ([`aggregator`])

pub mod aggregator;
mod frontier;
mod orchestrator;
mod pool;

pub use aggregator::{synthesize, update_best, Synthesized};
pub use frontier::{Frontier, VisitedUrls};
pub use orchestrator::{Collaborators, Orchestrator};
pub use pool::{Batch, WorkerPool, DEFAULT_FETCH_TIMEOUT};

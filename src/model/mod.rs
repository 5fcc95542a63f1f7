//! Data model shared by the orchestrator and its collaborators

mod page;
mod run;

pub use page::{Answer, FetchedPage, Link, PageNode, PageQAResult};
pub use run::{RunOutcome, RunRequest, StopReason, FALLBACK_ANSWER};

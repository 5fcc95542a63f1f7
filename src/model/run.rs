use crate::config::RunBudgets;
use crate::model::Link;
use serde::Serialize;

/// Answer returned when no page was ever answered
pub const FALLBACK_ANSWER: &str =
    "Sorry, I couldn't find a sufficient answer on the pages I visited.";

/// Input to a single orchestrator run
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub question: String,
    pub initial_url: String,
    pub initial_text: String,
    pub initial_links: Vec<Link>,

    /// Overrides the domain scope derived from `initial_url`
    pub original_domain: Option<String>,

    /// Overrides the orchestrator's default budgets for this run
    pub budgets: Option<RunBudgets>,
}

impl RunRequest {
    pub fn new(
        question: impl Into<String>,
        initial_url: impl Into<String>,
        initial_text: impl Into<String>,
        initial_links: Vec<Link>,
    ) -> Self {
        Self {
            question: question.into(),
            initial_url: initial_url.into(),
            initial_text: initial_text.into(),
            initial_links,
            original_domain: None,
            budgets: None,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.original_domain = Some(domain.into());
        self
    }

    pub fn with_budgets(mut self, budgets: RunBudgets) -> Self {
        self.budgets = Some(budgets);
        self
    }
}

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// A page (or several sibling pages) answered the question
    Sufficient,
    /// Nothing left in the frontier
    QueueExhausted,
    /// The total page budget was reached
    PageBudget,
    /// The wall-clock budget ran out
    WallClock,
}

/// Final result of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    pub answer: String,

    /// URLs of the pages the answer came from
    pub sources: Vec<String>,

    /// Every visited URL, in the order it was first visited
    pub visited_urls: Vec<String>,

    pub sufficient: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,

    pub multi_page: bool,

    /// Pages answered during the run
    pub pages_seen: usize,

    pub stop_reason: StopReason,
}

impl RunOutcome {
    /// Outcome for a run in which no page produced an answer
    pub fn fallback(visited_urls: Vec<String>, pages_seen: usize, stop_reason: StopReason) -> Self {
        Self {
            answer: FALLBACK_ANSWER.to_string(),
            sources: Vec::new(),
            visited_urls,
            sufficient: false,
            confidence: None,
            multi_page: false,
            pages_seen,
            stop_reason,
        }
    }
}

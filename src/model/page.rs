use serde::{Deserialize, Serialize};

/// An outbound hyperlink extracted from a page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    /// Anchor text, whitespace-collapsed
    #[serde(default)]
    pub text: String,

    /// Absolute URL
    pub href: String,
}

impl Link {
    pub fn new(text: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            href: href.into(),
        }
    }
}

/// The answering collaborator's verdict on one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub text: String,

    /// Whether the page fully answers the question
    pub sufficient: bool,

    /// Confidence in the range 0-100, when the answerer reports one
    pub confidence: Option<u8>,
}

impl Answer {
    pub fn new(text: impl Into<String>, sufficient: bool, confidence: Option<u8>) -> Self {
        Self {
            text: text.into(),
            sufficient,
            confidence: confidence.map(|c| c.min(100)),
        }
    }

    /// Insufficient, zero-confidence answer used when answering or fetching failed
    pub fn failed() -> Self {
        Self {
            text: String::new(),
            sufficient: false,
            confidence: Some(0),
        }
    }

    /// Confidence with a missing value treated as zero
    pub fn confidence_or_zero(&self) -> u8 {
        self.confidence.unwrap_or(0)
    }
}

/// A page as returned by the fetching collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// URL after redirects
    pub final_url: String,

    /// Extracted readable text
    pub text: String,

    /// Outbound links, absolute
    pub links: Vec<Link>,
}

/// One answered page, enriched with its provenance and outbound links
///
/// This is the value workers hand back to the orchestrator. The links are
/// kept so an insufficient result can be expanded further.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQAResult {
    pub url: String,
    pub text: String,
    pub answer: Answer,
    pub links: Vec<Link>,

    /// Set when the page could not be fetched or answered
    pub error: Option<String>,
}

impl PageQAResult {
    pub fn new(url: impl Into<String>, text: impl Into<String>, answer: Answer, links: Vec<Link>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
            answer,
            links,
            error: None,
        }
    }

    /// Zero-confidence, insufficient result carrying the attempted URL
    pub fn failure(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: String::new(),
            answer: Answer::failed(),
            links: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn sufficient(&self) -> bool {
        self.answer.sufficient
    }

    pub fn confidence(&self) -> Option<u8> {
        self.answer.confidence
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// A page waiting in the frontier
///
/// Nodes are never mutated: expanding a page produces new nodes for its
/// children. Children arrive already answered by the worker pool, so their
/// answer travels with the node and is not recomputed when popped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageNode {
    pub url: String,
    pub text: String,
    pub links: Vec<Link>,
    pub depth: u32,
    pub answer: Option<Answer>,
}

impl PageNode {
    /// The initial page of a run, at depth 0 and not yet answered
    pub fn seed(url: impl Into<String>, text: impl Into<String>, links: Vec<Link>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
            links,
            depth: 0,
            answer: None,
        }
    }

    /// A child page produced by the worker pool
    pub fn from_result(result: PageQAResult, depth: u32) -> Self {
        Self {
            url: result.url,
            text: result.text,
            links: result.links,
            depth,
            answer: Some(result.answer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_is_clamped() {
        let answer = Answer::new("x", false, Some(250));
        assert_eq!(answer.confidence, Some(100));
    }

    #[test]
    fn test_failure_result() {
        let result = PageQAResult::failure("https://example.com/404", "HTTP 404");
        assert!(!result.sufficient());
        assert_eq!(result.confidence(), Some(0));
        assert!(result.is_failure());
        assert!(result.links.is_empty());
    }

    #[test]
    fn test_child_node_carries_answer() {
        let result = PageQAResult::new(
            "https://example.com/a",
            "text",
            Answer::new("partial", false, Some(30)),
            vec![Link::new("b", "https://example.com/b")],
        );
        let node = PageNode::from_result(result, 2);
        assert_eq!(node.depth, 2);
        assert_eq!(node.links.len(), 1);
        assert_eq!(node.answer.map(|a| a.confidence_or_zero()), Some(30));
    }
}

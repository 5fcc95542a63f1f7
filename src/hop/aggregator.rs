//! Result aggregation
//!
//! Two jobs: keep the best-confidence partial answer seen so far, and fold
//! several simultaneously sufficient answers into one.

use crate::collab::{tagged_answers, Synthesizer};
use crate::model::PageQAResult;

/// Returns whichever of `current` and `candidate` should be the best partial
///
/// The candidate replaces the current best only with strictly higher
/// confidence; ties keep the current one. The first answered page always
/// becomes the best partial, even at confidence 0.
pub fn update_best(
    current: Option<PageQAResult>,
    candidate: PageQAResult,
) -> Option<PageQAResult> {
    match current {
        None => Some(candidate),
        Some(best) => {
            if candidate.answer.confidence_or_zero() > best.answer.confidence_or_zero() {
                Some(candidate)
            } else {
                Some(best)
            }
        }
    }
}

/// Final answer assembled from one or more sufficient pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesized {
    pub answer: String,
    pub sources: Vec<String>,
    pub confidence: Option<u8>,
    pub multi_page: bool,
}

/// Combines individually sufficient results into one answer
///
/// A single result is returned unchanged. Several are merged by the
/// synthesizer; without one, or when it fails, the url-tagged answers are
/// returned as they are. The combined confidence is the highest input
/// confidence.
pub async fn synthesize(
    synthesizer: Option<&dyn Synthesizer>,
    question: &str,
    results: Vec<PageQAResult>,
) -> Synthesized {
    let sources: Vec<String> = results
        .iter()
        .map(|r| r.url.clone())
        .filter(|url| !url.is_empty())
        .collect();
    let confidence = results.iter().filter_map(|r| r.confidence()).max();

    if results.len() == 1 {
        let only = &results[0];
        return Synthesized {
            answer: only.answer.text.clone(),
            sources,
            confidence: only.confidence(),
            multi_page: false,
        };
    }

    let answer = match synthesizer {
        Some(synthesizer) => match synthesizer.synthesize(question, &results).await {
            Ok(merged) => merged,
            Err(e) => {
                tracing::warn!("Synthesis failed, returning tagged answers: {}", e);
                tagged_answers(&results)
            }
        },
        None => tagged_answers(&results),
    };

    Synthesized {
        answer,
        sources,
        confidence,
        multi_page: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Answer;
    use crate::RippleError;
    use async_trait::async_trait;

    fn result(url: &str, confidence: Option<u8>) -> PageQAResult {
        PageQAResult::new(url, "", Answer::new(format!("from {}", url), true, confidence), vec![])
    }

    struct JoiningSynthesizer;

    #[async_trait]
    impl Synthesizer for JoiningSynthesizer {
        async fn synthesize(
            &self,
            _question: &str,
            results: &[PageQAResult],
        ) -> Result<String, RippleError> {
            Ok(results
                .iter()
                .map(|r| r.answer.text.as_str())
                .collect::<Vec<_>>()
                .join(" + "))
        }
    }

    struct BrokenSynthesizer;

    #[async_trait]
    impl Synthesizer for BrokenSynthesizer {
        async fn synthesize(
            &self,
            _question: &str,
            _results: &[PageQAResult],
        ) -> Result<String, RippleError> {
            Err(RippleError::Synthesis("offline".to_string()))
        }
    }

    #[test]
    fn test_update_best_first_candidate_wins() {
        let best = update_best(None, result("a", Some(0)));
        assert_eq!(best.unwrap().url, "a");
    }

    #[test]
    fn test_update_best_ties_keep_current() {
        let best = update_best(Some(result("a", Some(50))), result("b", Some(50)));
        assert_eq!(best.unwrap().url, "a");
    }

    #[test]
    fn test_update_best_missing_confidence_is_zero() {
        let best = update_best(Some(result("a", None)), result("b", Some(1)));
        assert_eq!(best.unwrap().url, "b");
        let best = update_best(Some(result("a", Some(1))), result("b", None));
        assert_eq!(best.unwrap().url, "a");
    }

    #[tokio::test]
    async fn test_single_result_is_unchanged() {
        let merged = synthesize(Some(&JoiningSynthesizer), "q", vec![result("a", Some(90))]).await;
        assert_eq!(merged.answer, "from a");
        assert_eq!(merged.sources, vec!["a"]);
        assert!(!merged.multi_page);
    }

    #[tokio::test]
    async fn test_multiple_results_are_merged() {
        let merged = synthesize(
            Some(&JoiningSynthesizer),
            "q",
            vec![result("a", Some(80)), result("b", Some(95))],
        )
        .await;
        assert_eq!(merged.answer, "from a + from b");
        assert_eq!(merged.sources, vec!["a", "b"]);
        assert_eq!(merged.confidence, Some(95));
        assert!(merged.multi_page);
    }

    #[tokio::test]
    async fn test_failed_synthesis_falls_back_to_tagged_answers() {
        let merged = synthesize(
            Some(&BrokenSynthesizer),
            "q",
            vec![result("a", Some(80)), result("b", Some(95))],
        )
        .await;
        assert_eq!(merged.answer, "[Source: a]\nfrom a\n\n[Source: b]\nfrom b");
        assert!(merged.multi_page);
    }
}

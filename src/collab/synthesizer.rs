use crate::collab::{CompletionModel, Synthesizer};
use crate::model::PageQAResult;
use crate::RippleError;
use async_trait::async_trait;
use std::sync::Arc;

/// Concatenates answers, each tagged with the page it came from
pub fn tagged_answers(results: &[PageQAResult]) -> String {
    results
        .iter()
        .map(|r| format!("[Source: {}]\n{}", r.url, r.answer.text.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// [`Synthesizer`] that asks a [`CompletionModel`] to merge answers
#[derive(Clone)]
pub struct PromptSynthesizer {
    model: Arc<dyn CompletionModel>,
}

impl PromptSynthesizer {
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Synthesizer for PromptSynthesizer {
    async fn synthesize(
        &self,
        question: &str,
        results: &[PageQAResult],
    ) -> Result<String, RippleError> {
        let prompt = format!(
            "Several pages of the same website each answered the user's question. Merge their \
             answers into one complete answer. Use only the information below and do not add new \
             facts. Keep quotes, numbers and code exactly as written, and cite the source URL \
             for each part.\n\n\
             USER QUESTION: {}\n\n\
             ANSWERS:\n{}",
            question,
            tagged_answers(results)
        );

        let merged = self.model.complete(&prompt).await?;
        let merged = merged.trim();
        if merged.is_empty() {
            return Err(RippleError::Synthesis("model returned an empty answer".to_string()));
        }
        Ok(merged.to_string())
    }
}

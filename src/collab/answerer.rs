//! Prompt-based page answerer
//!
//! The model is asked to quote the page verbatim and to finish its reply with
//! two markers that carry the sufficiency and confidence signals:
//!
//! ```text
//! SUFFICIENT: YES
//! CONFIDENCE: 85%
//! ```

use crate::collab::text::clean_markdown;
use crate::collab::{CompletionModel, PageAnswerer};
use crate::model::Answer;
use crate::RippleError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static CONFIDENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"CONFIDENCE: (\d+)%").expect("confidence regex should compile"));

const SUFFICIENT_YES: &str = "\nSUFFICIENT: YES";
const SUFFICIENT_NO: &str = "\nSUFFICIENT: NO";

/// [`PageAnswerer`] that prompts a [`CompletionModel`]
#[derive(Clone)]
pub struct PromptAnswerer {
    model: Arc<dyn CompletionModel>,
}

impl PromptAnswerer {
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl PageAnswerer for PromptAnswerer {
    async fn answer(&self, text: &str, question: &str, url: &str) -> Result<Answer, RippleError> {
        let prompt = build_answer_prompt(text, question, url);
        let reply = self.model.complete(&prompt).await?;
        Ok(parse_answer_output(&reply))
    }
}

/// Builds the answering prompt for one page
pub fn build_answer_prompt(text: &str, question: &str, url: &str) -> String {
    format!(
        "You are an expert assistant. Using only the current webpage content below, answer the \
         user's question by quoting the relevant passage, code block, or table word-for-word, \
         including all formatting, indentation, and line breaks. Do not paraphrase, summarize, \
         or shorten any part of the quoted answer unless absolutely necessary. If the content \
         has numbers, prices, code, tables, or other specific details, quote them exactly. If \
         multiple relevant passages are found, include all of them. If no answer is found, \
         summarize anything related and say that the answer does not appear to be present. Do \
         not invent facts.\n\
         At the end, write 'SUFFICIENT: YES' if the answer fully resolves the question, or \
         'SUFFICIENT: NO' if not. Then write 'CONFIDENCE: <0-100>%' for how confident you are \
         that this answers the question fully.\n\n\
         CONTENT:\n{}\n\n\
         USER QUESTION: {}\n\
         (Page URL: {})",
        clean_markdown(text),
        question,
        url
    )
}

/// Parses a model reply into an [`Answer`]
///
/// The answer text is everything before the sufficiency marker. A reply with
/// no marker is kept whole and treated as insufficient; a reply with no
/// confidence marker gets confidence 0.
///
/// # Examples
///
/// ```
/// use ripple_qa::collab::parse_answer_output;
///
/// let answer = parse_answer_output("Pro costs $20.\nSUFFICIENT: YES\nCONFIDENCE: 92%");
/// assert_eq!(answer.text, "Pro costs $20.");
/// assert!(answer.sufficient);
/// assert_eq!(answer.confidence, Some(92));
/// ```
pub fn parse_answer_output(reply: &str) -> Answer {
    let reply = reply.trim();

    let confidence = CONFIDENCE
        .captures(reply)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .map(|c| c.min(100) as u8)
        .unwrap_or(0);

    let (text, sufficient) = if let Some((before, _)) = reply.split_once(SUFFICIENT_YES) {
        (before.trim(), true)
    } else if let Some((before, _)) = reply.split_once(SUFFICIENT_NO) {
        (before.trim(), false)
    } else {
        (reply, false)
    };

    Answer::new(text, sufficient, Some(confidence))
}

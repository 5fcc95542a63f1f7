//! Run outcome rendering

use crate::model::{RunOutcome, StopReason};
use crate::RippleError;

/// Formats an outcome as markdown-style text
///
/// # Arguments
///
/// * `outcome` - The finished run
///
/// # Returns
///
/// A formatted string ending with a newline
pub fn format_text(outcome: &RunOutcome) -> String {
    let mut out = String::new();

    out.push_str("# Answer\n\n");
    out.push_str(outcome.answer.trim());
    out.push_str("\n\n");

    out.push_str("## Details\n\n");
    out.push_str(&format!(
        "- **Sufficient**: {}\n",
        if outcome.sufficient { "yes" } else { "no" }
    ));
    if let Some(confidence) = outcome.confidence {
        out.push_str(&format!("- **Confidence**: {}%\n", confidence));
    }
    if outcome.multi_page {
        out.push_str("- **Combined from several pages**: yes\n");
    }
    out.push_str(&format!("- **Pages answered**: {}\n", outcome.pages_seen));
    out.push_str(&format!(
        "- **Stopped because**: {}\n",
        describe_stop(outcome.stop_reason)
    ));

    if !outcome.sources.is_empty() {
        out.push_str("\n## Sources\n\n");
        for source in &outcome.sources {
            out.push_str(&format!("- {}\n", source));
        }
    }

    if !outcome.visited_urls.is_empty() {
        out.push_str(&format!(
            "\n## Visited ({})\n\n",
            outcome.visited_urls.len()
        ));
        for (i, url) in outcome.visited_urls.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, url));
        }
    }

    out
}

/// Serializes an outcome as pretty-printed JSON
pub fn format_json(outcome: &RunOutcome) -> Result<String, RippleError> {
    Ok(serde_json::to_string_pretty(outcome)?)
}

fn describe_stop(reason: StopReason) -> &'static str {
    match reason {
        StopReason::Sufficient => "a sufficient answer was found",
        StopReason::QueueExhausted => "no more links worth following",
        StopReason::PageBudget => "page budget reached",
        StopReason::WallClock => "time budget reached",
    }
}

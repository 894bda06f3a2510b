//! Removal of escalation advice the KB does not back up.
//!
//! When an answer tells the customer to escalate but none of the retrieved KB
//! chunks mention escalation, the escalation wording is softened, HIGH
//! confidence is downgraded to LOW and `missing_info` explains the gap.
//! The rewrite never contains the trigger stem, so filtering twice is the
//! same as filtering once.

use crate::answer::{Answer, Confidence};
use copilot_knowledge::EvidenceChunk;

/// Case-insensitive stem that marks escalation language.
pub const ESCALATION_STEM: &str = "escalat";

/// `missing_info` set when escalation advice was removed.
pub const ESCALATION_NOT_IN_KB: &str =
    "Escalation steps are not provided in the knowledge base for this issue.";

const SOFT_VERB: &str = "follow up with support";
const SOFT_NOUN: &str = "follow-up with support";

/// Whether `text` contains escalation language.
pub fn mentions_escalation(text: &str) -> bool {
    text.to_ascii_lowercase().contains(ESCALATION_STEM)
}

/// Whether any KB chunk mentions escalation.
pub fn kb_mentions_escalation(kb_evidence: &[EvidenceChunk]) -> bool {
    kb_evidence
        .iter()
        .any(|chunk| mentions_escalation(&chunk.content))
}

/// Strip unsupported escalation advice from an answer.
pub fn filter(mut answer: Answer, kb_evidence: &[EvidenceChunk]) -> Answer {
    if !mentions_escalation(&answer.text) || kb_mentions_escalation(kb_evidence) {
        return answer;
    }

    tracing::debug!("Softening escalation language not backed by KB evidence");

    answer.text = soften_escalation(&answer.text);
    if answer.confidence == Confidence::High {
        answer.confidence = Confidence::Low;
    }
    if answer.missing_info_is_empty() {
        answer.missing_info = Some(ESCALATION_NOT_IN_KB.to_string());
    }

    answer
}

/// Replace every word containing the escalation stem.
fn soften_escalation(text: &str) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let lower = text.to_ascii_lowercase();
    let bytes = lower.as_bytes();

    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut search_from = 0;

    while let Some(offset) = lower[search_from..].find(ESCALATION_STEM) {
        let hit = search_from + offset;

        let mut start = hit;
        while start > 0 && bytes[start - 1].is_ascii_alphanumeric() {
            start -= 1;
        }
        let mut end = hit + ESCALATION_STEM.len();
        while end < bytes.len() && bytes[end].is_ascii_alphanumeric() {
            end += 1;
        }

        out.push_str(&text[copied..start]);
        out.push_str(&replacement_for(&text[start..end], &lower[start..end]));

        copied = end;
        search_from = end;
    }

    out.push_str(&text[copied..]);
    out
}

fn replacement_for(word: &str, word_lower: &str) -> String {
    let soft = if word_lower.ends_with("ion") || word_lower.ends_with("ions") {
        SOFT_NOUN
    } else {
        SOFT_VERB
    };

    if word.starts_with(|c: char| c.is_ascii_uppercase()) {
        let mut capitalized = soft.to_string();
        capitalized[..1].make_ascii_uppercase();
        capitalized
    } else {
        soft.to_string()
    }
}

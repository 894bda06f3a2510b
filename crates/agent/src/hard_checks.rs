//! Deterministic grounding checks run before the judge.
//!
//! Every check is pure and returns its violations as messages; an empty list
//! means the check passed. Checks operate on the parsed answer JSON so that
//! loosely typed citations (`"chunk_id": "3"`) are judged the same way
//! regardless of how the answer was produced.

use crate::answer::integer_from_value;
use crate::grounding::{kb_mentions_escalation, mentions_escalation};
use copilot_knowledge::EvidenceChunk;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

const TAX_REFUND_KEYWORDS: &[&str] = &[
    "irs",
    "irs2go",
    "where's my refund",
    "wheres my refund",
    "1040",
    "w-2",
    "tax year",
    "efile",
    "e-file",
    "tax return",
    "state tax",
    "tax commission",
];

const COMMERCE_REFUND_KEYWORDS: &[&str] = &[
    "order", "purchase", "merchant", "store", "card", "bank", "amazon", "refund", "return",
];

const NETWORK_KEYWORDS: &[&str] = &["lte", "signal", "bars", "data", "internet", "load", "speed"];

/// Topic of a support question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    TaxRefund,
    CommerceRefund,
    Network,
    Unknown,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaxRefund => "tax_refund",
            Self::CommerceRefund => "commerce_refund",
            Self::Network => "network",
            Self::Unknown => "unknown",
        }
    }

    /// Topic hint keywords, lowercase.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::TaxRefund => TAX_REFUND_KEYWORDS,
            Self::CommerceRefund => COMMERCE_REFUND_KEYWORDS,
            Self::Network => NETWORK_KEYWORDS,
            Self::Unknown => &[],
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn contains_any(text_lower: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| text_lower.contains(keyword))
}

/// Classify a question by case-insensitive keyword containment.
///
/// Tax keywords win over everything; any other mention of "refund" is a
/// commerce refund; then network keywords; otherwise unknown.
pub fn infer_domain(question: &str) -> Domain {
    let q = question.to_lowercase();

    if contains_any(&q, Domain::TaxRefund.keywords()) {
        Domain::TaxRefund
    } else if q.contains("refund") {
        Domain::CommerceRefund
    } else if contains_any(&q, Domain::Network.keywords()) {
        Domain::Network
    } else {
        Domain::Unknown
    }
}

fn kb_text_lower(kb_evidence: &[EvidenceChunk]) -> String {
    kb_evidence
        .iter()
        .map(|chunk| chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
        .to_lowercase()
}

/// Every citation must name a retrieved KB chunk exactly.
pub fn check_citation_whitelist(answer: &Value, kb_evidence: &[EvidenceChunk]) -> Vec<String> {
    let allowed: HashSet<(&str, i64)> = kb_evidence.iter().map(EvidenceChunk::cite_key).collect();

    let citations = match answer.get("citations") {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(citations)) => citations,
        Some(other) => return vec![format!("Invalid citations field: {}", other)],
    };

    let mut errors = Vec::new();
    for citation in citations {
        let source = citation.get("source").unwrap_or(&Value::Null);
        let raw_chunk_id = citation.get("chunk_id").unwrap_or(&Value::Null);

        let Some(chunk_id) = integer_from_value(raw_chunk_id) else {
            errors.push(format!(
                "Invalid chunk_id in citation: {}",
                display_value(raw_chunk_id)
            ));
            continue;
        };

        let matched = source
            .as_str()
            .is_some_and(|source| allowed.contains(&(source, chunk_id)));
        if !matched {
            errors.push(format!(
                "Citation not in retrieved KB evidence: ({}, {})",
                display_value(source),
                chunk_id
            ));
        }
    }

    errors
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Flag tax-refund evidence retrieved for a question that is not about taxes.
pub fn check_domain_mismatch(question: &str, kb_evidence: &[EvidenceChunk]) -> Vec<String> {
    let question_domain = infer_domain(question);
    let has_tax_signals = contains_any(&kb_text_lower(kb_evidence), Domain::TaxRefund.keywords());

    if question_domain != Domain::TaxRefund && has_tax_signals {
        vec![
            "KB evidence appears to be about tax/IRS refunds, but the question is not tax-related."
                .to_string(),
        ]
    } else {
        Vec::new()
    }
}

/// Escalation advice requires escalation language in the KB evidence.
pub fn check_action_grounding(answer_text: &str, kb_evidence: &[EvidenceChunk]) -> Vec<String> {
    if mentions_escalation(answer_text) && !kb_mentions_escalation(kb_evidence) {
        vec![
            "Answer recommends escalation but KB evidence does not mention escalation."
                .to_string(),
        ]
    } else {
        Vec::new()
    }
}

/// Run all checks and collect every violation.
pub fn run_hard_checks(question: &str, answer: &Value, kb_evidence: &[EvidenceChunk]) -> Vec<String> {
    let answer_text = answer.get("answer").and_then(Value::as_str).unwrap_or_default();

    let mut errors = check_citation_whitelist(answer, kb_evidence);
    errors.extend(check_domain_mismatch(question, kb_evidence));
    errors.extend(check_action_grounding(answer_text, kb_evidence));
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn toy_kb() -> Vec<EvidenceChunk> {
        vec![
            EvidenceChunk::kb("policy.md", 0, "Refunds take 5-10 business days."),
            EvidenceChunk::kb("runbook.md", 0, "If a user is locked out, advise password reset."),
        ]
    }

    #[test]
    fn test_infer_domain() {
        assert_eq!(
            infer_domain("Where's my refund? I filed a 1040."),
            Domain::TaxRefund
        );
        assert_eq!(
            infer_domain("I want a refund for my order"),
            Domain::CommerceRefund
        );
        assert_eq!(
            infer_domain("My LTE signal is full bars but nothing loads"),
            Domain::Network
        );
        assert_eq!(infer_domain("Hello"), Domain::Unknown);
    }

    #[test]
    fn test_infer_domain_is_deterministic() {
        let question = "I asked for a refund a week ago. Still nothing. What next?";
        let first = infer_domain(question);
        for _ in 0..10 {
            assert_eq!(infer_domain(question), first);
        }
    }

    #[test]
    fn test_citation_whitelist_rejects_unknown_pair() {
        let answer = json!({
            "answer": "Refunds take 5-10 business days.",
            "citations": [{"source": "policy.md", "chunk_id": 99}]
        });

        let errors = check_citation_whitelist(&answer, &toy_kb());
        assert_eq!(
            errors,
            vec!["Citation not in retrieved KB evidence: (policy.md, 99)".to_string()]
        );
    }

    #[test]
    fn test_citation_whitelist_accepts_loose_ids() {
        let answer = json!({
            "citations": [
                {"source": "policy.md", "chunk_id": "0"},
                {"source": "runbook.md", "chunk_id": 0.0},
                {"source": "policy.md", "chunk_id": 0}
            ]
        });

        assert!(check_citation_whitelist(&answer, &toy_kb()).is_empty());
    }

    #[test]
    fn test_citation_whitelist_invalid_ids() {
        let answer = json!({
            "citations": [
                {"source": "policy.md", "chunk_id": "zero"},
                {"source": "policy.md", "chunk_id": 0.5},
                {"source": "policy.md"}
            ]
        });

        let errors = check_citation_whitelist(&answer, &toy_kb());
        assert_eq!(
            errors,
            vec![
                "Invalid chunk_id in citation: zero".to_string(),
                "Invalid chunk_id in citation: 0.5".to_string(),
                "Invalid chunk_id in citation: null".to_string(),
            ]
        );
    }

    #[test]
    fn test_ticket_citation_rejected() {
        let mut kb = toy_kb();
        kb.push(EvidenceChunk::ticket("twitter_support", 5, "Customer: x\nSupport: y"));
        let kb_only: Vec<EvidenceChunk> = kb
            .into_iter()
            .filter(|c| c.kind == copilot_knowledge::ChunkKind::Kb)
            .collect();

        let answer = json!({"citations": [{"source": "twitter_support", "chunk_id": 5}]});
        assert_eq!(check_citation_whitelist(&answer, &kb_only).len(), 1);
    }

    #[test]
    fn test_domain_mismatch_only_flags_tax_evidence() {
        let tax_kb = vec![EvidenceChunk::kb(
            "irs.md",
            0,
            "Use the IRS2Go app to check where's my refund for your tax return.",
        )];

        assert_eq!(
            check_domain_mismatch("I want a refund for my order", &tax_kb).len(),
            1
        );
        assert!(check_domain_mismatch("Where's my refund? I filed a 1040.", &tax_kb).is_empty());

        // Non-tax cross-topic evidence is not flagged
        assert!(check_domain_mismatch("Full bars LTE but nothing loads", &toy_kb()).is_empty());
    }

    #[test]
    fn test_action_grounding() {
        let errors = check_action_grounding("Please ESCALATE this.", &toy_kb());
        assert_eq!(errors.len(), 1);

        let escalation_kb = vec![EvidenceChunk::kb(
            "runbook.md",
            1,
            "Escalate billing issues if charge is duplicated.",
        )];
        assert!(check_action_grounding("Please escalate this.", &escalation_kb).is_empty());
        assert!(check_action_grounding("Wait a week.", &toy_kb()).is_empty());
    }

    #[test]
    fn test_run_hard_checks_collects_all_errors() {
        let tax_kb = vec![EvidenceChunk::kb("irs.md", 0, "File form 1040 by April.")];
        let answer = json!({
            "answer": "Escalate to billing.",
            "citations": [{"source": "policy.md", "chunk_id": 0}]
        });

        let errors = run_hard_checks("I was charged twice.", &answer, &tax_kb);
        assert_eq!(errors.len(), 3);

        // Pure: same inputs, same output
        assert_eq!(run_hard_checks("I was charged twice.", &answer, &tax_kb), errors);
    }
}

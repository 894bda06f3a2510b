//! Two-stage answer validation.
//!
//! 1. Deterministic hard checks over the parsed answer JSON.
//! 2. The semantic judge, only when every hard check passes.

use crate::answer::{Decision, ValidationResult};
use crate::hard_checks::run_hard_checks;
use crate::judge::Judge;
use copilot_core::{AppError, AppResult};
use copilot_knowledge::EvidenceChunk;
use serde_json::Value;
use std::sync::Arc;

/// Retrieval breadth suggested by every validator-issued retry.
pub const WIDENED_K: u32 = 10;

/// Lowest `suggested_k` a judge retry may carry.
pub const MIN_JUDGE_RETRY_K: u32 = 8;

/// Feedback for answer JSON that could not be parsed.
pub const UNPARSEABLE_FEEDBACK: &str = "Answer JSON could not be parsed; retrying.";

pub struct Validator {
    judge: Arc<dyn Judge>,
}

impl Validator {
    pub fn new(judge: Arc<dyn Judge>) -> Self {
        Self { judge }
    }

    /// Validate an answer against the KB evidence it was generated from.
    ///
    /// Malformed answer JSON and hard-check failures never reach the judge;
    /// both produce a widened retry on the original question.
    pub async fn validate(
        &self,
        question: &str,
        answer_json: &str,
        kb_evidence: &[EvidenceChunk],
    ) -> AppResult<ValidationResult> {
        let answer = match parse_answer_json(answer_json) {
            Ok(answer) => answer,
            Err(e) if !e.is_fatal() => {
                tracing::warn!("{}", e);
                return Ok(ValidationResult::retry(
                    UNPARSEABLE_FEEDBACK,
                    question,
                    WIDENED_K,
                ));
            }
            Err(e) => return Err(e),
        };

        let hard_errors = run_hard_checks(question, &answer, kb_evidence);
        if !hard_errors.is_empty() {
            tracing::debug!(?hard_errors, "Hard checks failed");
            return Ok(ValidationResult::retry(
                format!("Hard check failed: {}", hard_errors.join(" | ")),
                question,
                WIDENED_K,
            ));
        }

        let result = self.judge.judge(question, answer_json, kb_evidence).await?;
        Ok(enforce_retry_floor(result))
    }
}

fn parse_answer_json(answer_json: &str) -> AppResult<Value> {
    let value: Value = serde_json::from_str(answer_json)
        .map_err(|e| AppError::ValidationInputMalformed(format!("answer JSON: {}", e)))?;

    if !value.is_object() {
        return Err(AppError::ValidationInputMalformed(
            "answer JSON is not an object".to_string(),
        ));
    }

    Ok(value)
}

/// Judge retries always widen retrieval to at least `MIN_JUDGE_RETRY_K`.
fn enforce_retry_floor(mut result: ValidationResult) -> ValidationResult {
    if result.decision == Decision::Retry {
        let k = result
            .suggested_k
            .unwrap_or(MIN_JUDGE_RETRY_K)
            .max(MIN_JUDGE_RETRY_K);
        result.suggested_k = Some(k);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingJudge {
        result: ValidationResult,
        calls: AtomicUsize,
    }

    impl CountingJudge {
        fn new(result: ValidationResult) -> Arc<Self> {
            Arc::new(Self {
                result,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl Judge for CountingJudge {
        async fn judge(&self, _: &str, _: &str, _: &[EvidenceChunk]) -> AppResult<ValidationResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.result.clone())
        }
    }

    fn kb() -> Vec<EvidenceChunk> {
        vec![
            EvidenceChunk::kb("policy.md", 0, "Refunds take 5-10 business days."),
            EvidenceChunk::kb("runbook.md", 0, "If a user is locked out, advise password reset."),
        ]
    }

    const GOOD_ANSWER: &str = r#"{"answer": "Refunds take 5-10 business days.", "citations": [{"source": "policy.md", "chunk_id": 0}], "confidence": "medium", "next_steps": [], "similar_cases": []}"#;

    #[tokio::test]
    async fn test_unparseable_answer_skips_judge() {
        let judge = CountingJudge::new(ValidationResult::pass("ok"));
        let validator = Validator::new(judge.clone());

        for bad in ["{not json", "[1, 2, 3]"] {
            let result = validator.validate("Where is my refund?", bad, &kb()).await.unwrap();
            assert_eq!(
                result,
                ValidationResult::retry(UNPARSEABLE_FEEDBACK, "Where is my refund?", 10)
            );
        }
        assert_eq!(judge.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_hard_check_failure_skips_judge() {
        let judge = CountingJudge::new(ValidationResult::pass("ok"));
        let validator = Validator::new(judge.clone());

        let answer = r#"{"answer": "See policy.", "citations": [{"source": "policy.md", "chunk_id": 99}]}"#;
        let result = validator.validate("Where is my refund?", answer, &kb()).await.unwrap();

        assert_eq!(result.decision, Decision::Retry);
        assert_eq!(
            result.feedback,
            "Hard check failed: Citation not in retrieved KB evidence: (policy.md, 99)"
        );
        assert_eq!(result.suggested_query.as_deref(), Some("Where is my refund?"));
        assert_eq!(result.suggested_k, Some(10));
        assert_eq!(judge.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_hard_check_errors_joined() {
        let validator = Validator::new(CountingJudge::new(ValidationResult::pass("ok")));
        let answer = r#"{"answer": "Escalate it.", "citations": [{"source": "nope.md", "chunk_id": "x"}]}"#;

        let result = validator.validate("Where is my refund?", answer, &kb()).await.unwrap();
        assert_eq!(
            result.feedback,
            "Hard check failed: Invalid chunk_id in citation: x | \
             Answer recommends escalation but KB evidence does not mention escalation."
        );
    }

    #[tokio::test]
    async fn test_judge_decision_returned() {
        let judge = CountingJudge::new(ValidationResult::pass("Fully supported."));
        let validator = Validator::new(judge.clone());

        let result = validator.validate("Where is my refund?", GOOD_ANSWER, &kb()).await.unwrap();
        assert_eq!(result.decision, Decision::Pass);
        assert_eq!(judge.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_judge_retry_k_clamped() {
        let low_k = ValidationResult {
            decision: Decision::Retry,
            feedback: "policy threshold not in evidence".to_string(),
            suggested_query: None,
            suggested_k: Some(3),
        };
        let validator = Validator::new(CountingJudge::new(low_k));
        let result = validator.validate("q", GOOD_ANSWER, &kb()).await.unwrap();
        assert_eq!(result.suggested_k, Some(MIN_JUDGE_RETRY_K));
        assert_eq!(result.suggested_query, None);

        let no_k = ValidationResult {
            suggested_k: None,
            ..result.clone()
        };
        let validator = Validator::new(CountingJudge::new(no_k));
        let result = validator.validate("q", GOOD_ANSWER, &kb()).await.unwrap();
        assert_eq!(result.suggested_k, Some(MIN_JUDGE_RETRY_K));
    }

    #[tokio::test]
    async fn test_refuse_passes_through() {
        let validator = Validator::new(CountingJudge::new(ValidationResult::refuse("out of scope")));
        let result = validator.validate("q", GOOD_ANSWER, &kb()).await.unwrap();
        assert_eq!(result.decision, Decision::Refuse);
        assert_eq!(result.suggested_k, None);
    }
}

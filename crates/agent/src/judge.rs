//! Semantic judge consulted after the hard checks pass.

use crate::answer::ValidationResult;
use crate::generator::to_request;
use copilot_core::{AppError, AppResult};
use copilot_knowledge::EvidenceChunk;
use copilot_llm::{extract_json_object, LlmClient};
use copilot_prompt::{build_prompt, PromptDefinition};
use std::collections::HashMap;
use std::sync::Arc;

/// Decides whether an answer is fully supported by and on-topic for the evidence.
#[async_trait::async_trait]
pub trait Judge: Send + Sync {
    async fn judge(
        &self,
        question: &str,
        answer_json: &str,
        kb_evidence: &[EvidenceChunk],
    ) -> AppResult<ValidationResult>;
}

/// Render KB evidence as `[source#chunk_id] content` lines.
pub fn format_judge_evidence(kb_evidence: &[EvidenceChunk]) -> String {
    kb_evidence
        .iter()
        .map(|chunk| format!("[{}#{}] {}", chunk.source, chunk.chunk_id, chunk.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Judge backed by an LLM and the `support.judge` prompt.
pub struct LlmJudge {
    client: Arc<dyn LlmClient>,
    model: String,
    prompt: PromptDefinition,
}

impl LlmJudge {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>, prompt: PromptDefinition) -> Self {
        Self {
            client,
            model: model.into(),
            prompt,
        }
    }
}

#[async_trait::async_trait]
impl Judge for LlmJudge {
    async fn judge(
        &self,
        question: &str,
        answer_json: &str,
        kb_evidence: &[EvidenceChunk],
    ) -> AppResult<ValidationResult> {
        let mut variables = HashMap::new();
        variables.insert("question".to_string(), question.to_string());
        variables.insert("answer_json".to_string(), answer_json.to_string());
        variables.insert("kb_evidence".to_string(), format_judge_evidence(kb_evidence));

        let built = build_prompt(&self.prompt, variables)?;
        let request = to_request(built, &self.model);

        tracing::debug!("Asking judge {} to review answer", self.model);
        let response = self.client.complete(&request).await?;

        let json = extract_json_object(&response.content).ok_or_else(|| {
            AppError::Llm(format!(
                "Judge returned no JSON object: {}",
                response.content.trim()
            ))
        })?;

        serde_json::from_str(json)
            .map_err(|e| AppError::Llm(format!("Judge output does not match schema: {}", e)))
    }
}

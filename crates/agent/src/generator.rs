//! Answer generation from retrieved evidence.

use crate::answer::{Answer, SimilarCase};
use copilot_core::AppResult;
use copilot_knowledge::EvidenceChunk;
use copilot_llm::{LlmClient, LlmRequest};
use copilot_prompt::{build_prompt, BuiltPrompt, PromptDefinition};
use std::collections::HashMap;
use std::sync::Arc;

/// Produces one answer for a question from KB evidence and similar cases.
///
/// Implementations fail with `AppError::GenerationMalformed` when the model
/// output cannot be read as an answer; any other error aborts the run.
#[async_trait::async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(
        &self,
        question: &str,
        kb_evidence: &[EvidenceChunk],
        cases: &[SimilarCase],
    ) -> AppResult<Answer>;
}

/// Render KB evidence as `CITE_KEY=(source,chunk_id)` blocks separated by blank lines.
pub fn format_kb_evidence(kb_evidence: &[EvidenceChunk]) -> String {
    kb_evidence
        .iter()
        .map(|chunk| {
            format!(
                "CITE_KEY=({},{})\n{}",
                chunk.source, chunk.chunk_id, chunk.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render similar cases one per line.
pub fn format_cases(cases: &[SimilarCase]) -> String {
    cases
        .iter()
        .map(|case| {
            format!(
                "- (row_id={}) Customer: {} | Support: {}",
                case.row_id, case.customer_text, case.support_text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Turn a rendered prompt into a deterministic completion request.
pub(crate) fn to_request(built: BuiltPrompt, model: &str) -> LlmRequest {
    tracing::trace!(
        prompt = %built.metadata.source_prompt_id,
        variables = ?built.metadata.resolved_variables.keys().collect::<Vec<_>>(),
        "Rendered prompt"
    );

    let mut request = LlmRequest::new(built.user, model).with_temperature(0.0);
    if let Some(system) = built.system {
        request = request.with_system(system);
    }
    if built.json_output {
        request = request.with_json_output();
    }
    request
}

/// Generator backed by an LLM and the `support.generate` prompt.
pub struct LlmAnswerGenerator {
    client: Arc<dyn LlmClient>,
    model: String,
    prompt: PromptDefinition,
}

impl LlmAnswerGenerator {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>, prompt: PromptDefinition) -> Self {
        Self {
            client,
            model: model.into(),
            prompt,
        }
    }

    fn build_request(
        &self,
        question: &str,
        kb_evidence: &[EvidenceChunk],
        cases: &[SimilarCase],
    ) -> AppResult<LlmRequest> {
        let mut variables = HashMap::new();
        variables.insert("question".to_string(), question.to_string());
        variables.insert("kb_evidence".to_string(), format_kb_evidence(kb_evidence));
        variables.insert("similar_cases".to_string(), format_cases(cases));

        let built = build_prompt(&self.prompt, variables)?;
        Ok(to_request(built, &self.model))
    }
}

#[async_trait::async_trait]
impl AnswerGenerator for LlmAnswerGenerator {
    async fn generate(
        &self,
        question: &str,
        kb_evidence: &[EvidenceChunk],
        cases: &[SimilarCase],
    ) -> AppResult<Answer> {
        let request = self.build_request(question, kb_evidence, cases)?;

        tracing::debug!(
            "Generating answer with {} ({} KB chunks, {} cases)",
            self.model,
            kb_evidence.len(),
            cases.len()
        );

        let response = self.client.complete(&request).await?;
        tracing::debug!("Generation used {} tokens", response.usage.total_tokens);

        Answer::from_model_output(&response.content)
    }
}

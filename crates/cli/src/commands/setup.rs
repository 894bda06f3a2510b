//! Wiring shared by the commands: evidence store, LLM client, orchestrator.

use copilot_agent::{LlmAnswerGenerator, LlmJudge, Orchestrator};
use copilot_core::{config::AppConfig, AppError, AppResult};
use copilot_knowledge::MemoryEvidenceStore;
use copilot_llm::{create_client, LlmClient};
use copilot_prompt::{load_prompt, GENERATE_PROMPT_ID, JUDGE_PROMPT_ID};
use std::sync::Arc;
use std::time::Duration;

/// Open the evidence store: the built-in toy KB with `demo`, otherwise the
/// configured JSONL corpora.
pub fn open_store(config: &AppConfig, demo: bool) -> AppResult<Arc<MemoryEvidenceStore>> {
    if demo {
        tracing::info!("Using the built-in demo knowledge base");
        return Ok(Arc::new(MemoryEvidenceStore::demo()));
    }

    let kb_path = config.kb_corpus_path();
    let tickets_path = config.tickets_corpus_path();
    tracing::debug!("KB corpus: {:?}", kb_path);
    tracing::debug!("Ticket corpus: {:?}", tickets_path);

    Ok(Arc::new(MemoryEvidenceStore::load(&kb_path, &tickets_path)?))
}

/// Create the client for the active provider.
pub fn llm_client(config: &AppConfig) -> AppResult<Arc<dyn LlmClient>> {
    config.validate()?;

    let provider = config.provider.as_str();
    let endpoint = config.provider_endpoint(provider);
    let api_key = config.resolve_api_key(provider);
    let timeout = Duration::from_secs(config.provider_timeout_secs(provider));

    create_client(provider, endpoint.as_deref(), api_key.as_deref(), timeout)
}

/// Assemble an orchestrator generating with `model` and judging with `judge_model`.
pub fn orchestrator(
    config: &AppConfig,
    store: Arc<MemoryEvidenceStore>,
    client: Arc<dyn LlmClient>,
    model: &str,
    judge_model: &str,
) -> AppResult<Orchestrator> {
    let (generate_prompt, generate_source) = load_prompt(&config.workspace, GENERATE_PROMPT_ID)?;
    let (judge_prompt, judge_source) = load_prompt(&config.workspace, JUDGE_PROMPT_ID)?;
    tracing::debug!(
        "Prompts: {} ({:?}), {} ({:?})",
        generate_prompt.id,
        generate_source,
        judge_prompt.id,
        judge_source
    );
    tracing::debug!("Generator model: {}, judge model: {}", model, judge_model);

    let generator = LlmAnswerGenerator::new(client.clone(), model, generate_prompt);
    let judge = LlmJudge::new(client, judge_model, judge_prompt);

    Ok(Orchestrator::new(store, Arc::new(generator), Arc::new(judge)))
}

/// Retrieval breadth from a flag, falling back to the configured value.
pub fn breadth(flag: Option<usize>, configured: u32, name: &str) -> AppResult<usize> {
    let k = flag.unwrap_or(configured as usize);
    if k == 0 {
        return Err(AppError::Config(format!("{} must be greater than zero", name)));
    }
    Ok(k)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breadth_prefers_flag() {
        assert_eq!(breadth(Some(7), 5, "--kb-k").unwrap(), 7);
        assert_eq!(breadth(None, 5, "--kb-k").unwrap(), 5);
    }

    #[test]
    fn test_breadth_rejects_zero() {
        assert!(matches!(
            breadth(Some(0), 5, "--kb-k"),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_demo_store_needs_no_corpus() {
        let config = AppConfig::default();
        let store = open_store(&config, true).unwrap();
        assert!(store.len(copilot_knowledge::Corpus::Kb) > 0);
    }
}

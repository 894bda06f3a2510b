//! Grounded answer loop for the support copilot.
//!
//! Retrieves evidence, generates a citation-bearing answer, validates it with
//! deterministic hard checks and a semantic judge, and retries once with
//! widened retrieval when validation asks for more context.
//!
//! # Example
//! ```no_run
//! use copilot_agent::{LlmAnswerGenerator, LlmJudge, Orchestrator};
//! use copilot_knowledge::MemoryEvidenceStore;
//! use copilot_llm::OllamaClient;
//! use copilot_prompt::{builtin_prompt, GENERATE_PROMPT_ID, JUDGE_PROMPT_ID};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(OllamaClient::new());
//! let generator = LlmAnswerGenerator::new(client.clone(), "llama3.2", builtin_prompt(GENERATE_PROMPT_ID)?);
//! let judge = LlmJudge::new(client, "llama3.2", builtin_prompt(JUDGE_PROMPT_ID)?);
//!
//! let orchestrator = Orchestrator::new(
//!     Arc::new(MemoryEvidenceStore::demo()),
//!     Arc::new(generator),
//!     Arc::new(judge),
//! );
//! let state = orchestrator.run("My EU refund hasn't arrived.", 5, 3).await?;
//! println!("{:?}: {:?}", state.decision, state.feedback);
//! # Ok(())
//! # }
//! ```

pub mod answer;
pub mod cases;
pub mod eval;
pub mod generator;
pub mod grounding;
pub mod hard_checks;
pub mod judge;
pub mod orchestrator;
pub mod state;
pub mod validator;

#[cfg(test)]
mod tests;

// Re-export main types
pub use answer::{Answer, Citation, Confidence, Decision, SimilarCase, ValidationResult};
pub use eval::{run_eval, summarize, EvalRecord, EvalSummary, EVAL_QUESTIONS};
pub use generator::{AnswerGenerator, LlmAnswerGenerator};
pub use judge::{Judge, LlmJudge};
pub use orchestrator::Orchestrator;
pub use state::{RunState, Stage, MAX_RETRIES};
pub use validator::Validator;

//! Ask command handler.
//!
//! Runs one support question through the grounded answer loop.

use super::setup;
use clap::Args;
use copilot_agent::RunState;
use copilot_core::{config::AppConfig, AppResult};
use serde_json::json;

/// Answer a support question from the knowledge base
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The customer question
    pub question: String,

    /// Number of KB chunks to retrieve
    #[arg(long)]
    pub kb_k: Option<usize>,

    /// Number of similar tickets to retrieve
    #[arg(long)]
    pub tickets_k: Option<usize>,

    /// Model used by the judge (defaults to --model)
    #[arg(long)]
    pub judge_model: Option<String>,

    /// Use the built-in demo knowledge base instead of the corpora
    #[arg(long)]
    pub demo: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let kb_k = setup::breadth(self.kb_k, config.retrieval.kb_k, "--kb-k")?;
        let tickets_k = setup::breadth(self.tickets_k, config.retrieval.tickets_k, "--tickets-k")?;
        let judge_model = self
            .judge_model
            .as_deref()
            .unwrap_or_else(|| config.effective_judge_model());

        let store = setup::open_store(config, self.demo)?;
        let client = setup::llm_client(config)?;
        let orchestrator = setup::orchestrator(config, store, client, &config.model, judge_model)?;

        let state = orchestrator.run(&self.question, kb_k, tickets_k).await?;

        if self.json {
            let report = run_report(&state);
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_run(&state);
        }

        Ok(())
    }
}

/// JSON view of a finished run.
fn run_report(state: &RunState) -> serde_json::Value {
    let evidence: Vec<_> = state
        .kb_evidence
        .iter()
        .map(|chunk| format!("{}#{}", chunk.source, chunk.chunk_id))
        .collect();

    json!({
        "run_id": state.run_id,
        "started_at": state.started_at.to_rfc3339(),
        "question": state.question,
        "query": state.query,
        "decision": state.decision,
        "feedback": state.feedback,
        "retries": state.retries,
        "kb_evidence": evidence,
        "answer": state.answer,
    })
}

fn print_run(state: &RunState) {
    let decision = state.decision.map(|d| d.as_str()).unwrap_or("none");
    println!("Decision: {}", decision);
    if let Some(feedback) = &state.feedback {
        println!("Feedback: {}", feedback);
    }
    if state.retries > 0 {
        println!("Retries:  {} (final query: {})", state.retries, state.query);
    }
    println!();

    let Some(answer) = &state.answer else {
        println!("No answer was produced.");
        return;
    };

    println!("{}", answer.text);
    println!();
    println!("Confidence: {}", answer.confidence);

    if !answer.citations.is_empty() {
        println!("Citations:");
        for citation in &answer.citations {
            println!("  - {}#{}", citation.source, citation.chunk_id);
        }
    }

    if !answer.next_steps.is_empty() {
        println!("Next steps:");
        for (i, step) in answer.next_steps.iter().enumerate() {
            println!("  {}. {}", i + 1, step);
        }
    }

    if !answer.missing_info_is_empty() {
        println!("Missing info: {}", answer.missing_info.as_deref().unwrap_or_default());
    }

    if !answer.similar_cases.is_empty() {
        println!("Similar cases: {}", answer.similar_cases.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use copilot_agent::{Answer, Confidence, Decision};

    #[test]
    fn test_run_report_shape() {
        let mut state = RunState::new("Where is my refund?", 5, 3);
        state.decision = Some(Decision::Retry);
        state.feedback = Some("Need more context".to_string());
        state.answer = Some(Answer {
            text: "Refunds take 5-10 business days.".to_string(),
            citations: Vec::new(),
            confidence: Confidence::Low,
            missing_info: None,
            next_steps: Vec::new(),
            similar_cases: Vec::new(),
        });

        let report = run_report(&state);
        assert_eq!(report["decision"], "RETRY_WITH_MORE_CONTEXT");
        assert_eq!(report["answer"]["answer"], "Refunds take 5-10 business days.");
        assert_eq!(report["answer"]["confidence"], "low");
        assert_eq!(report["retries"], 0);
    }
}

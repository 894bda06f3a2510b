//! Batch evaluation over a fixed question set.
//!
//! Runs every question through the loop and aggregates decisions, confidence
//! and citation counts so that two generation models can be compared.

use crate::orchestrator::Orchestrator;
use crate::state::RunState;
use copilot_core::AppResult;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use std::collections::BTreeMap;

/// Refund, connectivity and billing questions used for model comparison.
pub const EVAL_QUESTIONS: &[&str] = &[
    "My EU refund hasn't arrived. What should I do?",
    "I asked for a refund a week ago. Still nothing. What next?",
    "Full bars LTE but nothing loads. Help!",
    "My data is very slow even with good signal.",
    "I was charged twice. What should I do?",
];

/// Outcome of one evaluated question.
#[derive(Debug, Clone, Serialize)]
pub struct EvalRecord {
    pub question: String,
    pub decision: Option<String>,
    pub feedback: Option<String>,
    pub confidence: Option<String>,
    pub num_citations: usize,
    pub num_similar_cases: usize,
    pub retries: u32,
}

impl From<&RunState> for EvalRecord {
    fn from(state: &RunState) -> Self {
        let answer = state.answer.as_ref();
        Self {
            question: state.question.clone(),
            decision: state.decision.map(|d| d.as_str().to_string()),
            feedback: state.feedback.clone(),
            confidence: answer.map(|a| a.confidence.as_str().to_string()),
            num_citations: answer.map_or(0, |a| a.citations.len()),
            num_similar_cases: answer.map_or(0, |a| a.similar_cases.len()),
            retries: state.retries,
        }
    }
}

/// Aggregate over a set of records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvalSummary {
    /// Count per final decision
    pub decisions: BTreeMap<String, usize>,

    /// Count per answer confidence; runs without an answer count as "none"
    pub confidence: BTreeMap<String, usize>,

    pub avg_citations: f64,
    pub avg_similar_cases: f64,

    /// Share of runs that ended on RETRY_WITH_MORE_CONTEXT
    pub retry_rate: f64,
}

/// Summarize evaluation records. An empty input yields zeros.
pub fn summarize(records: &[EvalRecord]) -> EvalSummary {
    let mut decisions = BTreeMap::new();
    let mut confidence = BTreeMap::new();

    for record in records {
        let decision = record.decision.clone().unwrap_or_else(|| "none".to_string());
        *decisions.entry(decision).or_insert(0) += 1;

        let conf = record.confidence.clone().unwrap_or_else(|| "none".to_string());
        *confidence.entry(conf).or_insert(0) += 1;
    }

    let runs = records.len().max(1) as f64;
    let total_decisions = decisions.values().sum::<usize>().max(1) as f64;
    let retries = decisions
        .get("RETRY_WITH_MORE_CONTEXT")
        .copied()
        .unwrap_or(0) as f64;

    EvalSummary {
        avg_citations: records.iter().map(|r| r.num_citations).sum::<usize>() as f64 / runs,
        avg_similar_cases: records.iter().map(|r| r.num_similar_cases).sum::<usize>() as f64
            / runs,
        retry_rate: retries / total_decisions,
        decisions,
        confidence,
    }
}

/// Run questions through the orchestrator with bounded concurrency.
///
/// Records come back in question order. The first infrastructure error
/// aborts the evaluation.
pub async fn run_eval(
    orchestrator: &Orchestrator,
    questions: &[&str],
    kb_k: usize,
    tickets_k: usize,
    concurrency: usize,
) -> AppResult<Vec<EvalRecord>> {
    tracing::info!(
        "Evaluating {} questions (concurrency {})",
        questions.len(),
        concurrency
    );

    stream::iter(questions.iter().copied())
        .map(|question| async move {
            orchestrator
                .run(question, kb_k, tickets_k)
                .await
                .map(|state| EvalRecord::from(&state))
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await
}

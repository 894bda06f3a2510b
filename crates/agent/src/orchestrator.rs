//! The bounded retrieve → generate → validate loop.
//!
//! ```text
//! Retrieve ──▶ Generate ──▶ Validate ──▶ End
//!    ▲                         │
//!    └──── RETRY, retries < 1 ─┘
//! ```
//!
//! A malformed generation skips validation and is routed as a widened retry.

use crate::answer::{Decision, ValidationResult};
use crate::cases::to_cases;
use crate::generator::AnswerGenerator;
use crate::grounding;
use crate::judge::Judge;
use crate::state::{RunState, Stage};
use crate::validator::{Validator, WIDENED_K};
use copilot_core::{AppError, AppResult};
use copilot_knowledge::{Corpus, EvidenceStore};
use std::sync::Arc;
use tracing::Instrument;

/// Drives runs over shared, read-only collaborators.
pub struct Orchestrator {
    store: Arc<dyn EvidenceStore>,
    generator: Arc<dyn AnswerGenerator>,
    validator: Validator,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn EvidenceStore>,
        generator: Arc<dyn AnswerGenerator>,
        judge: Arc<dyn Judge>,
    ) -> Self {
        Self {
            store,
            generator,
            validator: Validator::new(judge),
        }
    }

    /// Answer one question from a fresh state.
    ///
    /// # Errors
    /// Infrastructure failures (`StoreUnavailable`, provider errors) abort
    /// the run; no partial state is returned.
    pub async fn run(&self, question: &str, kb_k: usize, tickets_k: usize) -> AppResult<RunState> {
        self.drive(RunState::new(question, kb_k, tickets_k)).await
    }

    /// Step a state from `Retrieve` until `End`.
    pub async fn drive(&self, state: RunState) -> AppResult<RunState> {
        let span = tracing::info_span!(
            "run",
            run_id = %state.run_id,
            question = %state.question
        );

        async move {
            let mut stage = Stage::Retrieve;
            let mut state = state;

            while stage != Stage::End {
                let (next, updated) = self.step(stage, state).await?;
                tracing::debug!("{} -> {}", stage, next);
                stage = next;
                state = updated;
            }

            tracing::info!(
                decision = state.decision.map(|d| d.as_str()).unwrap_or("none"),
                retries = state.retries,
                "Run finished"
            );
            Ok(state)
        }
        .instrument(span)
        .await
    }

    /// Execute one stage and decide the next.
    pub async fn step(&self, stage: Stage, mut state: RunState) -> AppResult<(Stage, RunState)> {
        let next = match stage {
            Stage::Retrieve => {
                state.kb_evidence = self
                    .store
                    .search(Corpus::Kb, &state.query, state.kb_k)
                    .await?;
                state.ticket_evidence = self
                    .store
                    .search(Corpus::Tickets, &state.query, state.tickets_k)
                    .await?;

                tracing::info!(
                    query = %state.query,
                    kb = state.kb_evidence.len(),
                    tickets = state.ticket_evidence.len(),
                    "Retrieved evidence"
                );
                Stage::Generate
            }

            Stage::Generate => {
                let cases = to_cases(&state.ticket_evidence);
                let generated = self
                    .generator
                    .generate(&state.question, &state.kb_evidence, &cases)
                    .await;

                match generated {
                    Ok(answer) => {
                        state.answer = Some(grounding::filter(answer, &state.kb_evidence));
                        Stage::Validate
                    }
                    Err(AppError::GenerationMalformed(reason)) => {
                        tracing::warn!("Generated answer was malformed: {}", reason);
                        state.answer = None;
                        let retry = ValidationResult::retry(
                            format!("Generated answer could not be parsed: {}", reason),
                            state.question.clone(),
                            WIDENED_K,
                        );
                        state.record(retry);
                        route(&mut state)
                    }
                    Err(e) => return Err(e),
                }
            }

            Stage::Validate => {
                let answer = state.answer.as_ref().ok_or_else(|| {
                    AppError::Other("validation reached without an answer".to_string())
                })?;
                let answer_json = answer.to_json()?;

                let result = self
                    .validator
                    .validate(&state.question, &answer_json, &state.kb_evidence)
                    .await?;

                tracing::info!(decision = %result.decision, feedback = %result.feedback, "Validated answer");
                state.record(result);
                route(&mut state)
            }

            Stage::End => Stage::End,
        };

        Ok((next, state))
    }
}

/// Decide what follows a recorded decision, spending a retry when looping back.
fn route(state: &mut RunState) -> Stage {
    match state.decision {
        Some(Decision::Retry) if state.can_retry() => {
            state.begin_retry();
            tracing::info!(
                query = %state.query,
                kb_k = state.kb_k,
                retries = state.retries,
                "Retrying with more context"
            );
            Stage::Retrieve
        }
        Some(Decision::Retry) => {
            tracing::warn!("Retry budget exhausted; ending with RETRY");
            Stage::End
        }
        _ => Stage::End,
    }
}

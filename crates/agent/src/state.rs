//! Per-run state carried through the retrieve → generate → validate loop.

use crate::answer::{Answer, Decision, ValidationResult};
use chrono::{DateTime, Utc};
use copilot_knowledge::EvidenceChunk;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Additional retrieval attempts allowed per run.
pub const MAX_RETRIES: u32 = 1;

/// Where the loop is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Retrieve,
    Generate,
    Validate,
    End,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Retrieve => "retrieve",
            Self::Generate => "generate",
            Self::Validate => "validate",
            Self::End => "end",
        };
        f.write_str(name)
    }
}

/// Everything one run knows.
///
/// `question` never changes. `query` diverges from it only after a retry
/// that suggested a different query. Evidence is replaced wholesale on each
/// retrieval.
#[derive(Debug, Clone, Serialize)]
pub struct RunState {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub question: String,
    pub query: String,
    pub kb_k: usize,
    pub tickets_k: usize,
    pub kb_evidence: Vec<EvidenceChunk>,
    pub ticket_evidence: Vec<EvidenceChunk>,
    pub answer: Option<Answer>,
    pub decision: Option<Decision>,
    pub feedback: Option<String>,
    pub suggested_query: Option<String>,
    pub suggested_k: Option<u32>,
    pub retries: u32,
}

impl RunState {
    pub fn new(question: impl Into<String>, kb_k: usize, tickets_k: usize) -> Self {
        let question = question.into();
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            query: question.clone(),
            question,
            kb_k,
            tickets_k,
            kb_evidence: Vec::new(),
            ticket_evidence: Vec::new(),
            answer: None,
            decision: None,
            feedback: None,
            suggested_query: None,
            suggested_k: None,
            retries: 0,
        }
    }

    /// Record the outcome of a validation attempt.
    pub fn record(&mut self, result: ValidationResult) {
        self.decision = Some(result.decision);
        self.feedback = Some(result.feedback);
        self.suggested_query = result.suggested_query;
        self.suggested_k = result.suggested_k;
    }

    /// Whether another retrieval attempt is allowed.
    pub fn can_retry(&self) -> bool {
        self.retries < MAX_RETRIES
    }

    /// Apply the recorded retry hints and spend one retry.
    pub(crate) fn begin_retry(&mut self) {
        if let Some(query) = self.suggested_query.take() {
            self.query = query;
        }
        if let Some(k) = self.suggested_k.take() {
            self.kb_k = k as usize;
        }
        self.retries += 1;
    }
}

//! In-crate fakes for the store, generator and judge.

use crate::answer::{Answer, Citation, Confidence, SimilarCase, ValidationResult};
use crate::generator::AnswerGenerator;
use crate::judge::Judge;
use copilot_core::{AppError, AppResult};
use copilot_knowledge::{Corpus, EvidenceChunk, EvidenceStore};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Store that returns the first `k` chunks of a fixed list and logs every search.
pub struct FixedStore {
    kb: Vec<EvidenceChunk>,
    tickets: Vec<EvidenceChunk>,
    pub searches: Mutex<Vec<(Corpus, String, usize)>>,
}

impl FixedStore {
    pub fn new(kb: Vec<EvidenceChunk>, tickets: Vec<EvidenceChunk>) -> Self {
        Self {
            kb,
            tickets,
            searches: Mutex::new(Vec::new()),
        }
    }

    pub fn searches(&self) -> Vec<(Corpus, String, usize)> {
        self.searches.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl EvidenceStore for FixedStore {
    async fn search(&self, corpus: Corpus, query: &str, k: usize) -> AppResult<Vec<EvidenceChunk>> {
        self.searches
            .lock()
            .unwrap()
            .push((corpus, query.to_string(), k));

        let chunks = match corpus {
            Corpus::Kb => &self.kb,
            Corpus::Tickets => &self.tickets,
        };
        Ok(chunks.iter().take(k).cloned().collect())
    }
}

/// Store whose index can never be reached.
pub struct UnavailableStore;

#[async_trait::async_trait]
impl EvidenceStore for UnavailableStore {
    async fn search(&self, corpus: Corpus, _: &str, _: usize) -> AppResult<Vec<EvidenceChunk>> {
        Err(AppError::StoreUnavailable(format!("{} index offline", corpus)))
    }
}

/// Generator that replays scripted outcomes in order.
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<AppResult<Answer>>>,
    pub seen_cases: Mutex<Vec<Vec<SimilarCase>>>,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<AppResult<Answer>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            seen_cases: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl AnswerGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        _question: &str,
        _kb_evidence: &[EvidenceChunk],
        cases: &[SimilarCase],
    ) -> AppResult<Answer> {
        self.seen_cases.lock().unwrap().push(cases.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("generator called more often than scripted")
    }
}

/// Judge that replays scripted results and records the answers it saw.
pub struct ScriptedJudge {
    results: Mutex<VecDeque<ValidationResult>>,
    pub seen_answers: Mutex<Vec<String>>,
}

impl ScriptedJudge {
    pub fn new(results: Vec<ValidationResult>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            seen_answers: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen_answers.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Judge for ScriptedJudge {
    async fn judge(
        &self,
        _question: &str,
        answer_json: &str,
        _kb_evidence: &[EvidenceChunk],
    ) -> AppResult<ValidationResult> {
        self.seen_answers
            .lock()
            .unwrap()
            .push(answer_json.to_string());
        Ok(self
            .results
            .lock()
            .unwrap()
            .pop_front()
            .expect("judge called more often than scripted"))
    }
}

pub fn toy_kb() -> Vec<EvidenceChunk> {
    vec![
        EvidenceChunk::kb(
            "policy.md",
            0,
            "Refunds take 5-10 business days. EU refunds may take longer.",
        ),
        EvidenceChunk::kb(
            "runbook.md",
            0,
            "If a user is locked out, advise password reset and verify email.",
        ),
    ]
}

pub fn answer_citing(text: &str, citations: &[(&str, i64)], confidence: Confidence) -> Answer {
    Answer {
        text: text.to_string(),
        citations: citations
            .iter()
            .map(|(source, chunk_id)| Citation {
                source: source.to_string(),
                chunk_id: *chunk_id,
            })
            .collect(),
        confidence,
        missing_info: None,
        next_steps: vec!["Wait up to 10 business days.".to_string()],
        similar_cases: Vec::new(),
    }
}

//! In-memory evidence store backed by JSONL corpus files.
//!
//! Each line of a corpus file is one chunk:
//!
//! ```text
//! {"source": "policy.md", "chunk_id": 0, "content": "Refunds take 5-10 business days."}
//! {"source": "twitter_support", "row_id": 17, "text": "Customer: ...\nSupport: ..."}
//! ```
//!
//! `row_id` is accepted for `chunk_id` and `text` for `content`. A missing
//! `source` falls back to the corpus name. Every chunk is embedded once at
//! load time.

use crate::embedder::{cosine_similarity, Embedder, TrigramEmbedder};
use crate::store::EvidenceStore;
use crate::types::{Corpus, EvidenceChunk, ScoredChunk};
use copilot_core::{AppError, AppResult};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct CorpusRecord {
    #[serde(default)]
    source: Option<String>,

    #[serde(alias = "row_id")]
    chunk_id: i64,

    #[serde(alias = "text")]
    content: String,
}

#[derive(Debug)]
struct IndexedChunk {
    chunk: EvidenceChunk,
    embedding: Vec<f32>,
}

/// Evidence store that keeps both corpora and their embeddings in memory.
#[derive(Debug)]
pub struct MemoryEvidenceStore {
    embedder: Arc<dyn Embedder>,
    kb: Vec<IndexedChunk>,
    tickets: Vec<IndexedChunk>,
}

impl MemoryEvidenceStore {
    /// Build a store from chunks already in memory.
    pub fn from_chunks(
        embedder: Arc<dyn Embedder>,
        kb: Vec<EvidenceChunk>,
        tickets: Vec<EvidenceChunk>,
    ) -> Self {
        let index = |chunks: Vec<EvidenceChunk>| -> Vec<IndexedChunk> {
            chunks
                .into_iter()
                .map(|chunk| IndexedChunk {
                    embedding: embedder.embed(&chunk.content),
                    chunk,
                })
                .collect()
        };

        let kb = index(kb);
        let tickets = index(tickets);

        tracing::debug!(
            "Indexed {} KB chunks and {} ticket chunks with {} ({} dims)",
            kb.len(),
            tickets.len(),
            embedder.model_name(),
            embedder.dimensions()
        );

        Self {
            embedder,
            kb,
            tickets,
        }
    }

    /// Load both corpora from JSONL files, embedding with the trigram embedder.
    ///
    /// # Errors
    /// Returns `AppError::StoreUnavailable` if either file is missing,
    /// unreadable, or contains a malformed line.
    pub fn load(kb_path: &Path, tickets_path: &Path) -> AppResult<Self> {
        let kb = load_corpus(kb_path, Corpus::Kb)?;
        let tickets = load_corpus(tickets_path, Corpus::Tickets)?;

        tracing::info!(
            "Loaded evidence store: {} KB chunks from {:?}, {} tickets from {:?}",
            kb.len(),
            kb_path,
            tickets.len(),
            tickets_path
        );

        Ok(Self::from_chunks(
            Arc::new(TrigramEmbedder::default()),
            kb,
            tickets,
        ))
    }

    /// Small built-in KB for trying the loop without any corpus files.
    ///
    /// The ticket corpus is empty.
    pub fn demo() -> Self {
        let kb = vec![
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
            EvidenceChunk::kb(
                "runbook.md",
                1,
                "Escalate billing issues if charge is duplicated or pending > 7 days.",
            ),
        ];

        Self::from_chunks(Arc::new(TrigramEmbedder::default()), kb, Vec::new())
    }

    /// Number of chunks held for a corpus.
    pub fn len(&self, corpus: Corpus) -> usize {
        self.chunks(corpus).len()
    }

    /// Rank a corpus against the query and keep the top `k` with scores.
    pub fn search_scored(&self, corpus: Corpus, query: &str, k: usize) -> Vec<ScoredChunk> {
        if k == 0 {
            return Vec::new();
        }

        let query_embedding = self.embedder.embed(query);

        let mut results: Vec<ScoredChunk> = self
            .chunks(corpus)
            .iter()
            .map(|indexed| ScoredChunk {
                score: cosine_similarity(&query_embedding, &indexed.embedding),
                chunk: indexed.chunk.clone(),
            })
            .collect();

        // Stable sort keeps store order for equal scores
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(k);

        tracing::debug!(
            "Retrieved {} {} chunks (requested top-{})",
            results.len(),
            corpus,
            k
        );

        results
    }

    fn chunks(&self, corpus: Corpus) -> &[IndexedChunk] {
        match corpus {
            Corpus::Kb => &self.kb,
            Corpus::Tickets => &self.tickets,
        }
    }
}

#[async_trait::async_trait]
impl EvidenceStore for MemoryEvidenceStore {
    async fn search(
        &self,
        corpus: Corpus,
        query: &str,
        k: usize,
    ) -> AppResult<Vec<EvidenceChunk>> {
        Ok(self
            .search_scored(corpus, query, k)
            .into_iter()
            .map(|scored| scored.chunk)
            .collect())
    }
}

fn load_corpus(path: &Path, corpus: Corpus) -> AppResult<Vec<EvidenceChunk>> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        AppError::StoreUnavailable(format!(
            "Failed to read {} corpus {:?}: {}",
            corpus, path, e
        ))
    })?;

    let mut chunks = Vec::new();
    for (line_no, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let record: CorpusRecord = serde_json::from_str(line).map_err(|e| {
            AppError::StoreUnavailable(format!(
                "Malformed {} corpus record at {:?}:{}: {}",
                corpus,
                path,
                line_no + 1,
                e
            ))
        })?;

        chunks.push(EvidenceChunk::new(
            record.source.unwrap_or_else(|| corpus.as_str().to_string()),
            record.chunk_id,
            record.content,
            corpus.kind(),
        ));
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChunkKind;
    use std::fs;
    use tempfile::TempDir;

    fn write_corpora(dir: &Path, kb: &str, tickets: &str) -> (std::path::PathBuf, std::path::PathBuf) {
        let kb_path = dir.join("kb.jsonl");
        let tickets_path = dir.join("tickets.jsonl");
        fs::write(&kb_path, kb).unwrap();
        fs::write(&tickets_path, tickets).unwrap();
        (kb_path, tickets_path)
    }

    #[tokio::test]
    async fn test_demo_store_ranks_refund_policy_first() {
        let store = MemoryEvidenceStore::demo();
        let results = store
            .search(Corpus::Kb, "My EU refund hasn't arrived", 2)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].cite_key(), ("policy.md", 0));
        assert!(results.iter().all(|c| c.kind == ChunkKind::Kb));
    }

    #[tokio::test]
    async fn test_k_zero_and_k_larger_than_corpus() {
        let store = MemoryEvidenceStore::demo();

        let none = store.search(Corpus::Kb, "refund", 0).await.unwrap();
        assert!(none.is_empty());

        let all = store.search(Corpus::Kb, "refund", 10).await.unwrap();
        assert_eq!(all.len(), 3);

        let tickets = store.search(Corpus::Tickets, "refund", 3).await.unwrap();
        assert!(tickets.is_empty());
    }

    #[tokio::test]
    async fn test_ties_keep_store_order() {
        let chunks = vec![
            EvidenceChunk::kb("a.md", 0, "identical text"),
            EvidenceChunk::kb("b.md", 0, "identical text"),
            EvidenceChunk::kb("c.md", 0, "identical text"),
        ];
        let store = MemoryEvidenceStore::from_chunks(
            Arc::new(TrigramEmbedder::default()),
            chunks,
            Vec::new(),
        );

        let results = store.search(Corpus::Kb, "unrelated query", 3).await.unwrap();
        let sources: Vec<&str> = results.iter().map(|c| c.source.as_str()).collect();
        assert_eq!(sources, vec!["a.md", "b.md", "c.md"]);
    }

    #[tokio::test]
    async fn test_load_jsonl_corpora() {
        let temp_dir = TempDir::new().unwrap();
        let (kb_path, tickets_path) = write_corpora(
            temp_dir.path(),
            "{\"source\": \"policy.md\", \"chunk_id\": 0, \"content\": \"Refunds take 5-10 business days.\"}\n\n{\"chunk_id\": 1, \"text\": \"No source here.\"}\n",
            "{\"source\": \"twitter_support\", \"row_id\": 7, \"text\": \"Customer: my bill doubled\\nSupport: we refunded it\"}\n",
        );

        let store = MemoryEvidenceStore::load(&kb_path, &tickets_path).unwrap();
        assert_eq!(store.len(Corpus::Kb), 2);
        assert_eq!(store.len(Corpus::Tickets), 1);

        let kb = store.search(Corpus::Kb, "source", 5).await.unwrap();
        assert!(kb.iter().any(|c| c.cite_key() == ("kb", 1)));

        let tickets = store.search(Corpus::Tickets, "bill", 1).await.unwrap();
        assert_eq!(tickets[0].cite_key(), ("twitter_support", 7));
        assert_eq!(tickets[0].kind, ChunkKind::Ticket);
    }

    #[test]
    fn test_missing_file_is_store_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.jsonl");

        match MemoryEvidenceStore::load(&missing, &missing) {
            Err(AppError::StoreUnavailable(msg)) => assert!(msg.contains("kb corpus")),
            other => panic!("Expected StoreUnavailable, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_malformed_line_is_store_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let (kb_path, tickets_path) = write_corpora(
            temp_dir.path(),
            "{\"source\": \"policy.md\", \"chunk_id\": 0, \"content\": \"ok\"}\n",
            "not json\n",
        );

        match MemoryEvidenceStore::load(&kb_path, &tickets_path) {
            Err(AppError::StoreUnavailable(msg)) => assert!(msg.contains(":1")),
            other => panic!("Expected StoreUnavailable, got {:?}", other.map(|_| ())),
        }
    }
}

//! Evidence store abstraction.

use crate::types::{Corpus, EvidenceChunk};
use copilot_core::AppResult;

/// Read-only similarity search over the KB and ticket corpora.
///
/// Implementations must:
/// - return at most `k` chunks, ordered by descending similarity
/// - break ties by stable store order
/// - have no side effects
/// - fail with `AppError::StoreUnavailable` when the index cannot be reached
#[async_trait::async_trait]
pub trait EvidenceStore: Send + Sync {
    async fn search(&self, corpus: Corpus, query: &str, k: usize)
        -> AppResult<Vec<EvidenceChunk>>;
}

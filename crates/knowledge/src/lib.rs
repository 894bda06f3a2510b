//! Evidence retrieval for the support copilot.
//!
//! Provides the evidence data model, the `EvidenceStore` contract used by the
//! agent loop, and a local-first in-memory store over JSONL corpora ranked
//! with deterministic trigram embeddings.

pub mod embedder;
pub mod memory;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use embedder::{cosine_similarity, Embedder, TrigramEmbedder};
pub use memory::MemoryEvidenceStore;
pub use store::EvidenceStore;
pub use types::{ChunkKind, Corpus, EvidenceChunk, ScoredChunk};

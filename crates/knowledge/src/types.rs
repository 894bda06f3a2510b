//! Evidence data model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which corpus a chunk was retrieved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    /// Knowledge-base passage; the only citable kind
    Kb,
    /// Historical support ticket
    Ticket,
}

/// A named searchable collection of evidence chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Corpus {
    Kb,
    Tickets,
}

impl Corpus {
    /// Parse a corpus name ("kb", "tickets").
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "kb" => Some(Self::Kb),
            "tickets" | "ticket" => Some(Self::Tickets),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kb => "kb",
            Self::Tickets => "tickets",
        }
    }

    /// Kind of the chunks this corpus holds.
    pub fn kind(&self) -> ChunkKind {
        match self {
            Self::Kb => ChunkKind::Kb,
            Self::Tickets => ChunkKind::Ticket,
        }
    }
}

impl fmt::Display for Corpus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A retrievable unit of text with a stable `(source, chunk_id)` identity.
///
/// For ticket corpora `chunk_id` is the ticket row id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceChunk {
    pub source: String,

    #[serde(alias = "row_id")]
    pub chunk_id: i64,

    pub content: String,

    pub kind: ChunkKind,
}

impl EvidenceChunk {
    pub fn new(
        source: impl Into<String>,
        chunk_id: i64,
        content: impl Into<String>,
        kind: ChunkKind,
    ) -> Self {
        Self {
            source: source.into(),
            chunk_id,
            content: content.into(),
            kind,
        }
    }

    /// Shorthand for a knowledge-base chunk.
    pub fn kb(source: impl Into<String>, chunk_id: i64, content: impl Into<String>) -> Self {
        Self::new(source, chunk_id, content, ChunkKind::Kb)
    }

    /// Shorthand for a ticket chunk.
    pub fn ticket(source: impl Into<String>, row_id: i64, content: impl Into<String>) -> Self {
        Self::new(source, row_id, content, ChunkKind::Ticket)
    }

    /// Identity used for citation matching.
    pub fn cite_key(&self) -> (&str, i64) {
        (&self.source, self.chunk_id)
    }
}

/// A chunk paired with its similarity to the query.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    pub chunk: EvidenceChunk,
    pub score: f32,
}

//! Deterministic text embeddings for the in-memory store.

use std::collections::{HashMap, HashSet};

/// Default embedding width.
pub const DEFAULT_DIMENSIONS: usize = 384;

/// Maps text to a fixed-width vector.
pub trait Embedder: Send + Sync + std::fmt::Debug {
    /// Embedder identifier (e.g., "trigram-v1")
    fn model_name(&self) -> &str;

    /// Embedding dimensions
    fn dimensions(&self) -> usize;

    /// Embed one text.
    fn embed(&self, text: &str) -> Vec<f32>;
}

/// Trigram-based embedder for local, offline operation.
///
/// Generates deterministic embeddings based on text content using
/// character trigrams and word frequencies. Not semantically accurate like
/// neural embedding models, but consistent and content-dependent, which is
/// enough to rank support passages by lexical overlap.
#[derive(Debug)]
pub struct TrigramEmbedder {
    dimensions: usize,
    stop_words: HashSet<&'static str>,
}

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them",
];

impl TrigramEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
            stop_words: STOP_WORDS.iter().copied().collect(),
        }
    }
}

impl Default for TrigramEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

impl Embedder for TrigramEmbedder {
    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; self.dimensions];
        let lower = text.to_lowercase();

        let mut word_freq: HashMap<&str, u32> = HashMap::new();
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 2 && !self.stop_words.contains(w))
        {
            *word_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram_hash = window
                    .iter()
                    .collect::<String>()
                    .bytes()
                    .fold(0u64, |acc, b| acc.wrapping_mul(37).wrapping_add(b as u64));

                let dim_idx = (trigram_hash as usize) % self.dimensions;
                embedding[dim_idx] += (*freq as f32).sqrt();
            }

            // Whole-word bucket
            let word_hash = word
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            let base_dim = (word_hash as usize) % self.dimensions;
            embedding[base_dim] += *freq as f32;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

/// Cosine similarity between two vectors; 0.0 on length mismatch or zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[test]
    fn test_dimensions_and_normalization() {
        let embedder = TrigramEmbedder::default();
        let embedding = embedder.embed("Refunds take 5-10 business days.");

        assert_eq!(embedding.len(), 384);
        assert!((norm(&embedding) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_deterministic() {
        let embedder = TrigramEmbedder::default();
        assert_eq!(
            embedder.embed("deterministic test"),
            embedder.embed("deterministic test")
        );
    }

    #[test]
    fn test_punctuation_does_not_change_words() {
        let embedder = TrigramEmbedder::default();
        assert_eq!(embedder.embed("refund?"), embedder.embed("refund"));
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedder = TrigramEmbedder::default();
        let embedding = embedder.embed("");
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_utf8_safety() {
        let embedder = TrigramEmbedder::default();
        let embedding = embedder.embed("Reembolso não chegou 🎮 ainda");
        assert!((norm(&embedding) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_related_text_scores_higher() {
        let embedder = TrigramEmbedder::default();
        let query = embedder.embed("my refund has not arrived");
        let refund = embedder.embed("Refunds take 5-10 business days.");
        let lockout = embedder.embed("If a user is locked out, advise password reset.");

        assert!(cosine_similarity(&query, &refund) > cosine_similarity(&query, &lockout));
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 0.001);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 0.001);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }
}

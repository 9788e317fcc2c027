//! Domain entities owned by the external ingestion pipeline.
//!
//! `teams`, `players`, and `player_season_stats` (spec.md §3) are read
//! exclusively through ad hoc SQL (the deterministic path and the
//! synthesizer's generated statements), which the Data Access Layer
//! returns as generic JSON rows, not typed structs - there is no query in
//! this crate that reads a whole `Team`/`Player`/`PlayerSeasonStats` row
//! by itself. `schema_embeddings` is the one table the core reads through
//! a typed, hand-written query (`Session::fetch_schema_embeddings`), so it
//! is the only domain entity modeled here.

use serde::{Deserialize, Serialize};

/// A row in the `schema_embeddings` table: a human-readable schema
/// description or SQL exemplar plus its embedding vector. Written by the
/// one-shot seeder (`bin/seed_schema_kb.rs`), read by
/// [`crate::pipeline::schema_kb`].
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SchemaEmbedding {
    pub id: i64,
    pub content: String,
    #[sqlx(try_from = "Vec<u8>")]
    pub embedding: EmbeddingVector,
}

/// Fixed-dimension float vector, stored as little-endian f32 bytes so it
/// round-trips through any `sqlx` backend without a vector extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingVector(pub Vec<f32>);

impl EmbeddingVector {
    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.0.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        EmbeddingVector(bytes.chunks_exact(4).map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect())
    }

    /// Cosine similarity against another vector of the same dimension.
    /// Returns 0.0 for mismatched dimensions or a zero-magnitude vector,
    /// rather than panicking, retrieval treats that as "no match".
    pub fn cosine_similarity(&self, other: &EmbeddingVector) -> f32 {
        if self.0.len() != other.0.len() || self.0.is_empty() {
            return 0.0;
        }
        let dot: f32 = self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).sum();
        let mag_a = self.0.iter().map(|a| a * a).sum::<f32>().sqrt();
        let mag_b = other.0.iter().map(|b| b * b).sum::<f32>().sqrt();
        if mag_a == 0.0 || mag_b == 0.0 {
            return 0.0;
        }
        dot / (mag_a * mag_b)
    }
}

impl TryFrom<Vec<u8>> for EmbeddingVector {
    type Error = std::convert::Infallible;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        Ok(EmbeddingVector::from_bytes(&bytes))
    }
}

impl From<Vec<f32>> for EmbeddingVector {
    fn from(v: Vec<f32>) -> Self {
        EmbeddingVector(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_similarity_of_identical_vectors_is_one() {
        let v = EmbeddingVector(vec![1.0, 2.0, 3.0]);
        assert!((v.cosine_similarity(&v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_of_orthogonal_vectors_is_zero() {
        let a = EmbeddingVector(vec![1.0, 0.0]);
        let b = EmbeddingVector(vec![0.0, 1.0]);
        assert!(a.cosine_similarity(&b).abs() < 1e-6);
    }

    #[test]
    fn mismatched_dimensions_yield_zero_not_panic() {
        let a = EmbeddingVector(vec![1.0, 0.0]);
        let b = EmbeddingVector(vec![1.0, 0.0, 0.0]);
        assert_eq!(a.cosine_similarity(&b), 0.0);
    }

    #[test]
    fn bytes_round_trip() {
        let v = EmbeddingVector(vec![1.5, -2.25, 0.0]);
        let bytes = v.to_bytes();
        assert_eq!(EmbeddingVector::from_bytes(&bytes), v);
    }
}

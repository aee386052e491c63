//! Deterministic feature-hashing embedder.
//!
//! Each lowercased word is hashed with blake3 into a signed bucket and the
//! resulting bag-of-words vector is L2-normalized. Texts sharing vocabulary
//! land close together, identical texts embed identically, and text with no
//! words embeds to the zero vector. No model download is needed.

use super::{normalize_embedding, Embedder};
use crate::error::Result;
use async_trait::async_trait;
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
    model_name: String,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            model_name: format!("feature-hash-{}", dimension),
        }
    }

    fn bucket(&self, word: &str) -> (usize, f32) {
        let hash = blake3::hash(word.as_bytes());
        let bytes = hash.as_bytes();
        let mut index_bytes = [0u8; 8];
        index_bytes.copy_from_slice(&bytes[..8]);
        let index = (u64::from_le_bytes(index_bytes) % self.dimension as u64) as usize;
        let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
        (index, sign)
    }

    fn hash_to_vec(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        if self.dimension == 0 {
            return vector;
        }

        for word in text.unicode_words() {
            let (index, sign) = self.bucket(&word.to_lowercase());
            vector[index] += sign;
        }

        normalize_embedding(&vector)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.hash_to_vec(text)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn test_deterministic_and_normalized() {
        let embedder = HashEmbedder::new(64);
        let a = embedder.embed_one("Rust systems engineer").await.unwrap();
        let b = embedder.embed_one("rust SYSTEMS engineer").await.unwrap();

        assert_eq!(a.len(), 64);
        assert_eq!(a, b);
        assert!((dot(&a, &a) - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_shared_vocabulary_is_closer() {
        let embedder = HashEmbedder::new(256);
        let query = embedder.embed_one("technical skills evaluation").await.unwrap();
        let related = embedder
            .embed_one("technical skills should be evaluated")
            .await
            .unwrap();
        let unrelated = embedder
            .embed_one("volunteer work and hobbies")
            .await
            .unwrap();

        assert!(dot(&query, &related) > dot(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_wordless_text_is_zero_vector() {
        let embedder = HashEmbedder::new(8);
        let vector = embedder.embed_one("  --- !!! ").await.unwrap();
        assert!(vector.iter().all(|v| *v == 0.0));
    }
}

//! Embedding generation
//!
//! This module provides an abstraction over embedding models with:
//! - A trait every backend implements
//! - Local fastembed, HTTP sidecar and deterministic hashing backends
//! - Batch processing for efficiency

#[cfg(feature = "local-embed")]
mod fastembed_impl;
mod hash_impl;
mod http_backend;

#[cfg(feature = "local-embed")]
pub use fastembed_impl::*;
pub use hash_impl::*;
pub use http_backend::*;

use crate::config::{Config, EmbeddingBackend};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

pub fn normalize_embedding(vector: &[f32]) -> Vec<f32> {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return vector.to_vec();
    }
    vector.iter().map(|v| v / norm).collect()
}

/// Check every vector against the provider's fixed dimensionality
pub fn validate_dimensions(model: &str, expected: usize, embeddings: &[Vec<f32>]) -> Result<()> {
    if let Some(mismatch) = embeddings.iter().find(|vec| vec.len() != expected) {
        return Err(Error::Embedding(format!(
            "Embedding dimension mismatch for model '{}': expected {}, got {}",
            model,
            expected,
            mismatch.len()
        )));
    }
    Ok(())
}

/// Trait for embedding providers
///
/// Implementations are pure functions of the input text for the lifetime
/// of the process and always return vectors of length [`Embedder::dimension`].
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("No embedding returned".to_string()))
    }

    /// Get the embedding dimension
    fn dimension(&self) -> usize;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Create an embedder based on configuration. Loading a local model happens here.
pub fn create_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    let embedding = &config.embedding;
    info!(
        "Creating {} embedder for model {}",
        embedding.backend, embedding.model
    );

    match embedding.backend {
        EmbeddingBackend::Hash => Ok(Arc::new(HashEmbedder::new(embedding.resolved_dimension()))),
        EmbeddingBackend::Http => Ok(Arc::new(HttpEmbedder::new(embedding)?)),
        #[cfg(feature = "local-embed")]
        EmbeddingBackend::Fastembed => Ok(Arc::new(FastEmbedder::new(
            embedding,
            Some(config.paths.model_cache_dir.clone()),
        )?)),
        #[cfg(not(feature = "local-embed"))]
        EmbeddingBackend::Fastembed => Err(Error::Config(
            "embedding.backend = \"fastembed\" requires the 'local-embed' feature".to_string(),
        )),
    }
}

/// Helper to embed in batches
pub async fn embed_in_batches(
    embedder: &dyn Embedder,
    texts: Vec<String>,
    batch_size: usize,
) -> Result<Vec<Vec<f32>>> {
    let mut all_embeddings = Vec::with_capacity(texts.len());

    for chunk in texts.chunks(batch_size.max(1)) {
        let embeddings = embedder.embed(chunk.to_vec()).await?;
        all_embeddings.extend(embeddings);
    }

    Ok(all_embeddings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_embedding() {
        let normalized = normalize_embedding(&[3.0, 4.0]);
        assert!((normalized[0] - 0.6).abs() < 1e-6);
        assert!((normalized[1] - 0.8).abs() < 1e-6);

        // Zero vectors stay zero rather than becoming NaN
        assert_eq!(normalize_embedding(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_validate_dimensions() {
        assert!(validate_dimensions("m", 2, &[vec![1.0, 2.0]]).is_ok());
        assert!(validate_dimensions("m", 3, &[vec![1.0, 2.0]]).is_err());
    }

    #[tokio::test]
    async fn test_embed_in_batches_preserves_order() {
        let embedder = HashEmbedder::new(16);
        let texts: Vec<String> = (0..7).map(|i| format!("candidate {}", i)).collect();

        let batched = embed_in_batches(&embedder, texts.clone(), 3).await.unwrap();
        let single = embedder.embed(texts).await.unwrap();

        assert_eq!(batched.len(), 7);
        assert_eq!(batched, single);
    }

    #[test]
    fn test_create_embedder_hash_backend() {
        let mut config = Config::default();
        config.embedding.backend = EmbeddingBackend::Hash;
        config.embedding.dimension = 32;

        let embedder = create_embedder(&config).unwrap();
        assert_eq!(embedder.dimension(), 32);
    }
}

//! FastEmbed implementation for local embeddings

use super::{validate_dimensions, Embedder};
use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// FastEmbed-based embedder
pub struct FastEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
    model_name: String,
    dimension: usize,
}

fn model_enum(name: &str) -> EmbeddingModel {
    match name {
        "sentence-transformers/all-MiniLM-L6-v2" => EmbeddingModel::AllMiniLML6V2,
        "sentence-transformers/all-MiniLM-L12-v2" => EmbeddingModel::AllMiniLML12V2,
        "BAAI/bge-small-en-v1.5" => EmbeddingModel::BGESmallENV15,
        "BAAI/bge-base-en-v1.5" => EmbeddingModel::BGEBaseENV15,
        "BAAI/bge-large-en-v1.5" => EmbeddingModel::BGELargeENV15,
        other => {
            warn!("Unknown model '{}', using default AllMiniLML6V2", other);
            EmbeddingModel::AllMiniLML6V2
        }
    }
}

impl FastEmbedder {
    /// Load the model. Downloads it into `cache_dir` on first use.
    pub fn new(config: &EmbeddingConfig, cache_dir: Option<PathBuf>) -> Result<Self> {
        info!("Initializing FastEmbed with model: {}", config.model);

        let mut options = InitOptions::new(model_enum(&config.model)).with_show_download_progress(true);
        if let Some(dir) = cache_dir {
            debug!("FastEmbed cache directory: {:?}", dir);
            options = options.with_cache_dir(dir);
        }

        let model = TextEmbedding::try_new(options)
            .map_err(|e| Error::Embedding(format!("Failed to initialize model: {}", e)))?;

        info!("FastEmbed model loaded successfully");

        Ok(Self {
            model: Arc::new(Mutex::new(model)),
            model_name: config.model.clone(),
            dimension: config.resolved_dimension(),
        })
    }
}

#[async_trait]
impl Embedder for FastEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Embedding {} texts", texts.len());

        // FastEmbed is synchronous, so we wrap in blocking task
        let model = self.model.clone();
        let embeddings = tokio::task::spawn_blocking(move || {
            let model = model.blocking_lock();
            model.embed(texts, None)
        })
        .await
        .map_err(|e| Error::Embedding(format!("Task join error: {}", e)))?
        .map_err(|e| Error::Embedding(format!("Embedding failed: {}", e)))?;

        validate_dimensions(&self.model_name, self.dimension, &embeddings)?;
        Ok(embeddings)
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

    // Integration test - requires model download
    #[tokio::test]
    #[ignore] // Run manually with: cargo test -- --ignored
    async fn test_fastembed_integration() {
        let config = EmbeddingConfig::default();
        let embedder = FastEmbedder::new(&config, None).unwrap();

        let texts = vec![
            "Senior Rust engineer".to_string(),
            "Backend developer with Rust experience".to_string(),
        ];
        let embeddings = embedder.embed(texts).await.unwrap();

        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[0].len(), 384);
    }
}

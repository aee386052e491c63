use super::{validate_dimensions, Embedder};
use crate::config::EmbeddingConfig;
use crate::embedding_backend::EmbeddingBackendClient;
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub struct HttpEmbedder {
    client: EmbeddingBackendClient,
    model_id: String,
    dimension: usize,
}

impl HttpEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let client = EmbeddingBackendClient::new(
            &config.backend_url,
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(Self {
            client,
            model_id: config.model.clone(),
            dimension: config.resolved_dimension(),
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self.client.embed_text(&self.model_id, texts).await?;
        validate_dimensions(&self.model_id, self.dimension, &embeddings)?;
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbeddingBackend;
    use crate::error::Error;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(url: String, dimension: usize) -> EmbeddingConfig {
        EmbeddingConfig {
            backend: EmbeddingBackend::Http,
            model: "custom-encoder".to_string(),
            dimension,
            backend_url: url,
            ..EmbeddingConfig::default()
        }
    }

    #[tokio::test]
    async fn test_http_embedder_rejects_wrong_dimension() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embed/text"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "embeddings": [[0.5, 0.5]] })),
            )
            .mount(&server)
            .await;

        let embedder = HttpEmbedder::new(&config_for(server.uri(), 3)).unwrap();
        let err = embedder.embed_one("resume").await.expect_err("dimension 2 != 3");

        match err {
            Error::Embedding(message) => assert!(message.contains("expected 3, got 2")),
            other => panic!("expected embedding error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_embedder_embed_one() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embed/text"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "vectors": [[0.0, 1.0, 0.0]] })),
            )
            .mount(&server)
            .await;

        let embedder = HttpEmbedder::new(&config_for(server.uri(), 3)).unwrap();
        let vector = embedder.embed_one("job description").await.unwrap();

        assert_eq!(vector, vec![0.0, 1.0, 0.0]);
        assert_eq!(embedder.model_name(), "custom-encoder");
    }
}

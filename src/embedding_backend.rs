//! HTTP client for a remote embedding sidecar.
//!
//! The sidecar accepts `POST /v1/embed/text` with `{"model", "inputs"}` and
//! answers with one of the common embedding response shapes. Requests are
//! sent exactly once; retry policy belongs to the caller.

use crate::error::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, Serialize)]
struct EmbedTextRequest<'a> {
    model: &'a str,
    inputs: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum EmbeddingResponse {
    Embeddings { embeddings: Vec<Vec<f32>> },
    Vectors { vectors: Vec<Vec<f32>> },
    Data { data: Vec<EmbeddingData> },
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl EmbeddingResponse {
    fn into_embeddings(self) -> Vec<Vec<f32>> {
        match self {
            EmbeddingResponse::Embeddings { embeddings } => embeddings,
            EmbeddingResponse::Vectors { vectors } => vectors,
            EmbeddingResponse::Data { data } => data.into_iter().map(|d| d.embedding).collect(),
        }
    }
}

pub struct EmbeddingBackendClient {
    client: Client,
    base_url: Url,
}

impl EmbeddingBackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("Invalid embedding backend URL: {}", e)))
    }

    pub async fn embed_text(&self, model: &str, inputs: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let url = self.endpoint("/v1/embed/text")?;
        let expected = inputs.len();
        debug!("POST {} ({} inputs)", url, expected);

        let response = self
            .client
            .post(url)
            .json(&EmbedTextRequest { model, inputs })
            .send()
            .await
            .map_err(|e| Error::Embedding(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::Embedding(e.to_string()))?;

        let parsed: EmbeddingResponse = response.json().await?;
        let embeddings = parsed.into_embeddings();

        if embeddings.len() != expected {
            return Err(Error::Embedding(format!(
                "Embedding backend returned {} vectors for {} inputs",
                embeddings.len(),
                expected
            )));
        }

        Ok(embeddings)
    }
}

//! Default values for configuration

use super::{DuplicatePolicy, EmbeddingBackend, StoreBackend};

/// Default vector store backend (local SQLite file)
pub fn default_store_backend() -> StoreBackend {
    StoreBackend::Sqlite
}

/// Default Qdrant gRPC URL for local development (port 6334, not 6333 REST)
pub fn default_qdrant_url() -> String {
    std::env::var("QDRANT_URL").unwrap_or_else(|_| "http://127.0.0.1:6334".to_string())
}

/// Default environment variable name for Qdrant API key
pub fn default_qdrant_api_key_env() -> String {
    "QDRANT_API_KEY".to_string()
}

/// Default prefix for Qdrant collection names
pub fn default_collection_prefix() -> String {
    "resume_rag_".to_string()
}

/// Default embedding backend
pub fn default_embedding_backend() -> EmbeddingBackend {
    EmbeddingBackend::Fastembed
}

/// Default embedding model (sentence-transformers/all-MiniLM-L6-v2)
pub fn default_embedding_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

/// Default embedding dimension (all-MiniLM-L6-v2)
pub fn default_embedding_dimension() -> usize {
    384
}

/// Default batch size for embedding
pub fn default_embedding_batch_size() -> usize {
    32
}

/// Default embedding backend URL
pub fn default_embedding_backend_url() -> String {
    std::env::var("RESUME_RAG_EMBEDDING_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:7997".to_string())
}

/// Default HTTP embedding timeout in seconds
pub fn default_embedding_timeout() -> u64 {
    30
}

/// Default number of search results
pub fn default_retrieval_k() -> usize {
    5
}

/// Default maximum search results
pub fn default_retrieval_max_results() -> usize {
    50
}

/// Default: reject re-uploads under an existing id
pub fn default_duplicate_policy() -> DuplicatePolicy {
    DuplicatePolicy::Reject
}

//! Configuration management for resume-rag
//!
//! Handles loading, saving, and validating configuration from TOML files.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Vector store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Embedding model configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Retrieval defaults
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Knowledge corpus configuration
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Upload ingestion configuration
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// Which vector store holds the three collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Sqlite,
    Qdrant,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Sqlite => write!(f, "sqlite"),
            StoreBackend::Qdrant => write!(f, "qdrant"),
        }
    }
}

/// Vector store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store backend
    #[serde(default = "default_store_backend")]
    pub backend: StoreBackend,

    /// Qdrant connection URL
    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,

    /// Environment variable name for Qdrant API key
    #[serde(default = "default_qdrant_api_key_env")]
    pub qdrant_api_key_env: String,

    /// Prefix applied to Qdrant collection names
    #[serde(default = "default_collection_prefix")]
    pub collection_prefix: String,
}

/// Which embedding provider encodes text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Local ONNX model via fastembed
    Fastembed,
    /// Remote embedding sidecar
    Http,
    /// Deterministic feature hashing (offline, tests)
    Hash,
}

impl fmt::Display for EmbeddingBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddingBackend::Fastembed => write!(f, "fastembed"),
            EmbeddingBackend::Http => write!(f, "http"),
            EmbeddingBackend::Hash => write!(f, "hash"),
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding backend
    #[serde(default = "default_embedding_backend")]
    pub backend: EmbeddingBackend,

    /// Model name/identifier
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension (must match model)
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Batch size for embedding
    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: usize,

    /// Base URL of the HTTP embedding backend
    #[serde(default = "default_embedding_backend_url")]
    pub backend_url: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

/// Lookup the expected embedding dimension for a known model
pub fn embedding_dimension_for_model(model: &str) -> Option<usize> {
    match model {
        "BAAI/bge-small-en-v1.5" => Some(384),
        "BAAI/bge-base-en-v1.5" => Some(768),
        "BAAI/bge-large-en-v1.5" => Some(1024),
        "sentence-transformers/all-MiniLM-L6-v2" => Some(384),
        "sentence-transformers/all-MiniLM-L12-v2" => Some(384),
        _ => None,
    }
}

impl EmbeddingConfig {
    /// Resolve the effective embedding dimension based on the configured model
    pub fn resolved_dimension(&self) -> usize {
        if self.backend == EmbeddingBackend::Hash {
            return self.dimension;
        }

        if let Some(expected) = embedding_dimension_for_model(&self.model) {
            if expected != self.dimension {
                warn!(
                    "Embedding dimension {} does not match model '{}' ({}); using {}",
                    self.dimension, self.model, expected, expected
                );
            }
            expected
        } else {
            self.dimension
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Default number of results for searches
    #[serde(default = "default_retrieval_k")]
    pub default_k: usize,

    /// Upper bound applied to every requested k
    #[serde(default = "default_retrieval_max_results")]
    pub max_results: usize,
}

impl RetrievalConfig {
    /// Clamp a requested result count to the configured maximum
    pub fn clamp_k(&self, k: usize) -> usize {
        k.min(self.max_results)
    }
}

/// Knowledge corpus configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Optional corpus file replacing the bundled HR knowledge set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corpus_path: Option<PathBuf>,
}

/// What to do when an upload reuses an existing record id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Surface the conflict to the caller
    Reject,
    /// Append an upload timestamp to the id and insert again
    Timestamp,
}

/// Upload ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_duplicate_policy")]
    pub on_duplicate: DuplicatePolicy,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for resume-rag data
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,

    /// Path to the SQLite vector database
    pub db_file: PathBuf,

    /// Directory for downloaded embedding models
    pub model_cache_dir: PathBuf,
}

impl PathsConfig {
    fn for_base(base: PathBuf, config_file: PathBuf) -> Self {
        Self {
            config_file,
            db_file: base.join("rag.db"),
            model_cache_dir: base.join("models"),
            base_dir: base,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            qdrant_url: default_qdrant_url(),
            qdrant_api_key_env: default_qdrant_api_key_env(),
            collection_prefix: default_collection_prefix(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: default_embedding_backend(),
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            batch_size: default_embedding_batch_size(),
            backend_url: default_embedding_backend_url(),
            timeout_secs: default_embedding_timeout(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_k: default_retrieval_k(),
            max_results: default_retrieval_max_results(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            on_duplicate: default_duplicate_policy(),
        }
    }
}

impl Config {
    /// Get the default base directory for resume-rag (~/.resume-rag)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".resume-rag")
    }

    /// Initialize paths configuration
    pub fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(Self::default_base_dir);
        let config_file = base.join("config.toml");
        self.paths = PathsConfig::for_base(base, config_file);
    }

    /// Build a config rooted at `base_dir` without touching the filesystem
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        let mut config = Config::default();
        config.init_paths(Some(base_dir.into()));
        config
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        // Set up paths based on config file location
        let base = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        config.paths = PathsConfig::for_base(base, config_path.to_path_buf());

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Get the Qdrant API key from environment
    pub fn qdrant_api_key(&self) -> Option<String> {
        if self.store.qdrant_api_key_env.is_empty() {
            return None;
        }
        std::env::var(&self.store.qdrant_api_key_env).ok()
    }

    /// Check if resume-rag is initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.paths.config_file.exists()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.embedding.batch_size == 0 {
            return Err(Error::Config(
                "embedding.batch_size must be greater than 0".to_string(),
            ));
        }

        if self.embedding.dimension == 0 {
            return Err(Error::Config(
                "embedding.dimension must be greater than 0".to_string(),
            ));
        }

        if self.retrieval.default_k == 0 {
            return Err(Error::Config(
                "retrieval.default_k must be greater than 0".to_string(),
            ));
        }

        if self.retrieval.default_k > self.retrieval.max_results {
            return Err(Error::Config(
                "retrieval.default_k must be <= retrieval.max_results".to_string(),
            ));
        }

        if self.embedding.backend == EmbeddingBackend::Http {
            url::Url::parse(&self.embedding.backend_url).map_err(|e| {
                Error::Config(format!(
                    "embedding.backend_url '{}' is not a valid URL: {}",
                    self.embedding.backend_url, e
                ))
            })?;
        }

        Ok(())
    }
}

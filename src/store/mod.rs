//! Vector collection storage
//!
//! Three separately namespaced collections (resumes, job descriptions,
//! knowledge). A search is scoped to one collection structurally, so a
//! resume query can never match a job description.
//!
//! Backends:
//! - SQLite (default): durable local file, exact cosine search
//! - Qdrant: remote vector database

mod qdrant;
mod schema;
mod sqlite;

pub use qdrant::*;
pub use sqlite::*;

use crate::config::{Config, StoreBackend};
use crate::error::{Error, Result};
use crate::metadata::Metadata;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// The three fixed collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Resumes,
    JobDescriptions,
    Knowledge,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Resumes,
        Collection::JobDescriptions,
        Collection::Knowledge,
    ];

    /// Stable collection name
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Resumes => "resumes",
            Collection::JobDescriptions => "job_descriptions",
            Collection::Knowledge => "screening_knowledge",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Collection::Resumes => "Resume embeddings and metadata",
            Collection::JobDescriptions => "Job description embeddings and metadata",
            Collection::Knowledge => "HR knowledge base and best practices",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A document ready to be inserted
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
    pub metadata: Metadata,
}

impl DocumentRecord {
    /// Check the record invariants against the store's dimension
    pub fn validate(&self, dimension: usize) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::InvalidDocument("record id must not be empty".to_string()));
        }
        if self.text.trim().is_empty() {
            return Err(Error::InvalidDocument(format!(
                "record '{}' has empty text",
                self.id
            )));
        }
        if self.embedding.len() != dimension {
            return Err(Error::DimensionMismatch {
                expected: dimension,
                got: self.embedding.len(),
            });
        }
        Ok(())
    }
}

/// One nearest-neighbor hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub text: String,
    pub metadata: Metadata,
    /// Cosine distance (`1 - cosine similarity`); smaller is closer
    pub distance: f32,
}

/// Collection store contract shared by every backend
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the collection if it does not exist yet
    async fn ensure_collection(&self, collection: Collection) -> Result<()>;

    /// Drop the collection and every record in it. Returns false if it did not exist.
    async fn delete_collection(&self, collection: Collection) -> Result<bool>;

    /// Insert one record. Fails with [`Error::DuplicateId`] if the id exists.
    async fn insert(&self, collection: Collection, record: DocumentRecord) -> Result<()>;

    /// Up to `k` records ordered by ascending distance. Empty collections yield no hits.
    async fn query(&self, collection: Collection, embedding: &[f32], k: usize)
        -> Result<Vec<SearchHit>>;

    /// Exact number of stored records
    async fn count(&self, collection: Collection) -> Result<usize>;

    /// Vector dimension every record must have
    fn dimension(&self) -> usize;

    /// Backend label for status output
    fn backend_name(&self) -> &'static str;
}

/// Connect the configured backend
pub async fn connect_store(config: &Config, dimension: usize) -> Result<Arc<dyn VectorStore>> {
    info!(
        "Connecting {} vector store (dimension {})",
        config.store.backend, dimension
    );

    match config.store.backend {
        StoreBackend::Sqlite => {
            let store = SqliteStore::open(&config.paths.db_file, dimension).await?;
            Ok(Arc::new(store))
        }
        StoreBackend::Qdrant => {
            let store = QdrantStore::connect(config, dimension).await?;
            Ok(Arc::new(store))
        }
    }
}

/// Cosine distance between two vectors. Zero-norm input counts as orthogonal.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_names_are_distinct() {
        let names: std::collections::HashSet<_> =
            Collection::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names.len(), 3);
        assert_eq!(Collection::Knowledge.to_string(), "screening_knowledge");
    }

    #[test]
    fn test_record_validation() {
        let record = DocumentRecord {
            id: "r1".to_string(),
            text: "Rust engineer".to_string(),
            embedding: vec![1.0, 0.0],
            metadata: Metadata::new(),
        };
        assert!(record.validate(2).is_ok());
        assert!(matches!(
            record.validate(3),
            Err(Error::DimensionMismatch { expected: 3, got: 2 })
        ));

        let blank = DocumentRecord {
            text: "   ".to_string(),
            ..record.clone()
        };
        assert!(matches!(blank.validate(2), Err(Error::InvalidDocument(_))));

        let no_id = DocumentRecord {
            id: String::new(),
            ..record
        };
        assert!(matches!(no_id.validate(2), Err(Error::InvalidDocument(_))));
    }

    #[test]
    fn test_cosine_distance() {
        assert!(cosine_distance(&[1.0, 0.0], &[1.0, 0.0]).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-6);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
    }
}

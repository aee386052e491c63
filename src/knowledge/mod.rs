//! Curated HR knowledge corpus
//!
//! The corpus ships as a versioned JSON asset compiled into the binary and
//! can be replaced by a file named in `[knowledge] corpus_path`. Seeding
//! tops the knowledge collection up to the corpus size: entries already
//! stored are kept, so repeated or interrupted startups never duplicate or
//! lose entries.

use crate::embed::{embed_in_batches, Embedder};
use crate::error::{Error, Result};
use crate::metadata::{Metadata, MetadataValue};
use crate::store::{Collection, DocumentRecord, VectorStore};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

const BUNDLED_CORPUS: &str = include_str!("hr_knowledge.json");

/// How much weight a knowledge entry carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    High,
    Medium,
    Low,
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Importance::High => write!(f, "high"),
            Importance::Medium => write!(f, "medium"),
            Importance::Low => write!(f, "low"),
        }
    }
}

/// One best-practice statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: String,
    pub text: String,
    /// Category tag, e.g. `skill_evaluation` or `red_flags`
    pub category: String,
    pub importance: Importance,
}

impl KnowledgeEntry {
    fn metadata(&self, version: &str) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert(
            "category".to_string(),
            MetadataValue::from(self.category.as_str()),
        );
        metadata.insert(
            "importance".to_string(),
            MetadataValue::from(self.importance.to_string()),
        );
        metadata.insert("corpus_version".to_string(), MetadataValue::from(version));
        metadata
    }
}

/// A versioned set of knowledge entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeCorpus {
    pub version: String,
    pub entries: Vec<KnowledgeEntry>,
}

impl KnowledgeCorpus {
    /// The corpus compiled into the binary
    pub fn bundled() -> Result<Self> {
        Self::parse(BUNDLED_CORPUS)
    }

    /// Load a corpus from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading knowledge corpus from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// The configured corpus: an override file if set, otherwise the bundled one
    pub fn resolve(corpus_path: Option<&Path>) -> Result<Self> {
        match corpus_path {
            Some(path) => Self::load(path),
            None => Self::bundled(),
        }
    }

    fn parse(content: &str) -> Result<Self> {
        let corpus: KnowledgeCorpus = serde_json::from_str(content)?;
        corpus.validate()?;
        Ok(corpus)
    }

    /// Ids must be unique and non-empty; texts must be non-empty
    pub fn validate(&self) -> Result<()> {
        if self.entries.is_empty() {
            return Err(Error::Knowledge("corpus has no entries".to_string()));
        }

        let mut seen = HashSet::new();
        for entry in &self.entries {
            if entry.id.trim().is_empty() {
                return Err(Error::Knowledge("entry with empty id".to_string()));
            }
            if entry.text.trim().is_empty() {
                return Err(Error::Knowledge(format!("entry '{}' has empty text", entry.id)));
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(Error::Knowledge(format!("duplicate entry id '{}'", entry.id)));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of a seeding pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    /// Entries inserted by this pass
    pub inserted: usize,
    /// Records present before this pass
    pub existing: usize,
}

/// Populate the knowledge collection until it holds the whole corpus.
///
/// Entries whose id is already stored are skipped, which resumes a seed
/// interrupted by a failed insert.
pub async fn seed_knowledge(
    store: &dyn VectorStore,
    embedder: &dyn Embedder,
    corpus: &KnowledgeCorpus,
    batch_size: usize,
) -> Result<SeedReport> {
    let existing = store.count(Collection::Knowledge).await?;
    if existing >= corpus.len() {
        debug!(
            "Knowledge collection already holds {} entries, skipping seed",
            existing
        );
        return Ok(SeedReport {
            inserted: 0,
            existing,
        });
    }

    if existing > 0 {
        warn!(
            "Knowledge collection holds {} of {} entries, resuming seed",
            existing,
            corpus.len()
        );
    } else {
        info!(
            "Seeding {} knowledge entries (corpus version {})",
            corpus.len(),
            corpus.version
        );
    }

    let texts: Vec<String> = corpus.entries.iter().map(|e| e.text.clone()).collect();
    let embeddings = embed_in_batches(embedder, texts, batch_size).await?;

    let mut inserted = 0;
    for (entry, embedding) in corpus.entries.iter().zip(embeddings) {
        let record = DocumentRecord {
            id: entry.id.clone(),
            text: entry.text.clone(),
            embedding,
            metadata: entry.metadata(&corpus.version),
        };

        match store.insert(Collection::Knowledge, record).await {
            Ok(()) => inserted += 1,
            Err(e) if e.is_duplicate() => debug!("Knowledge entry {} already stored", entry.id),
            Err(e) => return Err(e),
        }
    }

    Ok(SeedReport { inserted, existing })
}

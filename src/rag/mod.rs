//! Retrieval orchestrator
//!
//! [`ResumeRag`] composes the embedder, the three collections and the
//! knowledge corpus. It is constructed once by the caller and passed around;
//! construction never fails. If any startup step fails the instance stays
//! degraded for its whole lifetime: reads return their zero value wrapped in
//! [`Outcome::Degraded`] and writes become logged no-ops.

mod batch;
mod confidence;
mod context;
mod ingest;
mod insights;
mod matching;
mod outcome;


pub use batch::*;
pub use confidence::*;
pub use context::*;
pub use insights::*;
pub use matching::*;
pub use outcome::*;

use crate::config::{Config, IngestConfig, RetrievalConfig};
use crate::embed::{create_embedder, Embedder};
use crate::error::{Error, Result};
use crate::knowledge::{seed_knowledge, KnowledgeCorpus, SeedReport};
use crate::metadata::Metadata;
use crate::store::{connect_store, Collection, DocumentRecord, SearchHit, VectorStore};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Startup step that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartupStage {
    Knowledge,
    Embedding,
    Store,
    Seed,
}

impl fmt::Display for StartupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupStage::Knowledge => write!(f, "knowledge corpus"),
            StartupStage::Embedding => write!(f, "embedding model"),
            StartupStage::Store => write!(f, "vector store"),
            StartupStage::Seed => write!(f, "knowledge seeding"),
        }
    }
}

/// Why the instance is degraded
#[derive(Debug, Clone, Serialize)]
pub struct StartupFailure {
    pub stage: StartupStage,
    pub message: String,
}

impl StartupFailure {
    pub fn new(stage: StartupStage, err: impl fmt::Display) -> Self {
        Self {
            stage,
            message: err.to_string(),
        }
    }
}

impl fmt::Display for StartupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.message)
    }
}

/// Orchestrator tuning taken from the config file
#[derive(Debug, Clone, Default)]
pub struct RagSettings {
    pub retrieval: RetrievalConfig,
    pub ingest: IngestConfig,
    pub batch_size: usize,
}

impl RagSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            retrieval: config.retrieval.clone(),
            ingest: config.ingest.clone(),
            batch_size: config.embedding.batch_size,
        }
    }
}

struct Components {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    corpus: KnowledgeCorpus,
}

enum State {
    Ready(Components),
    Degraded(StartupFailure),
}

/// Health of the collections as reported by [`ResumeRag::get_database_stats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsStatus {
    Initialized,
    NotInitialized,
    Error,
}

impl fmt::Display for StatsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatsStatus::Initialized => write!(f, "initialized"),
            StatsStatus::NotInitialized => write!(f, "not_initialized"),
            StatsStatus::Error => write!(f, "error"),
        }
    }
}

/// Record counts per collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseStats {
    pub resumes_count: usize,
    pub jobs_count: usize,
    pub knowledge_count: usize,
    pub total_embeddings: usize,
    pub status: StatsStatus,
}

impl DatabaseStats {
    fn zero(status: StatsStatus) -> Self {
        Self {
            resumes_count: 0,
            jobs_count: 0,
            knowledge_count: 0,
            total_embeddings: 0,
            status,
        }
    }
}

/// The retrieval system handle
pub struct ResumeRag {
    state: State,
    settings: RagSettings,
}

impl ResumeRag {
    /// Run the one-time startup: load the corpus and the embedding model,
    /// open the store, create the collections and seed the knowledge base.
    /// Any failure yields a degraded instance instead of an error.
    pub async fn connect(config: &Config) -> Self {
        let settings = RagSettings::from_config(config);

        match Self::open(config, settings.clone()).await {
            Ok(rag) => rag,
            Err(failure) => {
                error!("Retrieval unavailable, continuing degraded: {}", failure);
                Self::degraded(failure, settings)
            }
        }
    }

    async fn open(
        config: &Config,
        settings: RagSettings,
    ) -> std::result::Result<Self, StartupFailure> {
        let corpus = KnowledgeCorpus::resolve(config.knowledge.corpus_path.as_deref())
            .map_err(|e| StartupFailure::new(StartupStage::Knowledge, e))?;

        let embedder = create_embedder(config)
            .map_err(|e| StartupFailure::new(StartupStage::Embedding, e))?;

        let store = connect_store(config, embedder.dimension())
            .await
            .map_err(|e| StartupFailure::new(StartupStage::Store, e))?;

        Self::with_components(embedder, store, corpus, settings).await
    }

    /// Finish startup with already constructed components
    pub async fn with_components(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        corpus: KnowledgeCorpus,
        settings: RagSettings,
    ) -> std::result::Result<Self, StartupFailure> {
        if embedder.dimension() != store.dimension() {
            return Err(StartupFailure::new(
                StartupStage::Store,
                Error::DimensionMismatch {
                    expected: store.dimension(),
                    got: embedder.dimension(),
                },
            ));
        }

        for collection in Collection::ALL {
            store
                .ensure_collection(collection)
                .await
                .map_err(|e| StartupFailure::new(StartupStage::Store, e))?;
        }

        let report = seed_knowledge(
            store.as_ref(),
            embedder.as_ref(),
            &corpus,
            settings.batch_size,
        )
        .await
        .map_err(|e| StartupFailure::new(StartupStage::Seed, e))?;

        info!(
            "Retrieval ready: {} store, model {}, {} knowledge entries ({} seeded)",
            store.backend_name(),
            embedder.model_name(),
            report.existing + report.inserted,
            report.inserted
        );

        Ok(Self {
            state: State::Ready(Components {
                embedder,
                store,
                corpus,
            }),
            settings,
        })
    }

    /// An instance that never touches an embedder or a store
    pub fn degraded(failure: StartupFailure, settings: RagSettings) -> Self {
        Self {
            state: State::Degraded(failure),
            settings,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, State::Ready(_))
    }

    pub fn startup_failure(&self) -> Option<&StartupFailure> {
        match &self.state {
            State::Ready(_) => None,
            State::Degraded(failure) => Some(failure),
        }
    }

    pub fn settings(&self) -> &RagSettings {
        &self.settings
    }

    /// Store backend label, if ready
    pub fn store_backend(&self) -> Option<&'static str> {
        self.parts().map(|parts| parts.store.backend_name())
    }

    /// Embedding model name, if ready
    pub fn embedding_model(&self) -> Option<&str> {
        self.parts().map(|parts| parts.embedder.model_name())
    }

    fn parts(&self) -> Option<&Components> {
        match &self.state {
            State::Ready(parts) => Some(parts),
            State::Degraded(_) => None,
        }
    }

    /// Embed and store a resume
    pub async fn add_resume(
        &self,
        id: &str,
        text: &str,
        metadata: Metadata,
    ) -> Result<Outcome<()>> {
        self.insert_document(Collection::Resumes, id, text, metadata)
            .await
    }

    /// Embed and store a job description
    pub async fn add_job_description(
        &self,
        id: &str,
        text: &str,
        metadata: Metadata,
    ) -> Result<Outcome<()>> {
        self.insert_document(Collection::JobDescriptions, id, text, metadata)
            .await
    }

    async fn insert_document(
        &self,
        collection: Collection,
        id: &str,
        text: &str,
        metadata: Metadata,
    ) -> Result<Outcome<()>> {
        let Some(parts) = self.parts() else {
            warn!(
                "Retrieval not initialized, skipping insert of '{}' into {}",
                id, collection
            );
            return Ok(Outcome::empty(DegradedReason::NotInitialized));
        };

        let embedding = parts.embedder.embed_one(text).await?;
        let record = DocumentRecord {
            id: id.to_string(),
            text: text.to_string(),
            embedding,
            metadata,
        };

        if let Err(e) = parts.store.insert(collection, record).await {
            error!("Failed to add '{}' to {}: {}", id, collection, e);
            return Err(e);
        }

        debug!("Added '{}' to {}", id, collection);
        Ok(Outcome::ready(()))
    }

    /// Resumes nearest to the query text
    pub async fn search_similar_resumes(&self, query: &str, k: usize) -> Outcome<Vec<SearchHit>> {
        self.search_text(Collection::Resumes, query, k).await
    }

    /// Job descriptions nearest to the query text
    pub async fn search_similar_jobs(&self, query: &str, k: usize) -> Outcome<Vec<SearchHit>> {
        self.search_text(Collection::JobDescriptions, query, k)
            .await
    }

    /// Knowledge entries nearest to the query text, with metadata and distance
    pub async fn search_knowledge(&self, query: &str, k: usize) -> Outcome<Vec<SearchHit>> {
        self.search_text(Collection::Knowledge, query, k).await
    }

    /// Text of the knowledge entries nearest to the query
    pub async fn get_relevant_knowledge(&self, query: &str, k: usize) -> Outcome<Vec<String>> {
        self.search_knowledge(query, k)
            .await
            .map(|hits| hits.into_iter().map(|hit| hit.text).collect())
    }

    async fn search_text(
        &self,
        collection: Collection,
        query: &str,
        k: usize,
    ) -> Outcome<Vec<SearchHit>> {
        let Some(parts) = self.parts() else {
            return Outcome::empty(DegradedReason::NotInitialized);
        };

        let embedding = match parts.embedder.embed_one(query).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!("Embedding failed for {} search: {}", collection, e);
                return Outcome::empty(DegradedReason::Embedding);
            }
        };

        self.search_embedding(parts, collection, &embedding, k)
            .await
    }

    async fn search_embedding(
        &self,
        parts: &Components,
        collection: Collection,
        embedding: &[f32],
        k: usize,
    ) -> Outcome<Vec<SearchHit>> {
        let k = self.settings.retrieval.clamp_k(k);
        match parts.store.query(collection, embedding, k).await {
            Ok(hits) => Outcome::ready(hits),
            Err(e) => {
                warn!("Search in {} failed: {}", collection, e);
                Outcome::empty(DegradedReason::Store)
            }
        }
    }

    async fn count(&self, parts: &Components, collection: Collection) -> Outcome<usize> {
        match parts.store.count(collection).await {
            Ok(count) => Outcome::ready(count),
            Err(e) => {
                warn!("Counting {} failed: {}", collection, e);
                Outcome::empty(DegradedReason::Store)
            }
        }
    }

    /// Record counts per collection and their sum
    pub async fn get_database_stats(&self) -> DatabaseStats {
        let Some(parts) = self.parts() else {
            return DatabaseStats::zero(StatsStatus::NotInitialized);
        };

        let mut counts = [0usize; 3];
        for (slot, collection) in counts.iter_mut().zip(Collection::ALL) {
            match parts.store.count(collection).await {
                Ok(count) => *slot = count,
                Err(e) => {
                    warn!("Error getting database stats: {}", e);
                    return DatabaseStats::zero(StatsStatus::Error);
                }
            }
        }

        let [resumes_count, jobs_count, knowledge_count] = counts;
        DatabaseStats {
            resumes_count,
            jobs_count,
            knowledge_count,
            total_embeddings: resumes_count + jobs_count + knowledge_count,
            status: StatsStatus::Initialized,
        }
    }

    /// Drop and recreate every collection, then reseed the knowledge base.
    /// Irreversible.
    pub async fn clear_database(&self) -> Result<Outcome<SeedReport>> {
        let Some(parts) = self.parts() else {
            warn!("Retrieval not initialized, cannot clear database");
            return Ok(Outcome::empty(DegradedReason::NotInitialized));
        };

        warn!("Clearing all collections");

        for collection in Collection::ALL {
            parts.store.delete_collection(collection).await?;
        }
        for collection in Collection::ALL {
            parts.store.ensure_collection(collection).await?;
        }

        let report = seed_knowledge(
            parts.store.as_ref(),
            parts.embedder.as_ref(),
            &parts.corpus,
            self.settings.batch_size,
        )
        .await?;

        info!("Database cleared, {} knowledge entries reseeded", report.inserted);
        Ok(Outcome::ready(report))
    }
}

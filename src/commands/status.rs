//! Status command implementation

use crate::config::Config;
use crate::rag::{DatabaseStats, ResumeRag, StartupFailure, StatsStatus};
use serde::Serialize;
use tracing::info;

/// Status information
#[derive(Debug, Clone, Serialize)]
pub struct StatusInfo {
    pub config_path: String,
    pub db_path: String,
    pub store_backend: String,
    pub embedding_backend: String,
    pub embedding_model: String,
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub startup_failure: Option<StartupFailure>,
    pub stats: DatabaseStats,
}

/// Get system status
pub async fn cmd_status(config: &Config, rag: &ResumeRag) -> StatusInfo {
    info!("Getting status");

    let stats = rag.get_database_stats().await;

    StatusInfo {
        config_path: config.paths.config_file.display().to_string(),
        db_path: config.paths.db_file.display().to_string(),
        store_backend: rag
            .store_backend()
            .map(str::to_string)
            .unwrap_or_else(|| config.store.backend.to_string()),
        embedding_backend: config.embedding.backend.to_string(),
        embedding_model: rag
            .embedding_model()
            .map(str::to_string)
            .unwrap_or_else(|| config.embedding.model.clone()),
        ready: rag.is_ready(),
        startup_failure: rag.startup_failure().cloned(),
        stats,
    }
}

/// Print status to console
pub fn print_status(status: &StatusInfo) {
    println!("\n📊 resume-rag Status\n");
    println!("Configuration: {}", status.config_path);
    println!("Database: {}", status.db_path);
    println!("\nStore: {}", status.store_backend);
    println!(
        "Embedding: {} ({})",
        status.embedding_model, status.embedding_backend
    );

    let state = match (&status.startup_failure, status.stats.status) {
        (Some(failure), _) => format!("✗ Degraded: {}", failure),
        (None, StatsStatus::Initialized) => "✓ Ready".to_string(),
        (None, StatsStatus::Error) => "⚠ Ready, but the collections could not be counted".to_string(),
        (None, StatsStatus::NotInitialized) => "⚠ Not initialized".to_string(),
    };
    println!("Status: {}", state);

    println!("\nCollections:");
    println!("  Resumes: {}", status.stats.resumes_count);
    println!("  Job descriptions: {}", status.stats.jobs_count);
    println!("  Knowledge: {}", status.stats.knowledge_count);
    println!("  Total embeddings: {}", status.stats.total_embeddings);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbeddingBackend;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_status_of_ready_instance() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::with_base_dir(tmp.path());
        config.embedding.backend = EmbeddingBackend::Hash;
        config.embedding.dimension = 32;

        let rag = ResumeRag::connect(&config).await;
        let status = cmd_status(&config, &rag).await;

        assert!(status.ready);
        assert!(status.startup_failure.is_none());
        assert_eq!(status.store_backend, "sqlite");
        assert_eq!(status.embedding_model, "feature-hash-32");
        assert_eq!(status.stats.knowledge_count, 10);
        assert_eq!(status.stats.total_embeddings, 10);
    }

    #[tokio::test]
    async fn test_status_of_degraded_instance() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::with_base_dir(tmp.path());
        config.embedding.backend = EmbeddingBackend::Hash;
        config.knowledge.corpus_path = Some(tmp.path().join("missing.json"));

        let rag = ResumeRag::connect(&config).await;
        let status = cmd_status(&config, &rag).await;

        assert!(!status.ready);
        assert!(status.startup_failure.is_some());
        assert_eq!(status.stats.status, StatsStatus::NotInitialized);

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["stats"]["status"], "not_initialized");
    }
}

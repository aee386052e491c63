//! Init and clear command implementations

use crate::config::{Config, EmbeddingBackend, StoreBackend};
use crate::error::{Error, Result};
use crate::knowledge::SeedReport;
use crate::rag::{DatabaseStats, Outcome, ResumeRag, StartupFailure};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct InitOptions {
    pub base_dir: PathBuf,
    pub force: bool,
    pub store_backend: Option<StoreBackend>,
    pub embedding_backend: Option<EmbeddingBackend>,
}

/// What `init` created
#[derive(Debug, Clone, Serialize)]
pub struct InitReport {
    pub config_path: String,
    pub db_path: String,
    pub stats: DatabaseStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub startup_failure: Option<StartupFailure>,
}

/// Write a default config, create the collections and seed the knowledge base
pub async fn cmd_init(options: InitOptions) -> Result<InitReport> {
    let mut config = Config::with_base_dir(options.base_dir);
    if let Some(backend) = options.store_backend {
        config.store.backend = backend;
    }
    if let Some(backend) = options.embedding_backend {
        config.embedding.backend = backend;
    }

    if config.is_initialized() && !options.force {
        return Err(Error::Config(format!(
            "Config already exists at {}. Use --force to overwrite.",
            config.paths.config_file.display()
        )));
    }

    config.validate()?;
    config.save()?;
    info!("Created config at {:?}", config.paths.config_file);

    let rag = ResumeRag::connect(&config).await;
    let stats = rag.get_database_stats().await;

    Ok(InitReport {
        config_path: config.paths.config_file.display().to_string(),
        db_path: config.paths.db_file.display().to_string(),
        stats,
        startup_failure: rag.startup_failure().cloned(),
    })
}

/// Print init result to console
pub fn print_init_report(report: &InitReport) {
    println!("✓ resume-rag initialized");
    println!("  Config: {}", report.config_path);
    println!("  Database: {}", report.db_path);

    match &report.startup_failure {
        None => println!("  Knowledge entries: {}", report.stats.knowledge_count),
        Some(failure) => {
            println!("  ⚠ Retrieval unavailable: {}", failure);
            println!("    Fix the config and run 'resume-rag status' to check again.");
        }
    }

    println!("\nNext steps:");
    println!("  resume-rag add-resume ./resume.txt        # Store a resume");
    println!("  resume-rag match ./resume.txt ./job.txt   # Score a resume against a job");
}

/// Drop every collection and reseed the knowledge base
pub async fn cmd_clear(rag: &ResumeRag) -> Result<Outcome<SeedReport>> {
    info!("Clearing database");
    rag.clear_database().await
}

/// Print clear result to console
pub fn print_clear_report(outcome: &Outcome<SeedReport>) {
    match outcome.reason() {
        None => println!(
            "✓ Database cleared, {} knowledge entries reseeded",
            outcome.value().inserted
        ),
        Some(reason) => println!("⚠ Nothing cleared: retrieval unavailable ({})", reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::StatsStatus;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let tmp = TempDir::new().unwrap();
        let mut existing = Config::with_base_dir(tmp.path());
        existing.embedding.backend = EmbeddingBackend::Hash;
        existing.save().unwrap();

        let err = cmd_init(InitOptions {
            base_dir: tmp.path().to_path_buf(),
            force: false,
            store_backend: None,
            embedding_backend: Some(EmbeddingBackend::Hash),
        })
        .await
        .expect_err("existing config must not be overwritten");
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_init_writes_config_and_seeds() {
        let tmp = TempDir::new().unwrap();

        let report = cmd_init(InitOptions {
            base_dir: tmp.path().to_path_buf(),
            force: false,
            store_backend: Some(StoreBackend::Sqlite),
            embedding_backend: Some(EmbeddingBackend::Hash),
        })
        .await
        .unwrap();

        assert!(report.startup_failure.is_none());
        assert_eq!(report.stats.knowledge_count, 10);

        let saved = Config::load(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(saved.embedding.backend, EmbeddingBackend::Hash);
    }

    #[tokio::test]
    async fn test_clear_reports_reseed() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::with_base_dir(tmp.path());
        config.embedding.backend = EmbeddingBackend::Hash;
        config.embedding.dimension = 32;

        let rag = ResumeRag::connect(&config).await;
        let outcome = cmd_clear(&rag).await.unwrap();
        assert_eq!(outcome.value().inserted, 10);
        assert_eq!(
            rag.get_database_stats().await.status,
            StatsStatus::Initialized
        );
    }
}

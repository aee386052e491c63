//! Upload commands: store resumes and job descriptions

use super::{degraded_note, read_document};
use crate::error::Result;
use crate::metadata::UploadContext;
use crate::rag::{Outcome, ResumeRag};
use crate::store::Collection;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Where an uploaded document ended up
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub collection: Collection,
    pub filename: String,
    /// Outcome carrying the record id actually used
    pub stored: Outcome<String>,
}

/// Store a resume file
pub async fn cmd_add_resume(
    rag: &ResumeRag,
    path: &Path,
    context: UploadContext,
) -> Result<IngestReport> {
    let doc = read_document(path).await?;
    info!("Adding resume {} ({})", doc.filename, context);

    let stored = rag
        .ingest_resume_upload(&doc.filename, &doc.text, context)
        .await?;

    Ok(IngestReport {
        collection: Collection::Resumes,
        filename: doc.filename,
        stored,
    })
}

/// Store a job description submitted alongside `resume_filename`
pub async fn cmd_add_job(
    rag: &ResumeRag,
    path: &Path,
    resume_filename: &str,
) -> Result<IngestReport> {
    let doc = read_document(path).await?;
    info!("Adding job description {} for {}", doc.filename, resume_filename);

    let stored = rag.ingest_job_description(resume_filename, &doc.text).await?;

    Ok(IngestReport {
        collection: Collection::JobDescriptions,
        filename: doc.filename,
        stored,
    })
}

/// Print ingest result to console
pub fn print_ingest_report(report: &IngestReport) {
    if report.stored.is_ready() {
        println!(
            "✓ Stored {} in {} as '{}'",
            report.filename,
            report.collection,
            report.stored.value()
        );
    } else {
        println!(
            "⚠ {} was not stored{}",
            report.filename,
            degraded_note(&report.stored)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, DuplicatePolicy, EmbeddingBackend};
    use crate::error::Error;
    use tempfile::TempDir;

    async fn hash_rag(tmp: &TempDir, policy: DuplicatePolicy) -> ResumeRag {
        let mut config = Config::with_base_dir(tmp.path());
        config.embedding.backend = EmbeddingBackend::Hash;
        config.embedding.dimension = 64;
        config.ingest.on_duplicate = policy;
        ResumeRag::connect(&config).await
    }

    #[tokio::test]
    async fn test_add_resume_and_job() {
        let tmp = TempDir::new().unwrap();
        let rag = hash_rag(&tmp, DuplicatePolicy::Reject).await;

        let resume = tmp.path().join("ada.txt");
        std::fs::write(&resume, "Rust engineer, 7 years of distributed systems").unwrap();
        let job = tmp.path().join("role.txt");
        std::fs::write(&job, "Senior backend engineer, Rust and Kafka").unwrap();

        let report = cmd_add_resume(&rag, &resume, UploadContext::JdMatch)
            .await
            .unwrap();
        assert_eq!(report.collection, Collection::Resumes);
        assert_eq!(report.stored.value(), "jd_match_ada.txt");

        let report = cmd_add_job(&rag, &job, "ada.txt").await.unwrap();
        assert_eq!(report.collection, Collection::JobDescriptions);
        assert_eq!(report.filename, "role.txt");
        assert_eq!(report.stored.value(), "jd_match_ada.txt");

        let stats = rag.get_database_stats().await;
        assert_eq!(stats.resumes_count, 1);
        assert_eq!(stats.jobs_count, 1);
    }

    #[tokio::test]
    async fn test_add_resume_twice_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let rag = hash_rag(&tmp, DuplicatePolicy::Reject).await;

        let resume = tmp.path().join("ada.txt");
        std::fs::write(&resume, "Rust engineer").unwrap();

        cmd_add_resume(&rag, &resume, UploadContext::Resume)
            .await
            .unwrap();
        let err = cmd_add_resume(&rag, &resume, UploadContext::Resume)
            .await
            .expect_err("second upload under the same id");
        assert!(matches!(err, Error::DuplicateId { .. }));
    }
}

//! Upload ingestion
//!
//! Builds typed metadata for uploaded documents, namespaces their ids by
//! upload context and applies the configured duplicate policy.

use super::{Outcome, ResumeRag};
use crate::config::DuplicatePolicy;
use crate::error::Result;
use crate::metadata::{JobMetadata, Metadata, ResumeMetadata, UploadContext};
use crate::store::Collection;
use chrono::{DateTime, Utc};
use tracing::info;

/// `<id>_<yyyymmddThhmmssZ>`
pub fn timestamped_id(id: &str, at: DateTime<Utc>) -> String {
    format!("{}_{}", id, at.format("%Y%m%dT%H%M%SZ"))
}

impl ResumeRag {
    /// Store an uploaded resume. Returns the id it was stored under.
    pub async fn ingest_resume_upload(
        &self,
        filename: &str,
        text: &str,
        context: UploadContext,
    ) -> Result<Outcome<String>> {
        let record = ResumeMetadata::new(filename, context);
        let id = format!("{}{}", context.id_prefix(), filename);
        let upload_date = record.upload_date;
        let metadata = record.to_metadata()?;

        self.ingest_with_policy(Collection::Resumes, id, text, metadata, upload_date)
            .await
    }

    /// Store a job description submitted together with a resume
    pub async fn ingest_job_description(
        &self,
        resume_filename: &str,
        text: &str,
    ) -> Result<Outcome<String>> {
        let record = JobMetadata::for_resume(resume_filename);
        let id = format!("{}{}", UploadContext::JdMatch.id_prefix(), resume_filename);
        let upload_date = record.upload_date;
        let metadata = record.to_metadata()?;

        self.ingest_with_policy(Collection::JobDescriptions, id, text, metadata, upload_date)
            .await
    }

    async fn ingest_with_policy(
        &self,
        collection: Collection,
        id: String,
        text: &str,
        metadata: Metadata,
        upload_date: DateTime<Utc>,
    ) -> Result<Outcome<String>> {
        let first = self
            .insert_document(collection, &id, text, metadata.clone())
            .await;

        match first {
            Ok(outcome) => Ok(outcome.map(|_| id)),
            Err(e) if e.is_duplicate() && self.settings.ingest.on_duplicate == DuplicatePolicy::Timestamp => {
                let renamed = timestamped_id(&id, upload_date);
                info!("'{}' already exists in {}, storing as '{}'", id, collection, renamed);
                let outcome = self
                    .insert_document(collection, &renamed, text, metadata)
                    .await?;
                Ok(outcome.map(|_| renamed))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamped_id_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(timestamped_id("ada.pdf", at), "ada.pdf_20240309T070501Z");
    }
}

//! CLI commands implementation

pub mod analyze;
pub mod ingest;
pub mod init;
pub mod query;
pub mod status;

pub use analyze::*;
pub use ingest::*;
pub use init::*;
pub use query::*;
pub use status::*;

use crate::error::{Error, Result};
use std::path::Path;
use tracing::debug;

/// A plain-text document read from disk
#[derive(Debug, Clone)]
pub struct InputDocument {
    /// File name without directories, used as the record id
    pub filename: String,
    pub text: String,
}

/// Read an already extracted text file
pub async fn read_document(path: &Path) -> Result<InputDocument> {
    debug!("Reading {:?}", path);

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::InvalidDocument(format!("{} has no file name", path.display())))?;

    let text = tokio::fs::read_to_string(path).await?;
    if text.trim().is_empty() {
        return Err(Error::InvalidDocument(format!(
            "{} contains no text",
            path.display()
        )));
    }

    Ok(InputDocument { filename, text })
}

/// Label printed next to a degraded result
pub(crate) fn degraded_note<T>(outcome: &crate::rag::Outcome<T>) -> String {
    match outcome.reason() {
        Some(reason) => format!(" (degraded: {})", reason),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_read_document() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ada.txt");
        std::fs::write(&path, "Rust engineer").unwrap();

        let doc = read_document(&path).await.unwrap();
        assert_eq!(doc.filename, "ada.txt");
        assert_eq!(doc.text, "Rust engineer");
    }

    #[tokio::test]
    async fn test_read_document_rejects_blank_files() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("blank.txt");
        std::fs::write(&path, "  \n").unwrap();

        assert!(matches!(
            read_document(&path).await,
            Err(Error::InvalidDocument(_))
        ));
        assert!(read_document(&tmp.path().join("missing.txt")).await.is_err());
    }
}

//! Local vector store on SQLite
//!
//! Embeddings are stored as little-endian f32 blobs and searched with an
//! exact cosine scan per collection.

use super::schema::SCHEMA_SQL;
use super::{cosine_distance, Collection, DocumentRecord, SearchHit, VectorStore};
use crate::error::{Error, Result};
use crate::metadata::Metadata;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::{debug, info};

/// SQLite-backed collection store
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    dimension: usize,
}

impl SqliteStore {
    /// Open (or create) the database file and apply the schema
    pub async fn open(db_path: &Path, dimension: usize) -> Result<Self> {
        // Create parent directory if needed
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        debug!("Connecting to SQLite database at {:?}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool, dimension };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        debug!("Applying vector store schema");
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn collection_dimension(&self, collection: Collection) -> Result<Option<i64>> {
        let dimension: Option<i64> =
            sqlx::query_scalar("SELECT dimension FROM collections WHERE name = ?")
                .bind(collection.name())
                .fetch_optional(&self.pool)
                .await?;
        Ok(dimension)
    }

    async fn require_collection(&self, collection: Collection) -> Result<()> {
        match self.collection_dimension(collection).await? {
            Some(_) => Ok(()),
            None => Err(Error::CollectionNotFound(collection.name().to_string())),
        }
    }
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn ensure_collection(&self, collection: Collection) -> Result<()> {
        if let Some(existing) = self.collection_dimension(collection).await? {
            if existing as usize != self.dimension {
                return Err(Error::Config(format!(
                    "Collection '{}' has vector size {}, but the embedding model produces {}. Remediation: clear the database or point the config at a new data directory.",
                    collection, existing, self.dimension
                )));
            }
            debug!("Collection {} already exists", collection);
            return Ok(());
        }

        info!(
            "Creating collection {} with dimension {}",
            collection, self.dimension
        );

        sqlx::query(
            r#"
            INSERT OR IGNORE INTO collections (name, description, dimension, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(collection.name())
        .bind(collection.description())
        .bind(self.dimension as i64)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_collection(&self, collection: Collection) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM records WHERE collection = ?")
            .bind(collection.name())
            .execute(&mut *tx)
            .await?;

        let removed = sqlx::query("DELETE FROM collections WHERE name = ?")
            .bind(collection.name())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        if removed > 0 {
            info!("Deleted collection {}", collection);
        }
        Ok(removed > 0)
    }

    async fn insert(&self, collection: Collection, record: DocumentRecord) -> Result<()> {
        record.validate(self.dimension)?;
        self.require_collection(collection).await?;

        debug!("Inserting record {} into {}", record.id, collection);

        let metadata_json = serde_json::to_string(&record.metadata)?;

        sqlx::query(
            r#"
            INSERT INTO records (collection, id, document, embedding, metadata_json, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(collection.name())
        .bind(&record.id)
        .bind(&record.text)
        .bind(encode_embedding(&record.embedding))
        .bind(metadata_json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => Error::DuplicateId {
                collection: collection.name().to_string(),
                id: record.id.clone(),
            },
            other => Error::Database(other),
        })?;

        Ok(())
    }

    async fn query(
        &self,
        collection: Collection,
        embedding: &[f32],
        k: usize,
    ) -> Result<Vec<SearchHit>> {
        if embedding.len() != self.dimension {
            return Err(Error::DimensionMismatch {
                expected: self.dimension,
                got: embedding.len(),
            });
        }
        self.require_collection(collection).await?;

        if k == 0 {
            return Ok(Vec::new());
        }

        let rows: Vec<(String, String, Vec<u8>, String)> = sqlx::query_as(
            "SELECT id, document, embedding, metadata_json FROM records WHERE collection = ? ORDER BY rowid",
        )
        .bind(collection.name())
        .fetch_all(&self.pool)
        .await?;

        debug!(
            "Scanning {} records in {} for top {}",
            rows.len(),
            collection,
            k
        );

        let mut hits = Vec::with_capacity(rows.len());
        for (id, text, blob, metadata_json) in rows {
            let stored = decode_embedding(&blob)?;
            let metadata: Metadata = serde_json::from_str(&metadata_json)?;
            hits.push(SearchHit {
                id,
                text,
                metadata,
                distance: cosine_distance(embedding, &stored),
            });
        }

        // Stable sort: equal distances keep insertion order
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(hits)
    }

    async fn count(&self, collection: Collection) -> Result<usize> {
        self.require_collection(collection).await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records WHERE collection = ?")
            .bind(collection.name())
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_embedding(blob: &[u8]) -> Result<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return Err(Error::Other(format!(
            "Corrupt embedding blob of {} bytes",
            blob.len()
        )));
    }
    Ok(blob
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

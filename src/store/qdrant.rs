//! Qdrant vector database backend
//!
//! Each collection maps to a Qdrant collection named `<prefix><collection>`.
//! Qdrant point ids must be UUIDs or integers, so record ids are mapped to
//! UUIDv5 values and the original id travels in the payload.

use super::{Collection, DocumentRecord, SearchHit, VectorStore};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::metadata::{Metadata, MetadataValue};
use async_trait::async_trait;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    CountPointsBuilder, CreateCollectionBuilder, Distance, GetCollectionInfoResponse,
    GetPointsBuilder, PointId, PointStruct, SearchPointsBuilder, Struct, UpsertPointsBuilder,
    Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

const RECORD_ID_KEY: &str = "record_id";
const DOCUMENT_KEY: &str = "document";
const METADATA_KEY: &str = "metadata";

/// Qdrant store handle
pub struct QdrantStore {
    client: Qdrant,
    prefix: String,
    dimension: usize,
    /// Held across the existence check and the upsert
    insert_lock: Mutex<()>,
}

impl QdrantStore {
    /// Connect to Qdrant using config
    pub async fn connect(config: &Config, dimension: usize) -> Result<Self> {
        Self::new(
            &config.store.qdrant_url,
            &config.store.collection_prefix,
            dimension,
            config.qdrant_api_key(),
        )
        .await
    }

    /// Create a new store connection directly with URL and collection prefix
    pub async fn new(
        url: &str,
        prefix: &str,
        dimension: usize,
        api_key: Option<String>,
    ) -> Result<Self> {
        debug!("Connecting to Qdrant at {}", url);

        let mut builder = Qdrant::from_url(url).skip_compatibility_check();
        if let Some(key) = api_key {
            builder = builder.api_key(key);
        }
        let client = builder.build().map_err(|e| Error::Qdrant(e.to_string()))?;

        Ok(Self {
            client,
            prefix: prefix.to_string(),
            dimension,
            insert_lock: Mutex::new(()),
        })
    }

    fn collection_name(&self, collection: Collection) -> String {
        format!("{}{}", self.prefix, collection.name())
    }

    async fn collection_vector_size(&self, name: &str) -> Result<Option<u64>> {
        let info = self.client.collection_info(name).await?;
        Ok(extract_vector_size(&info))
    }

    async fn point_exists(&self, name: &str, point_id: &Uuid) -> Result<bool> {
        let response = self
            .client
            .get_points(
                GetPointsBuilder::new(name, vec![PointId::from(point_id.to_string())])
                    .with_payload(false)
                    .with_vectors(false),
            )
            .await?;
        Ok(!response.result.is_empty())
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn ensure_collection(&self, collection: Collection) -> Result<()> {
        let name = self.collection_name(collection);

        if self.client.collection_exists(&name).await? {
            debug!("Collection {} already exists", name);

            if let Some(size) = self.collection_vector_size(&name).await? {
                if size as usize != self.dimension {
                    return Err(Error::Qdrant(format!(
                        "Collection '{}' has vector size {}, but the embedding model produces {}. Remediation: set a new collection prefix or clear the database.",
                        name, size, self.dimension
                    )));
                }
            }
            return Ok(());
        }

        info!(
            "Creating collection {} with dimension {}",
            name, self.dimension
        );

        let vectors_config = VectorParamsBuilder::new(self.dimension as u64, Distance::Cosine);
        self.client
            .create_collection(CreateCollectionBuilder::new(&name).vectors_config(vectors_config))
            .await?;

        info!("Collection {} created successfully", name);
        Ok(())
    }

    async fn delete_collection(&self, collection: Collection) -> Result<bool> {
        let name = self.collection_name(collection);

        if !self.client.collection_exists(&name).await? {
            return Ok(false);
        }

        info!("Deleting collection {}", name);
        self.client.delete_collection(&name).await?;
        Ok(true)
    }

    async fn insert(&self, collection: Collection, record: DocumentRecord) -> Result<()> {
        record.validate(self.dimension)?;

        let name = self.collection_name(collection);
        let point_id = point_uuid(&record.id);

        // Upsert would silently overwrite, so probe first. Concurrent
        // inserts through this handle are serialized.
        let _guard = self.insert_lock.lock().await;
        if self.point_exists(&name, &point_id).await? {
            return Err(Error::DuplicateId {
                collection: collection.name().to_string(),
                id: record.id,
            });
        }

        debug!("Upserting record {} into {}", record.id, name);

        let payload = record_payload(&record);
        let point = PointStruct::new(point_id.to_string(), record.embedding, payload);

        self.client
            .upsert_points(UpsertPointsBuilder::new(&name, vec![point]).wait(true))
            .await?;

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
        if k == 0 {
            return Ok(Vec::new());
        }

        let name = self.collection_name(collection);
        debug!("Searching collection {} with limit {}", name, k);

        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(&name, embedding.to_vec(), k as u64).with_payload(true),
            )
            .await?;

        Ok(response
            .result
            .into_iter()
            .map(|point| hit_from_payload(point.payload, point.score))
            .collect())
    }

    async fn count(&self, collection: Collection) -> Result<usize> {
        let name = self.collection_name(collection);
        if !self.client.collection_exists(&name).await? {
            return Err(Error::CollectionNotFound(name));
        }

        let response = self
            .client
            .count(CountPointsBuilder::new(&name).exact(true))
            .await?;
        Ok(response.result.map(|r| r.count).unwrap_or(0) as usize)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn backend_name(&self) -> &'static str {
        "qdrant"
    }
}

/// Stable point id for a record id
fn point_uuid(record_id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, record_id.as_bytes())
}

fn extract_vector_size(info: &GetCollectionInfoResponse) -> Option<u64> {
    let result = info.result.as_ref()?;
    let config = result.config.as_ref()?;
    let params = config.params.as_ref()?;
    let vectors_config = params.vectors_config.as_ref()?;

    match vectors_config.config.as_ref()? {
        qdrant_client::qdrant::vectors_config::Config::Params(params) => Some(params.size),
        qdrant_client::qdrant::vectors_config::Config::ParamsMap(_) => None,
    }
}

fn record_payload(record: &DocumentRecord) -> HashMap<String, QdrantValue> {
    let metadata_fields = record
        .metadata
        .iter()
        .map(|(k, v)| (k.clone(), qdrant_from_metadata(v)))
        .collect();

    let mut payload = HashMap::new();
    payload.insert(RECORD_ID_KEY.to_string(), string_value(&record.id));
    payload.insert(DOCUMENT_KEY.to_string(), string_value(&record.text));
    payload.insert(
        METADATA_KEY.to_string(),
        QdrantValue {
            kind: Some(Kind::StructValue(Struct {
                fields: metadata_fields,
            })),
        },
    );
    payload
}

fn hit_from_payload(mut payload: HashMap<String, QdrantValue>, score: f32) -> SearchHit {
    let id = payload
        .remove(RECORD_ID_KEY)
        .and_then(string_from_qdrant)
        .unwrap_or_default();
    let text = payload
        .remove(DOCUMENT_KEY)
        .and_then(string_from_qdrant)
        .unwrap_or_default();
    let metadata: Metadata = match payload.remove(METADATA_KEY).and_then(|v| v.kind) {
        Some(Kind::StructValue(s)) => s
            .fields
            .into_iter()
            .map(|(k, v)| (k, metadata_from_qdrant(v)))
            .collect(),
        _ => Metadata::new(),
    };

    SearchHit {
        id,
        text,
        metadata,
        distance: 1.0 - score,
    }
}

fn string_value(s: &str) -> QdrantValue {
    QdrantValue {
        kind: Some(Kind::StringValue(s.to_string())),
    }
}

fn string_from_qdrant(v: QdrantValue) -> Option<String> {
    match v.kind {
        Some(Kind::StringValue(s)) => Some(s),
        _ => None,
    }
}

fn qdrant_from_metadata(value: &MetadataValue) -> QdrantValue {
    let kind = match value {
        MetadataValue::Null => Kind::NullValue(0),
        MetadataValue::Bool(b) => Kind::BoolValue(*b),
        MetadataValue::Int(i) => Kind::IntegerValue(*i),
        MetadataValue::Float(x) => Kind::DoubleValue(*x),
        MetadataValue::Str(s) => Kind::StringValue(s.clone()),
    };
    QdrantValue { kind: Some(kind) }
}

fn metadata_from_qdrant(value: QdrantValue) -> MetadataValue {
    match value.kind {
        Some(Kind::BoolValue(b)) => MetadataValue::Bool(b),
        Some(Kind::IntegerValue(i)) => MetadataValue::Int(i),
        Some(Kind::DoubleValue(d)) => MetadataValue::Float(d),
        Some(Kind::StringValue(s)) => MetadataValue::Str(s),
        Some(Kind::NullValue(_)) | None => MetadataValue::Null,
        // Never written by this store, keep them readable anyway
        Some(other) => MetadataValue::Str(format!("{:?}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_uuid_is_stable() {
        assert_eq!(point_uuid("resume.pdf"), point_uuid("resume.pdf"));
        assert_ne!(point_uuid("resume.pdf"), point_uuid("jd_match_resume.pdf"));
    }

    #[test]
    fn test_payload_round_trip_preserves_record() {
        let mut metadata = Metadata::new();
        metadata.insert("category".to_string(), "red_flags".into());
        metadata.insert("years".to_string(), 4i64.into());
        metadata.insert("remote".to_string(), true.into());

        let record = DocumentRecord {
            id: "knowledge_3".to_string(),
            text: "Red flags include gaps".to_string(),
            embedding: vec![0.0, 1.0],
            metadata: metadata.clone(),
        };

        let hit = hit_from_payload(record_payload(&record), 0.75);
        assert_eq!(hit.id, "knowledge_3");
        assert_eq!(hit.text, "Red flags include gaps");
        assert_eq!(hit.metadata, metadata);
        assert!((hit.distance - 0.25).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_insert_rejects_dimension_mismatch() {
        let store = QdrantStore::new("http://127.0.0.1:6334", "test_", 3, None)
            .await
            .expect("store should initialize");

        let record = DocumentRecord {
            id: "r1".to_string(),
            text: "resume".to_string(),
            embedding: vec![0.1, 0.2],
            metadata: Metadata::new(),
        };

        let err = store
            .insert(Collection::Resumes, record)
            .await
            .expect_err("should reject mismatched vector length");

        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 3,
                got: 2
            }
        ));
    }

    #[tokio::test]
    #[ignore = "requires a running Qdrant at 127.0.0.1:6334"]
    async fn test_concurrent_inserts_of_same_id_keep_one_record() {
        let prefix = format!("test_{}_", Uuid::new_v5(&Uuid::NAMESPACE_OID, b"concurrent").simple());
        let store = std::sync::Arc::new(
            QdrantStore::new("http://127.0.0.1:6334", &prefix, 3, None)
                .await
                .unwrap(),
        );
        store.delete_collection(Collection::Resumes).await.unwrap();
        store.ensure_collection(Collection::Resumes).await.unwrap();

        let record = |text: &str| DocumentRecord {
            id: "ada.txt".to_string(),
            text: text.to_string(),
            embedding: vec![0.1, 0.2, 0.3],
            metadata: Metadata::new(),
        };

        let (a, b) = tokio::join!(
            store.insert(Collection::Resumes, record("first upload")),
            store.insert(Collection::Resumes, record("second upload")),
        );

        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(Error::DuplicateId { .. }))));
        assert_eq!(store.count(Collection::Resumes).await.unwrap(), 1);

        store.delete_collection(Collection::Resumes).await.unwrap();
    }

    #[tokio::test]
    async fn test_collection_names_use_prefix() {
        let store = QdrantStore::new("http://127.0.0.1:6334", "resume_rag_", 3, None)
            .await
            .expect("store should initialize");
        assert_eq!(
            store.collection_name(Collection::Knowledge),
            "resume_rag_screening_knowledge"
        );
    }
}

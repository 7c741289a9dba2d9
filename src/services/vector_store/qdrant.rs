//! Qdrant-backed vector store.

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    VectorParamsBuilder, value::Kind, vectors_config,
};
use tracing::{debug, info};

use super::{CollectionStats, RecordMetadata, SearchHit, VectorRecord, VectorStore};
use crate::error::VectorStoreError;
use crate::models::VectorStoreConfig;

pub struct QdrantStore {
    client: Qdrant,
    collection: String,
}

/// Existing-collection shape relevant to `ensure_collection`.
struct CollectionState {
    points_count: u64,
    dimensions: Option<u64>,
}

impl QdrantStore {
    pub fn new(config: &VectorStoreConfig) -> Result<Self, VectorStoreError> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            collection: config.collection.clone(),
        })
    }

    /// Returns `None` when the collection does not exist.
    async fn collection_state(&self) -> Result<Option<CollectionState>, VectorStoreError> {
        match self.client.collection_info(&self.collection).await {
            Ok(info) => {
                let result = match info.result {
                    Some(r) => r,
                    None => return Ok(None),
                };
                let dimensions = result
                    .config
                    .and_then(|c| c.params)
                    .and_then(|p| p.vectors_config)
                    .and_then(|v| v.config)
                    .and_then(|c| match c {
                        vectors_config::Config::Params(p) => Some(p.size),
                        _ => None,
                    });
                Ok(Some(CollectionState {
                    points_count: result.points_count.unwrap_or(0),
                    dimensions,
                }))
            }
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("not found") || msg.contains("doesn't exist") {
                    Ok(None)
                } else {
                    Err(VectorStoreError::CollectionError(msg))
                }
            }
        }
    }
}

fn payload_str(payload: &HashMap<String, qdrant_client::qdrant::Value>, key: &str) -> String {
    payload
        .get(key)
        .and_then(|v| match &v.kind {
            Some(Kind::StringValue(s)) => Some(s.as_str()),
            _ => None,
        })
        .unwrap_or("")
        .to_string()
}

fn payload_u32(payload: &HashMap<String, qdrant_client::qdrant::Value>, key: &str) -> u32 {
    payload
        .get(key)
        .and_then(|v| match &v.kind {
            Some(Kind::IntegerValue(n)) => Some(*n as u32),
            _ => None,
        })
        .unwrap_or(0)
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn ensure_collection(&self, dimensions: usize) -> Result<(), VectorStoreError> {
        if let Some(state) = self.collection_state().await? {
            let existing = state.dimensions.ok_or_else(|| {
                VectorStoreError::CollectionError(format!(
                    "collection '{}' has unreadable vector config",
                    self.collection
                ))
            })?;
            if existing as usize != dimensions {
                return Err(VectorStoreError::DimensionMismatch {
                    collection: self.collection.clone(),
                    existing: existing as usize,
                    requested: dimensions,
                });
            }
            return Ok(());
        }

        info!(collection = %self.collection, dimensions, "creating collection");

        let create_collection = CreateCollectionBuilder::new(&self.collection).vectors_config(
            VectorParamsBuilder::new(dimensions as u64, Distance::Cosine),
        );

        self.client
            .create_collection(create_collection)
            .await
            .map_err(|e| VectorStoreError::CollectionError(e.to_string()))?;

        Ok(())
    }

    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), VectorStoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = records
            .into_iter()
            .map(|record| {
                let mut payload: HashMap<String, qdrant_client::qdrant::Value> = HashMap::new();
                payload.insert("content".to_string(), record.content.into());
                payload.insert(
                    "document_id".to_string(),
                    record.metadata.document_id.into(),
                );
                payload.insert(
                    "chunk_index".to_string(),
                    i64::from(record.metadata.chunk_index).into(),
                );
                payload.insert(
                    "total_chunks".to_string(),
                    i64::from(record.metadata.total_chunks).into(),
                );
                payload.insert("source".to_string(), record.metadata.source.into());
                payload.insert("created_at".to_string(), record.metadata.created_at.into());

                PointStruct::new(record.id, record.vector, payload)
            })
            .collect();

        debug!(points = points.len(), collection = %self.collection, "upserting batch");

        // A single upsert call: the whole document batch becomes visible
        // together or the call fails with nothing written
        let upsert = UpsertPointsBuilder::new(&self.collection, points);

        self.client
            .upsert_points(upsert)
            .await
            .map_err(|e| VectorStoreError::UpsertError(e.to_string()))?;

        Ok(())
    }

    async fn search(
        &self,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchHit>, VectorStoreError> {
        let search = SearchPointsBuilder::new(
            &self.collection,
            query_vector.to_vec(),
            top_k as u64,
        )
        .with_payload(true);

        let results = self
            .client
            .search_points(search)
            .await
            .map_err(|e| VectorStoreError::SearchError(e.to_string()))?;

        let hits = results
            .result
            .into_iter()
            .map(|point| {
                let payload = point.payload;
                SearchHit {
                    content: payload_str(&payload, "content"),
                    score: point.score,
                    metadata: RecordMetadata {
                        document_id: payload_str(&payload, "document_id"),
                        chunk_index: payload_u32(&payload, "chunk_index"),
                        total_chunks: payload_u32(&payload, "total_chunks"),
                        source: payload_str(&payload, "source"),
                        created_at: payload_str(&payload, "created_at"),
                    },
                }
            })
            .collect();

        Ok(hits)
    }

    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        self.client
            .health_check()
            .await
            .map(|_| true)
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))
    }

    async fn stats(&self) -> Result<CollectionStats, VectorStoreError> {
        let points_count = self
            .collection_state()
            .await?
            .map_or(0, |state| state.points_count);

        Ok(CollectionStats {
            collection: self.collection.clone(),
            points_count,
        })
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}

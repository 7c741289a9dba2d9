//! Vector store abstraction layer.
//!
//! A trait-based abstraction over similarity-index backends. The
//! production backend is Qdrant; an in-memory backend backs tests and
//! local development. All records in a collection share one
//! dimensionality, fixed when the collection is created.

mod memory;
mod qdrant;

pub use memory::InMemoryStore;
pub use qdrant::QdrantStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::VectorStoreError;
use crate::models::VectorStoreConfig;

/// The persisted unit in the similarity index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub vector: Vec<f32>,
    /// The source chunk text, stored alongside the vector so retrieval
    /// returns usable context without a second lookup.
    pub content: String,
    pub metadata: RecordMetadata,
}

/// Metadata carried by every record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub document_id: String,
    pub chunk_index: u32,
    pub total_chunks: u32,
    pub source: String,
    pub created_at: String,
}

/// One k-NN search hit: chunk text plus similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub content: String,
    pub score: f32,
    pub metadata: RecordMetadata,
}

/// Observability snapshot of a collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionStats {
    pub collection: String,
    pub points_count: u64,
}

/// Abstract trait for similarity-index backends.
///
/// Backends must be safe under concurrent upserts and searches from
/// independent callers; the pipelines perform no client-side locking.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the collection with cosine scoring if absent; no-op if it
    /// exists with the same dimensionality. An existing collection with
    /// a different dimensionality fails with
    /// [`VectorStoreError::DimensionMismatch`].
    async fn ensure_collection(&self, dimensions: usize) -> Result<(), VectorStoreError>;

    /// Insert or update a batch of records. Either the whole batch
    /// becomes queryable or none of it does.
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), VectorStoreError>;

    /// Return the `top_k` nearest records by similarity, descending.
    /// Fewer than `top_k` when the collection is smaller. A query vector
    /// whose length differs from the collection's dimensionality fails
    /// with [`VectorStoreError::DimensionMismatch`].
    async fn search(
        &self,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchHit>, VectorStoreError>;

    /// Check reachability without mutating state.
    async fn health_check(&self) -> Result<bool, VectorStoreError>;

    /// Record count and collection identity for observability.
    async fn stats(&self) -> Result<CollectionStats, VectorStoreError>;

    /// The collection name this store operates on.
    fn collection(&self) -> &str;
}

/// Create the production backend from configuration.
pub fn create_backend(
    config: &VectorStoreConfig,
) -> Result<Box<dyn VectorStore>, VectorStoreError> {
    Ok(Box::new(QdrantStore::new(config)?))
}

//! In-memory vector store using cosine similarity.
//!
//! Backs the test suite and local development. Collections live in a
//! `HashMap` behind a `tokio::sync::RwLock`, so concurrent upserts and
//! searches from independent tasks are safe.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CollectionStats, SearchHit, VectorRecord, VectorStore};
use crate::error::VectorStoreError;

#[derive(Default)]
struct CollectionData {
    dimensions: usize,
    records: HashMap<String, VectorRecord>,
}

/// A process-local store with the same contract as the Qdrant backend.
pub struct InMemoryStore {
    collection: String,
    data: RwLock<Option<CollectionData>>,
}

impl InMemoryStore {
    pub fn new(collection: &str) -> Self {
        Self {
            collection: collection.to_string(),
            data: RwLock::new(None),
        }
    }
}

/// Cosine similarity; 0.0 when either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn ensure_collection(&self, dimensions: usize) -> Result<(), VectorStoreError> {
        let mut data = self.data.write().await;
        match data.as_ref() {
            Some(existing) if existing.dimensions != dimensions => {
                Err(VectorStoreError::DimensionMismatch {
                    collection: self.collection.clone(),
                    existing: existing.dimensions,
                    requested: dimensions,
                })
            }
            Some(_) => Ok(()),
            None => {
                *data = Some(CollectionData {
                    dimensions,
                    records: HashMap::new(),
                });
                Ok(())
            }
        }
    }

    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), VectorStoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let mut data = self.data.write().await;
        let collection = data.as_mut().ok_or_else(|| {
            VectorStoreError::UpsertError(format!(
                "collection '{}' does not exist",
                self.collection
            ))
        })?;

        // Validate the whole batch before touching the map so a bad
        // batch is rejected atomically
        for record in &records {
            if record.vector.len() != collection.dimensions {
                return Err(VectorStoreError::DimensionMismatch {
                    collection: self.collection.clone(),
                    existing: collection.dimensions,
                    requested: record.vector.len(),
                });
            }
        }

        for record in records {
            collection.records.insert(record.id.clone(), record);
        }

        Ok(())
    }

    async fn search(
        &self,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchHit>, VectorStoreError> {
        let data = self.data.read().await;
        let collection = match data.as_ref() {
            Some(c) => c,
            None => return Ok(Vec::new()),
        };

        if query_vector.len() != collection.dimensions {
            return Err(VectorStoreError::DimensionMismatch {
                collection: self.collection.clone(),
                existing: collection.dimensions,
                requested: query_vector.len(),
            });
        }

        let mut hits: Vec<SearchHit> = collection
            .records
            .values()
            .map(|record| SearchHit {
                content: record.content.clone(),
                score: cosine_similarity(&record.vector, query_vector),
                metadata: record.metadata.clone(),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        Ok(true)
    }

    async fn stats(&self) -> Result<CollectionStats, VectorStoreError> {
        let data = self.data.read().await;
        Ok(CollectionStats {
            collection: self.collection.clone(),
            points_count: data.as_ref().map_or(0, |c| c.records.len() as u64),
        })
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}

#[cfg(test)]
mod tests {
    use super::super::RecordMetadata;
    use super::*;

    fn record(id: &str, vector: Vec<f32>, content: &str) -> VectorRecord {
        VectorRecord {
            id: id.to_string(),
            vector,
            content: content.to_string(),
            metadata: RecordMetadata {
                document_id: "doc".to_string(),
                chunk_index: 0,
                total_chunks: 1,
                source: "test.txt".to_string(),
                created_at: String::new(),
            },
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn test_ensure_collection_idempotent() {
        let store = InMemoryStore::new("docs");
        store.ensure_collection(3).await.unwrap();
        store.ensure_collection(3).await.unwrap();

        let err = store.ensure_collection(4).await.unwrap_err();
        assert!(matches!(err, VectorStoreError::DimensionMismatch { .. }));
    }

    #[tokio::test]
    async fn test_upsert_rejects_wrong_dimension_atomically() {
        let store = InMemoryStore::new("docs");
        store.ensure_collection(2).await.unwrap();

        let batch = vec![
            record("a", vec![1.0, 0.0], "ok"),
            record("b", vec![1.0, 0.0, 0.0], "bad"),
        ];
        let err = store.upsert(batch).await.unwrap_err();
        assert!(matches!(err, VectorStoreError::DimensionMismatch { .. }));

        // Nothing from the failed batch is visible
        assert_eq!(store.stats().await.unwrap().points_count, 0);
    }

    #[tokio::test]
    async fn test_search_rejects_wrong_query_dimension() {
        let store = InMemoryStore::new("docs");
        store.ensure_collection(2).await.unwrap();
        store
            .upsert(vec![record("a", vec![1.0, 0.0], "ok")])
            .await
            .unwrap();

        let err = store.search(&[1.0, 0.0, 0.0], 1).await.unwrap_err();
        assert!(matches!(
            err,
            VectorStoreError::DimensionMismatch {
                existing: 2,
                requested: 3,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_search_orders_by_score_and_bounds_k() {
        let store = InMemoryStore::new("docs");
        store.ensure_collection(2).await.unwrap();
        store
            .upsert(vec![
                record("a", vec![1.0, 0.0], "exact"),
                record("b", vec![0.7, 0.7], "diagonal"),
                record("c", vec![0.0, 1.0], "orthogonal"),
            ])
            .await
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].content, "exact");
        assert_eq!(hits[1].content, "diagonal");
        assert!(hits[0].score >= hits[1].score);

        // k larger than the collection returns everything, never pads
        let hits = store.search(&[1.0, 0.0], 10).await.unwrap();
        assert_eq!(hits.len(), 3);
    }
}

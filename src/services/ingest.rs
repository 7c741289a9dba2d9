//! Document ingestion: extract → chunk → embed → upsert.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::chunker::TextChunker;
use super::extract::extract_text;
use super::vector_store::{RecordMetadata, VectorRecord, VectorStore};
use crate::error::IngestError;
use crate::models::{Document, DocumentChunk};
use crate::providers::EmbeddingProvider;

/// Outcome of one ingestion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReceipt {
    pub document_id: String,
    pub chunk_count: usize,
    pub filename: String,
}

/// End-to-end document-to-index flow.
///
/// Stateless across calls; concurrent ingestions share only the vector
/// store collection and the provider connection handles. Any failure
/// before the final upsert leaves the index unchanged.
pub struct IngestionPipeline {
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

impl IngestionPipeline {
    pub fn new(
        chunker: TextChunker,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            chunker,
            embedder,
            store,
        }
    }

    /// Ingest one document.
    ///
    /// Re-ingesting identical bytes is not deduplicated: every call
    /// mints a fresh document id and writes a disjoint set of records.
    pub async fn ingest(
        &self,
        bytes: &[u8],
        filename: &str,
        media_type: &str,
    ) -> Result<IngestReceipt, IngestError> {
        let text = extract_text(bytes, filename, media_type)?;

        let chunks = self.chunker.chunk(&text);
        if chunks.is_empty() {
            return Err(crate::error::ExtractError::EmptyDocument.into());
        }

        let document = Document::new(filename, media_type, bytes.len() as u64);

        // The collection is bound to the embedding provider's
        // dimensionality; a mismatch fails here, before any embedding cost
        self.store
            .ensure_collection(self.embedder.dimensions())
            .await?;

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let records: Vec<VectorRecord> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, vector)| VectorRecord {
                id: DocumentChunk::record_id(&document.id, chunk.chunk_index),
                vector,
                content: chunk.content.clone(),
                metadata: RecordMetadata {
                    document_id: document.id.clone(),
                    chunk_index: chunk.chunk_index,
                    total_chunks: chunk.total_chunks,
                    source: document.filename.clone(),
                    created_at: document.created_at.clone(),
                },
            })
            .collect();

        let chunk_count = records.len();
        self.store.upsert(records).await?;

        info!(
            document_id = %document.id,
            filename,
            chunk_count,
            "ingested document"
        );

        Ok(IngestReceipt {
            document_id: document.id,
            chunk_count,
            filename: document.filename,
        })
    }
}

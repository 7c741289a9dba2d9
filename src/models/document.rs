use serde::{Deserialize, Serialize};

/// An uploaded document at the moment of ingestion.
///
/// Documents are not retained after text extraction; only the derived
/// chunks persist, carrying the document id in their metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Fresh identifier minted per ingestion call. Re-ingesting the same
    /// bytes mints a new one; there is no deduplication.
    pub id: String,
    pub filename: String,
    pub media_type: String,
    pub size_bytes: u64,
    pub created_at: String,
}

impl Document {
    pub fn new(filename: &str, media_type: &str, size_bytes: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            filename: filename.to_string(),
            media_type: media_type.to_string(),
            size_bytes,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// A contiguous span of a document's extracted text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub content: String,
    /// Zero-based position within the document.
    pub chunk_index: u32,
    pub total_chunks: u32,
    /// Character offset of the chunk start in the extracted text.
    pub start_offset: u64,
    /// Character offset one past the chunk end.
    pub end_offset: u64,
}

impl DocumentChunk {
    /// Deterministic record identifier for a chunk of a given document.
    pub fn record_id(document_id: &str, chunk_index: u32) -> String {
        let name = format!("{}:{}", document_id, chunk_index);
        uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_ids_are_unique() {
        let a = Document::new("faq.md", "text/markdown", 120);
        let b = Document::new("faq.md", "text/markdown", 120);
        assert_ne!(a.id, b.id);
        assert_eq!(a.filename, "faq.md");
    }

    #[test]
    fn test_record_id_deterministic() {
        let id = DocumentChunk::record_id("abc123", 5);
        assert_eq!(id.len(), 36);
        assert_eq!(id.chars().filter(|c| *c == '-').count(), 4);
        assert_eq!(id, DocumentChunk::record_id("abc123", 5));
        assert_ne!(id, DocumentChunk::record_id("abc123", 6));
    }
}

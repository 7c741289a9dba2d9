//! Data models shared across the pipeline.

mod answer;
mod config;
mod document;

pub use answer::{GenerationResult, OutputFormat, QuerySession, RetrievedContext};
pub use config::{
    Config, DEFAULT_COLLECTION, DEFAULT_QDRANT_URL, ProviderConfig, RagConfig, VectorStoreConfig,
};
pub use document::{Document, DocumentChunk};

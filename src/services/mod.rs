//! Pipeline services: extraction, chunking, storage, ingestion, query,
//! token accounting, and the retraining collaborator.

mod chunker;
mod extract;
mod ingest;
mod query;
mod retrain;
mod tokens;
pub mod vector_store;

pub use chunker::TextChunker;
pub use extract::extract_text;
pub use ingest::{IngestReceipt, IngestionPipeline};
pub use query::QueryPipeline;
pub use retrain::{
    FeedbackSample, FeedbackSource, RetrainManager, RetrainOutcome, TrainingJobService,
};
pub use tokens::TokenAccountant;
pub use vector_store::{
    CollectionStats, InMemoryStore, QdrantStore, RecordMetadata, SearchHit, VectorRecord,
    VectorStore, create_backend,
};

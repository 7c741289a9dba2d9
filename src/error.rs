//! Error types for the RAG pipeline.

use thiserror::Error;

use crate::utils::retry::Retryable;

/// Errors related to configuration and provider resolution.
///
/// These are fatal at startup: a pipeline is never constructed from a
/// misconfigured provider, so no request ever observes them.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown embedding provider: {0}")]
    UnknownEmbeddingProvider(String),

    #[error("unknown generation provider: {0}")]
    UnknownGenerationProvider(String),

    #[error("{provider} requires {variable} to be set")]
    MissingCredential {
        provider: &'static str,
        variable: &'static str,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Errors related to text extraction from uploaded bytes.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("document contains no extractable text")]
    EmptyDocument,

    #[error("PDF extraction failed: {0}")]
    Pdf(String),
}

/// Errors from embedding and generation providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} authentication failed: {message}")]
    Auth { provider: String, message: String },

    #[error("{provider} rate limited: {message}")]
    RateLimited { provider: String, message: String },

    #[error("{provider} unavailable: {message}")]
    Unavailable { provider: String, message: String },

    #[error("invalid response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },

    #[error("provider request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("provider request timed out")]
    Timeout,
}

impl Retryable for ProviderError {
    fn is_retryable(&self) -> bool {
        match self {
            // Quota and availability failures are transient
            ProviderError::RateLimited { .. }
            | ProviderError::Unavailable { .. }
            | ProviderError::Timeout => true,
            ProviderError::RequestError(e) => e.is_timeout() || e.is_connect(),
            // Bad credentials and malformed responses are not
            ProviderError::Auth { .. } | ProviderError::InvalidResponse { .. } => false,
        }
    }
}

/// Errors related to vector store operations.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("failed to connect to vector store: {0}")]
    ConnectionError(String),

    #[error(
        "collection '{collection}' has dimensionality {existing}, embedding provider produces {requested}"
    )]
    DimensionMismatch {
        collection: String,
        existing: usize,
        requested: usize,
    },

    #[error("collection error: {0}")]
    CollectionError(String),

    #[error("upsert error: {0}")]
    UpsertError(String),

    #[error("search error: {0}")]
    SearchError(String),
}

impl Retryable for VectorStoreError {
    fn is_retryable(&self) -> bool {
        match self {
            VectorStoreError::ConnectionError(_) => true,
            // A dimension mismatch is a configuration problem, never transient
            VectorStoreError::DimensionMismatch { .. } => false,
            VectorStoreError::CollectionError(msg)
            | VectorStoreError::UpsertError(msg)
            | VectorStoreError::SearchError(msg) => {
                let msg_lower = msg.to_lowercase();
                msg_lower.contains("timeout")
                    || msg_lower.contains("connection")
                    || msg_lower.contains("unavailable")
                    || msg_lower.contains("too many")
            }
        }
    }
}

/// Errors surfaced by the ingestion pipeline, per request.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("embedding error: {0}")]
    Provider(#[from] ProviderError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),
}

impl Retryable for IngestError {
    fn is_retryable(&self) -> bool {
        match self {
            // Nothing is written before the final upsert, so the caller may
            // re-run the whole ingestion after a transient failure
            IngestError::Provider(e) => e.is_retryable(),
            IngestError::VectorStore(e) => e.is_retryable(),
            IngestError::Extract(_) => false,
        }
    }
}

/// Errors surfaced by the query pipeline, per request.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),
}

impl Retryable for QueryError {
    fn is_retryable(&self) -> bool {
        match self {
            QueryError::Provider(e) => e.is_retryable(),
            QueryError::VectorStore(e) => e.is_retryable(),
            QueryError::InvalidQuery(_) => false,
        }
    }
}

/// Errors from the retraining workflow.
///
/// An insufficient sample count is not an error; it is reported as a
/// skipped [`RetrainOutcome`](crate::services::RetrainOutcome).
#[derive(Debug, Error)]
pub enum RetrainError {
    #[error("feedback collection failed: {0}")]
    Feedback(String),

    #[error("dataset formatting failed: {0}")]
    Formatting(#[from] serde_json::Error),

    #[error("training job submission failed: {0}")]
    Submission(String),
}

/// Application-level errors that wrap domain errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("ingestion error: {0}")]
    Ingest(#[from] IngestError),

    #[error("query error: {0}")]
    Query(#[from] QueryError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),

    #[error("retrain error: {0}")]
    Retrain(#[from] RetrainError),

    #[error("{0}")]
    Other(String),
}

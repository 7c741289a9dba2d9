//! Provider abstraction for embedding and generation backends.
//!
//! Concrete providers are resolved once at startup by [`ProviderRegistry`]
//! from configured names. Construction validates provider names and
//! credentials immediately; nothing is resolved lazily or per request.
//! A single configured identity is authoritative for the process
//! lifetime; there is no fallback across providers.

mod local;
mod ollama;
mod openai;

pub use local::LocalEmbedding;
pub use ollama::OllamaGeneration;
pub use openai::{OpenAiEmbedding, OpenAiGeneration};

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::error::{ConfigError, ProviderError};
use crate::models::ProviderConfig;

/// A provider that turns text into fixed-length embedding vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;

    /// Embed a batch of texts.
    ///
    /// The default implementation embeds sequentially; backends with
    /// native batch endpoints override it.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, ProviderError> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Dimensionality of every vector this provider produces. Fixed for
    /// the life of the provider; the vector store collection is created
    /// with this value.
    fn dimensions(&self) -> usize;

    /// Maximum input length in tokens the backing model accepts.
    fn context_length(&self) -> usize;

    /// Human-readable provider name for logs and errors.
    fn name(&self) -> &str;
}

/// A provider that completes a prompt into answer text.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, ProviderError>;

    /// Identifying name of the underlying model, reported in results.
    fn model_name(&self) -> &str;
}

/// The closed set of supported embedding providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProviderKind {
    OpenAi,
    Local,
}

impl FromStr for EmbeddingProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(EmbeddingProviderKind::OpenAi),
            "local" => Ok(EmbeddingProviderKind::Local),
            other => Err(ConfigError::UnknownEmbeddingProvider(other.to_string())),
        }
    }
}

/// The closed set of supported generation providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationProviderKind {
    OpenAi,
    Groq,
    Ollama,
}

impl FromStr for GenerationProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(GenerationProviderKind::OpenAi),
            "groq" => Ok(GenerationProviderKind::Groq),
            "ollama" => Ok(GenerationProviderKind::Ollama),
            other => Err(ConfigError::UnknownGenerationProvider(other.to_string())),
        }
    }
}

/// Resolved embedding and generation handles for one process lifetime.
///
/// Ingestion and query share the same registry instance, which is what
/// guarantees queries are embedded by the same provider that produced
/// the indexed vectors.
#[derive(Clone)]
pub struct ProviderRegistry {
    embedding: Arc<dyn EmbeddingProvider>,
    generation: Arc<dyn GenerationProvider>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("embedding", &self.embedding.name())
            .field("generation", &self.generation.model_name())
            .finish()
    }
}

impl ProviderRegistry {
    /// Resolve the configured providers, failing fast on an unknown name
    /// or a missing credential.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ConfigError> {
        let embedding_kind: EmbeddingProviderKind = config.embedding.parse()?;
        let generation_kind: GenerationProviderKind = config.generation.parse()?;

        let embedding: Arc<dyn EmbeddingProvider> = match embedding_kind {
            EmbeddingProviderKind::OpenAi => {
                let api_key = require_credential(&config.openai_api_key, "openai")?;
                Arc::new(OpenAiEmbedding::new(
                    api_key,
                    &config.embedding_model,
                    config.timeout_secs,
                )?)
            }
            EmbeddingProviderKind::Local => Arc::new(LocalEmbedding::new(
                &config.local_embedding_url,
                config.local_embedding_dimensions,
                config.batch_size as usize,
                config.timeout_secs,
            )?),
        };

        let generation: Arc<dyn GenerationProvider> = match generation_kind {
            GenerationProviderKind::OpenAi => {
                let api_key = require_credential(&config.openai_api_key, "openai")?;
                Arc::new(OpenAiGeneration::openai(
                    api_key,
                    &config.generation_model,
                    config.timeout_secs,
                )?)
            }
            GenerationProviderKind::Groq => {
                let api_key = require_credential(&config.groq_api_key, "groq")?;
                Arc::new(OpenAiGeneration::groq(
                    api_key,
                    &config.generation_model,
                    config.timeout_secs,
                )?)
            }
            GenerationProviderKind::Ollama => Arc::new(OllamaGeneration::new(
                &config.ollama_url,
                &config.generation_model,
                config.timeout_secs,
            )?),
        };

        info!(
            embedding = embedding.name(),
            dimensions = embedding.dimensions(),
            generation = generation.model_name(),
            "resolved providers"
        );

        Ok(Self {
            embedding,
            generation,
        })
    }

    /// Build a registry from already-constructed providers. Used by tests
    /// and embedders of the library that bring their own backends.
    pub fn from_parts(
        embedding: Arc<dyn EmbeddingProvider>,
        generation: Arc<dyn GenerationProvider>,
    ) -> Self {
        Self {
            embedding,
            generation,
        }
    }

    pub fn embedding(&self) -> Arc<dyn EmbeddingProvider> {
        Arc::clone(&self.embedding)
    }

    pub fn generation(&self) -> Arc<dyn GenerationProvider> {
        Arc::clone(&self.generation)
    }
}

fn require_credential(
    key: &Option<String>,
    provider: &'static str,
) -> Result<String, ConfigError> {
    let variable = match provider {
        "groq" => "GROQ_API_KEY",
        _ => "OPENAI_API_KEY",
    };
    match key {
        Some(k) if !k.is_empty() => Ok(k.clone()),
        _ => Err(ConfigError::MissingCredential { provider, variable }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProviderConfig;

    #[test]
    fn test_unknown_embedding_provider_fails_construction() {
        let config = ProviderConfig {
            embedding: "word2vec".to_string(),
            ..Default::default()
        };
        let err = ProviderRegistry::from_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownEmbeddingProvider(ref p) if p == "word2vec"));
    }

    #[test]
    fn test_unknown_generation_provider_fails_construction() {
        let config = ProviderConfig {
            embedding: "local".to_string(),
            generation: "markov".to_string(),
            ..Default::default()
        };
        let err = ProviderRegistry::from_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownGenerationProvider(ref p) if p == "markov"));
    }

    #[test]
    fn test_missing_openai_credential_fails_construction() {
        let config = ProviderConfig {
            embedding: "openai".to_string(),
            generation: "openai".to_string(),
            openai_api_key: None,
            ..Default::default()
        };
        let err = ProviderRegistry::from_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential { .. }));
    }

    #[test]
    fn test_local_ollama_needs_no_credentials() {
        let config = ProviderConfig {
            embedding: "local".to_string(),
            generation: "ollama".to_string(),
            ..Default::default()
        };
        let registry = ProviderRegistry::from_config(&config).unwrap();
        assert_eq!(registry.embedding().dimensions(), 384);
    }

    #[test]
    fn test_kind_parsing_is_case_insensitive() {
        assert_eq!(
            "OpenAI".parse::<EmbeddingProviderKind>().unwrap(),
            EmbeddingProviderKind::OpenAi
        );
        assert_eq!(
            "GROQ".parse::<GenerationProviderKind>().unwrap(),
            GenerationProviderKind::Groq
        );
    }
}

use serde::{Deserialize, Serialize};

use super::answer::OutputFormat;

pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6333";
pub const DEFAULT_COLLECTION: &str = "support_docs";
pub const DEFAULT_LOCAL_EMBEDDING_URL: &str = "http://localhost:11411";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub providers: ProviderConfig,

    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    #[serde(default)]
    pub rag: RagConfig,
}

impl Config {
    pub fn config_path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|p| p.join("ragpipe").join("config.toml"))
    }

    /// Load configuration from disk, then apply environment overrides
    /// for credentials. Missing file means defaults.
    pub fn load() -> Result<Self, crate::error::ConfigError> {
        let mut config = if let Some(path) = Self::config_path()
            && path.exists()
        {
            let content = std::fs::read_to_string(&path)?;
            toml::from_str::<Config>(&content)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn save(&self) -> Result<(), crate::error::ConfigError> {
        let path = Self::config_path().ok_or_else(|| {
            crate::error::ConfigError::PathError("could not determine config directory".to_string())
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Credentials are never required to live in the config file.
    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY")
            && !key.is_empty()
        {
            self.providers.openai_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("GROQ_API_KEY")
            && !key.is_empty()
        {
            self.providers.groq_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("QDRANT_API_KEY")
            && !key.is_empty()
        {
            self.vector_store.api_key = Some(key);
        }
    }
}

/// Provider selection and credentials.
///
/// `embedding` and `generation` are provider names resolved by the
/// registry at startup; an unrecognized name fails construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_embedding_provider")]
    pub embedding: String,

    #[serde(default = "default_generation_provider")]
    pub generation: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_generation_model")]
    pub generation_model: String,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub openai_api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub groq_api_key: Option<String>,

    #[serde(default = "default_local_embedding_url")]
    pub local_embedding_url: String,

    #[serde(default = "default_local_embedding_dimensions")]
    pub local_embedding_dimensions: usize,

    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
}

fn default_embedding_provider() -> String {
    "openai".to_string()
}

fn default_generation_provider() -> String {
    "openai".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_generation_model() -> String {
    "gpt-4".to_string()
}

fn default_local_embedding_url() -> String {
    DEFAULT_LOCAL_EMBEDDING_URL.to_string()
}

fn default_local_embedding_dimensions() -> usize {
    384
}

fn default_ollama_url() -> String {
    DEFAULT_OLLAMA_URL.to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_batch_size() -> u32 {
    16
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            embedding: default_embedding_provider(),
            generation: default_generation_provider(),
            embedding_model: default_embedding_model(),
            generation_model: default_generation_model(),
            openai_api_key: None,
            groq_api_key: None,
            local_embedding_url: default_local_embedding_url(),
            local_embedding_dimensions: default_local_embedding_dimensions(),
            ollama_url: default_ollama_url(),
            timeout_secs: default_timeout(),
            batch_size: default_batch_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    #[serde(default = "default_qdrant_url")]
    pub url: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub api_key: Option<String>,
}

fn default_qdrant_url() -> String {
    DEFAULT_QDRANT_URL.to_string()
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            url: default_qdrant_url(),
            collection: default_collection(),
            api_key: None,
        }
    }
}

/// Chunking, retrieval, and generation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    /// Maximum chunk length in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u32,

    /// Overlap between consecutive chunks in characters.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: u32,

    /// Default number of chunks retrieved per query.
    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// Sampling temperature passed to the generation provider.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum output length passed to the generation provider.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default)]
    pub default_format: OutputFormat,
}

fn default_chunk_size() -> u32 {
    1000
}

fn default_chunk_overlap() -> u32 {
    200
}

fn default_top_k() -> u32 {
    5
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    500
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            default_format: OutputFormat::Text,
        }
    }
}

impl RagConfig {
    /// Overlap must be strictly smaller than chunk size or the sliding
    /// window would never advance.
    pub fn validate(&self) -> Result<(), crate::error::ConfigError> {
        if self.chunk_size == 0 {
            return Err(crate::error::ConfigError::ValidationError(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(crate::error::ConfigError::ValidationError(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.vector_store.url, DEFAULT_QDRANT_URL);
        assert_eq!(config.vector_store.collection, DEFAULT_COLLECTION);
        assert_eq!(config.providers.embedding, "openai");
        assert_eq!(config.rag.chunk_size, 1000);
        assert_eq!(config.rag.chunk_overlap, 200);
        assert_eq!(config.rag.top_k, 5);
    }

    #[test]
    fn test_rag_config_validate() {
        let config = RagConfig::default();
        assert!(config.validate().is_ok());

        let bad = RagConfig {
            chunk_size: 100,
            chunk_overlap: 100,
            ..Default::default()
        };
        assert!(bad.validate().is_err());

        let zero = RagConfig {
            chunk_size: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_config_parses_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [providers]
            embedding = "local"
            generation = "ollama"

            [rag]
            chunk_size = 500
            "#,
        )
        .unwrap();
        assert_eq!(config.providers.embedding, "local");
        assert_eq!(config.providers.generation, "ollama");
        assert_eq!(config.rag.chunk_size, 500);
        assert_eq!(config.rag.chunk_overlap, 200);
    }
}

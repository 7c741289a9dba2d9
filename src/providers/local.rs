//! Client for a self-hosted embedding server.
//!
//! Speaks the text-embeddings-inference style protocol: `POST /embed`
//! with a batch of inputs, `GET /health` for reachability. Requires no
//! credentials; the server is assumed to sit on a trusted network.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::EmbeddingProvider;
use crate::error::ProviderError;

/// Input limit of the common sentence-transformer models, in tokens.
const LOCAL_CONTEXT_LENGTH: usize = 512;

#[derive(Debug, Serialize)]
struct EmbedRequest {
    inputs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    truncate: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse(Vec<Vec<f32>>);

/// Embeddings from a local HTTP embedding server.
#[derive(Debug, Clone)]
pub struct LocalEmbedding {
    client: Client,
    base_url: String,
    dimensions: usize,
    batch_size: usize,
}

impl LocalEmbedding {
    pub fn new(
        url: &str,
        dimensions: usize,
        batch_size: usize,
        timeout_secs: u64,
    ) -> Result<Self, crate::error::ConfigError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| crate::error::ConfigError::ValidationError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
            dimensions,
            batch_size: batch_size.max(1),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn embed_single_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, ProviderError> {
        let request = EmbedRequest {
            inputs: texts,
            truncate: Some(true),
        };

        let response = self
            .client
            .post(format!("{}/embed", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Unavailable {
                provider: "local".to_string(),
                message: format!("status {}: {}", status, body),
            });
        }

        let embed_response: EmbedResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::InvalidResponse {
                    provider: "local".to_string(),
                    message: e.to_string(),
                })?;

        Ok(embed_response.0)
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let embeddings = self.embed_batch(&[text]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse {
                provider: "local".to_string(),
                message: "empty embedding response".to_string(),
            })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(batch_size = texts.len(), "embedding via local server");

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            let batch: Vec<String> = chunk.iter().map(|t| (*t).to_string()).collect();
            let embeddings = self.embed_single_batch(batch).await?;
            all_embeddings.extend(embeddings);
        }

        if all_embeddings.len() != texts.len() {
            return Err(ProviderError::InvalidResponse {
                provider: "local".to_string(),
                message: format!(
                    "requested {} embeddings, received {}",
                    texts.len(),
                    all_embeddings.len()
                ),
            });
        }

        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn context_length(&self) -> usize {
        LOCAL_CONTEXT_LENGTH
    }

    fn name(&self) -> &str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trimming() {
        let provider = LocalEmbedding::new("http://localhost:11411/", 384, 8, 30).unwrap();
        assert_eq!(provider.base_url(), "http://localhost:11411");
        assert_eq!(provider.dimensions(), 384);
    }

    #[test]
    fn test_batch_size_floor() {
        let provider = LocalEmbedding::new("http://localhost:11411", 384, 0, 30).unwrap();
        assert_eq!(provider.batch_size, 1);
    }
}

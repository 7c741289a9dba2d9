//! OpenAI-protocol providers: embeddings and chat completions.
//!
//! Groq speaks the same chat-completions wire protocol, so the
//! generation client is shared and only the base URL, credential, and
//! default model differ.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{EmbeddingProvider, GenerationProvider};
use crate::error::ProviderError;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Dimensionality of `text-embedding-3-small` and `text-embedding-ada-002`.
const SMALL_EMBEDDING_DIMENSIONS: usize = 1536;
/// Dimensionality of `text-embedding-3-large`.
const LARGE_EMBEDDING_DIMENSIONS: usize = 3072;
/// Input limit of the OpenAI embedding models, in tokens.
const EMBEDDING_CONTEXT_LENGTH: usize = 8192;

/// Embeddings via `POST /v1/embeddings`.
pub struct OpenAiEmbedding {
    client: Client,
    api_key: String,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbedding {
    pub fn new(
        api_key: String,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, crate::error::ConfigError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| crate::error::ConfigError::ValidationError(e.to_string()))?;

        let dimensions = match model {
            "text-embedding-3-large" => LARGE_EMBEDDING_DIMENSIONS,
            _ => SMALL_EMBEDDING_DIMENSIONS,
        };

        Ok(Self {
            client,
            api_key,
            model: model.to_string(),
            dimensions,
        })
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Map an HTTP error status to the provider failure taxonomy, pulling
/// the human-readable message out of the API error body when present.
async fn classify_error_response(
    provider: &str,
    response: reqwest::Response,
) -> ProviderError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorResponse>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    let message = format!("status {}: {}", status, message);

    match status.as_u16() {
        401 | 403 => ProviderError::Auth {
            provider: provider.to_string(),
            message,
        },
        429 => ProviderError::RateLimited {
            provider: provider.to_string(),
            message,
        },
        _ => ProviderError::Unavailable {
            provider: provider.to_string(),
            message,
        },
    }
}

fn classify_request_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::RequestError(e)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let results = self.embed_batch(&[text]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse {
                provider: "openai".to_string(),
                message: "empty embedding response".to_string(),
            })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            batch_size = texts.len(),
            model = %self.model,
            "requesting embeddings"
        );

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts.to_vec(),
        };

        let response = self
            .client
            .post(format!("{}/embeddings", OPENAI_BASE_URL))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(classify_request_error)?;

        if !response.status().is_success() {
            let err = classify_error_response("openai", response).await;
            error!(error = %err, "embedding request failed");
            return Err(err);
        }

        let embedding_response: EmbeddingResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::InvalidResponse {
                    provider: "openai".to_string(),
                    message: e.to_string(),
                })?;

        let embeddings: Vec<Vec<f32>> = embedding_response
            .data
            .into_iter()
            .map(|d| d.embedding)
            .collect();

        if embeddings.len() != texts.len() {
            return Err(ProviderError::InvalidResponse {
                provider: "openai".to_string(),
                message: format!(
                    "requested {} embeddings, received {}",
                    texts.len(),
                    embeddings.len()
                ),
            });
        }

        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn context_length(&self) -> usize {
        EMBEDDING_CONTEXT_LENGTH
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// Chat-completion generation over the OpenAI wire protocol.
pub struct OpenAiGeneration {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    provider_name: &'static str,
}

impl OpenAiGeneration {
    pub fn openai(
        api_key: String,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, crate::error::ConfigError> {
        Self::with_base_url(OPENAI_BASE_URL, api_key, model, timeout_secs, "openai")
    }

    pub fn groq(
        api_key: String,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, crate::error::ConfigError> {
        Self::with_base_url(GROQ_BASE_URL, api_key, model, timeout_secs, "groq")
    }

    fn with_base_url(
        base_url: &str,
        api_key: String,
        model: &str,
        timeout_secs: u64,
        provider_name: &'static str,
    ) -> Result<Self, crate::error::ConfigError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| crate::error::ConfigError::ValidationError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
            provider_name,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[async_trait]
impl GenerationProvider for OpenAiGeneration {
    async fn generate(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, ProviderError> {
        debug!(
            provider = self.provider_name,
            model = %self.model,
            prompt_len = prompt.len(),
            "requesting completion"
        );

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature,
            max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(classify_request_error)?;

        if !response.status().is_success() {
            let err = classify_error_response(self.provider_name, response).await;
            error!(error = %err, "completion request failed");
            return Err(err);
        }

        let chat_response: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::InvalidResponse {
                    provider: self.provider_name.to_string(),
                    message: e.to_string(),
                })?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::InvalidResponse {
                provider: self.provider_name.to_string(),
                message: "response contained no choices".to_string(),
            })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_dimensions_follow_model() {
        let small = OpenAiEmbedding::new("sk-test".into(), "text-embedding-3-small", 30).unwrap();
        assert_eq!(small.dimensions(), 1536);

        let large = OpenAiEmbedding::new("sk-test".into(), "text-embedding-3-large", 30).unwrap();
        assert_eq!(large.dimensions(), 3072);
    }

    #[test]
    fn test_groq_uses_its_own_base_url() {
        let provider = OpenAiGeneration::groq("gsk-test".into(), "llama-3.1-70b", 30).unwrap();
        assert_eq!(provider.base_url, GROQ_BASE_URL);
        assert_eq!(provider.model_name(), "llama-3.1-70b");
    }
}

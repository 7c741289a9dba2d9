//! Generation via a local Ollama daemon (`POST /api/generate`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::GenerationProvider;
use crate::error::ProviderError;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Generation against a locally running Ollama instance.
#[derive(Debug, Clone)]
pub struct OllamaGeneration {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaGeneration {
    pub fn new(
        url: &str,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, crate::error::ConfigError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| crate::error::ConfigError::ValidationError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl GenerationProvider for OllamaGeneration {
    async fn generate(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, ProviderError> {
        debug!(model = %self.model, prompt_len = prompt.len(), "requesting ollama completion");

        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature,
                num_predict: max_tokens,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
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
                provider: "ollama".to_string(),
                message: format!("status {}: {}", status, body),
            });
        }

        let generate_response: GenerateResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::InvalidResponse {
                    provider: "ollama".to_string(),
                    message: e.to_string(),
                })?;

        Ok(generate_response.response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction() {
        let provider = OllamaGeneration::new("http://localhost:11434/", "llama3.1", 30).unwrap();
        assert_eq!(provider.model_name(), "llama3.1");
        assert_eq!(provider.base_url, "http://localhost:11434");
    }
}

//! Ollama-based providers for embeddings and generation
//!
//! One `OllamaClient` is shared by both providers so they reuse the same
//! connection pool.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;
use super::retry::{retry_request, RequestFailure, RETRY_BASE_DELAY};

/// Ollama API client with automatic retry
pub struct OllamaClient {
    /// HTTP client
    client: Client,
    /// Configuration
    config: LlmConfig,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.config.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Generate an embedding with retry
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.config.base_url);
        let url = url.as_str();

        let op = || async move {
            let request = EmbedRequest {
                model: &self.config.embed_model,
                prompt: text,
            };

            let response = self
                .client
                .post(url)
                .json(&request)
                .send()
                .await
                .map_err(|e| {
                    RequestFailure::transient(Error::embedding(format!(
                        "Embedding request failed: {}",
                        e
                    )))
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(RequestFailure::status(
                    status,
                    Error::embedding(format!("Embedding failed: HTTP {}", status)),
                ));
            }

            let embed_response: EmbedResponse = response.json().await.map_err(|e| {
                Error::embedding(format!("Failed to parse embedding response: {}", e))
            })?;

            if embed_response.embedding.is_empty() {
                return Err(Error::embedding("Ollama returned an empty embedding").into());
            }

            Ok::<_, RequestFailure>(embed_response.embedding)
        };

        retry_request("Ollama embedding", self.config.max_retries, RETRY_BASE_DELAY, op).await
    }

    /// Generate raw text for a prompt with retry
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.config.base_url);
        let url = url.as_str();
        let format = self.config.json_mode.then_some("json");

        tracing::info!("Generating with model: {}", self.config.generate_model);

        let op = || async move {
            let request = GenerateRequest {
                model: &self.config.generate_model,
                prompt,
                stream: false,
                format,
                options: GenerateOptions {
                    temperature: self.config.temperature,
                },
            };

            let response = self
                .client
                .post(url)
                .json(&request)
                .send()
                .await
                .map_err(|e| {
                    RequestFailure::transient(Error::generation(format!(
                        "Generation request failed: {}",
                        e
                    )))
                })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(RequestFailure::status(
                    status,
                    Error::generation(format!("Generation failed: HTTP {} - {}", status, body)),
                ));
            }

            let generate_response: GenerateResponse = response.json().await.map_err(|e| {
                Error::generation(format!("Failed to parse generation response: {}", e))
            })?;

            Ok::<_, RequestFailure>(generate_response.response)
        };

        retry_request("Ollama generation", self.config.max_retries, RETRY_BASE_DELAY, op).await
    }
}

/// Ollama embedding provider using nomic-embed-text or similar models
pub struct OllamaEmbedder {
    client: Arc<OllamaClient>,
    dimensions: usize,
}

impl OllamaEmbedder {
    /// Create from an existing OllamaClient
    pub fn from_client(client: Arc<OllamaClient>, dimensions: usize) -> Self {
        Self { client, dimensions }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed(text).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Ollama LLM provider for analysis generation
pub struct OllamaLlm {
    client: Arc<OllamaClient>,
    model: String,
}

impl OllamaLlm {
    /// Create from an existing OllamaClient
    pub fn from_client(client: Arc<OllamaClient>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl LlmProvider for OllamaLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.client.generate(prompt).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Build both Ollama providers over a single shared client
pub fn ollama_providers(config: &LlmConfig) -> Result<(OllamaEmbedder, OllamaLlm)> {
    let client = Arc::new(OllamaClient::new(config)?);
    Ok((
        OllamaEmbedder::from_client(Arc::clone(&client), config.embed_dimensions),
        OllamaLlm::from_client(client, config.generate_model.clone()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_includes_json_format() {
        let request = GenerateRequest {
            model: "llama3.2:3b",
            prompt: "hi",
            stream: false,
            format: Some("json"),
            options: GenerateOptions { temperature: 0.2 },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["format"], "json");
        assert_eq!(value["stream"], false);
    }

    #[test]
    fn test_generate_request_omits_format_when_disabled() {
        let request = GenerateRequest {
            model: "llama3.2:3b",
            prompt: "hi",
            stream: false,
            format: None,
            options: GenerateOptions { temperature: 0.2 },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("format").is_none());
    }

    #[tokio::test]
    async fn test_unreachable_server_reports_embedding_error() {
        let config = LlmConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            max_retries: 0,
            timeout_secs: 2,
            ..LlmConfig::default()
        };
        let (embedder, llm) = ollama_providers(&config).unwrap();

        assert!(matches!(embedder.embed("text").await, Err(Error::Embedding(_))));
        assert!(matches!(llm.generate("prompt").await, Err(Error::Generation(_))));
        assert!(!embedder.health_check().await.unwrap());
    }
}

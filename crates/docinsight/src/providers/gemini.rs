//! Gemini providers via the Generative Language API
//!
//! Authenticates with an API key (`x-goog-api-key`). Generation uses
//! `generateContent`; embeddings use `embedContent` and
//! `batchEmbedContents`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::GeminiConfig;
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::LlmProvider;
use super::retry::{retry_request, RequestFailure, RETRY_BASE_DELAY};

/// Maximum number of texts accepted by one `batchEmbedContents` call
const MAX_EMBED_BATCH: usize = 100;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini API client shared by the embedder and LLM providers
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
    api_key: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: String,
    content: Content<'a>,
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

impl GeminiClient {
    /// Create a new Gemini client. Requires an API key.
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config("Gemini backend requires an API key".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
            api_key,
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.config.base_url, model, method)
    }

    fn embed_request<'a>(&self, text: &'a str) -> EmbedRequest<'a> {
        EmbedRequest {
            model: format!("models/{}", self.config.embedding_model),
            content: Content {
                role: None,
                parts: vec![Part { text }],
            },
        }
    }

    /// Check the API key and model are usable
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models/{}", self.config.base_url, self.config.generation_model);
        let request = self.client.get(&url).header(API_KEY_HEADER, &self.api_key);

        match request.send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Generate raw text for a prompt with retry
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = self.endpoint(&self.config.generation_model, "generateContent");
        let url = url.as_str();

        tracing::info!("Generating with model: {}", self.config.generation_model);

        let op = || async move {
            let request = GenerateRequest {
                contents: vec![Content {
                    role: Some("user"),
                    parts: vec![Part { text: prompt }],
                }],
                generation_config: GenerationConfig {
                    temperature: self.config.temperature,
                    max_output_tokens: self.config.max_output_tokens,
                    response_mime_type: "application/json",
                },
            };

            let response = self
                .client
                .post(url)
                .header(API_KEY_HEADER, &self.api_key)
                .json(&request)
                .send()
                .await
                .map_err(|e| {
                    RequestFailure::transient(Error::generation(format!(
                        "Gemini request failed: {}",
                        e
                    )))
                })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(RequestFailure::status(
                    status,
                    Error::generation(format!("Gemini generation failed ({}): {}", status, body)),
                ));
            }

            let gen_response: GenerateResponse = response.json().await.map_err(|e| {
                Error::generation(format!("Failed to parse Gemini response: {}", e))
            })?;

            Ok::<_, RequestFailure>(candidate_text(gen_response))
        };

        retry_request("Gemini generation", self.config.max_retries, RETRY_BASE_DELAY, op).await
    }

    /// Embed a single text
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = self.endpoint(&self.config.embedding_model, "embedContent");
        let url = url.as_str();

        let op = || async move {
            let response = self
                .client
                .post(url)
                .header(API_KEY_HEADER, &self.api_key)
                .json(&self.embed_request(text))
                .send()
                .await
                .map_err(|e| {
                    RequestFailure::transient(Error::embedding(format!(
                        "Gemini embedding request failed: {}",
                        e
                    )))
                })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(RequestFailure::status(
                    status,
                    Error::embedding(format!("Gemini embedding failed ({}): {}", status, body)),
                ));
            }

            let embed_response: EmbedResponse = response.json().await.map_err(|e| {
                Error::embedding(format!("Failed to parse embedding response: {}", e))
            })?;

            Ok::<_, RequestFailure>(embed_response.embedding.values)
        };

        retry_request("Gemini embedding", self.config.max_retries, RETRY_BASE_DELAY, op).await
    }

    /// Embed up to `MAX_EMBED_BATCH` texts in one request, preserving order
    async fn embed_batch_once(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = self.endpoint(&self.config.embedding_model, "batchEmbedContents");
        let url = url.as_str();

        let op = || async move {
            let request = BatchEmbedRequest {
                requests: texts.iter().map(|t| self.embed_request(t)).collect(),
            };

            let response = self
                .client
                .post(url)
                .header(API_KEY_HEADER, &self.api_key)
                .json(&request)
                .send()
                .await
                .map_err(|e| {
                    RequestFailure::transient(Error::embedding(format!(
                        "Gemini batch embedding request failed: {}",
                        e
                    )))
                })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(RequestFailure::status(
                    status,
                    Error::embedding(format!(
                        "Gemini batch embedding failed ({}): {}",
                        status, body
                    )),
                ));
            }

            let batch: BatchEmbedResponse = response.json().await.map_err(|e| {
                Error::embedding(format!("Failed to parse batch embedding response: {}", e))
            })?;

            if batch.embeddings.len() != texts.len() {
                return Err(Error::embedding(format!(
                    "Gemini returned {} embeddings for {} texts",
                    batch.embeddings.len(),
                    texts.len()
                ))
                .into());
            }

            Ok::<_, RequestFailure>(batch.embeddings.into_iter().map(|e| e.values).collect())
        };

        retry_request("Gemini batch embedding", self.config.max_retries, RETRY_BASE_DELAY, op)
            .await
    }
}

/// Text of the first candidate's parts, concatenated. Empty when the model
/// returned no candidate (e.g. blocked by safety filters).
fn candidate_text(response: GenerateResponse) -> String {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default()
}

/// Gemini embedding provider (text-embedding-004)
pub struct GeminiEmbedder {
    client: Arc<GeminiClient>,
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_EMBED_BATCH) {
            embeddings.extend(self.client.embed_batch_once(batch).await?);
        }
        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.client.config.embed_dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Gemini LLM provider (gemini-1.5-flash)
pub struct GeminiLlm {
    client: Arc<GeminiClient>,
}

#[async_trait]
impl LlmProvider for GeminiLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.client.generate(prompt).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.client.config.generation_model
    }
}

/// Build both Gemini providers over a single shared client
pub fn gemini_providers(config: &GeminiConfig) -> Result<(GeminiEmbedder, GeminiLlm)> {
    let client = Arc::new(GeminiClient::new(config)?);
    Ok((
        GeminiEmbedder {
            client: Arc::clone(&client),
        },
        GeminiLlm { client },
    ))
}

//! LLM provider trait for text generation

use async_trait::async_trait;
use crate::error::Result;

/// Trait for prompt-in, text-out generation
///
/// Implementations:
/// - `OllamaLlm`: Local Ollama server
/// - `GeminiLlm`: Google Generative Language API (gemini-1.5-flash)
///
/// The returned text is best effort and not guaranteed to follow the
/// format the prompt asked for. Transport or service failures must be
/// reported as `Error::Generation`.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate raw text for a prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}

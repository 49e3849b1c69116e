//! Pluggable embedding and generation backends
//!
//! - `ollama`: local Ollama server
//! - `gemini`: Google Generative Language API

pub mod embedding;
pub mod gemini;
pub mod llm;
pub mod ollama;
mod retry;

pub use embedding::EmbeddingProvider;
pub use gemini::{gemini_providers, GeminiEmbedder, GeminiLlm};
pub use llm::LlmProvider;
pub use ollama::{ollama_providers, OllamaEmbedder, OllamaLlm};

use std::sync::Arc;

use crate::config::{AnalyzerConfig, BackendProvider};
use crate::error::Result;

/// Shared handles to the configured backend
pub type ProviderPair = (Arc<dyn EmbeddingProvider>, Arc<dyn LlmProvider>);

/// Build the embedding and generation providers for the configured backend
pub fn build_providers(config: &AnalyzerConfig) -> Result<ProviderPair> {
    match config.backend {
        BackendProvider::Ollama => {
            let (embedder, llm) = ollama_providers(&config.llm)?;
            tracing::info!(
                embed_model = %config.llm.embed_model,
                generate_model = %config.llm.generate_model,
                "Using Ollama backend at {}",
                config.llm.base_url
            );
            Ok((Arc::new(embedder), Arc::new(llm)))
        }
        BackendProvider::Gemini => {
            let (embedder, llm) = gemini_providers(&config.gemini)?;
            tracing::info!(
                embed_model = %config.gemini.embedding_model,
                generate_model = %config.gemini.generation_model,
                "Using Gemini backend"
            );
            Ok((Arc::new(embedder), Arc::new(llm)))
        }
    }
}

//! Configuration for the analysis service
//!
//! Configuration is loaded once at startup (optional TOML file plus a few
//! environment overrides), validated, and then passed by reference into
//! every component that needs it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Query the chunks are ranked against
pub const DEFAULT_INTENT_QUERY: &str =
    "Summarize the document and extract its key insights, main topics and overall sentiment.";

/// Environment variable naming an optional TOML config file
pub const CONFIG_PATH_ENV: &str = "DOCINSIGHT_CONFIG";

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Backend provider for embeddings and generation
    pub backend: BackendProvider,
    /// Server configuration
    pub server: ServerConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Ollama configuration (backend = ollama)
    pub llm: LlmConfig,
    /// Gemini configuration (backend = gemini)
    pub gemini: GeminiConfig,
    /// Result normalization
    pub normalizer: NormalizerConfig,
    /// Upload and result storage
    pub storage: StorageConfig,
}

impl AnalyzerConfig {
    /// Load configuration from `DOCINSIGHT_CONFIG` (if set), apply
    /// environment overrides and validate.
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        Self::load_from(path.as_deref())
    }

    /// Load configuration from an optional TOML file, apply environment
    /// overrides and validate.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                Self::from_toml(&raw)?
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string (missing sections use defaults)
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Apply environment overrides (`GEMINI_API_KEY`, `DOCINSIGHT_BACKEND`, `OLLAMA_BASE_URL`)
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.trim().is_empty() {
                self.gemini.api_key = Some(key);
            }
        }

        if let Ok(backend) = std::env::var("DOCINSIGHT_BACKEND") {
            match backend.to_lowercase().as_str() {
                "ollama" => self.backend = BackendProvider::Ollama,
                "gemini" => self.backend = BackendProvider::Gemini,
                other => tracing::warn!("Ignoring unknown DOCINSIGHT_BACKEND value: {}", other),
            }
        }

        if let Ok(url) = std::env::var("OLLAMA_BASE_URL") {
            self.llm.base_url = url;
        }
    }

    /// Validate the configuration, failing on the first problem found
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunking.chunk_size must be greater than 0".into()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be at least 1".into()));
        }
        if self.retrieval.max_context_chars == 0 {
            return Err(Error::Config("retrieval.max_context_chars must be greater than 0".into()));
        }
        if self.retrieval.intent_query.trim().is_empty() {
            return Err(Error::Config("retrieval.intent_query must not be empty".into()));
        }
        if self.retrieval.parallel_embeddings == Some(0) {
            return Err(Error::Config("retrieval.parallel_embeddings must be at least 1".into()));
        }
        if self.normalizer.fallback_summary_chars == 0 {
            return Err(Error::Config(
                "normalizer.fallback_summary_chars must be greater than 0".into(),
            ));
        }

        match self.backend {
            BackendProvider::Ollama => {
                if self.llm.base_url.trim().is_empty() {
                    return Err(Error::Config(
                        "llm.base_url must be set for the ollama backend".into(),
                    ));
                }
            }
            BackendProvider::Gemini => {
                let has_key = self
                    .gemini
                    .api_key
                    .as_deref()
                    .is_some_and(|k| !k.trim().is_empty());
                if !has_key {
                    return Err(Error::Config(
                        "Gemini backend selected but no API key configured (set GEMINI_API_KEY)"
                            .into(),
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Backend provider selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendProvider {
    /// Local Ollama server for embeddings and generation
    #[default]
    Ollama,
    /// Google Generative Language API (Gemini)
    Gemini,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
    /// Externally visible base URL used to build download links
    pub public_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 50 * 1024 * 1024,
            public_url: "http://localhost:8080".to_string(),
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 150,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks handed to the model
    pub top_k: usize,
    /// Upper bound on the assembled context, in characters
    pub max_context_chars: usize,
    /// Fixed query used to rank chunks
    pub intent_query: String,
    /// Concurrent embedding requests per document (default: CPU count, max 8)
    pub parallel_embeddings: Option<usize>,
}

impl RetrievalConfig {
    /// Effective embedding concurrency
    pub fn embedding_concurrency(&self) -> usize {
        self.parallel_embeddings
            .unwrap_or_else(|| num_cpus::get().min(8))
            .max(1)
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            max_context_chars: 15_000,
            intent_query: DEFAULT_INTENT_QUERY.to_string(),
            parallel_embeddings: None,
        }
    }
}

/// LLM (Ollama) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name
    pub embed_model: String,
    /// Embedding dimensions reported by the model
    pub embed_dimensions: usize,
    /// Generation model name
    pub generate_model: String,
    /// Ask Ollama to constrain output to JSON
    pub json_mode: bool,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            embed_dimensions: 768,
            generate_model: "llama3.2:3b".to_string(),
            json_mode: true,
            temperature: 0.2,
            timeout_secs: 120,
            max_retries: 2,
        }
    }
}

/// Gemini (Generative Language API) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key; usually supplied through `GEMINI_API_KEY`
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL
    pub base_url: String,
    /// Generation model
    pub generation_model: String,
    /// Embedding model
    pub embedding_model: String,
    /// Embedding dimensions
    pub embed_dimensions: usize,
    /// Temperature for generation
    pub temperature: f32,
    /// Maximum output tokens
    pub max_output_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            generation_model: "gemini-1.5-flash".to_string(),
            embedding_model: "text-embedding-004".to_string(),
            embed_dimensions: 768,
            temperature: 0.2,
            max_output_tokens: 2048,
            timeout_secs: 120,
            max_retries: 2,
        }
    }
}

/// Result normalization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Characters of raw model output kept as summary when parsing fails
    pub fallback_summary_chars: usize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            fallback_summary_chars: 500,
        }
    }
}

/// Storage configuration for uploads and results
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root data directory
    pub data_dir: PathBuf,
}

impl StorageConfig {
    /// Directory holding uploaded file bytes
    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    /// SQLite registry path
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("docinsight.db")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
            .join("docinsight");

        Self { data_dir }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalyzerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunking.chunk_size, 800);
        assert_eq!(config.chunking.chunk_overlap, 150);
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.retrieval.intent_query, DEFAULT_INTENT_QUERY);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk_size() {
        let mut config = AnalyzerConfig::default();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let mut config = AnalyzerConfig::default();
        config.retrieval.top_k = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_gemini_requires_api_key() {
        let mut config = AnalyzerConfig {
            backend: BackendProvider::Gemini,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.gemini.api_key = Some("test-key".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AnalyzerConfig::from_toml(
            r#"
            backend = "gemini"

            [chunking]
            chunk_size = 400

            [retrieval]
            top_k = 6
            "#,
        )
        .unwrap();

        assert_eq!(config.backend, BackendProvider::Gemini);
        assert_eq!(config.chunking.chunk_size, 400);
        assert_eq!(config.chunking.chunk_overlap, 150);
        assert_eq!(config.retrieval.top_k, 6);
        assert_eq!(config.retrieval.max_context_chars, 15_000);
        assert_eq!(config.gemini.generation_model, "gemini-1.5-flash");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = AnalyzerConfig::from_toml("chunking = 12");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}

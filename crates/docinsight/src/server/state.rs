//! Application state for the analysis server

use parking_lot::RwLock;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::AnalyzerConfig;
use crate::error::Result;
use crate::processing::DocumentAnalyzer;
use crate::storage::{AnalysisDb, LocalBlobStore};
use crate::types::{FileRecord, RawDocument};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: AnalyzerConfig,
    /// Analysis pipeline (Ollama or Gemini)
    analyzer: Arc<DocumentAnalyzer>,
    /// File and result registry
    db: AnalysisDb,
    /// Uploaded file bytes
    blobs: LocalBlobStore,
    /// Ready state
    ready: RwLock<bool>,
}

impl AppState {
    /// Create application state for the configured backend and data dir
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        tracing::info!(
            "Initializing application state (backend: {:?}, data dir: {})",
            config.backend,
            config.storage.data_dir.display()
        );

        let analyzer = Arc::new(DocumentAnalyzer::from_config(&config)?);
        let db = AnalysisDb::new(config.storage.database_path())?;
        let blobs = LocalBlobStore::new(config.storage.uploads_dir())?;

        tracing::info!("Storage initialized at {}", config.storage.data_dir.display());

        Ok(Self::with_components(config, analyzer, db, blobs))
    }

    /// Assemble state from already-built parts
    pub fn with_components(
        config: AnalyzerConfig,
        analyzer: Arc<DocumentAnalyzer>,
        db: AnalysisDb,
        blobs: LocalBlobStore,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                analyzer,
                db,
                blobs,
                ready: RwLock::new(true),
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &AnalyzerConfig {
        &self.inner.config
    }

    /// Get the analysis pipeline
    pub fn analyzer(&self) -> &Arc<DocumentAnalyzer> {
        &self.inner.analyzer
    }

    /// Get the registry database
    pub fn db(&self) -> &AnalysisDb {
        &self.inner.db
    }

    /// Get the blob store
    pub fn blobs(&self) -> &LocalBlobStore {
        &self.inner.blobs
    }

    /// Check if the server is ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }

    /// Look up a file and load its bytes
    pub async fn load_document(&self, file_id: Uuid) -> Result<(FileRecord, RawDocument)> {
        let record = self.db().require_file(file_id)?;
        let data = self.blobs().get(&record.storage_key).await?;
        let doc = RawDocument::new(record.filename.clone(), data);
        Ok((record, doc))
    }
}

//! End-to-end document analysis pipeline
//!
//! extract → chunk → embed → index → retrieve → prompt → generate → normalize

use bytes::Bytes;
use std::sync::Arc;
use std::time::Instant;

use crate::config::AnalyzerConfig;
use crate::error::{Error, Result};
use crate::generation::{PromptBuilder, ResultNormalizer};
use crate::ingestion::TextExtractor;
use crate::providers::{build_providers, EmbeddingProvider, LlmProvider};
use crate::retrieval::Retriever;
use crate::types::{AnalysisReport, AnalysisResult, Chunk, RawDocument, ResultOrigin};

/// Runs the analysis pipeline for one document at a time
pub struct DocumentAnalyzer {
    retriever: Retriever,
    llm: Arc<dyn LlmProvider>,
    embedder: Arc<dyn EmbeddingProvider>,
    normalizer: ResultNormalizer,
}

impl DocumentAnalyzer {
    /// Create an analyzer over explicit providers
    pub fn new(
        config: &AnalyzerConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            retriever: Retriever::new(config, Arc::clone(&embedder)),
            llm,
            embedder,
            normalizer: ResultNormalizer::from_config(&config.normalizer),
        }
    }

    /// Create an analyzer for the configured backend
    pub fn from_config(config: &AnalyzerConfig) -> Result<Self> {
        let (embedder, llm) = build_providers(config)?;
        Ok(Self::new(config, embedder, llm))
    }

    /// Name of the generation provider
    pub fn provider_name(&self) -> &str {
        self.llm.name()
    }

    /// Generation model in use
    pub fn model(&self) -> &str {
        self.llm.model()
    }

    /// Whether both backends respond
    pub async fn health_check(&self) -> Result<bool> {
        let (embed_ok, llm_ok) =
            futures::try_join!(self.embedder.health_check(), self.llm.health_check())?;
        Ok(embed_ok && llm_ok)
    }

    /// Extract plain text. Fails when the document holds no text at all.
    pub async fn extract_text(&self, doc: &RawDocument) -> Result<String> {
        let owned = doc.clone();
        let text = tokio::task::spawn_blocking(move || TextExtractor::extract_document(&owned))
            .await
            .map_err(|e| Error::internal(format!("Extraction task failed: {}", e)))?;

        if text.trim().is_empty() {
            return Err(Error::extraction(
                &doc.filename,
                format!(
                    "No text could be extracted from {} file",
                    doc.file_type().display_name()
                ),
            ));
        }

        Ok(text)
    }

    /// Extract text and split it into chunks, without calling any service
    pub async fn extract_and_chunk(&self, doc: &RawDocument) -> Result<(String, Vec<Chunk>)> {
        let text = self.extract_text(doc).await?;
        let chunks = self.retriever.chunker().split(&text);
        Ok((text, chunks))
    }

    /// Analyze a document and report pipeline metadata
    pub async fn analyze(&self, doc: RawDocument) -> Result<AnalysisReport> {
        let start = Instant::now();
        let text = self.extract_text(&doc).await?;

        let mut report = self.analyze_text(&text).await?;
        report.processing_time_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            filename = %doc.filename,
            origin = report.origin.as_str(),
            total_chunks = report.total_chunks,
            chunks_used = report.chunks_used,
            time_ms = report.processing_time_ms,
            "document analyzed"
        );

        Ok(report)
    }

    /// Analyze already-extracted text. Blank text yields the no-content
    /// result and makes no service calls.
    pub async fn analyze_text(&self, text: &str) -> Result<AnalysisReport> {
        let start = Instant::now();
        let text_length = text.chars().count();

        let no_content = |total_chunks| AnalysisReport {
            result: AnalysisResult::no_content(),
            origin: ResultOrigin::NoContent,
            text_length,
            total_chunks,
            chunks_used: 0,
            processing_time_ms: start.elapsed().as_millis() as u64,
        };

        if text.trim().is_empty() {
            return Ok(no_content(0));
        }

        // Blank top-ranked chunks still go to the model; only a document
        // without chunks is "no content"
        let retrieved = self.retriever.retrieve(text).await?;
        if retrieved.is_empty() {
            return Ok(no_content(0));
        }

        let prompt = PromptBuilder::build_analysis_prompt(&retrieved.context);
        let raw = self.llm.generate(&prompt).await?;
        let normalized = self.normalizer.normalize(&raw);

        Ok(AnalysisReport {
            origin: normalized.origin(),
            result: normalized.into_result(),
            text_length,
            total_chunks: retrieved.total_chunks,
            chunks_used: retrieved.chunks.len(),
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Analyze raw uploaded bytes
    pub async fn analyze_document(
        &self,
        data: impl Into<Bytes>,
        filename: &str,
    ) -> Result<AnalysisResult> {
        let report = self.analyze(RawDocument::new(filename, data)).await?;
        Ok(report.result)
    }
}

//! Intent-driven context retrieval over a single document

use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;

use crate::config::AnalyzerConfig;
use crate::error::{Error, Result};
use crate::ingestion::TextChunker;
use crate::providers::EmbeddingProvider;
use crate::types::Chunk;

use super::index::{ScoredChunk, VectorIndex};

/// Separator placed between retrieved chunks in the context
const CONTEXT_SEPARATOR: &str = "\n\n";

/// Context assembled for one document
#[derive(Debug, Clone, Default)]
pub struct RetrievedContext {
    /// Top-ranked chunks, best first
    pub chunks: Vec<ScoredChunk>,
    /// Concatenated chunk texts, bounded to the configured size
    pub context: String,
    /// Number of chunks the document was split into
    pub total_chunks: usize,
}

impl RetrievedContext {
    /// Whether the document produced no chunks at all
    pub fn is_empty(&self) -> bool {
        self.total_chunks == 0
    }
}

/// Chunks, embeds and indexes a document, then pulls the chunks closest
/// to the analysis intent
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    chunker: TextChunker,
    top_k: usize,
    max_context_chars: usize,
    intent_query: String,
    concurrency: usize,
}

impl Retriever {
    /// Create a retriever from configuration
    pub fn new(config: &AnalyzerConfig, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            chunker: TextChunker::from_config(&config.chunking),
            top_k: config.retrieval.top_k,
            max_context_chars: config.retrieval.max_context_chars,
            intent_query: config.retrieval.intent_query.clone(),
            concurrency: config.retrieval.embedding_concurrency(),
        }
    }

    /// The chunker used for splitting documents
    pub fn chunker(&self) -> &TextChunker {
        &self.chunker
    }

    /// Retrieve the most relevant context for `text`
    pub async fn retrieve(&self, text: &str) -> Result<RetrievedContext> {
        let chunks = self.chunker.split(text);
        if chunks.is_empty() {
            return Ok(RetrievedContext::default());
        }
        let total_chunks = chunks.len();

        let embeddings = self.embed_chunks(&chunks).await?;
        let index = VectorIndex::build(chunks, embeddings)?;

        let query = self.embedder.embed(&self.intent_query).await?;
        let ranked = index.query(&query, self.top_k)?;

        let joined = ranked
            .iter()
            .map(|r| r.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);
        let context = truncate_chars(&joined, self.max_context_chars).to_string();

        tracing::debug!(
            total_chunks,
            retrieved = ranked.len(),
            context_chars = context.chars().count(),
            "context retrieved"
        );

        Ok(RetrievedContext {
            chunks: ranked,
            context,
            total_chunks,
        })
    }

    /// Embed every chunk, keeping chunk order. The chunks are split into at
    /// most `concurrency` batches which run concurrently; any failure fails
    /// the whole call.
    async fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<Vec<f32>>> {
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let batch_size = texts.len().div_ceil(self.concurrency.max(1));

        let requests: Vec<_> = texts
            .chunks(batch_size)
            .map(|batch| self.embedder.embed_batch(batch))
            .collect();
        let batches: Vec<Vec<Vec<f32>>> = stream::iter(requests)
            .buffered(self.concurrency.max(1))
            .try_collect()
            .await?;

        let embeddings: Vec<Vec<f32>> = batches.into_iter().flatten().collect();
        if embeddings.len() != chunks.len() {
            return Err(Error::embedding(format!(
                "{} returned {} embeddings for {} chunks",
                self.embedder.name(),
                embeddings.len(),
                chunks.len()
            )));
        }

        let expected = self.embedder.dimensions();
        if let Some(bad) = embeddings.iter().find(|e| e.len() != expected) {
            return Err(Error::embedding(format!(
                "{} returned a {}-dimensional embedding, expected {} (check the configured \
                 embedding dimensions for the model)",
                self.embedder.name(),
                bad.len(),
                expected
            )));
        }

        Ok(embeddings)
    }
}

/// Longest prefix of `s` holding at most `max` chars
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((byte, _)) => &s[..byte],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scores texts by how many times they mention "budget"
    struct KeywordEmbedder {
        calls: AtomicUsize,
        fail_on: Option<&'static str>,
    }

    impl KeywordEmbedder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_on: None,
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(marker) = self.fail_on {
                if text.contains(marker) {
                    return Err(Error::embedding("service unavailable"));
                }
            }
            let hits = text.matches("budget").count() as f32;
            Ok(vec![hits, 1.0])
        }

        fn dimensions(&self) -> usize {
            2
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "keyword"
        }
    }

    /// Ranks whitespace-only chunks above anything with text
    struct BlankFirstEmbedder;

    #[async_trait]
    impl EmbeddingProvider for BlankFirstEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            if text.trim().is_empty() || text.contains("budget") {
                Ok(vec![1.0, 0.0])
            } else {
                Ok(vec![0.0, 1.0])
            }
        }

        fn dimensions(&self) -> usize {
            2
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "blank-first"
        }
    }

    /// Declares more dimensions than it returns
    struct WrongDimensionEmbedder;

    #[async_trait]
    impl EmbeddingProvider for WrongDimensionEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        fn dimensions(&self) -> usize {
            768
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "wrong-dimension"
        }
    }

    fn config(chunk_size: usize, overlap: usize, top_k: usize) -> AnalyzerConfig {
        let mut config = AnalyzerConfig::default();
        config.chunking.chunk_size = chunk_size;
        config.chunking.chunk_overlap = overlap;
        config.retrieval.top_k = top_k;
        config.retrieval.intent_query = "budget budget budget".to_string();
        config.retrieval.parallel_embeddings = Some(3);
        config
    }

    #[tokio::test]
    async fn test_empty_text_makes_no_calls() {
        let embedder = Arc::new(KeywordEmbedder::new());
        let retriever = Retriever::new(&config(50, 10, 2), embedder.clone());

        let ctx = retriever.retrieve("").await.unwrap();
        assert!(ctx.is_empty());
        assert_eq!(ctx.total_chunks, 0);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_retrieves_most_relevant_chunk_first() {
        let text = [
            "The weather was mild all week.",
            "The budget grew and the budget was approved.",
            "Lunch was served at noon.",
        ]
        .join("\n\n");
        let embedder = Arc::new(KeywordEmbedder::new());
        let retriever = Retriever::new(&config(50, 5, 1), embedder.clone());

        let ctx = retriever.retrieve(&text).await.unwrap();
        assert!(ctx.total_chunks >= 3);
        assert_eq!(ctx.chunks.len(), 1);
        assert!(ctx.context.contains("budget"));
        // one call per chunk plus the intent query
        assert_eq!(embedder.calls.load(Ordering::SeqCst), ctx.total_chunks + 1);
    }

    #[tokio::test]
    async fn test_context_is_bounded() {
        let text = "budget ".repeat(400);
        let mut cfg = config(100, 10, 4);
        cfg.retrieval.max_context_chars = 120;
        let retriever = Retriever::new(&cfg, Arc::new(KeywordEmbedder::new()));

        let ctx = retriever.retrieve(&text).await.unwrap();
        assert_eq!(ctx.context.chars().count(), 120);
    }

    #[tokio::test]
    async fn test_any_embedding_failure_fails_retrieval() {
        let text = "alpha section text here.\n\nbeta section text here.\n\nFAIL section text here.";
        let embedder = Arc::new(KeywordEmbedder {
            calls: AtomicUsize::new(0),
            fail_on: Some("FAIL"),
        });
        let retriever = Retriever::new(&config(30, 5, 2), embedder);

        let result = retriever.retrieve(text).await;
        assert!(matches!(result, Err(Error::Embedding(_))));
    }

    #[tokio::test]
    async fn test_blank_top_chunks_still_form_context() {
        let text = format!("Quarterly revenue grew twelve percent.{}", "\n".repeat(200));
        let embedder = Arc::new(BlankFirstEmbedder);
        let retriever = Retriever::new(&config(50, 10, 1), embedder);

        let ctx = retriever.retrieve(&text).await.unwrap();
        assert!(ctx.total_chunks >= 2);
        assert_eq!(ctx.chunks.len(), 1);
        assert!(ctx.context.trim().is_empty());
        assert!(!ctx.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_dimension_is_embedding_error() {
        let embedder = Arc::new(WrongDimensionEmbedder);
        let retriever = Retriever::new(&config(50, 10, 1), embedder);

        let result = retriever.retrieve("Some text to embed.").await;
        assert!(matches!(result, Err(Error::Embedding(_))));
    }

    #[tokio::test]
    async fn test_retrieval_is_deterministic() {
        let text = "Budget notes. ".repeat(40) + &"Other notes. ".repeat(40);
        let retriever = Retriever::new(&config(60, 10, 4), Arc::new(KeywordEmbedder::new()));

        let first = retriever.retrieve(&text).await.unwrap();
        let second = retriever.retrieve(&text).await.unwrap();
        assert_eq!(first.context, second.context);
        assert_eq!(first.chunks, second.chunks);
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }
}

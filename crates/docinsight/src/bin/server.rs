//! Analysis server binary
//!
//! Run with: cargo run -p docinsight --bin docinsight-server

use docinsight::{
    config::{AnalyzerConfig, BackendProvider},
    server::AnalyzerServer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docinsight=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                        docinsight                         ║
║      Summaries, insights, topics and sentiment for        ║
║                 PDF, DOCX and text files                  ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    // Load configuration
    let config = AnalyzerConfig::load()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Backend: {:?}", config.backend);
    match config.backend {
        BackendProvider::Ollama => {
            tracing::info!("  - Embedding model: {}", config.llm.embed_model);
            tracing::info!("  - LLM model: {}", config.llm.generate_model);
        }
        BackendProvider::Gemini => {
            tracing::info!("  - Embedding model: {}", config.gemini.embedding_model);
            tracing::info!("  - LLM model: {}", config.gemini.generation_model);
        }
    }
    tracing::info!(
        "  - Chunking: {} chars, {} overlap",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );
    tracing::info!("  - Top-k: {}", config.retrieval.top_k);
    tracing::info!("  - Data dir: {}", config.storage.data_dir.display());

    // Create server
    let server = AnalyzerServer::new(config.clone())?;

    // Check backend
    match server.state().analyzer().health_check().await {
        Ok(true) => tracing::info!("Backend is reachable"),
        _ => match config.backend {
            BackendProvider::Ollama => {
                tracing::warn!("Ollama not available at {}", config.llm.base_url);
                tracing::warn!("Please start Ollama:");
                tracing::warn!("  1. Start: ollama serve");
                tracing::warn!(
                    "  2. Pull models: ollama pull {} && ollama pull {}",
                    config.llm.embed_model,
                    config.llm.generate_model
                );
            }
            BackendProvider::Gemini => {
                tracing::warn!("Gemini API not reachable; check GEMINI_API_KEY and network access");
            }
        },
    }

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/upload            - Upload a file");
    println!("  POST /api/process/:id       - Analyze and store the result");
    println!("  GET  /api/results/:id       - Stored analysis");
    println!("  POST /api/extract-text      - Extracted text and chunks");
    println!("  POST /api/summarize         - Summary only");
    println!("  POST /api/analyze           - Insights, topics and sentiment");
    println!();

    server.start().await?;

    Ok(())
}

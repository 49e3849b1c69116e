//! API routes for the analysis server

pub mod analysis;
pub mod files;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Files - with larger body limit for uploads
        .route(
            "/upload",
            post(files::upload_file).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/download/:id", get(files::download_file))
        .route("/files/:id/content", get(files::file_content))
        // Analysis
        .route("/process/:id", post(analysis::process_file))
        .route("/results/:id", get(analysis::get_result))
        .route("/extract-text", post(analysis::extract_text))
        .route("/summarize", post(analysis::summarize))
        .route("/analyze", post(analysis::analyze))
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let analyzer = state.analyzer();
    Json(serde_json::json!({
        "name": "docinsight",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Retrieval-grounded summaries, insights, topics and sentiment for documents",
        "backend": {
            "provider": analyzer.provider_name(),
            "model": analyzer.model(),
        },
        "endpoints": {
            "POST /api/upload": "Upload a file (multipart field 'file')",
            "GET /api/download/:id": "Download link for an uploaded file",
            "GET /api/files/:id/content": "Raw bytes of an uploaded file",
            "POST /api/process/:id": "Analyze a file and store the result",
            "GET /api/results/:id": "Stored analysis for a file",
            "POST /api/extract-text": "Extracted text and chunks for a file",
            "POST /api/summarize": "Summary of a file",
            "POST /api/analyze": "Insights, topics and sentiment of a file"
        }
    }))
}

//! Analysis endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::response::{ExtractTextResponse, FileRequest, InsightsResponse, SummaryResponse};
use crate::types::{AnalysisResult, FileStatus, StoredResult};

/// POST /api/process/:id - Run the full pipeline and store the result
pub async fn process_file(
    State(state): State<AppState>,
    Path(file_id): Path<Uuid>,
) -> Result<Json<AnalysisResult>> {
    let (record, doc) = state.load_document(file_id).await?;

    tracing::info!(file_id = %file_id, filename = %record.filename, "processing file");

    let report = match state.analyzer().analyze(doc).await {
        Ok(report) => report,
        Err(e) => {
            state
                .db()
                .update_status(file_id, FileStatus::Failed, Some(&e.to_string()))?;
            return Err(e);
        }
    };

    let stored = StoredResult::new(file_id, report.result, report.origin);
    state.db().upsert_result(&stored)?;
    state.db().update_status(file_id, FileStatus::Processed, None)?;

    Ok(Json(stored.result))
}

/// GET /api/results/:id - Stored analysis for a file
pub async fn get_result(
    State(state): State<AppState>,
    Path(file_id): Path<Uuid>,
) -> Result<Json<StoredResult>> {
    state
        .db()
        .get_result(file_id)?
        .map(Json)
        .ok_or_else(|| Error::ResultNotFound(file_id.to_string()))
}

/// POST /api/extract-text - Extracted text and its chunks
pub async fn extract_text(
    State(state): State<AppState>,
    Json(request): Json<FileRequest>,
) -> Result<Json<ExtractTextResponse>> {
    let (_, doc) = state.load_document(request.file_id).await?;
    let (text, chunks) = state.analyzer().extract_and_chunk(&doc).await?;

    Ok(Json(ExtractTextResponse {
        file_id: request.file_id,
        text_length: text.chars().count(),
        total_chunks: chunks.len(),
        chunks: chunks.into_iter().map(|c| c.content).collect(),
    }))
}

/// POST /api/summarize - Summary only, not stored
pub async fn summarize(
    State(state): State<AppState>,
    Json(request): Json<FileRequest>,
) -> Result<Json<SummaryResponse>> {
    let result = analyze_stored(&state, request.file_id).await?;

    Ok(Json(SummaryResponse {
        file_id: request.file_id,
        summary: result.summary,
    }))
}

/// POST /api/analyze - Insights, topics and sentiment, not stored
pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<FileRequest>,
) -> Result<Json<InsightsResponse>> {
    let result = analyze_stored(&state, request.file_id).await?;

    Ok(Json(InsightsResponse {
        file_id: request.file_id,
        insights: result.insights,
        topics: result.topics,
        sentiment: result.sentiment,
    }))
}

async fn analyze_stored(state: &AppState, file_id: Uuid) -> Result<AnalysisResult> {
    let (_, doc) = state.load_document(file_id).await?;
    let report = state.analyzer().analyze(doc).await?;
    Ok(report.result)
}

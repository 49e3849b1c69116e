//! Request and response bodies for the HTTP API

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response for a successful upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// ID assigned to the upload
    pub file_id: Uuid,
    /// Human-readable status
    pub message: String,
}

/// Download link for a stored file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadResponse {
    /// File ID
    pub file_id: Uuid,
    /// URL serving the original bytes
    pub download_url: String,
}

/// Body for endpoints that operate on a stored file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRequest {
    /// File ID returned by upload
    pub file_id: Uuid,
}

/// Extracted text split into chunks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractTextResponse {
    /// File ID
    pub file_id: Uuid,
    /// Extracted text length in chars
    pub text_length: usize,
    /// Number of chunks
    pub total_chunks: usize,
    /// Chunk texts in order
    pub chunks: Vec<String>,
}

/// Summary-only view of an analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResponse {
    /// File ID
    pub file_id: Uuid,
    /// Summary text
    pub summary: String,
}

/// Insights/topics/sentiment view of an analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsResponse {
    /// File ID
    pub file_id: Uuid,
    /// Key insights
    pub insights: Vec<String>,
    /// Topics
    pub topics: Vec<String>,
    /// Sentiment label
    pub sentiment: String,
}

//! File and stored-result records for the upload registry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::analysis::{AnalysisResult, ResultOrigin};

/// Processing status of an uploaded file
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileStatus {
    /// Stored, not yet analyzed
    Uploaded,
    /// Analysis stored
    Processed,
    /// Last analysis attempt failed
    Failed,
}

impl FileStatus {
    /// Stable string form (used as the database value)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploaded => "UPLOADED",
            Self::Processed => "PROCESSED",
            Self::Failed => "FAILED",
        }
    }

    /// Parse the stable string form
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "UPLOADED" => Some(Self::Uploaded),
            "PROCESSED" => Some(Self::Processed),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Metadata for an uploaded file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileRecord {
    /// Unique file ID
    pub file_id: Uuid,
    /// Original filename as uploaded
    pub filename: String,
    /// Key of the stored bytes in the blob store
    pub storage_key: String,
    /// File size in bytes
    pub size: u64,
    /// Content hash (SHA-256)
    pub content_hash: String,
    /// Upload time
    pub uploaded_at: DateTime<Utc>,
    /// Processing status
    pub status: FileStatus,
    /// Error message from the last failed analysis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl FileRecord {
    /// Create a record for a freshly uploaded file
    pub fn uploaded(
        file_id: Uuid,
        filename: String,
        storage_key: String,
        size: u64,
        content_hash: String,
    ) -> Self {
        Self {
            file_id,
            filename,
            storage_key,
            size,
            content_hash,
            uploaded_at: Utc::now(),
            status: FileStatus::Uploaded,
            error_message: None,
        }
    }
}

/// Persisted analysis for a file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredResult {
    /// File the analysis belongs to
    pub file_id: Uuid,
    /// The four-field analysis
    #[serde(flatten)]
    pub result: AnalysisResult,
    /// How the result was obtained
    pub origin: ResultOrigin,
    /// When the analysis finished
    pub processed_at: DateTime<Utc>,
}

impl StoredResult {
    /// Wrap a fresh analysis result
    pub fn new(file_id: Uuid, result: AnalysisResult, origin: ResultOrigin) -> Self {
        Self {
            file_id,
            result,
            origin,
            processed_at: Utc::now(),
        }
    }
}

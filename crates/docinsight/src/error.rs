//! Error types for the analysis service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for docinsight operations
pub type Result<T> = std::result::Result<T, Error>;

/// Analysis service errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed client request (bad multipart body, missing field)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No recoverable text in the uploaded document
    #[error("Text extraction failed for '{filename}': {message}")]
    Extraction { filename: String, message: String },

    /// Embedding service unreachable or returned an error
    #[error("Embedding service failed: {0}")]
    Embedding(String),

    /// Generative service unreachable or returned an error
    #[error("Generative service failed: {0}")]
    Generation(String),

    /// Vector index construction or query error
    #[error("Vector index error: {0}")]
    VectorIndex(String),

    /// Uploaded file not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// No stored analysis for the file
    #[error("No analysis result found: {0}")]
    ResultNotFound(String),

    /// Metadata registry error
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an extraction error
    pub fn extraction(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Create a vector index error
    pub fn vector_index(message: impl Into<String>) -> Self {
        Self::VectorIndex(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Short machine-readable kind, also used in API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config_error",
            Error::InvalidRequest(_) => "invalid_request",
            Error::Extraction { .. } => "extraction_error",
            Error::Embedding(_) => "embedding_error",
            Error::Generation(_) => "generation_error",
            Error::VectorIndex(_) => "vector_index_error",
            Error::FileNotFound(_) | Error::ResultNotFound(_) => "not_found",
            Error::Storage(_) => "storage_error",
            Error::Io(_) => "io_error",
            Error::Json(_) => "json_error",
            Error::Internal(_) => "internal_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Error::Config(_)
            | Error::InvalidRequest(_)
            | Error::Extraction { .. }
            | Error::Json(_) => StatusCode::BAD_REQUEST,
            Error::Embedding(_) => StatusCode::BAD_GATEWAY,
            Error::Generation(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::FileNotFound(_) | Error::ResultNotFound(_) => StatusCode::NOT_FOUND,
            Error::VectorIndex(_) | Error::Storage(_) | Error::Io(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), "{}", self);
        }

        let body = Json(json!({
            "error": {
                "type": self.kind(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

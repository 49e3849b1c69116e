//! Upload and download endpoints

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::storage::LocalBlobStore;
use crate::types::document::hash_bytes;
use crate::types::response::{DownloadResponse, UploadResponse};
use crate::types::FileRecord;

/// Multipart field carrying the upload
const FILE_FIELD: &str = "file";

/// POST /api/upload - Store a file for later analysis
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::invalid_request(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_id = Uuid::new_v4();
        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("file_{}.bin", file_id));

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::invalid_request(format!("Failed to read file: {}", e)))?;

        let storage_key = LocalBlobStore::storage_key(file_id, &filename);
        state.blobs().put(&storage_key, &data).await?;

        let record = FileRecord::uploaded(
            file_id,
            filename,
            storage_key,
            data.len() as u64,
            hash_bytes(&data),
        );
        state.db().insert_file(&record)?;

        tracing::info!(
            file_id = %file_id,
            filename = %record.filename,
            bytes = record.size,
            "file uploaded"
        );

        return Ok(Json(UploadResponse {
            file_id,
            message: "File uploaded successfully".to_string(),
        }));
    }

    Err(Error::invalid_request(format!(
        "Missing multipart field '{}'",
        FILE_FIELD
    )))
}

/// GET /api/download/:id - Link to the stored bytes
pub async fn download_file(
    State(state): State<AppState>,
    Path(file_id): Path<Uuid>,
) -> Result<Json<DownloadResponse>> {
    let record = state.db().require_file(file_id)?;

    let base = state.config().server.public_url.trim_end_matches('/');
    Ok(Json(DownloadResponse {
        file_id: record.file_id,
        download_url: format!("{}/api/files/{}/content", base, record.file_id),
    }))
}

/// GET /api/files/:id/content - Raw bytes of an upload
pub async fn file_content(
    State(state): State<AppState>,
    Path(file_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let (record, doc) = state.load_document(file_id).await?;

    let content_type = mime_guess::from_path(&record.filename)
        .first_or_octet_stream()
        .to_string();
    let disposition = format!(
        "inline; filename=\"{}\"",
        record.filename.replace(['"', '\\'], "_")
    );

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        doc.data,
    ))
}

use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::gallery_error;
use crate::api::response::{ApiError, AppJson, AppQuery, JSend};
use crate::storage::models::{FilePatch, FileRecord};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

/// Per-file upload outcome. A batch where some files fail is still a
/// JSend success, but every failure is itemized; 3-of-5 uploaded is
/// never reported as a blanket success.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub uploaded: Vec<FileRecord>,
    pub failed: Vec<UploadFailure>,
}

#[derive(Debug, Serialize)]
pub struct UploadFailure {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteFileResponse {
    pub removed: bool,
}

#[derive(Debug, Deserialize)]
pub struct ContentParams {
    #[serde(default)]
    pub download: Option<bool>,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    Path((user_id, folder_id)): Path<(String, String)>,
    mut multipart: Multipart,
) -> Result<Json<JSend<UploadResponse>>, ApiError> {
    let mut uploaded = Vec::new();
    let mut failed = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart data: {e}")))?
    {
        // Only fields carrying a filename are treated as uploads.
        let Some(file_name) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };
        let content_type = field.content_type().map(|s| s.to_string());

        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                failed.push(UploadFailure {
                    name: file_name,
                    error: format!("failed to read upload: {e}"),
                });
                continue;
            }
        };

        if data.len() as u64 > state.config.max_upload_size {
            failed.push(UploadFailure {
                name: file_name,
                error: format!(
                    "file exceeds maximum upload size of {} bytes",
                    state.config.max_upload_size
                ),
            });
            continue;
        }

        match state
            .gallery
            .upload_file(&user_id, &folder_id, &file_name, content_type.as_deref(), data)
            .await
        {
            Ok(record) => uploaded.push(record),
            Err(crate::service::GalleryError::Store(
                e @ (crate::storage::StoreError::UserNotFound
                | crate::storage::StoreError::FolderNotFound(_)),
            )) => {
                // The whole batch targets one folder; bail out instead
                // of repeating the same failure per file.
                return Err(gallery_error(e.into()));
            }
            Err(e) => failed.push(UploadFailure {
                name: file_name,
                error: e.to_string(),
            }),
        }
    }

    if uploaded.is_empty() && failed.is_empty() {
        return Err(ApiError::bad_request("at least one file field is required"));
    }

    Ok(JSend::success(UploadResponse { uploaded, failed }))
}

pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
) -> Result<Json<JSend<FileRecord>>, ApiError> {
    let record = state.gallery.file_record(&file_id).map_err(gallery_error)?;
    Ok(JSend::success(record))
}

pub async fn update_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
    AppJson(patch): AppJson<FilePatch>,
) -> Result<Json<JSend<FileRecord>>, ApiError> {
    let record = state
        .gallery
        .update_file(&file_id, &patch)
        .map_err(gallery_error)?;

    Ok(JSend::success(record))
}

pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path((user_id, folder_id, file_id)): Path<(String, String, String)>,
) -> Result<Json<JSend<DeleteFileResponse>>, ApiError> {
    let removed = state
        .gallery
        .delete_file(&user_id, &folder_id, &file_id)
        .await
        .map_err(gallery_error)?;

    Ok(JSend::success(DeleteFileResponse { removed }))
}

/// Serve a file's bytes.
/// Route: GET /files/:id/content
pub async fn serve_content(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
    AppQuery(params): AppQuery<ContentParams>,
) -> Result<Response, ApiError> {
    let (record, data) = state
        .gallery
        .file_content(&file_id)
        .await
        .map_err(gallery_error)?;

    let mut response = (StatusCode::OK, data).into_response();
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_TYPE,
        record
            .mime_type
            .parse()
            .unwrap_or(header::HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CONTENT_LENGTH, header::HeaderValue::from(record.size));

    let disposition = if params.download.unwrap_or(false) {
        "attachment"
    } else {
        "inline"
    };
    if let Ok(value) = format!("{disposition}; filename=\"{}\"", record.name).parse() {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok(response)
}

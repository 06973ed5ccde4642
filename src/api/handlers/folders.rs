use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::gallery_error;
use crate::api::response::{ApiError, AppJson, AppQuery, JSend};
use crate::storage::models::ROOT_FOLDER_ID;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    pub name: String,
    #[serde(default = "default_parent")]
    pub parent_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameFolderRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFolderParams {
    #[serde(default = "default_parent")]
    pub parent_id: String,
}

fn default_parent() -> String {
    ROOT_FOLDER_ID.to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderResponse {
    pub folder_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFolderResponse {
    pub folders_removed: u64,
    pub files_removed: u64,
    pub shares_removed: u64,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    AppJson(req): AppJson<CreateFolderRequest>,
) -> Result<Json<JSend<CreateFolderResponse>>, ApiError> {
    let folder_id = state
        .gallery
        .create_folder(&user_id, &req.name, &req.parent_id)
        .map_err(gallery_error)?;

    Ok(JSend::success(CreateFolderResponse { folder_id }))
}

pub async fn rename_folder(
    State(state): State<Arc<AppState>>,
    Path((user_id, folder_id)): Path<(String, String)>,
    AppJson(req): AppJson<RenameFolderRequest>,
) -> Result<Json<JSend<()>>, ApiError> {
    state
        .gallery
        .rename_folder(&user_id, &folder_id, &req.name)
        .map_err(gallery_error)?;

    Ok(JSend::success(()))
}

pub async fn delete_folder(
    State(state): State<Arc<AppState>>,
    Path((user_id, folder_id)): Path<(String, String)>,
    AppQuery(params): AppQuery<DeleteFolderParams>,
) -> Result<Json<JSend<DeleteFolderResponse>>, ApiError> {
    let outcome = state
        .gallery
        .delete_folder(&user_id, &folder_id, &params.parent_id)
        .await
        .map_err(gallery_error)?;

    Ok(JSend::success(DeleteFolderResponse {
        folders_removed: outcome.folders_removed,
        files_removed: outcome.files_removed,
        shares_removed: outcome.shares_removed,
    }))
}

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;

use super::gallery_error;
use crate::api::response::{ApiError, AppJson, AppQuery, JSend};
use crate::storage::models::ShareRecord;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShareRequest {
    pub user_id: String,
    pub folder_id: String,
    #[serde(default)]
    pub protected_download: bool,
}

#[derive(Debug, Deserialize)]
pub struct GetShareParams {
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteShareParams {
    pub user_id: String,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn create_share(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CreateShareRequest>,
) -> Result<Json<JSend<ShareRecord>>, ApiError> {
    let record = state
        .gallery
        .create_share(&req.user_id, &req.folder_id, req.protected_download)
        .map_err(gallery_error)?;

    Ok(JSend::success(record))
}

pub async fn get_share(
    State(state): State<Arc<AppState>>,
    Path(share_id): Path<String>,
    AppQuery(params): AppQuery<GetShareParams>,
) -> Result<Json<JSend<ShareRecord>>, ApiError> {
    let record = state
        .gallery
        .resolve_share(&share_id, &params.token)
        .map_err(gallery_error)?;

    Ok(JSend::success(record))
}

pub async fn list_shares(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<JSend<Vec<ShareRecord>>>, ApiError> {
    let shares = state.gallery.list_shares(&user_id).map_err(gallery_error)?;
    Ok(JSend::success(shares))
}

pub async fn delete_share(
    State(state): State<Arc<AppState>>,
    Path(share_id): Path<String>,
    AppQuery(params): AppQuery<DeleteShareParams>,
) -> Result<Json<JSend<()>>, ApiError> {
    state
        .gallery
        .delete_share(&share_id, &params.user_id)
        .map_err(gallery_error)?;

    Ok(JSend::success(()))
}

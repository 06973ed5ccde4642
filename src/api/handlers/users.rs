use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::gallery_error;
use crate::api::response::{ApiError, AppJson, JSend};
use crate::storage::models::{Folder, Settings, UserDocument};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

/// The user document as served to clients: everything except the
/// password hash.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocumentResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub folders: HashMap<String, Folder>,
    pub settings: Settings,
}

impl From<UserDocument> for UserDocumentResponse {
    fn from(document: UserDocument) -> Self {
        Self {
            id: document.id,
            username: document.username,
            email: document.email,
            created_at: document.created_at,
            folders: document.folders,
            settings: document.settings,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateEmailRequest {
    pub email: String,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<JSend<UserDocumentResponse>>, ApiError> {
    let document = state
        .gallery
        .user_document(&user_id)
        .map_err(gallery_error)?;

    Ok(JSend::success(document.into()))
}

pub async fn update_email(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    AppJson(req): AppJson<UpdateEmailRequest>,
) -> Result<Json<JSend<()>>, ApiError> {
    state
        .gallery
        .update_email(&user_id, &req.email)
        .map_err(gallery_error)?;

    Ok(JSend::success(()))
}

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::gallery_error;
use crate::api::response::{ApiError, AppJson, JSend};
use crate::storage::models::UserEntry;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Public identity of an account; never carries the password hash.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
}

impl From<UserEntry> for UserResponse {
    fn from(entry: UserEntry) -> Self {
        Self {
            id: entry.id,
            username: entry.username,
            email: entry.email,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<Json<JSend<UserResponse>>, ApiError> {
    let entry = state
        .gallery
        .register(&req.username, &req.email, &req.password)
        .map_err(gallery_error)?;

    Ok(JSend::success(entry.into()))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<JSend<UserResponse>>, ApiError> {
    let entry = state
        .gallery
        .login(&req.username, &req.password)
        .map_err(gallery_error)?;

    Ok(JSend::success(entry.into()))
}

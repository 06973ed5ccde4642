use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.max_upload_size as usize;

    let mut router = Router::new()
        // Accounts
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/users/:id", get(handlers::get_user))
        .route("/users/:id/email", put(handlers::update_email))
        // Folders
        .route("/users/:id/folders", post(handlers::create_folder))
        .route("/users/:id/folders/:folder_id", put(handlers::rename_folder))
        .route(
            "/users/:id/folders/:folder_id",
            delete(handlers::delete_folder),
        )
        // Files
        .route(
            "/users/:id/folders/:folder_id/files",
            post(handlers::upload_files).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/users/:id/folders/:folder_id/files/:file_id",
            delete(handlers::delete_file),
        )
        .route("/files/:id", get(handlers::get_file))
        .route("/files/:id", put(handlers::update_file))
        .route("/files/:id/content", get(handlers::serve_content))
        // Shares
        .route("/shares", post(handlers::create_share))
        .route("/shares/:id", get(handlers::get_share))
        .route("/shares/:id", delete(handlers::delete_share))
        .route("/users/:id/shares", get(handlers::list_shares))
        // Internal
        .route("/_internal/health", get(handlers::health));

    // Test-only routes
    if state.config.test_mode {
        tracing::warn!("Test mode enabled -- purge route is available.");
        router = router.route("/admin/purge", delete(handlers::admin_purge));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

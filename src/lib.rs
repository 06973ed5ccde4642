//! gallery-manager - A private media gallery API for folder-organized libraries
//!
//! This crate provides account registration, nested folder trees, media
//! upload with metadata, and shareable folder links backed by:
//! - Flat JSON documents on the filesystem (atomic replace-on-write)
//! - A per-user upload directory behind a swappable object store
//! - REST API with multipart upload support

pub mod api;
pub mod auth;
pub mod config;
pub mod ident;
pub mod object_store;
pub mod service;
pub mod storage;
#[cfg(test)]
pub mod testutil;

use config::Config;
use service::Gallery;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub gallery: Gallery,
}

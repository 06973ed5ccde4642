//! Gallery application service.
//!
//! Sequences the multi-document operations (upload, cascading folder
//! delete, share lifecycle) over the document store and the physical
//! upload store. No operation spans two documents atomically; the
//! ordering rules here keep every crash window recoverable:
//!
//! - physical bytes are durable before their file record exists,
//! - file records exist before a folder references them,
//! - on deletion, contained files are disposed of before the tree is
//!   pruned, so an interrupted delete leaves the folder attached and
//!   the whole operation retryable.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::auth;
use crate::ident;
use crate::object_store::{ObjectStore, ObjectStoreError};
use crate::storage::models::{
    FilePatch, FileRecord, MediaKind, ShareRecord, UserDocument, UserEntry, ROOT_FOLDER_ID,
};
use crate::storage::{tree, Store, StoreError};

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("upload storage error: {0}")]
    Objects(#[from] ObjectStoreError),
}

/// Outcome of a cascading folder deletion.
#[derive(Debug, Default)]
pub struct FolderDeletion {
    pub folders_removed: u64,
    pub files_removed: u64,
    pub shares_removed: u64,
}

/// Application layer over the persisted gallery state.
#[derive(Clone)]
pub struct Gallery {
    store: Store,
    objects: Arc<dyn ObjectStore>,
    public_url: String,
}

impl Gallery {
    pub fn new(store: Store, objects: Arc<dyn ObjectStore>, public_url: impl Into<String>) -> Self {
        Self {
            store,
            objects,
            public_url: public_url.into(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    pub fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<UserEntry, GalleryError> {
        let username = username.trim();
        let email = email.trim();
        if username.is_empty() {
            return Err(StoreError::Validation("username is required".into()).into());
        }
        if email.is_empty() || !email.contains('@') {
            return Err(StoreError::Validation("a valid email address is required".into()).into());
        }

        let password_hash = auth::hash_password(password)
            .map_err(|e| StoreError::Validation(e.to_string()))?;

        let entry = self.store.register_user(username, email, &password_hash)?;
        debug!(user_id = %entry.id, username = %entry.username, "Registered user");
        Ok(entry)
    }

    /// Authenticate by username and password.
    ///
    /// An unknown username is `NoSuchUser`; a wrong password is
    /// `InvalidCredentials`.
    pub fn login(&self, username: &str, password: &str) -> Result<UserEntry, GalleryError> {
        let entry = self
            .store
            .find_user_by_username(username)?
            .ok_or(StoreError::NoSuchUser)?;

        let document = self.store.user_document(&entry.id)?;
        auth::verify_password(password, &document.password_hash)
            .map_err(|_| StoreError::InvalidCredentials)?;

        Ok(entry)
    }

    pub fn user_document(&self, user_id: &str) -> Result<UserDocument, GalleryError> {
        Ok(self.store.user_document(user_id)?)
    }

    pub fn update_email(&self, user_id: &str, new_email: &str) -> Result<(), GalleryError> {
        self.store.update_email(user_id, new_email)?;
        debug!(user_id = %user_id, "Updated email");
        Ok(())
    }

    // ========================================================================
    // Folders
    // ========================================================================

    pub fn create_folder(
        &self,
        user_id: &str,
        name: &str,
        parent_id: &str,
    ) -> Result<String, GalleryError> {
        let mut document = self.store.user_document(user_id)?;
        let folder_id = tree::create_folder(&mut document, name, parent_id)?;
        self.store.write_user_document(&document)?;

        debug!(user_id = %user_id, folder_id = %folder_id, parent_id = %parent_id, "Created folder");
        Ok(folder_id)
    }

    pub fn rename_folder(
        &self,
        user_id: &str,
        folder_id: &str,
        name: &str,
    ) -> Result<(), GalleryError> {
        let mut document = self.store.user_document(user_id)?;
        tree::rename_folder(&mut document, folder_id, name)?;
        self.store.write_user_document(&document)?;

        debug!(user_id = %user_id, folder_id = %folder_id, "Renamed folder");
        Ok(())
    }

    /// Delete a folder and everything beneath it.
    ///
    /// Contained files (bytes, then records) are disposed of first;
    /// only then is the subtree pruned and the document written, in one
    /// atomic replacement. Shares targeting any deleted folder are
    /// pruned last; a share whose prune is lost to a crash degrades to
    /// an unresolvable link, not a dangling tree. Deleting an absent
    /// folder succeeds without changing anything.
    pub async fn delete_folder(
        &self,
        user_id: &str,
        folder_id: &str,
        parent_id: &str,
    ) -> Result<FolderDeletion, GalleryError> {
        if folder_id == ROOT_FOLDER_ID {
            return Err(StoreError::Validation("the root folder cannot be deleted".into()).into());
        }

        let mut document = self.store.user_document(user_id)?;
        let subtree = tree::collect_subtree(&document, folder_id);

        let mut outcome = FolderDeletion {
            folders_removed: subtree.folders.len() as u64,
            ..FolderDeletion::default()
        };

        for file_id in &subtree.files {
            if self.dispose_file(file_id).await? {
                outcome.files_removed += 1;
            }
        }

        tree::detach_subtree(&mut document, folder_id, parent_id, &subtree)?;
        self.store.write_user_document(&document)?;

        if !subtree.folders.is_empty() {
            outcome.shares_removed = self
                .store
                .prune_shares_for_folders(user_id, &subtree.folders)?;
        }

        debug!(
            user_id = %user_id,
            folder_id = %folder_id,
            folders = outcome.folders_removed,
            files = outcome.files_removed,
            shares = outcome.shares_removed,
            "Deleted folder"
        );
        Ok(outcome)
    }

    // ========================================================================
    // Files
    // ========================================================================

    /// Store one uploaded file: bytes first, then the metadata record,
    /// then the folder reference.
    pub async fn upload_file(
        &self,
        user_id: &str,
        folder_id: &str,
        file_name: &str,
        content_type: Option<&str>,
        data: Bytes,
    ) -> Result<FileRecord, GalleryError> {
        let mut document = self.store.user_document(user_id)?;
        if !document.folders.contains_key(folder_id) {
            return Err(StoreError::FolderNotFound(folder_id.to_string()).into());
        }

        // Strip any client-supplied directory components.
        let file_name = file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .trim();
        if file_name.is_empty() {
            return Err(StoreError::Validation("file name is required".into()).into());
        }

        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        let kind = MediaKind::from_extension(&extension)
            .ok_or_else(|| StoreError::UnsupportedType(extension.clone()))?;

        // MIME: trust the client's Content-Type unless it is the
        // generic fallback, then guess from the filename.
        let mime_type = content_type
            .filter(|ct| *ct != "application/octet-stream")
            .map(|ct| ct.to_string())
            .or_else(|| {
                mime_guess::from_path(file_name)
                    .first()
                    .map(|m| m.to_string())
            })
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let file_id = ident::generate_id();
        let storage_key = format!("{user_id}/{file_id}_{file_name}");
        let size = data.len() as u64;
        let now = Utc::now();

        // Phase 1: physical bytes.
        self.objects.put(&storage_key, data).await?;

        // Phase 2: metadata record.
        let record = FileRecord {
            id: file_id.clone(),
            name: file_name.to_string(),
            mime_type,
            size,
            path: storage_key.clone(),
            created_at: now,
            modified_at: now,
            folder_id: folder_id.to_string(),
            description: String::new(),
            tags: Vec::new(),
            notes: String::new(),
            enrichment: basic_enrichment(kind, &extension),
        };
        if let Err(e) = self.store.create_file_record(&record) {
            // Best-effort cleanup of the stored bytes.
            let _ = self.objects.delete(&storage_key).await;
            return Err(e.into());
        }

        // Phase 3: folder reference.
        tree::add_file(&mut document, folder_id, &file_id)?;
        self.store.write_user_document(&document)?;

        debug!(user_id = %user_id, file_id = %file_id, folder_id = %folder_id, "Uploaded file");
        Ok(record)
    }

    pub fn file_record(&self, file_id: &str) -> Result<FileRecord, GalleryError> {
        Ok(self
            .store
            .file_record(file_id)?
            .ok_or(StoreError::FileNotFound)?)
    }

    pub fn update_file(
        &self,
        file_id: &str,
        patch: &FilePatch,
    ) -> Result<FileRecord, GalleryError> {
        if patch.is_empty() {
            return Err(StoreError::Validation(
                "at least one field (name, description, tags, notes, or an enrichment key) must be provided"
                    .into(),
            )
            .into());
        }

        let record = self
            .store
            .update_file_record(file_id, patch)?
            .ok_or(StoreError::FileNotFound)?;

        debug!(file_id = %file_id, "Updated file metadata");
        Ok(record)
    }

    /// Delete one file: bytes, record, then the folder reference.
    /// Idempotent, every step tolerates the target already being gone.
    pub async fn delete_file(
        &self,
        user_id: &str,
        folder_id: &str,
        file_id: &str,
    ) -> Result<bool, GalleryError> {
        let mut document = self.store.user_document(user_id)?;

        let existed = self.dispose_file(file_id).await?;
        let removed = tree::remove_file(&mut document, folder_id, file_id);
        if removed {
            self.store.write_user_document(&document)?;
        }

        debug!(user_id = %user_id, file_id = %file_id, "Deleted file");
        Ok(existed || removed)
    }

    /// Fetch a file's record and its physical bytes.
    pub async fn file_content(&self, file_id: &str) -> Result<(FileRecord, Bytes), GalleryError> {
        let record = self.file_record(file_id)?;
        let data = self.objects.get(&record.path).await?;
        Ok((record, data))
    }

    /// Remove a file's bytes and its record, in that order. Returns
    /// whether a record existed. A crash between the two steps leaves
    /// an orphaned record pointing at nothing, which is logged on the
    /// next delete attempt rather than hidden.
    async fn dispose_file(&self, file_id: &str) -> Result<bool, GalleryError> {
        let Some(record) = self.store.file_record(file_id)? else {
            return Ok(false);
        };

        if let Err(e) = self.objects.delete(&record.path).await {
            match e {
                ObjectStoreError::NotFound(_) => {
                    warn!(file_id = %file_id, path = %record.path, "File bytes already absent");
                }
                other => return Err(other.into()),
            }
        }

        self.store.remove_file_record(file_id)?;
        Ok(true)
    }

    // ========================================================================
    // Shares
    // ========================================================================

    pub fn create_share(
        &self,
        user_id: &str,
        folder_id: &str,
        protected_download: bool,
    ) -> Result<ShareRecord, GalleryError> {
        let document = self.store.user_document(user_id)?;
        if !document.folders.contains_key(folder_id) {
            return Err(StoreError::FolderNotFound(folder_id.to_string()).into());
        }

        let record = self
            .store
            .create_share(user_id, folder_id, protected_download, &self.public_url)?;

        debug!(user_id = %user_id, share_id = %record.share_id, folder_id = %folder_id, "Created share");
        Ok(record)
    }

    /// Resolve a share by id + token.
    ///
    /// A share whose owner or target folder has since disappeared
    /// degrades to `InvalidShare` instead of failing downstream when
    /// the folder is loaded.
    pub fn resolve_share(&self, share_id: &str, token: &str) -> Result<ShareRecord, GalleryError> {
        let record = self.store.resolve_share(share_id, token)?;

        let folder_exists = match self.store.user_document(&record.user_id) {
            Ok(document) => document.folders.contains_key(&record.folder_id),
            Err(StoreError::UserNotFound) => false,
            Err(e) => return Err(e.into()),
        };
        if !folder_exists {
            warn!(share_id = %share_id, "Share targets a folder that no longer exists");
            return Err(StoreError::InvalidShare.into());
        }

        Ok(record)
    }

    pub fn list_shares(&self, user_id: &str) -> Result<Vec<ShareRecord>, GalleryError> {
        Ok(self.store.shares_by_owner(user_id)?)
    }

    pub fn delete_share(&self, share_id: &str, requester_id: &str) -> Result<(), GalleryError> {
        self.store.delete_share(share_id, requester_id)?;
        debug!(share_id = %share_id, user_id = %requester_id, "Deleted share");
        Ok(())
    }
}

/// Built-in enrichment for kinds whose metadata needs no parsing.
/// Image EXIF extraction is an external step that merges further keys
/// through `update_file`.
fn basic_enrichment(kind: MediaKind, extension: &str) -> HashMap<String, serde_json::Value> {
    let mut enrichment = HashMap::new();
    if matches!(kind, MediaKind::Audio | MediaKind::Video) {
        enrichment.insert(
            "format".to_string(),
            serde_json::Value::String(extension.to_uppercase()),
        );
        enrichment.insert(
            "mediaType".to_string(),
            serde_json::Value::String(kind.as_str().to_string()),
        );
    }
    enrichment
}

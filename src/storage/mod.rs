mod documents;
mod files;
pub mod models;
mod shares;
pub mod tree;
mod users;

pub use documents::{DocumentError, DocumentStore};

use std::path::Path;
use std::sync::{Arc, Mutex};

use thiserror::Error;

/// Storage-layer error taxonomy. Every failure a caller might branch
/// on gets its own variant; I/O and serde problems are fatal for the
/// request and travel as `Document`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("user not found")]
    UserNotFound,

    #[error("no user with that username")]
    NoSuchUser,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("username or email already registered")]
    DuplicateUser,

    #[error("folder '{0}' not found")]
    FolderNotFound(String),

    #[error("file not found")]
    FileNotFound,

    #[error("share not found")]
    ShareNotFound,

    #[error("not the owner of this share")]
    PermissionDenied,

    #[error("invalid share link")]
    InvalidShare,

    #[error("file type '{0}' is not allowed")]
    UnsupportedType(String),

    #[error("{0}")]
    Validation(String),
}

/// Document containers under the data directory.
pub(crate) const USER_INDEX_KEY: &str = "users";
pub(crate) const SHARES_KEY: &str = "shares";
pub(crate) const USERS_CONTAINER: &str = "users";
pub(crate) const FILES_CONTAINER: &str = "files";

/// Handle over all persisted gallery documents: the user directory,
/// the per-user documents, the file records, and the share registry.
///
/// Each operation is a full-document read-modify-write with no
/// cross-document atomicity. The two process-wide documents (user
/// directory and share registry) are additionally serialized behind
/// in-process mutexes, which narrows (but does not eliminate) the
/// lost-update window between independent server processes.
pub struct Store {
    docs: DocumentStore,
    index_lock: Arc<Mutex<()>>,
    shares_lock: Arc<Mutex<()>>,
}

impl Clone for Store {
    fn clone(&self) -> Self {
        Self {
            docs: self.docs.clone(),
            index_lock: Arc::clone(&self.index_lock),
            shares_lock: Arc::clone(&self.shares_lock),
        }
    }
}

/// Statistics from a purge operation
#[derive(Debug, Default)]
pub struct PurgeStats {
    pub users: u64,
    pub files: u64,
    pub shares: u64,
}

impl Store {
    /// Open or create a store under the given data directory.
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, StoreError> {
        let docs = DocumentStore::open(data_dir)?;
        docs.ensure_container(USERS_CONTAINER)?;
        docs.ensure_container(FILES_CONTAINER)?;

        Ok(Self {
            docs,
            index_lock: Arc::new(Mutex::new(())),
            shares_lock: Arc::new(Mutex::new(())),
        })
    }

    pub(crate) fn docs(&self) -> &DocumentStore {
        &self.docs
    }

    pub(crate) fn lock_index(&self) -> std::sync::MutexGuard<'_, ()> {
        self.index_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn lock_shares(&self) -> std::sync::MutexGuard<'_, ()> {
        self.shares_lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ========================================================================
    // Admin operations
    // ========================================================================

    /// Purge all data - for testing only
    pub fn purge_all(&self) -> Result<PurgeStats, StoreError> {
        let _index = self.lock_index();
        let _shares = self.lock_shares();
        let mut stats = PurgeStats::default();

        for key in self.docs.list(USERS_CONTAINER)? {
            if self.docs.remove(&key)? {
                stats.users += 1;
            }
        }
        for key in self.docs.list(FILES_CONTAINER)? {
            if self.docs.remove(&key)? {
                stats.files += 1;
            }
        }

        let registry: std::collections::HashMap<String, models::ShareRecord> =
            self.docs.read(SHARES_KEY)?.unwrap_or_default();
        stats.shares = registry.len() as u64;

        self.docs.remove(SHARES_KEY)?;
        self.docs.remove(USER_INDEX_KEY)?;

        Ok(stats)
    }
}

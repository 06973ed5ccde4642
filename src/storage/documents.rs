use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Flat JSON-document store keyed by relative path.
///
/// Each key maps to one `<root>/<key>.json` file holding a complete
/// document. Writes replace the whole document atomically: the new
/// contents are staged to a temp file in the same directory, synced,
/// and renamed into place, so a concurrent reader sees either the old
/// or the new document, never a torn one.
#[derive(Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, DocumentError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Create a sub-directory for a family of documents (e.g. `users`).
    pub fn ensure_container(&self, container: &str) -> Result<(), DocumentError> {
        fs::create_dir_all(self.root.join(container))?;
        Ok(())
    }

    fn doc_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    /// Read and deserialize a document. Absent documents are `None`,
    /// not an error.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DocumentError> {
        let path = self.doc_path(key);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&data)?))
    }

    /// Serialize and write a document, fully replacing any previous
    /// version. Stage-then-rename keeps the replacement atomic on every
    /// platform that gives us an atomic rename within one directory.
    pub fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), DocumentError> {
        let path = self.doc_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let data = serde_json::to_vec_pretty(value)?;

        let tmp_path = path.with_extension(format!("tmp.{}", uuid::Uuid::new_v4()));
        {
            let mut tmp = fs::File::create(&tmp_path)?;
            tmp.write_all(&data)?;
            tmp.sync_all()?;
        }

        if let Err(e) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(())
    }

    pub fn exists(&self, key: &str) -> bool {
        self.doc_path(key).exists()
    }

    /// Delete a document. Returns false if it was already absent.
    pub fn remove(&self, key: &str) -> Result<bool, DocumentError> {
        match fs::remove_file(self.doc_path(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// List the keys of all documents inside a container directory.
    pub fn list(&self, container: &str) -> Result<Vec<String>, DocumentError> {
        let dir = self.root.join(container);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(stem) = name.strip_suffix(".json") {
                keys.push(format!("{container}/{stem}"));
            }
        }
        keys.sort();
        Ok(keys)
    }
}

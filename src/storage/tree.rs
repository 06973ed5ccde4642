//! Folder tree mutations.
//!
//! Every function here operates on one `UserDocument` already loaded
//! into memory; callers persist the document afterwards in a single
//! write. Keeping the mutations pure makes the consistency rules (no
//! orphans, no duplicate references, root is immortal) testable
//! without touching disk.

use std::collections::HashSet;

use chrono::Utc;

use super::models::{Folder, UserDocument, ROOT_FOLDER_ID};
use super::StoreError;
use crate::ident;

/// Everything contained in a folder, the folder itself included.
/// Produced before a cascading delete so physical files can be removed
/// first and the tree pruned in one atomic document write afterwards.
#[derive(Debug, Default, PartialEq)]
pub struct Subtree {
    pub folders: Vec<String>,
    pub files: Vec<String>,
}

impl Subtree {
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.files.is_empty()
    }
}

/// Create a folder under `parent_id` and return the new folder's id.
///
/// A missing parent is rejected rather than fabricated; silently
/// inventing a placeholder parent would detach the new folder from the
/// tree reachable from root.
pub fn create_folder(
    doc: &mut UserDocument,
    name: &str,
    parent_id: &str,
) -> Result<String, StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::Validation("folder name must not be empty".into()));
    }
    if !doc.folders.contains_key(parent_id) {
        return Err(StoreError::FolderNotFound(parent_id.to_string()));
    }

    let now = Utc::now();
    let folder_id = ident::generate_id();
    doc.folders
        .insert(folder_id.clone(), Folder::new(folder_id.clone(), name, now));

    // Checked above; the parent cannot have vanished between the two lookups.
    if let Some(parent) = doc.folders.get_mut(parent_id) {
        parent.subfolders.push(folder_id.clone());
        parent.modified_at = now;
    }

    Ok(folder_id)
}

/// Rename a folder, stamping `modified_at`.
pub fn rename_folder(
    doc: &mut UserDocument,
    folder_id: &str,
    name: &str,
) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::Validation("folder name must not be empty".into()));
    }
    let folder = doc
        .folders
        .get_mut(folder_id)
        .ok_or_else(|| StoreError::FolderNotFound(folder_id.to_string()))?;
    folder.name = name.to_string();
    folder.modified_at = Utc::now();
    Ok(())
}

/// Collect the ids of `folder_id` and every descendant folder, plus all
/// files transitively contained.
///
/// Iterative worklist traversal: no call-stack recursion, and the
/// `seen` set keeps a corrupted document (cycle, duplicated edge) from
/// looping or double-counting. An absent `folder_id` yields an empty
/// subtree.
pub fn collect_subtree(doc: &UserDocument, folder_id: &str) -> Subtree {
    let mut subtree = Subtree::default();
    let mut seen: HashSet<String> = HashSet::new();
    let mut pending = vec![folder_id.to_string()];

    while let Some(id) = pending.pop() {
        if !seen.insert(id.clone()) {
            continue;
        }
        let Some(folder) = doc.folders.get(&id) else {
            continue;
        };
        subtree.files.extend(folder.files.iter().cloned());
        pending.extend(folder.subfolders.iter().cloned());
        subtree.folders.push(id);
    }

    subtree
}

/// Remove a previously collected subtree from the document and detach
/// its top folder from `parent_id`.
///
/// This is the last step of a cascading delete: callers dispose of the
/// contained files first, then prune the tree in one document write.
/// Removing an already-absent folder is a no-op, so a retried delete
/// succeeds. The root folder is never removable.
pub fn detach_subtree(
    doc: &mut UserDocument,
    folder_id: &str,
    parent_id: &str,
    subtree: &Subtree,
) -> Result<(), StoreError> {
    if folder_id == ROOT_FOLDER_ID {
        return Err(StoreError::Validation("the root folder cannot be deleted".into()));
    }

    for id in &subtree.folders {
        doc.folders.remove(id);
    }

    if let Some(parent) = doc.folders.get_mut(parent_id) {
        let before = parent.subfolders.len();
        parent.subfolders.retain(|id| id != folder_id);
        if parent.subfolders.len() != before {
            parent.modified_at = Utc::now();
        }
    }

    Ok(())
}

/// Reference `file_id` from a folder, idempotently: a file already
/// listed is left alone so a retried upload cannot duplicate it.
pub fn add_file(doc: &mut UserDocument, folder_id: &str, file_id: &str) -> Result<(), StoreError> {
    let folder = doc
        .folders
        .get_mut(folder_id)
        .ok_or_else(|| StoreError::FolderNotFound(folder_id.to_string()))?;

    if !folder.files.iter().any(|id| id == file_id) {
        folder.files.push(file_id.to_string());
        folder.modified_at = Utc::now();
    }
    Ok(())
}

/// Drop `file_id` from a folder's file list, preserving the order of
/// the remaining entries. Returns whether anything was removed; an
/// absent folder or file is a no-op.
pub fn remove_file(doc: &mut UserDocument, folder_id: &str, file_id: &str) -> bool {
    let Some(folder) = doc.folders.get_mut(folder_id) else {
        return false;
    };

    let before = folder.files.len();
    folder.files.retain(|id| id != file_id);
    let removed = folder.files.len() != before;
    if removed {
        folder.modified_at = Utc::now();
    }
    removed
}

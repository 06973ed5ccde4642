use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Folder id of the tree root every user document starts with.
pub const ROOT_FOLDER_ID: &str = "root";

/// Display name given to the root folder at registration.
pub const ROOT_FOLDER_NAME: &str = "My Gallery";

/// Upload allow-list, grouped by media kind. Anything outside these
/// extensions is rejected before any bytes touch disk.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "aac", "m4a", "flac"];

/// Classification of an upload derived from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Image,
    Video,
}

impl MediaKind {
    /// Classify a lowercase file extension, or `None` when the
    /// extension is not on the allow-list.
    pub fn from_extension(ext: &str) -> Option<Self> {
        if IMAGE_EXTENSIONS.contains(&ext) {
            Some(MediaKind::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            Some(MediaKind::Video)
        } else if AUDIO_EXTENSIONS.contains(&ext) {
            Some(MediaKind::Audio)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// Lightweight directory entry, one per registered user.
///
/// The directory (`users.json`) exists for uniqueness checks and
/// username lookup; everything else lives in the user's own document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntry {
    pub id: String,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Per-user preferences, carried in the user document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub theme: String,
    pub language: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            language: "en".to_string(),
        }
    }
}

/// One folder in a user's tree.
///
/// Children are referenced by id only; the parent is not stored, so
/// callers that detach a folder must know (or scan for) its parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    pub files: Vec<String>,
    pub subfolders: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Folder {
    pub fn new(id: impl Into<String>, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            files: Vec::new(),
            subfolders: Vec::new(),
            created_at: now,
            modified_at: now,
        }
    }
}

/// The full per-user document: credentials plus the whole folder tree.
///
/// This is the unit of atomic read-modify-write for every tree
/// mutation. Invariant: `folders` always contains `root`, and every
/// other folder is reachable from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub folders: HashMap<String, Folder>,
    #[serde(default)]
    pub settings: Settings,
}

impl UserDocument {
    pub fn new(
        id: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut folders = HashMap::new();
        folders.insert(
            ROOT_FOLDER_ID.to_string(),
            Folder::new(ROOT_FOLDER_ID, ROOT_FOLDER_NAME, now),
        );
        Self {
            id: id.into(),
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            created_at: now,
            folders,
            settings: Settings::default(),
        }
    }
}

/// Metadata for one uploaded file, stored as its own document so it can
/// be fetched without loading the owner's tree.
///
/// `folder_id` is a denormalized pointer to the owning folder; the
/// folder's `files` list is authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
    /// Storage key of the physical bytes, relative to the upload root.
    pub path: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub folder_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: String,
    /// Open-ended enrichment (capture date, camera, dimensions, format,
    /// media type, ...) merged in by the metadata-extraction step.
    #[serde(flatten)]
    pub enrichment: HashMap<String, serde_json::Value>,
}

/// Partial update for a file record. Absent fields are preserved;
/// enrichment keys are merged over the existing map.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub enrichment: HashMap<String, serde_json::Value>,
}

impl FilePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.tags.is_none()
            && self.notes.is_none()
            && self.enrichment.is_empty()
    }
}

/// A shareable link to one folder. All shares live in a single global
/// registry document keyed by `share_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRecord {
    pub share_id: String,
    /// Capability secret, independent of the id. Both are required to
    /// resolve the share.
    pub token: String,
    pub url: String,
    pub user_id: String,
    pub folder_id: String,
    pub protected_download: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_kind_from_extension() {
        assert_eq!(MediaKind::from_extension("jpg"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_extension("webp"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_extension("mkv"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_extension("flac"), Some(MediaKind::Audio));
        assert_eq!(MediaKind::from_extension("exe"), None);
        assert_eq!(MediaKind::from_extension("pdf"), None);
        assert_eq!(MediaKind::from_extension(""), None);
    }

    #[test]
    fn new_document_has_empty_root() {
        let doc = UserDocument::new("u1", "alice", "a@example.com", "$hash", Utc::now());
        let root = doc.folders.get(ROOT_FOLDER_ID).expect("root folder");
        assert!(root.files.is_empty());
        assert!(root.subfolders.is_empty());
        assert_eq!(root.name, ROOT_FOLDER_NAME);
    }

    #[test]
    fn file_record_serializes_mime_as_type() {
        let now = Utc::now();
        let record = FileRecord {
            id: "f1".into(),
            name: "photo.jpg".into(),
            mime_type: "image/jpeg".into(),
            size: 10,
            path: "u1/f1_photo.jpg".into(),
            created_at: now,
            modified_at: now,
            folder_id: "root".into(),
            description: String::new(),
            tags: vec![],
            notes: String::new(),
            enrichment: HashMap::new(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "image/jpeg");
        assert_eq!(json["folderId"], "root");
    }
}

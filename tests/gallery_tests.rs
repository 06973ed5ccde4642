use std::sync::Arc;

use bytes::Bytes;
use gallery_manager::object_store::LocalStore;
use gallery_manager::service::{Gallery, GalleryError};
use gallery_manager::storage::models::{FilePatch, ROOT_FOLDER_ID};
use gallery_manager::storage::{Store, StoreError};

fn test_gallery() -> (tempfile::TempDir, Gallery) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path().join("data")).unwrap();
    let objects = LocalStore::new(dir.path().join("uploads")).unwrap();
    let gallery = Gallery::new(store, Arc::new(objects), "http://localhost:8080");
    (dir, gallery)
}

fn upload_path(dir: &tempfile::TempDir, storage_key: &str) -> std::path::PathBuf {
    dir.path().join("uploads").join(storage_key)
}

fn assert_store_err(result: Result<impl std::fmt::Debug, GalleryError>, check: fn(&StoreError) -> bool) {
    match result {
        Err(GalleryError::Store(ref e)) if check(e) => {}
        other => panic!("unexpected result: {other:?}"),
    }
}

// ============================================================================
// Accounts
// ============================================================================

#[tokio::test]
async fn test_register_creates_account_with_empty_root() {
    let (_dir, gallery) = test_gallery();

    let entry = gallery
        .register("alice", "alice@example.com", "Passw0rd!")
        .unwrap();
    assert!(!entry.id.is_empty());
    assert_eq!(entry.username, "alice");
    assert_eq!(entry.email, "alice@example.com");

    let document = gallery.user_document(&entry.id).unwrap();
    let root = document.folders.get(ROOT_FOLDER_ID).unwrap();
    assert!(root.files.is_empty());
    assert!(root.subfolders.is_empty());
    // The stored hash is never the raw password.
    assert!(document.password_hash.starts_with("$argon2id$"));
}

#[tokio::test]
async fn test_register_rejects_duplicates() {
    let (_dir, gallery) = test_gallery();
    gallery
        .register("alice", "alice@example.com", "Passw0rd!")
        .unwrap();

    assert_store_err(
        gallery.register("alice", "new@example.com", "Passw0rd!"),
        |e| matches!(e, StoreError::DuplicateUser),
    );
    assert_store_err(
        gallery.register("alice2", "alice@example.com", "Passw0rd!"),
        |e| matches!(e, StoreError::DuplicateUser),
    );
}

#[tokio::test]
async fn test_register_validates_input() {
    let (_dir, gallery) = test_gallery();

    assert_store_err(gallery.register("", "a@example.com", "Passw0rd!"), |e| {
        matches!(e, StoreError::Validation(_))
    });
    assert_store_err(gallery.register("bob", "not-an-email", "Passw0rd!"), |e| {
        matches!(e, StoreError::Validation(_))
    });
    assert_store_err(gallery.register("bob", "b@example.com", "short"), |e| {
        matches!(e, StoreError::Validation(_))
    });
}

#[tokio::test]
async fn test_login() {
    let (_dir, gallery) = test_gallery();
    let entry = gallery
        .register("alice", "alice@example.com", "Passw0rd!")
        .unwrap();

    let logged_in = gallery.login("alice", "Passw0rd!").unwrap();
    assert_eq!(logged_in.id, entry.id);

    assert_store_err(gallery.login("alice", "WrongPassword"), |e| {
        matches!(e, StoreError::InvalidCredentials)
    });
    assert_store_err(gallery.login("nobody", "Passw0rd!"), |e| {
        matches!(e, StoreError::NoSuchUser)
    });
}

// ============================================================================
// Folders
// ============================================================================

#[tokio::test]
async fn test_create_and_delete_folder() {
    let (_dir, gallery) = test_gallery();
    let user = gallery
        .register("alice", "alice@example.com", "Passw0rd!")
        .unwrap();

    let f1 = gallery.create_folder(&user.id, "Trip", ROOT_FOLDER_ID).unwrap();
    let document = gallery.user_document(&user.id).unwrap();
    assert_eq!(
        document.folders.get(ROOT_FOLDER_ID).unwrap().subfolders,
        vec![f1.clone()]
    );

    let outcome = gallery
        .delete_folder(&user.id, &f1, ROOT_FOLDER_ID)
        .await
        .unwrap();
    assert_eq!(outcome.folders_removed, 1);

    let document = gallery.user_document(&user.id).unwrap();
    assert!(document.folders.get(ROOT_FOLDER_ID).unwrap().subfolders.is_empty());
    assert!(!document.folders.contains_key(&f1));
}

#[tokio::test]
async fn test_create_folder_under_missing_parent() {
    let (_dir, gallery) = test_gallery();
    let user = gallery
        .register("alice", "alice@example.com", "Passw0rd!")
        .unwrap();

    assert_store_err(
        gallery.create_folder(&user.id, "Orphan", "no-such-folder"),
        |e| matches!(e, StoreError::FolderNotFound(_)),
    );
}

#[tokio::test]
async fn test_delete_folder_is_idempotent() {
    let (_dir, gallery) = test_gallery();
    let user = gallery
        .register("alice", "alice@example.com", "Passw0rd!")
        .unwrap();
    let f1 = gallery.create_folder(&user.id, "Trip", ROOT_FOLDER_ID).unwrap();

    gallery
        .delete_folder(&user.id, &f1, ROOT_FOLDER_ID)
        .await
        .unwrap();

    // Second delete of the same id: no-op success.
    let outcome = gallery
        .delete_folder(&user.id, &f1, ROOT_FOLDER_ID)
        .await
        .unwrap();
    assert_eq!(outcome.folders_removed, 0);
    assert_eq!(outcome.files_removed, 0);
}

#[tokio::test]
async fn test_root_folder_is_not_deletable() {
    let (_dir, gallery) = test_gallery();
    let user = gallery
        .register("alice", "alice@example.com", "Passw0rd!")
        .unwrap();

    let result = gallery
        .delete_folder(&user.id, ROOT_FOLDER_ID, ROOT_FOLDER_ID)
        .await;
    assert_store_err(result, |e| matches!(e, StoreError::Validation(_)));
    assert!(gallery
        .user_document(&user.id)
        .unwrap()
        .folders
        .contains_key(ROOT_FOLDER_ID));
}

#[tokio::test]
async fn test_rename_folder() {
    let (_dir, gallery) = test_gallery();
    let user = gallery
        .register("alice", "alice@example.com", "Passw0rd!")
        .unwrap();
    let f1 = gallery.create_folder(&user.id, "Trip", ROOT_FOLDER_ID).unwrap();

    gallery.rename_folder(&user.id, &f1, "Summer 2026").unwrap();

    let document = gallery.user_document(&user.id).unwrap();
    assert_eq!(document.folders.get(&f1).unwrap().name, "Summer 2026");
}

// ============================================================================
// Uploads
// ============================================================================

#[tokio::test]
async fn test_upload_stores_bytes_record_and_folder_entry() {
    let (dir, gallery) = test_gallery();
    let user = gallery
        .register("alice", "alice@example.com", "Passw0rd!")
        .unwrap();

    let record = gallery
        .upload_file(
            &user.id,
            ROOT_FOLDER_ID,
            "beach.jpg",
            Some("image/jpeg"),
            Bytes::from_static(b"fake jpeg bytes"),
        )
        .await
        .unwrap();

    assert_eq!(record.name, "beach.jpg");
    assert_eq!(record.mime_type, "image/jpeg");
    assert_eq!(record.size, 15);
    assert_eq!(record.folder_id, ROOT_FOLDER_ID);

    // Bytes on disk under the user's upload directory.
    assert!(upload_path(&dir, &record.path).exists());

    // Record fetchable independently of the tree.
    let fetched = gallery.file_record(&record.id).unwrap();
    assert_eq!(fetched.name, "beach.jpg");

    // Folder references the file.
    let document = gallery.user_document(&user.id).unwrap();
    assert_eq!(
        document.folders.get(ROOT_FOLDER_ID).unwrap().files,
        vec![record.id.clone()]
    );
}

#[tokio::test]
async fn test_upload_rejects_disallowed_extension() {
    let (dir, gallery) = test_gallery();
    let user = gallery
        .register("alice", "alice@example.com", "Passw0rd!")
        .unwrap();

    let result = gallery
        .upload_file(
            &user.id,
            ROOT_FOLDER_ID,
            "payload.exe",
            Some("application/octet-stream"),
            Bytes::from_static(b"MZ"),
        )
        .await;
    assert_store_err(result, |e| matches!(e, StoreError::UnsupportedType(ext) if ext == "exe"));

    // No bytes were written and no record created.
    assert!(!dir.path().join("uploads").join(&user.id).exists());
    let document = gallery.user_document(&user.id).unwrap();
    assert!(document.folders.get(ROOT_FOLDER_ID).unwrap().files.is_empty());
}

#[tokio::test]
async fn test_upload_guesses_mime_from_filename() {
    let (_dir, gallery) = test_gallery();
    let user = gallery
        .register("alice", "alice@example.com", "Passw0rd!")
        .unwrap();

    let record = gallery
        .upload_file(
            &user.id,
            ROOT_FOLDER_ID,
            "clip.mp4",
            Some("application/octet-stream"),
            Bytes::from_static(b"0000"),
        )
        .await
        .unwrap();

    assert_eq!(record.mime_type, "video/mp4");
    // Audio/video uploads carry built-in enrichment.
    assert_eq!(record.enrichment.get("format").unwrap(), &serde_json::json!("MP4"));
    assert_eq!(
        record.enrichment.get("mediaType").unwrap(),
        &serde_json::json!("video")
    );
}

#[tokio::test]
async fn test_upload_strips_directory_components() {
    let (_dir, gallery) = test_gallery();
    let user = gallery
        .register("alice", "alice@example.com", "Passw0rd!")
        .unwrap();

    let record = gallery
        .upload_file(
            &user.id,
            ROOT_FOLDER_ID,
            "../../../etc/evil.png",
            Some("image/png"),
            Bytes::from_static(b"png"),
        )
        .await
        .unwrap();

    assert_eq!(record.name, "evil.png");
    assert!(record.path.starts_with(&user.id));
}

#[tokio::test]
async fn test_upload_into_missing_folder() {
    let (_dir, gallery) = test_gallery();
    let user = gallery
        .register("alice", "alice@example.com", "Passw0rd!")
        .unwrap();

    let result = gallery
        .upload_file(
            &user.id,
            "no-such-folder",
            "a.jpg",
            None,
            Bytes::from_static(b"x"),
        )
        .await;
    assert_store_err(result, |e| matches!(e, StoreError::FolderNotFound(_)));
}

// ============================================================================
// File metadata
// ============================================================================

#[tokio::test]
async fn test_update_file_metadata() {
    let (_dir, gallery) = test_gallery();
    let user = gallery
        .register("alice", "alice@example.com", "Passw0rd!")
        .unwrap();
    let record = gallery
        .upload_file(
            &user.id,
            ROOT_FOLDER_ID,
            "sunset.jpg",
            Some("image/jpeg"),
            Bytes::from_static(b"jpeg"),
        )
        .await
        .unwrap();

    let patch = FilePatch {
        description: Some("Golden hour at the pier".to_string()),
        tags: Some(vec!["sunset".to_string(), "sea".to_string()]),
        ..FilePatch::default()
    };
    let updated = gallery.update_file(&record.id, &patch).unwrap();

    assert_eq!(updated.description, "Golden hour at the pier");
    assert_eq!(updated.tags, vec!["sunset".to_string(), "sea".to_string()]);
    assert_eq!(updated.name, "sunset.jpg");
}

#[tokio::test]
async fn test_update_file_rejects_empty_patch() {
    let (_dir, gallery) = test_gallery();
    let result = gallery.update_file("any", &FilePatch::default());
    assert_store_err(result, |e| matches!(e, StoreError::Validation(_)));
}

#[tokio::test]
async fn test_delete_file_removes_bytes_record_and_reference() {
    let (dir, gallery) = test_gallery();
    let user = gallery
        .register("alice", "alice@example.com", "Passw0rd!")
        .unwrap();
    let record = gallery
        .upload_file(
            &user.id,
            ROOT_FOLDER_ID,
            "a.jpg",
            None,
            Bytes::from_static(b"x"),
        )
        .await
        .unwrap();

    assert!(gallery
        .delete_file(&user.id, ROOT_FOLDER_ID, &record.id)
        .await
        .unwrap());

    assert!(!upload_path(&dir, &record.path).exists());
    assert_store_err(gallery.file_record(&record.id), |e| {
        matches!(e, StoreError::FileNotFound)
    });
    let document = gallery.user_document(&user.id).unwrap();
    assert!(document.folders.get(ROOT_FOLDER_ID).unwrap().files.is_empty());

    // Retrying the delete is a no-op success.
    assert!(!gallery
        .delete_file(&user.id, ROOT_FOLDER_ID, &record.id)
        .await
        .unwrap());
}

// ============================================================================
// Cascading folder deletion
// ============================================================================

#[tokio::test]
async fn test_delete_folder_disposes_contained_files() {
    let (dir, gallery) = test_gallery();
    let user = gallery
        .register("alice", "alice@example.com", "Passw0rd!")
        .unwrap();
    let f1 = gallery.create_folder(&user.id, "Trip", ROOT_FOLDER_ID).unwrap();

    let first = gallery
        .upload_file(&user.id, &f1, "a.jpg", None, Bytes::from_static(b"a"))
        .await
        .unwrap();
    let second = gallery
        .upload_file(&user.id, &f1, "b.mp3", None, Bytes::from_static(b"b"))
        .await
        .unwrap();

    let outcome = gallery
        .delete_folder(&user.id, &f1, ROOT_FOLDER_ID)
        .await
        .unwrap();
    assert_eq!(outcome.folders_removed, 1);
    assert_eq!(outcome.files_removed, 2);

    // Physical bytes and records are gone; the tree no longer
    // references the folder.
    for record in [&first, &second] {
        assert!(!upload_path(&dir, &record.path).exists());
        assert!(matches!(
            gallery.file_record(&record.id),
            Err(GalleryError::Store(StoreError::FileNotFound))
        ));
    }
    let document = gallery.user_document(&user.id).unwrap();
    assert!(document.folders.get(ROOT_FOLDER_ID).unwrap().subfolders.is_empty());
}

#[tokio::test]
async fn test_delete_folder_cascades_into_nested_subfolders() {
    let (dir, gallery) = test_gallery();
    let user = gallery
        .register("alice", "alice@example.com", "Passw0rd!")
        .unwrap();
    let trip = gallery.create_folder(&user.id, "Trip", ROOT_FOLDER_ID).unwrap();
    let day1 = gallery.create_folder(&user.id, "Day 1", &trip).unwrap();
    let nested = gallery
        .upload_file(&user.id, &day1, "deep.png", None, Bytes::from_static(b"p"))
        .await
        .unwrap();

    let outcome = gallery
        .delete_folder(&user.id, &trip, ROOT_FOLDER_ID)
        .await
        .unwrap();
    assert_eq!(outcome.folders_removed, 2);
    assert_eq!(outcome.files_removed, 1);
    assert!(!upload_path(&dir, &nested.path).exists());

    let document = gallery.user_document(&user.id).unwrap();
    assert_eq!(document.folders.len(), 1);
}

// ============================================================================
// Shares
// ============================================================================

#[tokio::test]
async fn test_share_round_trip_with_protected_download() {
    let (_dir, gallery) = test_gallery();
    let user = gallery
        .register("alice", "alice@example.com", "Passw0rd!")
        .unwrap();
    let f1 = gallery.create_folder(&user.id, "Trip", ROOT_FOLDER_ID).unwrap();

    let share = gallery.create_share(&user.id, &f1, true).unwrap();
    assert!(share.url.starts_with("http://localhost:8080/share.html?id="));

    let resolved = gallery.resolve_share(&share.share_id, &share.token).unwrap();
    assert!(resolved.protected_download);
    assert_eq!(resolved.folder_id, f1);

    assert_store_err(gallery.resolve_share(&share.share_id, "wrong"), |e| {
        matches!(e, StoreError::InvalidShare)
    });
}

#[tokio::test]
async fn test_create_share_for_missing_folder() {
    let (_dir, gallery) = test_gallery();
    let user = gallery
        .register("alice", "alice@example.com", "Passw0rd!")
        .unwrap();

    assert_store_err(gallery.create_share(&user.id, "no-such-folder", false), |e| {
        matches!(e, StoreError::FolderNotFound(_))
    });
}

#[tokio::test]
async fn test_deleting_folder_invalidates_its_shares() {
    let (_dir, gallery) = test_gallery();
    let user = gallery
        .register("alice", "alice@example.com", "Passw0rd!")
        .unwrap();
    let f1 = gallery.create_folder(&user.id, "Trip", ROOT_FOLDER_ID).unwrap();
    let share = gallery.create_share(&user.id, &f1, false).unwrap();
    let root_share = gallery.create_share(&user.id, ROOT_FOLDER_ID, false).unwrap();

    let outcome = gallery
        .delete_folder(&user.id, &f1, ROOT_FOLDER_ID)
        .await
        .unwrap();
    assert_eq!(outcome.shares_removed, 1);

    assert_store_err(gallery.resolve_share(&share.share_id, &share.token), |e| {
        matches!(e, StoreError::InvalidShare)
    });
    // Shares of surviving folders keep working.
    assert!(gallery
        .resolve_share(&root_share.share_id, &root_share.token)
        .is_ok());
}

#[tokio::test]
async fn test_delete_share_ownership() {
    let (_dir, gallery) = test_gallery();
    let alice = gallery
        .register("alice", "alice@example.com", "Passw0rd!")
        .unwrap();
    let bob = gallery
        .register("bob", "bob@example.com", "Passw0rd!")
        .unwrap();
    let share = gallery.create_share(&alice.id, ROOT_FOLDER_ID, false).unwrap();

    assert_store_err(gallery.delete_share(&share.share_id, &bob.id), |e| {
        matches!(e, StoreError::PermissionDenied)
    });
    assert!(gallery.resolve_share(&share.share_id, &share.token).is_ok());

    gallery.delete_share(&share.share_id, &alice.id).unwrap();
    assert!(gallery.list_shares(&alice.id).unwrap().is_empty());
}

// ============================================================================
// Content serving
// ============================================================================

#[tokio::test]
async fn test_file_content_round_trip() {
    let (_dir, gallery) = test_gallery();
    let user = gallery
        .register("alice", "alice@example.com", "Passw0rd!")
        .unwrap();
    let record = gallery
        .upload_file(
            &user.id,
            ROOT_FOLDER_ID,
            "song.flac",
            None,
            Bytes::from_static(b"flac-bytes"),
        )
        .await
        .unwrap();

    let (fetched, data) = gallery.file_content(&record.id).await.unwrap();
    assert_eq!(fetched.id, record.id);
    assert_eq!(data, Bytes::from_static(b"flac-bytes"));
}

#[tokio::test]
async fn test_file_content_not_found() {
    let (_dir, gallery) = test_gallery();
    let result = gallery.file_content("missing").await;
    assert!(matches!(
        result,
        Err(GalleryError::Store(StoreError::FileNotFound))
    ));
}

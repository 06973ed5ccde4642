mod admin;
mod auth;
mod files;
mod folders;
mod shares;
mod users;

use crate::api::response::ApiError;
use crate::service::GalleryError;
use crate::storage::StoreError;

pub use admin::{admin_purge, health};
pub use auth::{login, register};
pub use files::{delete_file, get_file, serve_content, update_file, upload_files};
pub use folders::{create_folder, delete_folder, rename_folder};
pub use shares::{create_share, delete_share, get_share, list_shares};
pub use users::{get_user, update_email};

/// Map a service-layer error to its JSend representation.
fn gallery_error(e: GalleryError) -> ApiError {
    match e {
        GalleryError::Store(e) => match e {
            StoreError::Validation(message) => ApiError::bad_request(message),
            StoreError::UserNotFound => ApiError::not_found("User not found"),
            StoreError::NoSuchUser => ApiError::not_found("No user with that username"),
            StoreError::FileNotFound => ApiError::not_found("File not found"),
            StoreError::FolderNotFound(id) => ApiError::not_found(format!("Folder '{id}' not found")),
            StoreError::ShareNotFound => ApiError::not_found("Share not found"),
            StoreError::DuplicateUser => {
                ApiError::conflict("Username or email is already registered")
            }
            StoreError::InvalidCredentials => ApiError::unauthorized("Invalid username or password"),
            StoreError::PermissionDenied => ApiError::forbidden("You do not own this share"),
            StoreError::InvalidShare => ApiError::invalid_share("Invalid share link"),
            StoreError::UnsupportedType(ext) => {
                ApiError::unsupported_type(format!("File type '{ext}' is not allowed"))
            }
            StoreError::Document(e) => ApiError::internal(e.to_string()),
        },
        GalleryError::Objects(e) => match e {
            crate::object_store::ObjectStoreError::NotFound(_) => {
                ApiError::not_found("File content not found")
            }
            other => ApiError::internal(other.to_string()),
        },
    }
}

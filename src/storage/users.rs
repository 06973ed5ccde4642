use chrono::Utc;

use super::models::{UserDocument, UserEntry};
use super::{Store, StoreError, USERS_CONTAINER, USER_INDEX_KEY};
use crate::ident;

fn user_doc_key(user_id: &str) -> String {
    format!("{USERS_CONTAINER}/{user_id}")
}

impl Store {
    // ========================================================================
    // User directory + user documents
    // ========================================================================

    /// Register a user: append to the directory and create the user's
    /// document with its root folder.
    ///
    /// Uniqueness of username AND email is re-checked against the
    /// freshly loaded directory inside the same read-modify-write
    /// cycle; a separate pre-check would race with another writer.
    pub fn register_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<UserEntry, StoreError> {
        debug_assert!(!username.is_empty(), "username must not be empty");
        debug_assert!(!email.is_empty(), "email must not be empty");

        let _guard = self.lock_index();

        let mut entries: Vec<UserEntry> = self.docs().read(USER_INDEX_KEY)?.unwrap_or_default();
        if entries
            .iter()
            .any(|u| u.username == username || u.email == email)
        {
            return Err(StoreError::DuplicateUser);
        }

        let now = Utc::now();
        let user_id = ident::generate_id();
        let entry = UserEntry {
            id: user_id.clone(),
            username: username.to_string(),
            email: email.to_string(),
            created_at: now,
        };
        let document = UserDocument::new(&user_id, username, email, password_hash, now);

        entries.push(entry.clone());
        self.docs().write(USER_INDEX_KEY, &entries)?;
        self.docs().write(&user_doc_key(&user_id), &document)?;

        Ok(entry)
    }

    pub fn find_user_by_username(&self, username: &str) -> Result<Option<UserEntry>, StoreError> {
        let entries: Vec<UserEntry> = self.docs().read(USER_INDEX_KEY)?.unwrap_or_default();
        Ok(entries.into_iter().find(|u| u.username == username))
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<UserEntry>, StoreError> {
        let entries: Vec<UserEntry> = self.docs().read(USER_INDEX_KEY)?.unwrap_or_default();
        Ok(entries.into_iter().find(|u| u.email == email))
    }

    /// Change a user's email in the directory and their document.
    ///
    /// The two writes are not atomic with each other; the directory is
    /// written first so uniqueness is never violated even if the
    /// document write fails afterwards.
    pub fn update_email(&self, user_id: &str, new_email: &str) -> Result<(), StoreError> {
        if new_email.trim().is_empty() || !new_email.contains('@') {
            return Err(StoreError::Validation("a valid email address is required".into()));
        }

        let _guard = self.lock_index();

        let mut entries: Vec<UserEntry> = self.docs().read(USER_INDEX_KEY)?.unwrap_or_default();
        if entries
            .iter()
            .any(|u| u.email == new_email && u.id != user_id)
        {
            return Err(StoreError::DuplicateUser);
        }
        let entry = entries
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(StoreError::UserNotFound)?;
        entry.email = new_email.to_string();
        self.docs().write(USER_INDEX_KEY, &entries)?;

        let mut document = self.user_document(user_id)?;
        document.email = new_email.to_string();
        self.write_user_document(&document)?;

        Ok(())
    }

    /// Load a user's full document.
    pub fn user_document(&self, user_id: &str) -> Result<UserDocument, StoreError> {
        self.docs()
            .read(&user_doc_key(user_id))?
            .ok_or(StoreError::UserNotFound)
    }

    /// Persist a user document, fully replacing the previous version.
    pub fn write_user_document(&self, document: &UserDocument) -> Result<(), StoreError> {
        debug_assert!(
            document.folders.contains_key(super::models::ROOT_FOLDER_ID),
            "user document must keep its root folder"
        );
        self.docs().write(&user_doc_key(&document.id), document)?;
        Ok(())
    }
}

use std::collections::HashMap;

use chrono::Utc;
use subtle::ConstantTimeEq;

use super::models::ShareRecord;
use super::{Store, StoreError, SHARES_KEY};
use crate::ident;

type Registry = HashMap<String, ShareRecord>;

impl Store {
    // ========================================================================
    // Share registry
    // ========================================================================

    /// Create a share for one of `user_id`'s folders.
    ///
    /// The capability token is generated independently of the share id:
    /// resolving a share requires both.
    pub fn create_share(
        &self,
        user_id: &str,
        folder_id: &str,
        protected_download: bool,
        public_url: &str,
    ) -> Result<ShareRecord, StoreError> {
        let _guard = self.lock_shares();

        let mut registry: Registry = self.docs().read(SHARES_KEY)?.unwrap_or_default();

        let share_id = ident::generate_id();
        let token = ident::generate_token();
        let record = ShareRecord {
            url: format!("{public_url}/share.html?id={share_id}&token={token}"),
            share_id: share_id.clone(),
            token,
            user_id: user_id.to_string(),
            folder_id: folder_id.to_string(),
            protected_download,
            created_at: Utc::now(),
        };

        registry.insert(share_id, record.clone());
        self.docs().write(SHARES_KEY, &registry)?;

        Ok(record)
    }

    /// Resolve a share from its id/token pair.
    ///
    /// The token comparison is constant-time; a wrong id and a wrong
    /// token are indistinguishable to the caller.
    pub fn resolve_share(&self, share_id: &str, token: &str) -> Result<ShareRecord, StoreError> {
        let registry: Registry = self.docs().read(SHARES_KEY)?.unwrap_or_default();
        let record = registry.get(share_id).ok_or(StoreError::InvalidShare)?;

        let stored = record.token.as_bytes();
        let supplied = token.as_bytes();
        if stored.len() != supplied.len() || stored.ct_eq(supplied).unwrap_u8() != 1 {
            return Err(StoreError::InvalidShare);
        }

        Ok(record.clone())
    }

    /// List all shares created by one user, newest first.
    pub fn shares_by_owner(&self, user_id: &str) -> Result<Vec<ShareRecord>, StoreError> {
        let registry: Registry = self.docs().read(SHARES_KEY)?.unwrap_or_default();
        let mut shares: Vec<ShareRecord> = registry
            .into_values()
            .filter(|s| s.user_id == user_id)
            .collect();
        shares.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.share_id.cmp(&b.share_id)));
        Ok(shares)
    }

    /// Delete a share after checking the requester owns it.
    ///
    /// An absent share is `ShareNotFound`; an ownership mismatch is
    /// `PermissionDenied` and leaves the share intact.
    pub fn delete_share(&self, share_id: &str, requester_id: &str) -> Result<(), StoreError> {
        let _guard = self.lock_shares();

        let mut registry: Registry = self.docs().read(SHARES_KEY)?.unwrap_or_default();
        let record = registry.get(share_id).ok_or(StoreError::ShareNotFound)?;
        if record.user_id != requester_id {
            return Err(StoreError::PermissionDenied);
        }

        registry.remove(share_id);
        self.docs().write(SHARES_KEY, &registry)?;
        Ok(())
    }

    /// Drop every share owned by `user_id` that targets one of the
    /// given folders. Invoked when a folder subtree is deleted so its
    /// links stop resolving. Returns how many shares were removed.
    pub fn prune_shares_for_folders(
        &self,
        user_id: &str,
        folder_ids: &[String],
    ) -> Result<u64, StoreError> {
        let _guard = self.lock_shares();

        let mut registry: Registry = self.docs().read(SHARES_KEY)?.unwrap_or_default();
        let before = registry.len();
        registry.retain(|_, s| !(s.user_id == user_id && folder_ids.contains(&s.folder_id)));
        let removed = (before - registry.len()) as u64;

        if removed > 0 {
            self.docs().write(SHARES_KEY, &registry)?;
        }
        Ok(removed)
    }
}

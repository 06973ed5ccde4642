use chrono::Utc;

use super::models::{FilePatch, FileRecord};
use super::{Store, StoreError, FILES_CONTAINER};

fn file_doc_key(file_id: &str) -> String {
    format!("{FILES_CONTAINER}/{file_id}")
}

impl Store {
    // ========================================================================
    // File records
    // ========================================================================

    /// Persist a freshly created file record.
    ///
    /// Callers must have durably stored the physical bytes first; a
    /// record must never describe bytes that are not on disk yet.
    pub fn create_file_record(&self, record: &FileRecord) -> Result<(), StoreError> {
        debug_assert!(!record.id.is_empty(), "file id must not be empty");
        debug_assert!(!record.path.is_empty(), "file path must not be empty");

        self.docs().write(&file_doc_key(&record.id), record)?;
        Ok(())
    }

    /// Get a file record by id.
    pub fn file_record(&self, file_id: &str) -> Result<Option<FileRecord>, StoreError> {
        Ok(self.docs().read(&file_doc_key(file_id))?)
    }

    /// Merge a partial update onto an existing record.
    ///
    /// Fields absent from the patch are preserved; tags are replaced
    /// wholesale but deduplicated; enrichment keys are merged over the
    /// existing map. `modified_at` is always refreshed.
    pub fn update_file_record(
        &self,
        file_id: &str,
        patch: &FilePatch,
    ) -> Result<Option<FileRecord>, StoreError> {
        let Some(mut record) = self.file_record(file_id)? else {
            return Ok(None);
        };

        if let Some(ref name) = patch.name {
            record.name = name.clone();
        }
        if let Some(ref description) = patch.description {
            record.description = description.clone();
        }
        if let Some(ref tags) = patch.tags {
            let mut deduped: Vec<String> = Vec::with_capacity(tags.len());
            for tag in tags {
                if !deduped.contains(tag) {
                    deduped.push(tag.clone());
                }
            }
            record.tags = deduped;
        }
        if let Some(ref notes) = patch.notes {
            record.notes = notes.clone();
        }
        for (key, value) in &patch.enrichment {
            record.enrichment.insert(key.clone(), value.clone());
        }

        record.modified_at = Utc::now();
        self.docs().write(&file_doc_key(file_id), &record)?;
        Ok(Some(record))
    }

    /// Delete a file record. Returns false if it was already absent,
    /// which is not an error: deletes must be safely retryable.
    pub fn remove_file_record(&self, file_id: &str) -> Result<bool, StoreError> {
        Ok(self.docs().remove(&file_doc_key(file_id))?)
    }
}

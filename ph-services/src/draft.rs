//! Story form autosave.

use chrono::Utc;
use tracing::debug;

use ph_core::constants::keys;
use ph_core::error::PhResult;
use ph_models::{LocalStore, StoryDraft};

#[derive(Clone)]
pub struct DraftService {
    store: LocalStore,
}

impl DraftService {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// Save the form, stamping the save time. An empty form clears the draft.
    pub fn save(&self, mut draft: StoryDraft) -> PhResult<()> {
        if draft.is_empty() {
            return self.clear();
        }
        draft.saved_at = Some(Utc::now());
        self.store.kv_set_json(keys::STORY_DRAFT, &draft)?;
        debug!("story draft saved");
        Ok(())
    }

    pub fn load(&self) -> PhResult<Option<StoryDraft>> {
        self.store.kv_get_json(keys::STORY_DRAFT)
    }

    pub fn clear(&self) -> PhResult<()> {
        self.store.kv_delete(keys::STORY_DRAFT)?;
        Ok(())
    }
}

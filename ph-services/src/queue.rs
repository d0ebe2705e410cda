//! Pending-submission queue.
//!
//! Stories that could not be published yet wait here, in submission order,
//! until replay delivers them. The queue lives in the key-value store under
//! `pendingStories` so it survives restarts. If local storage is unavailable
//! it keeps working from process memory for the lifetime of the process.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use ph_core::constants::keys;
use ph_core::error::{PhError, PhResult};
use ph_models::{LocalStore, RecordId, Story};

#[derive(Clone)]
pub struct PendingQueue {
    store: LocalStore,
    /// Copy of the persisted list; the only copy when the store is down.
    /// Also serializes read-modify-write cycles.
    memory: Arc<Mutex<Vec<Story>>>,
}

impl PendingQueue {
    pub fn new(store: LocalStore) -> Self {
        Self {
            store,
            memory: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Whether the queue survives a restart.
    pub fn is_durable(&self) -> bool {
        self.store.is_available()
    }

    /// The persisted list, or the in-memory copy when the store is down.
    /// A persisted list that does not decode is an error, so that no write
    /// replaces stories queued by an earlier run.
    fn read(&self, memory: &[Story]) -> PhResult<Vec<Story>> {
        match self.store.kv_get_json::<Vec<Story>>(keys::PENDING_STORIES) {
            Ok(Some(items)) => Ok(items),
            Ok(None) => Ok(Vec::new()),
            Err(e) if e.is_storage() => Ok(memory.to_vec()),
            Err(e) => {
                warn!("persisted pending queue is unreadable, leaving it untouched: {e}");
                Err(e)
            }
        }
    }

    fn write(&self, memory: &mut Vec<Story>, items: Vec<Story>) {
        if let Err(e) = self.store.kv_set_json(keys::PENDING_STORIES, &items) {
            debug!("pending queue kept in memory only: {e}");
        }
        *memory = items;
    }

    /// Append a story. Returns the new queue length.
    ///
    /// A story already queued under the same id is replaced in place.
    pub async fn enqueue(&self, story: Story) -> PhResult<usize> {
        if !story.status.is_queued() {
            return Err(PhError::Internal(format!(
                "story {} has status {} and cannot be queued",
                story.id, story.status
            )));
        }

        let mut memory = self.memory.lock().await;
        let mut items = self.read(&memory)?;
        match items.iter_mut().find(|s| s.id == story.id) {
            Some(existing) => *existing = story.clone(),
            None => items.push(story.clone()),
        }
        let len = items.len();
        self.write(&mut memory, items);

        info!("queued story {} ({} pending)", story.id, len);
        Ok(len)
    }

    /// The queue in delivery order. Empty when the persisted list is unreadable.
    pub async fn snapshot(&self) -> Vec<Story> {
        let memory = self.memory.lock().await;
        self.read(&memory).unwrap_or_default()
    }

    pub async fn len(&self) -> usize {
        self.snapshot().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Remove a delivered story. Returns whether it was queued.
    pub async fn remove(&self, id: &RecordId) -> PhResult<bool> {
        let mut memory = self.memory.lock().await;
        let mut items = self.read(&memory)?;
        let before = items.len();
        items.retain(|s| &s.id != id);
        let removed = items.len() != before;
        if removed {
            self.write(&mut memory, items);
            debug!("removed story {id} from pending queue");
        }
        Ok(removed)
    }

    /// Drop every queued story, including an unreadable persisted list.
    pub async fn clear(&self) -> usize {
        let mut memory = self.memory.lock().await;
        let count = self.read(&memory).map(|items| items.len()).unwrap_or(0);
        self.write(&mut memory, Vec::new());
        if count > 0 {
            info!("cleared {count} stories from pending queue");
        }
        count
    }
}

//! First-visit flag.

use tracing::debug;

use ph_core::constants::keys;
use ph_models::LocalStore;

#[derive(Clone)]
pub struct VisitTracker {
    store: LocalStore,
}

impl VisitTracker {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// True until `mark_visited` succeeds. An unreadable store counts as a
    /// first visit.
    pub fn is_first_visit(&self) -> bool {
        !matches!(self.store.kv_get_bool(keys::HAS_VISITED), Ok(Some(true)))
    }

    pub fn mark_visited(&self) {
        if let Err(e) = self.store.kv_set_bool(keys::HAS_VISITED, true) {
            debug!("could not record visit: {e}");
        }
    }
}

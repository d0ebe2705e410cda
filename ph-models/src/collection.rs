//! The three named content collections and the records they hold.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::record_id::RecordId;

/// A named, id-keyed collection in the content store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Timeline,
    Stories,
    Benefits,
}

impl Collection {
    /// All collections, in load order.
    pub const ALL: [Collection; 3] = [Collection::Timeline, Collection::Stories, Collection::Benefits];

    /// Table backing this collection.
    pub fn table(&self) -> &'static str {
        match self {
            Collection::Timeline => "timeline",
            Collection::Stories => "stories",
            Collection::Benefits => "benefits",
        }
    }

}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

/// An entity stored in one of the content collections, keyed by its id.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection the record lives in.
    const COLLECTION: Collection;

    /// Primary key within the collection.
    fn record_id(&self) -> &RecordId;
}

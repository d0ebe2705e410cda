//! Benefit entry model.

use serde::{Deserialize, Serialize};

use crate::collection::{Collection, Record};
use crate::models::record_id::RecordId;

/// An entry on the "benefits of preschool education" page.
///
/// Only `id` is required; everything the server sends is preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benefit {
    pub id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Record for Benefit {
    const COLLECTION: Collection = Collection::Benefits;

    fn record_id(&self) -> &RecordId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benefit_keeps_extra_fields() {
        let json = serde_json::json!({
            "id": 2,
            "title": "Social skills",
            "icon": "handshake",
            "facts": ["sharing", "teamwork"]
        });
        let benefit: Benefit = serde_json::from_value(json).unwrap();
        assert_eq!(benefit.title.as_deref(), Some("Social skills"));
        assert!(benefit.description.is_none());
        assert_eq!(benefit.extra["icon"], "handshake");
    }
}

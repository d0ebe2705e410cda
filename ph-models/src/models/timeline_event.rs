//! Timeline event entity model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::collection::{Collection, Record};
use crate::models::record_id::RecordId;

/// A dated milestone in the history of the region's preschool education.
///
/// Timeline events come only from the content server (or the local mirror of
/// it) and are never edited on the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: RecordId,
    pub year: i32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Figures shown next to the event ("kindergartens": 12, "period": "1930s").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<BTreeMap<String, StatValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    /// Author of `quote`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// A statistics value: either a number or free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Number(serde_json::Number),
    Text(String),
}

impl std::fmt::Display for StatValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatValue::Number(n) => write!(f, "{n}"),
            StatValue::Text(s) => f.write_str(s),
        }
    }
}

impl TimelineEvent {
    /// First year of the decade this event falls in (1934 -> 1930).
    pub fn decade(&self) -> i32 {
        self.year.div_euclid(10) * 10
    }
}

impl Record for TimelineEvent {
    const COLLECTION: Collection = Collection::Timeline;

    fn record_id(&self) -> &RecordId {
        &self.id
    }
}

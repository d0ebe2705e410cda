//! Story entity model.
//!
//! Stories arrive from the content server (already published) or are
//! written by users through the submission form. Unknown JSON fields are kept
//! in `extra` so a story mirrored locally serializes back to what the server
//! sent.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::collection::{Collection, Record};
use crate::models::record_id::RecordId;

/// Publication state of a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryStatus {
    /// Submitted while online but not yet accepted by the server.
    Pending,
    /// Submitted while offline, waiting for connectivity.
    Offline,
    #[default]
    Published,
}

impl StoryStatus {
    /// Whether a story in this state belongs in the pending queue.
    pub fn is_queued(&self) -> bool {
        matches!(self, StoryStatus::Pending | StoryStatus::Offline)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StoryStatus::Pending => "pending",
            StoryStatus::Offline => "offline",
            StoryStatus::Published => "published",
        }
    }
}

impl std::fmt::Display for StoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A personal story about a kindergarten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: RecordId,
    pub author: String,
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub email: Option<String>,
    pub kindergarten: String,
    #[serde(
        default,
        deserialize_with = "lenient_year",
        skip_serializing_if = "Option::is_none"
    )]
    pub year: Option<i32>,
    #[serde(default)]
    pub role: String,
    #[serde(alias = "content")]
    pub text: String,
    /// Photo as a `data:image/...;base64,` URI.
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub photo: Option<String>,
    /// ISO-8601 timestamp or date.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub status: StoryStatus,
    #[serde(default)]
    pub privacy: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Story {
    /// Parsed `date`, accepting full RFC 3339 timestamps and bare dates.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&self.date) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }

    /// Optional title carried by server-provided stories.
    pub fn title(&self) -> Option<&str> {
        self.extra.get("title").and_then(|v| v.as_str())
    }

    /// First `max` characters of the text, for list views.
    pub fn excerpt(&self, max: usize) -> String {
        let mut chars = self.text.chars();
        let head: String = chars.by_ref().take(max).collect();
        if chars.next().is_some() {
            format!("{}...", head.trim_end())
        } else {
            head
        }
    }
}

impl Record for Story {
    const COLLECTION: Collection = Collection::Stories;

    fn record_id(&self) -> &RecordId {
        &self.id
    }
}

fn blank_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Year as a number, a numeric string, an empty string, or null.
fn lenient_year<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
    use serde::de::Error;

    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .and_then(|y| i32::try_from(y).ok())
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid year {n}"))),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<i32>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid year {s:?}"))),
        Some(other) => Err(D::Error::custom(format!("invalid year {other}"))),
    }
}

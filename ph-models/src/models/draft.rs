//! Autosaved story form state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Partially filled story form, saved so a reload does not lose the text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryDraft {
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub kindergarten: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl StoryDraft {
    /// True when no form field holds any text.
    pub fn is_empty(&self) -> bool {
        [&self.author, &self.kindergarten, &self.year, &self.role, &self.text]
            .iter()
            .all(|f| f.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_is_empty() {
        let mut draft = StoryDraft::default();
        assert!(draft.is_empty());
        draft.text = "  ".into();
        assert!(draft.is_empty());
        draft.author = "Vera".into();
        assert!(!draft.is_empty());
    }

    #[test]
    fn test_draft_uses_camel_case() {
        let draft = StoryDraft {
            saved_at: Some(Utc::now()),
            ..Default::default()
        };
        let json = serde_json::to_value(&draft).unwrap();
        assert!(json.get("savedAt").is_some());
    }
}

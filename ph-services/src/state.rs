//! In-memory content state shared by the services.

use std::cmp::Ordering;
use std::sync::Arc;

use tokio::sync::RwLock;

use ph_models::{Benefit, Story, TimelineEvent};

use crate::event_bus::{ContentCounts, LoadSource};

/// The three collections as currently displayed.
#[derive(Debug, Clone, Default)]
pub struct ContentState {
    pub timeline: Vec<TimelineEvent>,
    pub stories: Vec<Story>,
    pub benefits: Vec<Benefit>,
    /// Where the last load came from; `None` before the first load.
    pub source: Option<LoadSource>,
}

/// Handle to the shared state.
pub type SharedState = Arc<RwLock<ContentState>>;

pub fn new_shared_state() -> SharedState {
    Arc::new(RwLock::new(ContentState::default()))
}

impl ContentState {
    pub fn counts(&self) -> ContentCounts {
        ContentCounts {
            timeline: self.timeline.len(),
            stories: self.stories.len(),
            benefits: self.benefits.len(),
        }
    }

    /// Timeline ordered by year, ties broken by id.
    pub fn timeline_sorted(&self) -> Vec<TimelineEvent> {
        let mut events = self.timeline.clone();
        events.sort_by(|a, b| a.year.cmp(&b.year).then_with(|| a.id.cmp(&b.id)));
        events
    }

    /// Stories with the newest date first. Undated stories go last.
    pub fn stories_newest_first(&self) -> Vec<Story> {
        let mut stories = self.stories.clone();
        stories.sort_by(|a, b| match (a.timestamp(), b.timestamp()) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        stories
    }

    /// Replace the story with the same id, or append it.
    pub fn upsert_story(&mut self, story: Story) {
        match self.stories.iter_mut().find(|s| s.id == story.id) {
            Some(existing) => *existing = story,
            None => self.stories.push(story),
        }
    }
}

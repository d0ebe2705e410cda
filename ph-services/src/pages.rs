//! Page kinds and the data each one shows.

use ph_models::{Benefit, Story, StoryDraft, TimelineEvent};

use crate::event_bus::ContentCounts;

/// Every page of the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Home,
    History,
    Stories,
    AddStory,
    Benefits,
    About,
}

impl Page {
    pub const ALL: [Page; 6] = [
        Page::Home,
        Page::History,
        Page::Stories,
        Page::AddStory,
        Page::Benefits,
        Page::About,
    ];

    /// Parse a page from its URL slug. An empty slug is the home page.
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug.trim().trim_matches('/').trim_end_matches(".html") {
            "" | "home" | "index" => Some(Page::Home),
            "history" => Some(Page::History),
            "stories" => Some(Page::Stories),
            "add-story" => Some(Page::AddStory),
            "benefits" => Some(Page::Benefits),
            "about" => Some(Page::About),
            _ => None,
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Page::Home => "home",
            Page::History => "history",
            Page::Stories => "stories",
            Page::AddStory => "add-story",
            Page::Benefits => "benefits",
            Page::About => "about",
        }
    }
}

impl std::fmt::Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// What a page displays.
#[derive(Debug, Clone)]
pub enum PageView {
    Home {
        first_visit: bool,
        counts: ContentCounts,
        pending: usize,
    },
    /// Timeline ordered by year.
    History { timeline: Vec<TimelineEvent> },
    /// Stories, newest first.
    Stories { stories: Vec<Story> },
    AddStory {
        draft: Option<StoryDraft>,
        pending: usize,
    },
    Benefits { benefits: Vec<Benefit> },
    About,
}

impl PageView {
    pub fn page(&self) -> Page {
        match self {
            PageView::Home { .. } => Page::Home,
            PageView::History { .. } => Page::History,
            PageView::Stories { .. } => Page::Stories,
            PageView::AddStory { .. } => Page::AddStory,
            PageView::Benefits { .. } => Page::Benefits,
            PageView::About => Page::About,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_roundtrip() {
        for page in Page::ALL {
            assert_eq!(Page::from_slug(page.slug()), Some(page));
        }
    }

    #[test]
    fn test_slug_variants() {
        assert_eq!(Page::from_slug(""), Some(Page::Home));
        assert_eq!(Page::from_slug("/index.html"), Some(Page::Home));
        assert_eq!(Page::from_slug("add-story.html"), Some(Page::AddStory));
        assert_eq!(Page::from_slug("gallery"), None);
    }
}

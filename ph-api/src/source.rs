//! Collaborator seams used by the services.
//!
//! The loader, replay and connectivity probe depend on these traits rather
//! than on `ApiClient`, so tests (and alternative transports) can stand in
//! for the network.

use async_trait::async_trait;

use ph_core::error::PhResult;
use ph_models::{Benefit, Story, TimelineEvent};

use crate::client::ApiClient;

/// Where the three content collections come from.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch_timeline(&self) -> PhResult<Vec<TimelineEvent>>;
    async fn fetch_stories(&self) -> PhResult<Vec<Story>>;
    async fn fetch_benefits(&self) -> PhResult<Vec<Benefit>>;
}

/// Delivers one submitted story to the server. `Ok` means accepted.
#[async_trait]
pub trait StoryDelivery: Send + Sync {
    async fn deliver(&self, story: &Story) -> PhResult<()>;
}

/// Answers "can we reach the server right now?".
#[async_trait]
pub trait Reachability: Send + Sync {
    async fn is_reachable(&self) -> bool;
}

#[async_trait]
impl ContentSource for ApiClient {
    async fn fetch_timeline(&self) -> PhResult<Vec<TimelineEvent>> {
        self.timeline().await
    }

    async fn fetch_stories(&self) -> PhResult<Vec<Story>> {
        self.stories().await
    }

    async fn fetch_benefits(&self) -> PhResult<Vec<Benefit>> {
        self.benefits().await
    }
}

#[async_trait]
impl StoryDelivery for ApiClient {
    async fn deliver(&self, story: &Story) -> PhResult<()> {
        self.submit_story(story).await
    }
}

#[async_trait]
impl Reachability for ApiClient {
    async fn is_reachable(&self) -> bool {
        match self.health_check().await {
            Ok(latency) => {
                tracing::trace!("server reachable in {}ms", latency.as_millis());
                true
            }
            Err(e) => {
                tracing::debug!("server unreachable: {e}");
                false
            }
        }
    }
}

//! Static content resources: timeline, stories and benefits arrays.

use ph_core::error::PhResult;
use ph_models::{Benefit, Story, TimelineEvent};

use crate::client::ApiClient;

impl ApiClient {
    /// Fetch the timeline events array.
    pub async fn timeline(&self) -> PhResult<Vec<TimelineEvent>> {
        let path = self.routes().timeline.clone();
        self.get_json(&path).await
    }

    /// Fetch the published stories array.
    pub async fn stories(&self) -> PhResult<Vec<Story>> {
        let path = self.routes().stories.clone();
        self.get_json(&path).await
    }

    /// Fetch the benefits array.
    pub async fn benefits(&self) -> PhResult<Vec<Benefit>> {
        let path = self.routes().benefits.clone();
        self.get_json(&path).await
    }
}

//! Story submission endpoint.

use tracing::info;

use ph_core::error::PhResult;
use ph_models::Story;

use crate::client::ApiClient;

impl ApiClient {
    /// POST a story to the submission endpoint.
    pub async fn submit_story(&self, story: &Story) -> PhResult<()> {
        let path = self.routes().submit.clone();
        self.post_json(&path, story).await?;
        info!("story {} accepted by server", story.id);
        Ok(())
    }
}

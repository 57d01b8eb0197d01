//! Client for the per-session edit queue.

use std::time::Duration;

use async_trait::async_trait;

use vidchat_core::edit_queue::EditQueueSnapshot;

use crate::error::GatewayError;
use crate::http;
use crate::traits::EditQueueSource;

/// HTTP client for `GET {api_url}/edit-queue`.
pub struct EditQueueClient {
    client: reqwest::Client,
    api_url: String,
    timeout: Duration,
}

impl EditQueueClient {
    pub fn with_client(client: reqwest::Client, api_url: String, timeout: Duration) -> Self {
        Self {
            client,
            api_url,
            timeout,
        }
    }
}

#[async_trait]
impl EditQueueSource for EditQueueClient {
    async fn fetch(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<EditQueueSnapshot, GatewayError> {
        let response = self
            .client
            .get(format!("{}/edit-queue", self.api_url))
            .timeout(self.timeout)
            .query(&[("user_id", user_id), ("session_id", session_id)])
            .send()
            .await?;

        let snapshot: EditQueueSnapshot = http::parse_response(response).await?;
        tracing::debug!(
            session_id,
            edits = snapshot.edits.len(),
            active = snapshot.active_count(),
            "Fetched edit queue"
        );
        Ok(snapshot)
    }
}

//! Client for the editing agent endpoint.

use std::time::Duration;

use async_trait::async_trait;

use vidchat_core::agent_response::{self, AgentResponse};

use crate::error::GatewayError;
use crate::http;
use crate::traits::{AgentGateway, AgentRequest};

/// HTTP client for `POST {api_url}/call_ai_editor_agent`.
pub struct AgentClient {
    client: reqwest::Client,
    api_url: String,
    timeout: Duration,
}

impl AgentClient {
    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: String, timeout: Duration) -> Self {
        Self {
            client,
            api_url,
            timeout,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/call_ai_editor_agent", self.api_url)
    }
}

#[async_trait]
impl AgentGateway for AgentClient {
    /// Send one query. The body is decoded leniently: structured JSON,
    /// JSON-encoded JSON, or plain text all yield an [`AgentResponse`].
    async fn ask(&self, request: &AgentRequest) -> Result<AgentResponse, GatewayError> {
        tracing::debug!(
            session_id = %request.session_id,
            query_len = request.query.len(),
            "Calling editing agent"
        );

        let response = self
            .client
            .post(self.endpoint())
            .timeout(self.timeout)
            .json(request)
            .send()
            .await?;

        let body = http::read_text(response).await?;
        Ok(agent_response::decode_body(&body))
    }
}

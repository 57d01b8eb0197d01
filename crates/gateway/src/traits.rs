//! Gateway seams. The HTTP clients in this crate implement them; tests and
//! alternative front ends can substitute their own.

use async_trait::async_trait;

use vidchat_core::agent_response::AgentResponse;
use vidchat_core::edit_queue::EditQueueSnapshot;
use vidchat_core::session::{NewSession, Session, SessionVersion};
use vidchat_core::types::SessionPk;

use crate::error::GatewayError;

/// One query to the editing agent.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AgentRequest {
    pub query: String,
    pub feature_id: Option<String>,
    pub user_id: String,
    pub session_id: String,
}

/// Optional filters for listing sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionFilter {
    pub video_id: Option<String>,
    pub feature_id: Option<String>,
}

#[async_trait]
pub trait AgentGateway: Send + Sync {
    async fn ask(&self, request: &AgentRequest) -> Result<AgentResponse, GatewayError>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, session: &NewSession) -> Result<SessionPk, GatewayError>;

    async fn get(&self, user_id: &str, session_id: &str) -> Result<Session, GatewayError>;

    async fn list(&self, user_id: &str, filter: &SessionFilter)
        -> Result<Vec<Session>, GatewayError>;

    async fn update_state(
        &self,
        user_id: &str,
        session_id: &str,
        state: &serde_json::Value,
    ) -> Result<(), GatewayError>;

    async fn rename(
        &self,
        user_id: &str,
        session_id: &str,
        new_name: &str,
    ) -> Result<(), GatewayError>;

    async fn delete(&self, user_id: &str, session_id: &str) -> Result<(), GatewayError>;

    /// Returns the number of sessions deleted.
    async fn delete_all(&self, user_id: &str) -> Result<u64, GatewayError>;

    /// Snapshot the session at `video_url`; returns the new version id.
    async fn create_version(
        &self,
        session_pk: SessionPk,
        video_url: Option<&str>,
    ) -> Result<i64, GatewayError>;

    /// Versions ordered by version number, ascending.
    async fn versions(&self, session_pk: SessionPk) -> Result<Vec<SessionVersion>, GatewayError>;
}

#[async_trait]
pub trait EditQueueSource: Send + Sync {
    async fn fetch(&self, user_id: &str, session_id: &str)
        -> Result<EditQueueSnapshot, GatewayError>;
}

#[async_trait]
pub trait ExportService: Send + Sync {
    /// Publish `video_url`; returns the public URL.
    async fn export(&self, video_url: &str) -> Result<String, GatewayError>;
}

//! Client for the session store (`{api_url}/sessions/...`).
//!
//! Every endpoint takes its arguments as query parameters; only
//! `/sessions/update` carries a JSON body.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use vidchat_core::session::{NewSession, Session, SessionVersion};
use vidchat_core::types::SessionPk;

use crate::error::GatewayError;
use crate::http;
use crate::traits::{SessionFilter, SessionStore};

#[derive(Debug, Deserialize)]
struct CreateSessionResponse {
    session_pk: SessionPk,
}

#[derive(Debug, Deserialize)]
struct CreateVersionResponse {
    version_id: i64,
}

#[derive(Debug, Deserialize)]
struct DeleteAllResponse {
    deleted_count: u64,
}

/// HTTP client for the session store.
pub struct SessionStoreClient {
    client: reqwest::Client,
    api_url: String,
    timeout: Duration,
}

impl SessionStoreClient {
    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: String, timeout: Duration) -> Self {
        Self {
            client,
            api_url,
            timeout,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/sessions/{path}", self.api_url)
    }
}

/// Push `(key, value)` only when `value` is present and non-empty.
fn push_opt<'a>(
    params: &mut Vec<(&'static str, &'a str)>,
    key: &'static str,
    value: &'a Option<String>,
) {
    if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
        params.push((key, v));
    }
}

#[async_trait]
impl SessionStore for SessionStoreClient {
    async fn create(&self, session: &NewSession) -> Result<SessionPk, GatewayError> {
        let mut params = vec![
            ("user_id", session.user_id.as_str()),
            ("session_id", session.session_id.as_str()),
        ];
        push_opt(&mut params, "video_id", &session.video_id);
        push_opt(&mut params, "video_url", &session.video_url);
        push_opt(&mut params, "feature_id", &session.feature_id);

        let response = self
            .client
            .post(self.url("create"))
            .timeout(self.timeout)
            .query(&params)
            .send()
            .await?;

        let created: CreateSessionResponse = http::parse_response(response).await?;
        tracing::info!(
            session_id = %session.session_id,
            session_pk = created.session_pk,
            "Session created"
        );
        Ok(created.session_pk)
    }

    async fn get(&self, user_id: &str, session_id: &str) -> Result<Session, GatewayError> {
        let response = self
            .client
            .get(self.url("get"))
            .timeout(self.timeout)
            .query(&[("user_id", user_id), ("session_id", session_id)])
            .send()
            .await?;

        http::parse_response(response).await
    }

    async fn list(
        &self,
        user_id: &str,
        filter: &SessionFilter,
    ) -> Result<Vec<Session>, GatewayError> {
        let mut params = vec![("user_id", user_id)];
        push_opt(&mut params, "video_id", &filter.video_id);
        push_opt(&mut params, "feature_id", &filter.feature_id);

        let response = self
            .client
            .get(self.url("list"))
            .timeout(self.timeout)
            .query(&params)
            .send()
            .await?;

        http::parse_response(response).await
    }

    async fn update_state(
        &self,
        user_id: &str,
        session_id: &str,
        state: &serde_json::Value,
    ) -> Result<(), GatewayError> {
        let response = self
            .client
            .put(self.url("update"))
            .timeout(self.timeout)
            .query(&[("user_id", user_id), ("session_id", session_id)])
            .json(&serde_json::json!({ "state": state }))
            .send()
            .await?;

        http::check_status(response).await
    }

    async fn rename(
        &self,
        user_id: &str,
        session_id: &str,
        new_name: &str,
    ) -> Result<(), GatewayError> {
        let response = self
            .client
            .put(self.url("rename"))
            .timeout(self.timeout)
            .query(&[
                ("user_id", user_id),
                ("session_id", session_id),
                ("new_name", new_name),
            ])
            .send()
            .await?;

        http::check_status(response).await
    }

    async fn delete(&self, user_id: &str, session_id: &str) -> Result<(), GatewayError> {
        let response = self
            .client
            .delete(self.url("delete"))
            .timeout(self.timeout)
            .query(&[("user_id", user_id), ("session_id", session_id)])
            .send()
            .await?;

        http::check_status(response).await
    }

    async fn delete_all(&self, user_id: &str) -> Result<u64, GatewayError> {
        let response = self
            .client
            .delete(self.url("delete-all"))
            .timeout(self.timeout)
            .query(&[("user_id", user_id)])
            .send()
            .await?;

        let deleted: DeleteAllResponse = http::parse_response(response).await?;
        tracing::info!(user_id, deleted = deleted.deleted_count, "Deleted all sessions");
        Ok(deleted.deleted_count)
    }

    async fn create_version(
        &self,
        session_pk: SessionPk,
        video_url: Option<&str>,
    ) -> Result<i64, GatewayError> {
        let pk = session_pk.to_string();
        let mut params = vec![("session_pk", pk.as_str())];
        if let Some(url) = video_url.filter(|u| !u.is_empty()) {
            params.push(("video_url", url));
        }

        let response = self
            .client
            .post(self.url("version"))
            .timeout(self.timeout)
            .query(&params)
            .send()
            .await?;

        let created: CreateVersionResponse = http::parse_response(response).await?;
        Ok(created.version_id)
    }

    async fn versions(&self, session_pk: SessionPk) -> Result<Vec<SessionVersion>, GatewayError> {
        let response = self
            .client
            .get(self.url("versions"))
            .timeout(self.timeout)
            .query(&[("session_pk", session_pk)])
            .send()
            .await?;

        let mut versions: Vec<SessionVersion> = http::parse_response(response).await?;
        versions.sort_by_key(|v| v.version_number);
        Ok(versions)
    }
}

//! Client for the export service.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::http;
use crate::traits::ExportService;

#[derive(Debug, Serialize)]
struct ExportRequest<'a> {
    video_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ExportResponse {
    public_url: String,
}

/// HTTP client for `POST {export_url}/export`.
pub struct ExportClient {
    client: reqwest::Client,
    export_url: String,
    timeout: Duration,
}

impl ExportClient {
    pub fn with_client(client: reqwest::Client, export_url: String, timeout: Duration) -> Self {
        Self {
            client,
            export_url,
            timeout,
        }
    }
}

#[async_trait]
impl ExportService for ExportClient {
    async fn export(&self, video_url: &str) -> Result<String, GatewayError> {
        let response = self
            .client
            .post(format!("{}/export", self.export_url))
            .timeout(self.timeout)
            .json(&ExportRequest { video_url })
            .send()
            .await?;

        let exported: ExportResponse = http::parse_response(response).await?;
        tracing::info!(public_url = %exported.public_url, "Video exported");
        Ok(exported.public_url)
    }
}

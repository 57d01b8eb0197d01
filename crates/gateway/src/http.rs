//! Response helpers shared by every client in this crate.

use crate::error::GatewayError;

/// Ensure the response has a success status code. Returns the response
/// unchanged on success, or a [`GatewayError::Api`] carrying the status and
/// body text on failure.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(GatewayError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

/// Parse a successful JSON response body into the expected type.
pub(crate) async fn parse_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, GatewayError> {
    let response = ensure_success(response).await?;
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Read a successful response body as text.
pub(crate) async fn read_text(response: reqwest::Response) -> Result<String, GatewayError> {
    let response = ensure_success(response).await?;
    Ok(response.text().await?)
}

/// Assert the response has a success status code, discarding the body.
pub(crate) async fn check_status(response: reqwest::Response) -> Result<(), GatewayError> {
    ensure_success(response).await?;
    Ok(())
}

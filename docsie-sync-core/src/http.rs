//! Response handling shared by the HTTP clients.

use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::error::{truncate_str, Error, Result};

const ERROR_PREVIEW_CHARS: usize = 200;

/// Passes 2xx responses through; anything else becomes [`Error::Api`]
/// carrying a preview of the body.
pub async fn ensure_success(endpoint: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(
        endpoint,
        status = status.as_u16(),
        "Request rejected by remote API"
    );
    Err(Error::Api {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
        message: truncate_str(&body, ERROR_PREVIEW_CHARS),
    })
}

/// Checks the status, then decodes the body as JSON.
pub async fn read_json<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T> {
    let response = ensure_success(endpoint, response).await?;
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|source| {
        tracing::debug!(
            endpoint,
            body = %truncate_str(&body, 500),
            "Failed to parse response"
        );
        Error::Parse {
            endpoint: endpoint.to_string(),
            source,
        }
    })
}

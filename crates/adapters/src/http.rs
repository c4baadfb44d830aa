//! Shared HTTP plumbing for platform adapters

use alt_texter_domain::PlatformError;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default request timeout for platform APIs
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub(crate) fn build_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .expect("Failed to build HTTP client")
}

pub(crate) fn network_error(error: reqwest::Error) -> PlatformError {
    if error.is_timeout() {
        PlatformError::Network(format!("Request timed out: {}", error))
    } else {
        PlatformError::Network(error.to_string())
    }
}

/// Map non-success statuses onto platform errors, carrying status and body
pub(crate) async fn ensure_success(response: Response) -> Result<Response, PlatformError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(PlatformError::Auth(format!("{}: {}", status, body)))
        }
        StatusCode::TOO_MANY_REQUESTS => Err(PlatformError::RateLimited(body)),
        _ => Err(PlatformError::Http {
            status: status.as_u16(),
            body,
        }),
    }
}

pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, PlatformError> {
    let response = ensure_success(response).await?;
    response
        .json()
        .await
        .map_err(|e| PlatformError::InvalidFormat(e.to_string()))
}

/// Trim a trailing slash so paths can be appended with `/`
pub(crate) fn normalize_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

//! Shared reqwest plumbing: client construction and error mapping.

use std::time::Duration;

use paperdesk_shared::{PaperdeskError, Result};
use reqwest::{Client, Response};
use serde::Deserialize;

/// User-Agent string for all outgoing requests.
pub const USER_AGENT: &str = concat!("Paperdesk/", env!("CARGO_PKG_VERSION"));

/// Error body shape used by the backend: `{ "error": "..." }`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Build a reqwest client with appropriate settings.
pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| PaperdeskError::Transport(format!("failed to build HTTP client: {e}")))
}

/// Join a base URL and an absolute API path without doubling slashes.
pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Map a send failure to a transport error.
pub(crate) fn transport(url: &str, err: reqwest::Error) -> PaperdeskError {
    PaperdeskError::Transport(format!("{url}: {err}"))
}

/// Pass 2xx responses through; turn anything else into a service error,
/// preferring the server-supplied message.
pub(crate) async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .map(|b| b.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("HTTP {status}"));

    Err(PaperdeskError::service(Some(status.as_u16()), message))
}

/// Decode a JSON body, treating a malformed payload as a transport failure.
pub(crate) async fn decode<T: serde::de::DeserializeOwned>(url: &str, response: Response) -> Result<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| PaperdeskError::Transport(format!("{url}: invalid response body: {e}")))
}

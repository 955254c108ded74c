//! Shared HTTP plumbing for the API clients

use envlink_core::{constants::USER_AGENT, Error, Result};
use reqwest::StatusCode;
use std::time::Duration;

/// Client for Google APIs: public roots, per-request timeout, our user agent
pub(crate) fn api_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| Error::configuration(format!("failed to build HTTP client: {e}")))
}

/// Fully read a response body. The body is always drained, whatever the status.
pub(crate) async fn read_body(
    response: reqwest::Response,
) -> std::result::Result<(StatusCode, Vec<u8>), reqwest::Error> {
    let status = response.status();
    let body = response.bytes().await?;
    Ok((status, body.to_vec()))
}

/// Short description of a transport failure
pub(crate) fn describe(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timed out: {error}")
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else {
        error.to_string()
    }
}

/// First bytes of an error body, for log context
pub(crate) fn snippet(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    match text.char_indices().nth(200) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

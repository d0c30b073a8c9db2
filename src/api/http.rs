//! HTTP utilities for UpCloud REST API calls

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde_json::Value;

use crate::error::ApiError;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Per-request timeout; waits are bounded separately by the state waiter
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Username/password pair for HTTP basic auth
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// HTTP client wrapper for UpCloud API calls
#[derive(Clone)]
pub struct ApiHttpClient {
    client: Client,
    credentials: Credentials,
}

impl ApiHttpClient {
    /// Create a new HTTP client
    pub fn new(credentials: Credentials) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("upctl/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            credentials,
        })
    }

    pub async fn get(&self, url: &str) -> Result<Value, ApiError> {
        tracing::debug!("GET {}", url);
        self.send(self.client.get(url)).await
    }

    pub async fn post(&self, url: &str, body: Option<&Value>) -> Result<Value, ApiError> {
        tracing::debug!("POST {}", url);
        self.send(with_body(self.client.post(url), body)).await
    }

    pub async fn put(&self, url: &str, body: &Value) -> Result<Value, ApiError> {
        tracing::debug!("PUT {}", url);
        self.send(self.client.put(url).json(body)).await
    }

    pub async fn patch(&self, url: &str, body: &Value) -> Result<Value, ApiError> {
        tracing::debug!("PATCH {}", url);
        self.send(self.client.patch(url).json(body)).await
    }

    pub async fn delete(&self, url: &str) -> Result<Value, ApiError> {
        tracing::debug!("DELETE {}", url);
        self.send(self.client.delete(url)).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, ApiError> {
        let response = request
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(status_error(status.as_u16(), &body));
        }

        // DELETE and some POSTs answer 204 with no body
        if body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

fn with_body(request: RequestBuilder, body: Option<&Value>) -> RequestBuilder {
    match body {
        Some(body) => request.json(body),
        None => request,
    }
}

/// Build a status error, pulling `error_code`/`error_message` out of the
/// API's error document when there is one
fn status_error(status: u16, body: &str) -> ApiError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().and_then(|v| v.get("error"));
    let field = |name: &str| {
        error
            .and_then(|e| e.get(name))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };

    ApiError::Status {
        status,
        code: field("error_code").unwrap_or_else(|| "UNKNOWN".to_string()),
        message: field("error_message").unwrap_or_else(|| "no error message".to_string()),
    }
}

/// Format an API error for display
pub fn format_api_error(error: &ApiError) -> String {
    match error {
        ApiError::Status { status: 401, .. } => {
            "Authentication failed. Check your UpCloud username and password.".to_string()
        }
        ApiError::Status { status: 403, .. } => {
            "Permission denied. Check the API permissions of your account.".to_string()
        }
        ApiError::Status { status: 404, .. } => "Resource not found.".to_string(),
        ApiError::Status { status: 429, .. } => {
            "Rate limit exceeded. Please try again later.".to_string()
        }
        ApiError::Status { status, .. } if *status >= 500 => {
            "UpCloud API temporarily unavailable. Please try again.".to_string()
        }
        // 400 and 409 carry actionable messages (e.g. SERVER_STATE_ILLEGAL)
        ApiError::Status { code, message, .. } => {
            let sanitized: String = message
                .chars()
                .filter(|c| c.is_ascii_graphic() || *c == ' ')
                .take(80)
                .collect();
            if sanitized.len() < message.len() {
                format!("{sanitized}... ({code})")
            } else {
                format!("{sanitized} ({code})")
            }
        }
        ApiError::Transport(_) => {
            "Request failed. Check your network connection and try again.".to_string()
        }
        ApiError::Decode(_) => "Unexpected response from the UpCloud API.".to_string(),
    }
}

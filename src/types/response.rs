//! Response-side types: transport output, raw responses and the API envelope

use serde::{Deserialize, Serialize};

use super::request::RetryableRequestInfo;
use crate::error::{ApiError, Result};

/// Status line and body text returned by a [`Transport`](crate::Transport)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl TransportResponse {
    /// Create a transport response
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Create a transport response with a JSON body
    #[must_use]
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

/// A transport response paired with the request that produced it
///
/// This is the value threaded through the response-interceptor chain. An
/// interceptor that re-issues the call returns a new `RawResponse`, which then
/// replaces the original for everything downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
    /// Replay metadata of the call that produced this response
    pub request: RetryableRequestInfo,
}

impl RawResponse {
    /// Pair a transport response with its request
    #[must_use]
    pub fn new(response: TransportResponse, request: RetryableRequestInfo) -> Self {
        Self {
            status: response.status,
            body: response.body,
            request,
        }
    }

    /// Whether the status line is 2xx
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the status line is 401
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

/// Standard `{code, message, data?}` body returned by every endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Application status code, independent of the HTTP status line
    pub code: i64,
    /// Human-readable status message
    #[serde(default)]
    pub message: String,
    /// Payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Whether `code` is in `[200, 300)`
    #[must_use]
    pub fn is_success(&self) -> bool {
        is_success_code(self.code)
    }

    /// Take the payload, failing when the server sent none
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Decode` if `data` was absent.
    pub fn into_data(self) -> Result<T> {
        self.data.ok_or_else(|| {
            ApiError::decode(
                format!("response {} carried no data: {}", self.code, self.message),
                None,
            )
        })
    }
}

/// Whether an application status code is in `[200, 300)`
#[must_use]
pub fn is_success_code(code: i64) -> bool {
    (200..300).contains(&code)
}

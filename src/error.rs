//! Error types for the Nailkit HTTP client

use std::time::Duration;

use thiserror::Error;

/// Code reported for failures that never produced an HTTP status.
pub const NO_STATUS_CODE: i64 = 0;

/// Code reported when the per-call deadline elapses.
pub const TIMEOUT_CODE: i64 = 408;

/// Code reported when the caller cancels a request.
pub const ABORTED_CODE: i64 = 499;

/// Error returned by every [`ApiClient`](crate::ApiClient) call.
///
/// Whatever the variant, callers can read the same `{code, message, payload}`
/// shape through [`code`](Self::code), [`message`](Self::message) and
/// [`payload`](Self::payload).
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport-level failure (connection refused, TLS, broken body)
    #[error("Network error: {0}")]
    Network(String),

    /// The per-call deadline elapsed before the transport answered
    #[error("Request timed out after {timeout_ms} ms: {url}")]
    Timeout {
        /// Deadline that elapsed, in milliseconds
        timeout_ms: u64,
        /// URL of the request
        url: String,
    },

    /// The caller's cancellation token fired
    #[error("Request aborted: {url}")]
    Aborted {
        /// URL of the request
        url: String,
    },

    /// Non-2xx response whose body is not a valid envelope
    #[error("HTTP {status}: {message}")]
    Http {
        /// HTTP status line code
        status: u16,
        /// Truncated response body
        message: String,
    },

    /// Well-formed envelope whose `code` is outside the success range
    #[error("Application error {code}: {message}")]
    Application {
        /// Envelope status code
        code: i64,
        /// Envelope message
        message: String,
        /// Envelope `data`, if any
        payload: Option<serde_json::Value>,
    },

    /// Response body could not be decoded
    #[error("Decode error: {message}")]
    Decode {
        /// What went wrong
        message: String,
        /// Raw body, when it was at least valid JSON
        payload: Option<serde_json::Value>,
    },

    /// Request body could not be encoded
    #[error("JSON encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An interceptor aborted its chain
    #[error("Interceptor error: {0}")]
    Interceptor(String),
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(timeout: Duration, url: impl Into<String>) -> Self {
        Self::Timeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            url: url.into(),
        }
    }

    /// Create an aborted error
    pub fn aborted(url: impl Into<String>) -> Self {
        Self::Aborted { url: url.into() }
    }

    /// Create an HTTP status error
    pub fn http(status: u16, msg: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: msg.into(),
        }
    }

    /// Create an application error from an envelope
    pub fn application(
        code: i64,
        msg: impl Into<String>,
        payload: Option<serde_json::Value>,
    ) -> Self {
        Self::Application {
            code,
            message: msg.into(),
            payload,
        }
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>, payload: Option<serde_json::Value>) -> Self {
        Self::Decode {
            message: msg.into(),
            payload,
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an interceptor error
    pub fn interceptor(msg: impl Into<String>) -> Self {
        Self::Interceptor(msg.into())
    }

    /// Numeric code of the uniform error shape
    #[must_use]
    pub fn code(&self) -> i64 {
        match self {
            Self::Timeout { .. } => TIMEOUT_CODE,
            Self::Aborted { .. } => ABORTED_CODE,
            Self::Http { status, .. } => i64::from(*status),
            Self::Application { code, .. } => *code,
            Self::Network(_)
            | Self::Decode { .. }
            | Self::Encode(_)
            | Self::InvalidConfig(_)
            | Self::Interceptor(_) => NO_STATUS_CODE,
        }
    }

    /// Human-readable message of the uniform error shape
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Http { message, .. }
            | Self::Application { message, .. }
            | Self::Decode { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Optional payload of the uniform error shape
    #[must_use]
    pub fn payload(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Application { payload, .. } | Self::Decode { payload, .. } => payload.as_ref(),
            _ => None,
        }
    }

    /// Whether the error is a transport failure, timeout or abort
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout { .. } | Self::Aborted { .. }
        )
    }

    /// Whether the error is a deadline expiry
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Whether the server rejected the call as unauthenticated
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.code() == 401
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

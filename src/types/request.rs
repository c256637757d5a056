//! Request-side types: options, methods, query values and replay metadata

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use typed_builder::TypedBuilder;

/// `Authorization` header name
pub const AUTHORIZATION: &str = "Authorization";

/// `Content-Type` header name
pub const CONTENT_TYPE: &str = "Content-Type";

/// Content type sent with every request
pub const JSON_CONTENT_TYPE: &str = "application/json";

// ============================================================================
// HTTP Method
// ============================================================================

/// HTTP method of an API call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// `GET` (default)
    #[default]
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl Method {
    /// Upper-case wire name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Query Values
// ============================================================================

/// Scalar value of a query-string entry
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    /// Text value
    String(String),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// Boolean value, rendered as `true` / `false`
    Bool(bool),
}

impl std::fmt::Display for QueryValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<String> for QueryValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for QueryValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<i64> for QueryValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for QueryValue {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<u32> for QueryValue {
    fn from(i: u32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for QueryValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for QueryValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

// ============================================================================
// Request Options
// ============================================================================

/// Options for one logical API call
///
/// ```
/// use nailkit_http::{Method, RequestOptions};
/// use std::time::Duration;
///
/// let options = RequestOptions::builder()
///     .endpoint("/nail-sets")
///     .method(Method::Get)
///     .timeout(Duration::from_secs(3))
///     .build()
///     .with_query("page", 1)
///     .with_query_opt("cursor", None::<String>);
/// assert_eq!(options.query.len(), 2);
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct RequestOptions {
    /// Path relative to the base URL, or an absolute URL
    #[builder(setter(into))]
    pub endpoint: String,

    /// HTTP method (default `GET`)
    #[builder(default)]
    pub method: Method,

    /// Extra headers, merged over the defaults
    #[builder(default)]
    pub headers: HashMap<String, String>,

    /// Ordered query entries; `None` values are omitted from the URL
    #[builder(default)]
    pub query: Vec<(String, Option<QueryValue>)>,

    /// JSON body
    #[builder(default, setter(strip_option))]
    pub body: Option<serde_json::Value>,

    /// Per-call deadline; falls back to the client default (10 s)
    #[builder(default, setter(strip_option))]
    pub timeout: Option<Duration>,

    /// Caller-owned abort signal
    #[builder(default, setter(strip_option))]
    pub cancel: Option<CancellationToken>,
}

impl RequestOptions {
    /// `GET` options for an endpoint with everything else defaulted
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::builder().endpoint(endpoint).build()
    }

    /// Set or replace a header
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Append a query entry
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.query.push((key.into(), Some(value.into())));
        self
    }

    /// Append a query entry that is omitted when `value` is `None`
    #[must_use]
    pub fn with_query_opt<V: Into<QueryValue>>(
        mut self,
        key: impl Into<String>,
        value: Option<V>,
    ) -> Self {
        self.query.push((key.into(), value.map(Into::into)));
        self
    }

    /// Look up a header case-insensitively
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Replace the `Authorization` header with a bearer token
    pub fn set_bearer(&mut self, token: &str) {
        set_bearer_header(&mut self.headers, token);
    }
}

// ============================================================================
// Replay Metadata
// ============================================================================

/// Everything needed to re-issue a call exactly as it was sent
///
/// Captured by the executor for every transport call and carried next to the
/// response so a 401 can be replayed with a fresh token. Bodies are stored as
/// serialized JSON text; streaming or multipart bodies are not replayable.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryableRequestInfo {
    /// Fully resolved URL, query string included
    pub url: String,
    /// HTTP method
    pub method: Method,
    /// Headers as sent
    pub headers: HashMap<String, String>,
    /// Serialized JSON body
    pub body: Option<String>,
    /// Deadline the call was sent with
    pub timeout: Duration,
}

impl RetryableRequestInfo {
    /// Look up a header case-insensitively
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Bearer token carried by this request, if any
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        self.header(AUTHORIZATION)
            .and_then(|value| value.strip_prefix("Bearer "))
    }

    /// Copy of this request with `Authorization` replaced by `token`
    #[must_use]
    pub fn with_bearer(&self, token: &str) -> Self {
        let mut replay = self.clone();
        set_bearer_header(&mut replay.headers, token);
        replay
    }
}

fn find_header<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

fn set_bearer_header(headers: &mut HashMap<String, String>, token: &str) {
    headers.retain(|key, _| !key.eq_ignore_ascii_case(AUTHORIZATION));
    headers.insert(AUTHORIZATION.to_string(), format!("Bearer {token}"));
}

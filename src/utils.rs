//! Utility functions for URL building and log-safe text
//!
//! Provides the percent-encoding used for query strings, base URL resolution,
//! and UTF-8 safe truncation for response bodies quoted in error messages.

use std::fmt::Write;

use crate::types::QueryValue;

/// Percent-encode a string for use in a query component.
///
/// Keeps the RFC 3986 unreserved set (`A-Z a-z 0-9 - _ . ~`) and encodes every
/// other byte as `%XX`.
///
/// # Example
/// ```
/// use nailkit_http::utils::percent_encode;
///
/// assert_eq!(percent_encode("gel & glitter"), "gel%20%26%20glitter");
/// ```
#[must_use]
pub fn percent_encode(s: &str) -> String {
    let mut result = String::with_capacity(s.len() * 3);
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => {
                let _ = write!(result, "%{byte:02X}");
            }
        }
    }
    result
}

/// Build a query string from ordered entries.
///
/// Entries whose value is `None` are omitted. Returns an empty string when
/// nothing remains, otherwise the encoded pairs joined by `&` (no leading `?`).
#[must_use]
pub fn encode_query(query: &[(String, Option<QueryValue>)]) -> String {
    query
        .iter()
        .filter_map(|(key, value)| {
            value
                .as_ref()
                .map(|v| format!("{}={}", percent_encode(key), percent_encode(&v.to_string())))
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Whether an endpoint is already an absolute `http(s)` URL
#[must_use]
pub fn is_absolute_url(endpoint: &str) -> bool {
    let lower = endpoint.get(..8).unwrap_or(endpoint).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Resolve an endpoint against a base URL.
///
/// Absolute endpoints are returned unchanged. Otherwise exactly one `/` joins
/// the base and the path.
///
/// # Example
/// ```
/// use nailkit_http::utils::resolve_url;
///
/// assert_eq!(resolve_url("https://api.test/", "/auth/reissue"), "https://api.test/auth/reissue");
/// assert_eq!(resolve_url("https://api.test", "https://cdn.test/x"), "https://cdn.test/x");
/// ```
#[must_use]
pub fn resolve_url(base_url: &str, endpoint: &str) -> String {
    if is_absolute_url(endpoint) {
        return endpoint.to_string();
    }
    let base = base_url.trim_end_matches('/');
    let path = endpoint.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    }
}

/// Append an encoded query string to a URL, respecting an existing `?`.
#[must_use]
pub fn append_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        url.to_string()
    } else if url.contains('?') {
        format!("{url}&{query}")
    } else {
        format!("{url}?{query}")
    }
}

/// Strip any query string or fragment from a URL.
#[must_use]
pub fn url_path_part(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

/// Safely truncate a string at a UTF-8 character boundary.
///
/// Returns a slice of at most `max_bytes` bytes, ensuring the result
/// is valid UTF-8 by finding the last valid character boundary.
#[inline]
#[must_use]
pub fn safe_truncate(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }

    let mut boundary = max_bytes;
    while boundary > 0 && !s.is_char_boundary(boundary) {
        boundary -= 1;
    }

    &s[..boundary]
}

/// Truncate a string for display with ellipsis.
///
/// # Example
/// ```
/// use nailkit_http::utils::truncate_for_display;
///
/// let text = "This is a long message";
/// let result = truncate_for_display(text, 10);
/// assert_eq!(result, "This is a ...");
/// ```
#[must_use]
pub fn truncate_for_display(s: &str, max_bytes: usize) -> String {
    let truncated = safe_truncate(s, max_bytes);
    if truncated.len() < s.len() {
        format!("{truncated}...")
    } else {
        truncated.to_string()
    }
}

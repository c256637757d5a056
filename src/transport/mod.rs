//! Transport layer for issuing raw HTTP calls
//!
//! This module provides the transport abstraction the executor and the auth
//! coordinator send requests through, plus the deadline/cancellation wrapper
//! every call goes through.

pub mod http;

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::error::{ApiError, Result};
use crate::types::{RetryableRequestInfo, TransportResponse};

/// Transport trait for issuing one raw HTTP call
///
/// Implementations send the request exactly as described and return the
/// status line and body text. Non-2xx statuses are *not* errors at this
/// layer; only failures to get a response at all are.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and read the full response body
    ///
    /// # Errors
    /// Returns `ApiError::Network` if no response could be obtained
    async fn send(&self, request: &RetryableRequestInfo) -> Result<TransportResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: &RetryableRequestInfo) -> Result<TransportResponse> {
        (**self).send(request).await
    }
}

/// Type alias for a shared transport.
pub type SharedTransport = Arc<dyn Transport>;

/// Wrapper to convert a closure into a `Transport`.
///
/// Useful for tests and for routing calls through platform networking.
///
/// ```
/// use nailkit_http::transport::FnTransport;
/// use nailkit_http::TransportResponse;
///
/// let transport = FnTransport::new(|request| {
///     Box::pin(async move {
///         Ok(TransportResponse::new(200, format!(r#"{{"code":200,"message":"{}"}}"#, request.url)))
///     })
/// });
/// ```
pub struct FnTransport<F>
where
    F: Fn(RetryableRequestInfo) -> BoxFuture<'static, Result<TransportResponse>> + Send + Sync,
{
    func: F,
}

impl<F> FnTransport<F>
where
    F: Fn(RetryableRequestInfo) -> BoxFuture<'static, Result<TransportResponse>> + Send + Sync,
{
    /// Create a new function-based transport.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F> Transport for FnTransport<F>
where
    F: Fn(RetryableRequestInfo) -> BoxFuture<'static, Result<TransportResponse>> + Send + Sync,
{
    async fn send(&self, request: &RetryableRequestInfo) -> Result<TransportResponse> {
        (self.func)(request.clone()).await
    }
}

/// Build a shared transport from an async closure.
pub fn transport_fn<F, Fut>(f: F) -> SharedTransport
where
    F: Fn(RetryableRequestInfo) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<TransportResponse>> + Send + 'static,
{
    Arc::new(FnTransport::new(move |request| {
        Box::pin(f(request)) as BoxFuture<'static, _>
    }))
}

/// Send a request bounded by its deadline and an optional abort signal.
///
/// The deadline timer and the transport future are both dropped when this
/// returns, whichever branch won.
///
/// # Errors
/// - `ApiError::Timeout` if `request.timeout` elapses first
/// - `ApiError::Aborted` if `cancel` fires first
/// - whatever the transport returned otherwise
pub async fn send_with_deadline(
    transport: &dyn Transport,
    request: &RetryableRequestInfo,
    cancel: Option<&CancellationToken>,
) -> Result<TransportResponse> {
    let aborted = async {
        match cancel {
            Some(token) => token.cancelled().await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        biased;
        () = aborted => {
            tracing::debug!(url = %request.url, "Request aborted by caller");
            Err(ApiError::aborted(&request.url))
        }
        outcome = tokio::time::timeout(request.timeout, transport.send(request)) => match outcome {
            Ok(result) => result,
            Err(_elapsed) => {
                tracing::warn!(
                    url = %request.url,
                    method = %request.method,
                    timeout = ?request.timeout,
                    "Request timed out"
                );
                Err(ApiError::timeout(request.timeout, &request.url))
            }
        },
    }
}

pub use http::ReqwestTransport;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Method;
    use std::collections::HashMap;
    use std::time::Duration;

    fn request(timeout_ms: u64) -> RetryableRequestInfo {
        RetryableRequestInfo {
            url: "https://api.test/slow".to_string(),
            method: Method::Get,
            headers: HashMap::new(),
            body: None,
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    fn never_answers() -> SharedTransport {
        transport_fn(|_request| async {
            std::future::pending::<()>().await;
            Ok::<_, ApiError>(TransportResponse::new(200, ""))
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_fires_for_stuck_transport() {
        let transport = never_answers();
        let started = tokio::time::Instant::now();

        let result = send_with_deadline(transport.as_ref(), &request(50), None).await;

        assert!(matches!(result, Err(ApiError::Timeout { timeout_ms: 50, .. })));
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_millis(60), "took {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_token_aborts_before_deadline() {
        let transport = never_answers();
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            trigger.cancel();
        });

        let result = send_with_deadline(transport.as_ref(), &request(10_000), Some(&token)).await;
        let err = tokio_test::assert_err!(result);
        assert!(matches!(err, ApiError::Aborted { .. }));
    }

    #[tokio::test]
    async fn test_fast_transport_wins() {
        let transport = transport_fn(|request| async move {
            Ok::<_, ApiError>(TransportResponse::new(201, request.url))
        });
        let response =
            tokio_test::assert_ok!(send_with_deadline(transport.as_ref(), &request(1_000), None).await);
        assert_eq!(response.status, 201);
        assert_eq!(response.body, "https://api.test/slow");
    }
}

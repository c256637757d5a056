//! Ordered request/response interceptor pipeline.
//!
//! Interceptors are async transforms run around every transport call. Request
//! interceptors see the [`RequestOptions`] before the URL is built; response
//! interceptors see the [`RawResponse`] before the body is parsed. Each stage
//! consumes its predecessor's output, in registration order.
//!
//! # Example: Implementing `RequestInterceptor`
//!
//! ```no_run
//! use nailkit_http::interceptors::RequestInterceptor;
//! use nailkit_http::{RequestOptions, Result};
//! use async_trait::async_trait;
//!
//! struct DeviceHeader;
//!
//! #[async_trait]
//! impl RequestInterceptor for DeviceHeader {
//!     async fn on_request(&self, options: RequestOptions) -> Result<RequestOptions> {
//!         Ok(options.with_header("X-Device", "ios"))
//!     }
//! }
//! ```
//!
//! # Example: Closures
//!
//! ```no_run
//! use nailkit_http::interceptors::{InterceptorRegistry, request_interceptor, response_interceptor};
//!
//! let registry = InterceptorRegistry::new();
//! registry.add_request_interceptor(request_interceptor(|options| async move {
//!     Ok(options.with_header("X-App-Version", "3.2.0"))
//! }));
//! registry.add_response_interceptor(response_interceptor(|response| async move {
//!     tracing::debug!(status = response.status, "response observed");
//!     Ok(response)
//! }));
//! ```

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::Result;
use crate::types::{RawResponse, RequestOptions};

// ============================================================================
// Interceptor Traits
// ============================================================================

/// Transform applied to every outgoing call.
///
/// Returning an error aborts the rest of the chain and fails the call.
#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    /// Observe or rewrite the options of an outgoing call.
    async fn on_request(&self, options: RequestOptions) -> Result<RequestOptions>;
}

/// Transform applied to every transport response.
///
/// An interceptor may return a different response (for example the result of
/// re-issuing the call); downstream stages and the executor then only see the
/// replacement.
#[async_trait]
pub trait ResponseInterceptor: Send + Sync {
    /// Observe or replace a response.
    async fn on_response(&self, response: RawResponse) -> Result<RawResponse>;
}

#[async_trait]
impl<T: RequestInterceptor + ?Sized> RequestInterceptor for Arc<T> {
    async fn on_request(&self, options: RequestOptions) -> Result<RequestOptions> {
        (**self).on_request(options).await
    }
}

#[async_trait]
impl<T: ResponseInterceptor + ?Sized> ResponseInterceptor for Arc<T> {
    async fn on_response(&self, response: RawResponse) -> Result<RawResponse> {
        (**self).on_response(response).await
    }
}

/// Type alias for a shared request interceptor.
pub type SharedRequestInterceptor = Arc<dyn RequestInterceptor>;

/// Type alias for a shared response interceptor.
pub type SharedResponseInterceptor = Arc<dyn ResponseInterceptor>;

// ============================================================================
// Closure-based wrappers
// ============================================================================

/// Wrapper to convert a closure into a `RequestInterceptor`.
pub struct FnRequestInterceptor<F>
where
    F: Fn(RequestOptions) -> BoxFuture<'static, Result<RequestOptions>> + Send + Sync,
{
    func: F,
}

impl<F> FnRequestInterceptor<F>
where
    F: Fn(RequestOptions) -> BoxFuture<'static, Result<RequestOptions>> + Send + Sync,
{
    /// Create a new function-based request interceptor.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F> RequestInterceptor for FnRequestInterceptor<F>
where
    F: Fn(RequestOptions) -> BoxFuture<'static, Result<RequestOptions>> + Send + Sync,
{
    async fn on_request(&self, options: RequestOptions) -> Result<RequestOptions> {
        (self.func)(options).await
    }
}

/// Wrapper to convert a closure into a `ResponseInterceptor`.
pub struct FnResponseInterceptor<F>
where
    F: Fn(RawResponse) -> BoxFuture<'static, Result<RawResponse>> + Send + Sync,
{
    func: F,
}

impl<F> FnResponseInterceptor<F>
where
    F: Fn(RawResponse) -> BoxFuture<'static, Result<RawResponse>> + Send + Sync,
{
    /// Create a new function-based response interceptor.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F> ResponseInterceptor for FnResponseInterceptor<F>
where
    F: Fn(RawResponse) -> BoxFuture<'static, Result<RawResponse>> + Send + Sync,
{
    async fn on_response(&self, response: RawResponse) -> Result<RawResponse> {
        (self.func)(response).await
    }
}

/// Build a shared request interceptor from an async closure.
pub fn request_interceptor<F, Fut>(f: F) -> SharedRequestInterceptor
where
    F: Fn(RequestOptions) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<RequestOptions>> + Send + 'static,
{
    Arc::new(FnRequestInterceptor::new(move |options| {
        Box::pin(f(options)) as BoxFuture<'static, _>
    }))
}

/// Build a shared response interceptor from an async closure.
pub fn response_interceptor<F, Fut>(f: F) -> SharedResponseInterceptor
where
    F: Fn(RawResponse) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<RawResponse>> + Send + 'static,
{
    Arc::new(FnResponseInterceptor::new(move |response| {
        Box::pin(f(response)) as BoxFuture<'static, _>
    }))
}

// ============================================================================
// Registry
// ============================================================================

/// Two append-only interceptor lists run as sequential pipelines.
///
/// Registration may happen at any time, including while calls are in flight;
/// a running chain works on the snapshot taken when it started.
#[derive(Default)]
pub struct InterceptorRegistry {
    request: RwLock<Vec<SharedRequestInterceptor>>,
    response: RwLock<Vec<SharedResponseInterceptor>>,
}

impl InterceptorRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a request interceptor to the end of the request chain
    pub fn add_request_interceptor(&self, interceptor: impl RequestInterceptor + 'static) {
        let mut chain = self.request.write().unwrap_or_else(PoisonError::into_inner);
        chain.push(Arc::new(interceptor));
        tracing::debug!(position = chain.len(), "Registered request interceptor");
    }

    /// Append a response interceptor to the end of the response chain
    pub fn add_response_interceptor(&self, interceptor: impl ResponseInterceptor + 'static) {
        let mut chain = self.response.write().unwrap_or_else(PoisonError::into_inner);
        chain.push(Arc::new(interceptor));
        tracing::debug!(position = chain.len(), "Registered response interceptor");
    }

    /// Number of registered request interceptors
    #[must_use]
    pub fn request_len(&self) -> usize {
        self.request.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Number of registered response interceptors
    #[must_use]
    pub fn response_len(&self) -> usize {
        self.response.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Run `options` through every request interceptor in order
    ///
    /// # Errors
    ///
    /// Returns the first interceptor error; later stages do not run.
    pub async fn run_request(&self, mut options: RequestOptions) -> Result<RequestOptions> {
        let chain = self
            .request
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for (stage, interceptor) in chain.iter().enumerate() {
            options = interceptor.on_request(options).await.inspect_err(|e| {
                tracing::debug!(stage, error = %e, "Request interceptor aborted the chain");
            })?;
        }
        Ok(options)
    }

    /// Run `response` through every response interceptor in order
    ///
    /// # Errors
    ///
    /// Returns the first interceptor error; later stages do not run.
    pub async fn run_response(&self, mut response: RawResponse) -> Result<RawResponse> {
        let chain = self
            .response
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for (stage, interceptor) in chain.iter().enumerate() {
            response = interceptor.on_response(response).await.inspect_err(|e| {
                tracing::debug!(stage, error = %e, "Response interceptor aborted the chain");
            })?;
        }
        Ok(response)
    }
}

impl std::fmt::Debug for InterceptorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorRegistry")
            .field("request", &self.request_len())
            .field("response", &self.response_len())
            .finish()
    }
}

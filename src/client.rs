//! `ApiClient` for issuing API calls through the interceptor pipeline
//!
//! Every call goes through the same steps:
//!
//! ```text
//! RequestOptions
//!   │  defaults (Content-Type, timeout)
//!   ▼
//! request interceptors ──▶ resolve URL + query ──▶ serialize body
//!                                                      │
//!                               transport (deadline / cancel-bound)
//!                                                      │
//! ApiResponse<T> ◀── envelope check ◀── response interceptors ◀┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use nailkit_http::{ApiClient, ClientConfig, ReqwestTransport, RequestOptions};
//!
//! # async fn example() -> nailkit_http::Result<()> {
//! let client = ApiClient::new(
//!     ClientConfig::builder().base_url("https://api.nailkit.test").build(),
//!     Arc::new(ReqwestTransport::new()),
//! );
//!
//! let options = RequestOptions::new("/nail-sets").with_query("page", 2);
//! let sets: Vec<serde_json::Value> = client.execute(options).await?.into_data()?;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::auth::{AuthCoordinator, SharedNavigator, SharedTokenStore};
use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::interceptors::{InterceptorRegistry, RequestInterceptor, ResponseInterceptor};
use crate::transport::{SharedTransport, send_with_deadline};
use crate::types::{
    ApiResponse, CONTENT_TYPE, JSON_CONTENT_TYPE, Method, RawResponse, RequestOptions,
    RetryableRequestInfo, is_success_code,
};
use crate::utils::{append_query, encode_query, truncate_for_display};

/// Longest body excerpt quoted in an `ApiError::Http` message
const MAX_ERROR_BODY: usize = 512;

/// Request executor
///
/// Cheap to clone; clones share the transport and the interceptor registry.
#[derive(Clone)]
pub struct ApiClient {
    config: ClientConfig,
    transport: SharedTransport,
    interceptors: Arc<InterceptorRegistry>,
}

impl ApiClient {
    /// Create a client with an empty interceptor registry
    #[must_use]
    pub fn new(config: ClientConfig, transport: SharedTransport) -> Self {
        Self {
            config,
            transport,
            interceptors: Arc::new(InterceptorRegistry::new()),
        }
    }

    /// Create a client with an [`AuthCoordinator`] installed as the first
    /// interceptor on both chains
    #[must_use]
    pub fn with_auth(
        config: ClientConfig,
        transport: SharedTransport,
        store: SharedTokenStore,
        navigator: SharedNavigator,
    ) -> (Self, AuthCoordinator) {
        let client = Self::new(config.clone(), transport.clone());
        let auth = AuthCoordinator::new(config, transport, store, navigator);
        auth.install(&client.interceptors);
        (client, auth)
    }

    /// Client configuration
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The interceptor registry shared by every clone of this client
    #[must_use]
    pub fn interceptors(&self) -> &InterceptorRegistry {
        &self.interceptors
    }

    /// Append a request interceptor
    pub fn add_request_interceptor(&self, interceptor: impl RequestInterceptor + 'static) {
        self.interceptors.add_request_interceptor(interceptor);
    }

    /// Append a response interceptor
    pub fn add_response_interceptor(&self, interceptor: impl ResponseInterceptor + 'static) {
        self.interceptors.add_response_interceptor(interceptor);
    }

    /// Execute one API call and decode its envelope
    ///
    /// Issues exactly one transport call, unless a response interceptor
    /// replaces the response (as the auth coordinator does when replaying a
    /// 401). Nothing is cached.
    ///
    /// # Errors
    ///
    /// - `ApiError::Interceptor` (or whatever an interceptor returned)
    /// - `ApiError::Encode` if the body cannot be serialized
    /// - `ApiError::Network`, `Timeout` or `Aborted` from the transport
    /// - `ApiError::Aborted` if the caller's token fires while an interceptor
    ///   is still working (for example waiting on a token refresh)
    /// - `ApiError::Application` if the envelope code is outside `[200, 300)`
    /// - `ApiError::Http` for a non-2xx response that is not an envelope
    /// - `ApiError::Decode` if a 2xx body or its `data` does not decode
    pub async fn execute<T: DeserializeOwned>(
        &self,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>> {
        let options = self.with_defaults(options);
        let cancel = options.cancel.clone();
        let target = self.config.resolve(&options.endpoint);
        let RequestOptions {
            endpoint,
            method,
            headers,
            query,
            body,
            timeout,
            cancel: _,
        } = abortable(cancel.as_ref(), &target, self.interceptors.run_request(options)).await?;

        let url = append_query(&self.config.resolve(&endpoint), &encode_query(&query));
        let body = body.as_ref().map(serde_json::to_string).transpose()?;
        let request = RetryableRequestInfo {
            url,
            method,
            headers,
            body,
            timeout: timeout.unwrap_or(self.config.default_timeout),
        };

        tracing::debug!(method = %request.method, url = %request.url, "Dispatching request");
        let response =
            send_with_deadline(self.transport.as_ref(), &request, cancel.as_ref()).await?;

        let url = request.url.clone();
        let response = abortable(
            cancel.as_ref(),
            &url,
            self.interceptors.run_response(RawResponse::new(response, request)),
        )
        .await?;

        tracing::debug!(
            method = %response.request.method,
            url = %response.request.url,
            status = response.status,
            "Request completed"
        );
        parse_envelope(&response)
    }

    /// `GET` an endpoint
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<ApiResponse<T>> {
        self.execute(RequestOptions::new(endpoint)).await
    }

    /// `DELETE` an endpoint
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<ApiResponse<T>> {
        self.execute(
            RequestOptions::builder()
                .endpoint(endpoint)
                .method(Method::Delete)
                .build(),
        )
        .await
    }

    /// `POST` a JSON body
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &impl Serialize,
    ) -> Result<ApiResponse<T>> {
        self.send_json(Method::Post, endpoint, body).await
    }

    /// `PUT` a JSON body
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn put<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &impl Serialize,
    ) -> Result<ApiResponse<T>> {
        self.send_json(Method::Put, endpoint, body).await
    }

    /// `PATCH` a JSON body
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn patch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &impl Serialize,
    ) -> Result<ApiResponse<T>> {
        self.send_json(Method::Patch, endpoint, body).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: &impl Serialize,
    ) -> Result<ApiResponse<T>> {
        let options = RequestOptions::builder()
            .endpoint(endpoint)
            .method(method)
            .body(serde_json::to_value(body)?)
            .build();
        self.execute(options).await
    }

    fn with_defaults(&self, mut options: RequestOptions) -> RequestOptions {
        if options.header(CONTENT_TYPE).is_none() {
            options
                .headers
                .insert(CONTENT_TYPE.to_string(), JSON_CONTENT_TYPE.to_string());
        }
        options.timeout.get_or_insert(self.config.default_timeout);
        options
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .field("interceptors", &self.interceptors)
            .finish_non_exhaustive()
    }
}

/// Run an interceptor chain until it finishes or the caller cancels.
///
/// Work the chain started elsewhere (such as a token refresh) is not stopped.
async fn abortable<T>(
    cancel: Option<&CancellationToken>,
    url: &str,
    chain: impl Future<Output = Result<T>>,
) -> Result<T> {
    let Some(token) = cancel else {
        return chain.await;
    };

    tokio::select! {
        biased;
        () = token.cancelled() => {
            tracing::debug!(url, "Request aborted by caller during interceptors");
            Err(ApiError::aborted(url))
        }
        result = chain => result,
    }
}

/// Decode the `{code, message, data?}` envelope of a final response.
fn parse_envelope<T: DeserializeOwned>(response: &RawResponse) -> Result<ApiResponse<T>> {
    let value: Value = match serde_json::from_str(&response.body) {
        Ok(value) => value,
        Err(e) => return Err(not_an_envelope(response, &e.to_string())),
    };

    let Some(code) = value.get("code").and_then(Value::as_i64) else {
        return Err(not_an_envelope(response, "missing numeric `code`"));
    };

    if !is_success_code(code) {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        tracing::debug!(code, %message, url = %response.request.url, "Application error");
        return Err(ApiError::application(code, message, value.get("data").cloned()));
    }

    serde_json::from_value(value.clone()).map_err(|e| {
        ApiError::decode(
            format!("unexpected data from {}: {e}", response.request.url),
            Some(value),
        )
    })
}

fn not_an_envelope(response: &RawResponse, reason: &str) -> ApiError {
    if response.is_success() {
        ApiError::decode(
            format!(
                "response from {} is not an API envelope: {reason}",
                response.request.url
            ),
            None,
        )
    } else {
        ApiError::http(
            response.status,
            truncate_for_display(&response.body, MAX_ERROR_BODY),
        )
    }
}

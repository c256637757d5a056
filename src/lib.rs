//! # Nailkit HTTP client core
//!
//! Typed API calls with an ordered interceptor pipeline and transparent
//! access-token refresh. Async/await, strong typing, tokio-based.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use nailkit_http::auth::{FileTokenStore, NavigationRef};
//! use nailkit_http::{ApiClient, ClientConfig, ReqwestTransport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (client, auth) = ApiClient::with_auth(
//!         ClientConfig::from_build_env()?,
//!         Arc::new(ReqwestTransport::new()),
//!         Arc::new(FileTokenStore::new()),
//!         Arc::new(NavigationRef::new()),
//!     );
//!     auth.initialize().await?;
//!
//!     let sets: Vec<serde_json::Value> = client.get("/nail-sets").await?.into_data()?;
//!     println!("{} nail sets", sets.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Core Features
//!
//! ### 1. Request execution with [`ApiClient`]
//!
//! [`ApiClient::execute`] resolves the endpoint against the base URL, encodes
//! the query, applies the per-call deadline and decodes the
//! `{code, message, data}` envelope into an [`ApiResponse`]. Failures of every
//! kind come back as one [`ApiError`] with a uniform `code`/`message`/`payload`.
//!
//! ```no_run
//! # use nailkit_http::{ApiClient, Method, RequestOptions};
//! # use std::time::Duration;
//! # async fn example(client: ApiClient) -> nailkit_http::Result<()> {
//! let options = RequestOptions::builder()
//!     .endpoint("/nail-sets")
//!     .method(Method::Get)
//!     .timeout(Duration::from_secs(3))
//!     .build()
//!     .with_query("page", 1);
//!
//! let page = client.execute::<serde_json::Value>(options).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ### 2. Interceptors
//!
//! Request interceptors see [`RequestOptions`] before dispatch, response
//! interceptors see the [`RawResponse`] (with the [`RetryableRequestInfo`] it
//! came from) before decoding. Both chains run strictly in registration order.
//!
//! ```no_run
//! # use nailkit_http::ApiClient;
//! # use nailkit_http::interceptors::request_interceptor;
//! # fn example(client: &ApiClient) {
//! client.add_request_interceptor(request_interceptor(|options| async move {
//!     Ok(options.with_header("X-App-Version", "3.1.0"))
//! }));
//! # }
//! ```
//!
//! ### 3. Authentication
//!
//! The [`AuthCoordinator`] attaches the bearer token to every call and, on a
//! 401, performs a single shared refresh and replays every failed call with
//! the new token. See the [`auth`] module.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod interceptors;
pub mod transport;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use auth::{AuthCoordinator, Navigator, TokenPair, TokenStore};
pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::{ApiError, Result};
pub use interceptors::{
    FnRequestInterceptor, FnResponseInterceptor, InterceptorRegistry, RequestInterceptor,
    ResponseInterceptor, SharedRequestInterceptor, SharedResponseInterceptor,
};
pub use transport::{ReqwestTransport, SharedTransport, Transport};
pub use types::{
    ApiResponse, Method, QueryValue, RawResponse, RequestOptions, RequestOptionsBuilder,
    RetryableRequestInfo, RouteName, TransportResponse,
};

/// Version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

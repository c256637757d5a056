//! Session authentication for the HTTP client
//!
//! Keeps the access/refresh token pair, attaches it to outgoing calls, and
//! recovers from expired access tokens with a single shared refresh.
//!
//! # Overview
//!
//! 1. [`AuthCoordinator::initialize`] loads the stored pair at startup
//! 2. Every request gets `Authorization: Bearer <access token>`
//! 3. A 401 triggers one `POST /auth/reissue` no matter how many calls failed
//! 4. Failed calls are replayed once with the new token
//! 5. If the reissue fails the store is cleared and the user is sent to login
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use nailkit_http::auth::{FileTokenStore, NavigationRef};
//! use nailkit_http::{ApiClient, ClientConfig, ReqwestTransport};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let navigation = Arc::new(NavigationRef::new());
//! let (client, auth) = ApiClient::with_auth(
//!     ClientConfig::from_build_env()?,
//!     Arc::new(ReqwestTransport::new()),
//!     Arc::new(FileTokenStore::new()),
//!     navigation.clone(),
//! );
//! auth.initialize().await?;
//!
//! let profile: serde_json::Value = client.get("/users/me").await?.into_data()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Security
//!
//! - Tokens never appear in logs or `Debug` output, only an 8-char fingerprint
//! - [`FileTokenStore`] writes with user-only permissions (600)

mod coordinator;
mod navigator;
mod store;
mod token;

pub use coordinator::AuthCoordinator;
pub use navigator::{FnNavigator, NavigationRef, Navigator, SharedNavigator};
pub use store::{FileTokenStore, MemoryTokenStore, SharedTokenStore, TokenStore};
pub use token::{TokenError, TokenPair, fingerprint};

//! Shared fixtures for integration tests: a scripted backend, a counting
//! token store and a recording navigator.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use nailkit_http::auth::{MemoryTokenStore, TokenError};
use nailkit_http::transport::transport_fn;
use nailkit_http::{
    ApiClient, ApiError, AuthCoordinator, ClientConfig, Navigator, RetryableRequestInfo,
    RouteName, SharedTransport, TokenPair, TokenStore, TransportResponse,
};

pub const BASE_URL: &str = "https://api.nailkit.test";
pub const FRESH_TOKEN: &str = "tok2";

/// Install a test subscriber once; `RUST_LOG=nailkit_http=debug` shows the flow.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Scripted backend
// ============================================================================

/// How the backend answers `POST /auth/reissue`
#[derive(Debug, Clone, Copy)]
pub enum Reissue {
    /// 200 with `accessToken = FRESH_TOKEN` after `delay`
    Succeed { delay: Duration },
    /// 401 after `delay`
    Unauthorized { delay: Duration },
}

/// Accepts only `FRESH_TOKEN`; every other call gets a 401 envelope.
pub struct Backend {
    reissue: Reissue,
    reissue_calls: AtomicUsize,
    calls: Mutex<Vec<RetryableRequestInfo>>,
}

impl Backend {
    pub fn new(reissue: Reissue) -> Arc<Self> {
        Arc::new(Self {
            reissue,
            reissue_calls: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn reissue_calls(&self) -> usize {
        self.reissue_calls.load(Ordering::SeqCst)
    }

    /// Non-reissue calls, in arrival order
    pub fn calls(&self) -> Vec<RetryableRequestInfo> {
        self.calls.lock().unwrap().clone()
    }

    /// URLs of calls that carried `token`
    pub fn urls_sent_with(&self, token: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.bearer_token() == Some(token))
            .map(|call| call.url)
            .collect()
    }

    /// Transport that routes every call to this backend
    pub fn transport(self: &Arc<Self>) -> SharedTransport {
        let backend = Arc::clone(self);
        transport_fn(move |request| {
            let backend = backend.clone();
            async move { backend.handle(request).await }
        })
    }

    async fn handle(&self, request: RetryableRequestInfo) -> Result<TransportResponse, ApiError> {
        if request.url.ends_with("/auth/reissue") {
            self.reissue_calls.fetch_add(1, Ordering::SeqCst);
            return Ok(match self.reissue {
                Reissue::Succeed { delay } => {
                    tokio::time::sleep(delay).await;
                    TransportResponse::json(
                        200,
                        &serde_json::json!({
                            "code": 200,
                            "message": "reissued",
                            "data": {"accessToken": FRESH_TOKEN}
                        }),
                    )
                }
                Reissue::Unauthorized { delay } => {
                    tokio::time::sleep(delay).await;
                    unauthorized()
                }
            });
        }

        let authorized = request.bearer_token() == Some(FRESH_TOKEN);
        let url = request.url.clone();
        self.calls.lock().unwrap().push(request);

        if authorized {
            Ok(TransportResponse::json(
                200,
                &serde_json::json!({"code": 200, "message": "ok", "data": {"url": url}}),
            ))
        } else {
            Ok(unauthorized())
        }
    }
}

fn unauthorized() -> TransportResponse {
    TransportResponse::new(401, r#"{"code":401,"message":"token expired"}"#)
}

// ============================================================================
// Collaborators
// ============================================================================

/// Memory store that counts writes
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryTokenStore,
    saves: AtomicUsize,
    clears: AtomicUsize,
}

impl CountingStore {
    pub fn with_tokens(tokens: TokenPair) -> Self {
        Self {
            inner: MemoryTokenStore::with_tokens(tokens),
            ..Self::default()
        }
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Option<TokenPair> {
        self.inner.snapshot()
    }
}

#[async_trait]
impl TokenStore for CountingStore {
    async fn load(&self) -> Result<Option<TokenPair>, TokenError> {
        self.inner.load().await
    }

    async fn save(&self, tokens: &TokenPair) -> Result<(), TokenError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(tokens).await
    }

    async fn clear(&self) -> Result<(), TokenError> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.inner.clear().await
    }
}

/// Navigator that records every route it was sent to
#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &RouteName) {
        self.routes.lock().unwrap().push(route.to_string());
    }
}

// ============================================================================
// Fixture
// ============================================================================

pub struct Fixture {
    pub client: ApiClient,
    pub auth: AuthCoordinator,
    pub backend: Arc<Backend>,
    pub store: Arc<CountingStore>,
    pub navigator: Arc<RecordingNavigator>,
}

/// Client with auth installed, tokens loaded from the store
pub async fn fixture(reissue: Reissue, tokens: TokenPair) -> anyhow::Result<Fixture> {
    init_tracing();

    let backend = Backend::new(reissue);
    let transport = backend.transport();

    let store = Arc::new(CountingStore::with_tokens(tokens));
    let navigator = Arc::new(RecordingNavigator::default());
    let (client, auth) = ApiClient::with_auth(
        ClientConfig::builder().base_url(BASE_URL).build(),
        transport,
        store.clone(),
        navigator.clone(),
    );
    auth.initialize().await?;

    Ok(Fixture {
        client,
        auth,
        backend,
        store,
        navigator,
    })
}

/// Expired access token plus a usable refresh token
pub fn expired_session() -> TokenPair {
    TokenPair::new("tok1-expired", "refresh-1")
}

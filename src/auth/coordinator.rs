//! Single-flight access-token refresh and transparent 401 replay
//!
//! The [`AuthCoordinator`] owns the in-memory [`TokenPair`] and the refresh
//! gate. Installed into an [`InterceptorRegistry`] it contributes:
//!
//! - a request interceptor that attaches `Authorization: Bearer <token>`,
//!   refreshing first when only a refresh token is held;
//! - a response interceptor that turns a 401 into one shared refresh and a
//!   replay of the failed call with the new token.
//!
//! ```text
//!            401                        reissue ok
//!   Idle ──────────▶ Refreshing ─────────────────────▶ Idle
//!    ▲                 │   ▲  401 (queued as waiter)     │ waiters replay
//!    │                 │   └──┘                          │ with new token
//!    │                 │ reissue failed                  │
//!    └─────────────────┘ clear store, navigate to login ◀┘
//! ```
//!
//! Every caller that needs a new token, including the one that opened the
//! episode, waits on the same outcome. The reissue call runs in its own task,
//! so dropping a waiting request never aborts it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::oneshot;

use super::navigator::SharedNavigator;
use super::store::SharedTokenStore;
use super::token::{TokenError, TokenPair, fingerprint};
use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::interceptors::{InterceptorRegistry, RequestInterceptor, ResponseInterceptor};
use crate::transport::{SharedTransport, send_with_deadline};
use crate::types::{
    ApiResponse, CONTENT_TYPE, JSON_CONTENT_TYPE, Method, RawResponse, RequestOptions,
    RetryableRequestInfo,
};

/// Why a refresh episode failed. Never returned to callers.
#[derive(Debug, Error)]
pub(crate) enum RefreshFailure {
    #[error("reissue request failed: {0}")]
    Transport(#[from] ApiError),

    #[error("reissue returned HTTP {0}")]
    Status(u16),

    #[error("reissue rejected with code {code}: {message}")]
    Rejected { code: i64, message: String },

    #[error("reissue response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("reissue response carried no access token")]
    MissingToken,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReissueRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReissueData {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// What a refresh episode resolved to
#[derive(Clone)]
enum RefreshOutcome {
    Refreshed(String),
    Failed,
}

type RefreshWaiter = oneshot::Sender<RefreshOutcome>;

#[derive(Default)]
struct AuthState {
    tokens: TokenPair,
    refreshing: bool,
    waiters: Vec<RefreshWaiter>,
    /// Counts refresh episodes, for logs
    episode: u64,
    /// Bumped by login/logout so a refresh racing them is discarded
    session: u64,
}

enum Attach {
    Token(String),
    Wait(oneshot::Receiver<RefreshOutcome>),
    Anonymous,
}

enum Recovery {
    Replay(String),
    Wait(oneshot::Receiver<RefreshOutcome>),
    SignedOut,
}

struct Inner {
    config: ClientConfig,
    transport: SharedTransport,
    store: SharedTokenStore,
    navigator: SharedNavigator,
    state: Mutex<AuthState>,
}

/// Owner of the token pair and the single-flight refresh gate
///
/// Cheap to clone; clones share state. Construct one per process and install
/// it into the client's registry before any other interceptor.
#[derive(Clone)]
pub struct AuthCoordinator {
    inner: Arc<Inner>,
}

impl AuthCoordinator {
    /// Create a coordinator with no tokens loaded
    #[must_use]
    pub fn new(
        config: ClientConfig,
        transport: SharedTransport,
        store: SharedTokenStore,
        navigator: SharedNavigator,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                transport,
                store,
                navigator,
                state: Mutex::new(AuthState::default()),
            }),
        }
    }

    /// Register the request and response interceptors
    pub fn install(&self, registry: &InterceptorRegistry) {
        registry.add_request_interceptor(self.clone());
        registry.add_response_interceptor(self.clone());
    }

    /// Load the persisted pair into memory
    ///
    /// Returns whether a pair was found.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn initialize(&self) -> std::result::Result<bool, TokenError> {
        let Some(tokens) = self.inner.store.load().await? else {
            tracing::debug!("No stored tokens found");
            return Ok(false);
        };

        tracing::info!(token = ?tokens.fingerprint(), "Loaded stored tokens");
        self.inner.state().tokens = tokens;
        Ok(true)
    }

    /// Replace the pair after a successful login and persist it
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written; memory is updated
    /// regardless.
    pub async fn login(&self, tokens: TokenPair) -> std::result::Result<(), TokenError> {
        {
            let mut state = self.inner.state();
            state.tokens = tokens.clone();
            state.session += 1;
        }
        tracing::info!(token = ?tokens.fingerprint(), "Signed in");
        self.inner.store.save(&tokens).await
    }

    /// Drop the pair from memory and from the store
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be cleared; memory is cleared
    /// regardless.
    pub async fn logout(&self) -> std::result::Result<(), TokenError> {
        {
            let mut state = self.inner.state();
            state.tokens = TokenPair::default();
            state.session += 1;
        }
        tracing::info!("Signed out");
        self.inner.store.clear().await
    }

    /// Snapshot of the in-memory pair
    #[must_use]
    pub fn tokens(&self) -> TokenPair {
        self.inner.state().tokens.clone()
    }

    /// Whether a refresh episode is in flight
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.inner.state().refreshing
    }

    fn attach_decision(&self) -> Attach {
        let mut state = self.inner.state();
        if let Some(token) = &state.tokens.access_token {
            return Attach::Token(token.clone());
        }
        match join_episode(&self.inner, &mut state) {
            Some(waiter) => Attach::Wait(waiter),
            None => Attach::Anonymous,
        }
    }

    fn recovery_decision(&self, sent: Option<&str>) -> Recovery {
        let mut state = self.inner.state();
        if !state.refreshing {
            if let Some(current) = state.tokens.access_token.as_deref() {
                if sent != Some(current) {
                    return Recovery::Replay(current.to_string());
                }
            }
        }
        match join_episode(&self.inner, &mut state) {
            Some(waiter) => Recovery::Wait(waiter),
            None => Recovery::SignedOut,
        }
    }

    /// Re-issue `original.request` with a new bearer token.
    ///
    /// A failed replay yields the original response.
    async fn replay(&self, original: RawResponse, token: &str) -> RawResponse {
        let request = original.request.with_bearer(token);
        match send_with_deadline(self.inner.transport.as_ref(), &request, None).await {
            Ok(response) => {
                tracing::debug!(
                    url = %request.url,
                    status = response.status,
                    token = %fingerprint(token),
                    "Replayed request with refreshed token"
                );
                RawResponse::new(response, request)
            }
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "Replay failed, keeping original response");
                original
            }
        }
    }
}

impl std::fmt::Debug for AuthCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state();
        f.debug_struct("AuthCoordinator")
            .field("tokens", &state.tokens)
            .field("refreshing", &state.refreshing)
            .field("waiters", &state.waiters.len())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RequestInterceptor for AuthCoordinator {
    async fn on_request(&self, mut options: RequestOptions) -> Result<RequestOptions> {
        if self.inner.config.is_refresh_endpoint(&options.endpoint) {
            return Ok(options);
        }

        let token = match self.attach_decision() {
            Attach::Token(token) => Some(token),
            Attach::Wait(waiter) => {
                tracing::debug!(endpoint = %options.endpoint, "Waiting for token refresh before sending");
                match waiter.await {
                    Ok(RefreshOutcome::Refreshed(token)) => Some(token),
                    Ok(RefreshOutcome::Failed) | Err(_) => None,
                }
            }
            Attach::Anonymous => None,
        };

        if let Some(token) = token {
            options.set_bearer(&token);
        }
        Ok(options)
    }
}

#[async_trait]
impl ResponseInterceptor for AuthCoordinator {
    async fn on_response(&self, response: RawResponse) -> Result<RawResponse> {
        if !response.is_unauthorized() || self.inner.config.is_refresh_endpoint(&response.request.url)
        {
            return Ok(response);
        }

        let decision = self.recovery_decision(response.request.bearer_token());
        match decision {
            Recovery::Replay(token) => {
                tracing::debug!(url = %response.request.url, "401 for a superseded token, replaying");
                Ok(self.replay(response, &token).await)
            }
            Recovery::Wait(waiter) => match waiter.await {
                Ok(RefreshOutcome::Refreshed(token)) => Ok(self.replay(response, &token).await),
                Ok(RefreshOutcome::Failed) | Err(_) => Ok(response),
            },
            Recovery::SignedOut => {
                tracing::info!(url = %response.request.url, "401 without a refresh token, signing out");
                self.inner.sign_out_locally().await;
                Ok(response)
            }
        }
    }
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, AuthState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clear memory and store, then send the user to the login route.
    async fn sign_out_locally(&self) {
        self.state().tokens = TokenPair::default();
        if let Err(e) = self.store.clear().await {
            tracing::warn!(error = %e, "Failed to clear token store");
        }
        self.navigator.navigate(&self.config.login_route);
    }

    async fn reissue(
        &self,
        refresh_token: &str,
    ) -> std::result::Result<(String, Option<String>), RefreshFailure> {
        let body = serde_json::to_string(&ReissueRequest { refresh_token })?;
        let request = RetryableRequestInfo {
            url: self.config.refresh_url(),
            method: Method::Post,
            headers: HashMap::from([(CONTENT_TYPE.to_string(), JSON_CONTENT_TYPE.to_string())]),
            body: Some(body),
            timeout: self.config.default_timeout,
        };

        let response = send_with_deadline(self.transport.as_ref(), &request, None).await?;
        if !(200..300).contains(&response.status) {
            return Err(RefreshFailure::Status(response.status));
        }

        let envelope: ApiResponse<ReissueData> = serde_json::from_str(&response.body)?;
        if !envelope.is_success() {
            return Err(RefreshFailure::Rejected {
                code: envelope.code,
                message: envelope.message,
            });
        }

        let data = envelope.data.ok_or(RefreshFailure::MissingToken)?;
        Ok((data.access_token, data.refresh_token))
    }

    async fn on_refreshed(
        &self,
        access_token: String,
        refresh_token: String,
        episode: u64,
        session: u64,
    ) -> RefreshOutcome {
        let tokens = TokenPair {
            access_token: Some(access_token.clone()),
            refresh_token: Some(refresh_token),
        };

        {
            let mut state = self.state();
            if state.session != session {
                tracing::warn!(episode, "Session changed during refresh, discarding new token");
                return session_outcome(&state);
            }
            state.tokens = tokens.clone();
        }

        if let Err(e) = self.store.save(&tokens).await {
            tracing::warn!(episode, error = %e, "Failed to persist refreshed tokens");
        }
        tracing::info!(episode, token = %fingerprint(&access_token), "Access token refreshed");
        RefreshOutcome::Refreshed(access_token)
    }

    async fn on_refresh_failed(
        &self,
        failure: &RefreshFailure,
        episode: u64,
        session: u64,
    ) -> RefreshOutcome {
        tracing::warn!(episode, error = %failure, "Token refresh failed");

        {
            let mut state = self.state();
            if state.session != session {
                tracing::debug!(episode, "Session changed during refresh, keeping it");
                return session_outcome(&state);
            }
            state.tokens = TokenPair::default();
        }

        if let Err(e) = self.store.clear().await {
            tracing::warn!(episode, error = %e, "Failed to clear token store");
        }
        self.navigator.navigate(&self.config.login_route);
        RefreshOutcome::Failed
    }

    /// Close the gate and wake every waiter with `outcome`.
    fn settle(&self, outcome: &RefreshOutcome) {
        let waiters = {
            let mut state = self.state();
            state.refreshing = false;
            std::mem::take(&mut state.waiters)
        };

        tracing::debug!(
            waiters = waiters.len(),
            refreshed = matches!(outcome, RefreshOutcome::Refreshed(_)),
            "Refresh episode settled"
        );
        for waiter in waiters {
            // Receiver gone means the request was dropped.
            let _ = waiter.send(outcome.clone());
        }
    }
}

/// Outcome for waiters of an episode overtaken by `login`/`logout`: the
/// session's own access token if it holds one.
fn session_outcome(state: &AuthState) -> RefreshOutcome {
    match &state.tokens.access_token {
        Some(token) => RefreshOutcome::Refreshed(token.clone()),
        None => RefreshOutcome::Failed,
    }
}

/// Queue a waiter on the current episode, opening one if the gate is idle.
///
/// Returns `None` when idle with no refresh token to spend.
fn join_episode(
    inner: &Arc<Inner>,
    state: &mut AuthState,
) -> Option<oneshot::Receiver<RefreshOutcome>> {
    if !state.refreshing {
        let refresh_token = state.tokens.refresh_token.clone()?;
        state.refreshing = true;
        state.episode += 1;
        tracing::debug!(episode = state.episode, "Starting token refresh");
        tokio::spawn(run_refresh(
            Arc::clone(inner),
            refresh_token,
            state.episode,
            state.session,
        ));
    }

    let (tx, rx) = oneshot::channel();
    state.waiters.push(tx);
    Some(rx)
}

/// Reopens the gate when dropped, even if the refresh task panicked.
struct EpisodeGate {
    inner: Arc<Inner>,
    released: bool,
}

impl EpisodeGate {
    fn release(mut self, outcome: &RefreshOutcome) {
        self.released = true;
        self.inner.settle(outcome);
    }
}

impl Drop for EpisodeGate {
    fn drop(&mut self) {
        if !self.released {
            self.inner.settle(&RefreshOutcome::Failed);
        }
    }
}

async fn run_refresh(inner: Arc<Inner>, refresh_token: String, episode: u64, session: u64) {
    let gate = EpisodeGate {
        inner: Arc::clone(&inner),
        released: false,
    };

    let outcome = match inner.reissue(&refresh_token).await {
        Ok((access_token, rotated)) => {
            inner
                .on_refreshed(
                    access_token,
                    rotated.unwrap_or(refresh_token),
                    episode,
                    session,
                )
                .await
        }
        Err(failure) => inner.on_refresh_failed(&failure, episode, session).await,
    };

    gate.release(&outcome);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::navigator::FnNavigator;
    use crate::auth::store::MemoryTokenStore;
    use crate::transport::transport_fn;
    use crate::types::{RouteName, TransportResponse};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Harness {
        coordinator: AuthCoordinator,
        store: Arc<MemoryTokenStore>,
        navigations: Arc<AtomicUsize>,
        reissues: Arc<AtomicUsize>,
    }

    fn config() -> ClientConfig {
        ClientConfig::builder().base_url("https://api.test").build()
    }

    fn harness(tokens: TokenPair, reissue_status: u16) -> Harness {
        let reissues = Arc::new(AtomicUsize::new(0));
        let counter = reissues.clone();
        let transport = transport_fn(move |request: RetryableRequestInfo| {
            let counter = counter.clone();
            async move {
                if request.url.ends_with("/auth/reissue") {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    let body = serde_json::json!({
                        "code": reissue_status,
                        "message": "reissue",
                        "data": {"accessToken": "tok2"}
                    });
                    return Ok::<_, ApiError>(TransportResponse::json(reissue_status, &body));
                }
                match request.bearer_token() {
                    Some("tok2") => Ok(TransportResponse::new(200, r#"{"code":200,"message":"ok"}"#)),
                    _ => Ok(TransportResponse::new(401, r#"{"code":401,"message":"expired"}"#)),
                }
            }
        });

        let store = Arc::new(MemoryTokenStore::with_tokens(tokens.clone()));
        let navigations = Arc::new(AtomicUsize::new(0));
        let nav_counter = navigations.clone();
        let navigator: SharedNavigator = Arc::new(FnNavigator::new(move |route: &RouteName| {
            assert_eq!(route.as_str(), "SocialLogin");
            nav_counter.fetch_add(1, Ordering::SeqCst);
        }));

        let coordinator = AuthCoordinator::new(config(), transport, store.clone(), navigator);
        coordinator.inner.state().tokens = tokens;
        Harness {
            coordinator,
            store,
            navigations,
            reissues,
        }
    }

    fn unauthorized(url: &str, bearer: Option<&str>) -> RawResponse {
        let mut headers = HashMap::new();
        if let Some(token) = bearer {
            headers.insert("Authorization".to_string(), format!("Bearer {token}"));
        }
        RawResponse::new(
            TransportResponse::new(401, r#"{"code":401,"message":"expired"}"#),
            RetryableRequestInfo {
                url: url.to_string(),
                method: Method::Get,
                headers,
                body: None,
                timeout: Duration::from_secs(10),
            },
        )
    }

    #[tokio::test]
    async fn test_request_attaches_held_access_token() {
        let h = harness(TokenPair::new("tok1", "refresh"), 200);
        let options = h
            .coordinator
            .on_request(RequestOptions::new("/nails"))
            .await
            .unwrap();
        assert_eq!(options.header("authorization"), Some("Bearer tok1"));
        assert_eq!(h.reissues.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_request_without_tokens_goes_out_anonymous() {
        let h = harness(TokenPair::default(), 200);
        let options = h
            .coordinator
            .on_request(RequestOptions::new("/nails"))
            .await
            .unwrap();
        assert_eq!(options.header("authorization"), None);
    }

    #[tokio::test]
    async fn test_request_refreshes_eagerly_without_access_token() {
        let h = harness(
            TokenPair {
                access_token: None,
                refresh_token: Some("refresh".to_string()),
            },
            200,
        );
        let options = h
            .coordinator
            .on_request(RequestOptions::new("/nails"))
            .await
            .unwrap();
        assert_eq!(options.header("Authorization"), Some("Bearer tok2"));
        assert_eq!(h.reissues.load(Ordering::SeqCst), 1);
        assert_eq!(
            h.store.snapshot().unwrap().access_token.as_deref(),
            Some("tok2")
        );
    }

    #[tokio::test]
    async fn test_refresh_endpoint_request_passes_through() {
        let h = harness(TokenPair::new("tok1", "refresh"), 200);
        let options = h
            .coordinator
            .on_request(RequestOptions::new("/auth/reissue"))
            .await
            .unwrap();
        assert_eq!(options.header("Authorization"), None);
    }

    #[tokio::test]
    async fn test_refresh_endpoint_401_is_not_retried() {
        let h = harness(TokenPair::new("tok1", "refresh"), 200);
        let response = unauthorized("https://api.test/auth/reissue", Some("tok1"));
        let out = h.coordinator.on_response(response.clone()).await.unwrap();
        assert_eq!(out, response);
        assert_eq!(h.reissues.load(Ordering::SeqCst), 0);
        assert_eq!(h.navigations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_401_refreshes_and_replays() {
        let h = harness(TokenPair::new("tok1", "refresh"), 200);
        let out = h
            .coordinator
            .on_response(unauthorized("https://api.test/a", Some("tok1")))
            .await
            .unwrap();
        assert_eq!(out.status, 200);
        assert_eq!(out.request.bearer_token(), Some("tok2"));
        assert_eq!(h.coordinator.tokens().refresh_token.as_deref(), Some("refresh"));
        assert!(!h.coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn test_401_without_refresh_token_signs_out() {
        let h = harness(
            TokenPair {
                access_token: Some("tok1".to_string()),
                refresh_token: None,
            },
            200,
        );
        let response = unauthorized("https://api.test/a", Some("tok1"));
        let out = h.coordinator.on_response(response.clone()).await.unwrap();
        assert_eq!(out, response);
        assert!(h.coordinator.tokens().is_empty());
        assert!(h.store.snapshot().is_none());
        assert_eq!(h.navigations.load(Ordering::SeqCst), 1);
        assert_eq!(h.reissues.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_401_for_superseded_token_replays_without_refresh() {
        let h = harness(TokenPair::new("tok2", "refresh"), 200);
        let out = h
            .coordinator
            .on_response(unauthorized("https://api.test/a", Some("tok1")))
            .await
            .unwrap();
        assert_eq!(out.status, 200);
        assert_eq!(h.reissues.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_401_is_ignored() {
        let h = harness(TokenPair::new("tok1", "refresh"), 200);
        let mut response = unauthorized("https://api.test/a", Some("tok1"));
        response.status = 403;
        let out = h.coordinator.on_response(response.clone()).await.unwrap();
        assert_eq!(out, response);
        assert_eq!(h.reissues.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_gate_reopens_when_refresh_task_panics() {
        let transport = transport_fn(|request: RetryableRequestInfo| async move {
            if request.url.ends_with("/auth/reissue") {
                panic!("transport blew up");
            }
            Ok::<_, ApiError>(TransportResponse::new(401, "{}"))
        });
        let navigator: SharedNavigator = Arc::new(FnNavigator::new(|_route: &RouteName| {}));
        let coordinator = AuthCoordinator::new(
            config(),
            transport,
            Arc::new(MemoryTokenStore::new()),
            navigator,
        );
        coordinator.inner.state().tokens = TokenPair::new("tok1", "refresh");

        let response = unauthorized("https://api.test/a", Some("tok1"));
        let out = coordinator.on_response(response.clone()).await.unwrap();

        assert_eq!(out, response);
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_logout_during_refresh_discards_new_token() {
        let h = harness(TokenPair::new("tok1", "refresh"), 200);
        let coordinator = h.coordinator.clone();
        let pending = tokio::spawn(async move {
            coordinator
                .on_response(unauthorized("https://api.test/a", Some("tok1")))
                .await
        });

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(h.coordinator.is_refreshing());
        h.coordinator.logout().await.unwrap();

        let out = pending.await.unwrap().unwrap();
        assert_eq!(out.status, 401);
        assert!(h.coordinator.tokens().is_empty());
        assert_eq!(h.navigations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_during_failed_refresh_replays_with_login_token() {
        let h = harness(TokenPair::new("tok1", "refresh"), 401);
        let coordinator = h.coordinator.clone();
        let pending = tokio::spawn(async move {
            coordinator
                .on_response(unauthorized("https://api.test/a", Some("tok1")))
                .await
        });

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(h.coordinator.is_refreshing());
        h.coordinator
            .login(TokenPair::new("tok2", "refresh-2"))
            .await
            .unwrap();

        let out = pending.await.unwrap().unwrap();
        assert_eq!(out.status, 200);
        assert_eq!(out.request.bearer_token(), Some("tok2"));
        assert_eq!(h.navigations.load(Ordering::SeqCst), 0);
        assert_eq!(
            h.store.snapshot(),
            Some(TokenPair::new("tok2", "refresh-2"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_login_during_refresh_keeps_login_token() {
        let h = harness(TokenPair::new("tok1", "refresh"), 200);
        let coordinator = h.coordinator.clone();
        let pending = tokio::spawn(async move {
            coordinator
                .on_response(unauthorized("https://api.test/a", Some("tok1")))
                .await
        });

        tokio::time::sleep(Duration::from_millis(5)).await;
        h.coordinator
            .login(TokenPair::new("tok3", "refresh-3"))
            .await
            .unwrap();

        let out = pending.await.unwrap().unwrap();
        assert_eq!(out.request.bearer_token(), Some("tok3"));
        assert_eq!(
            h.coordinator.tokens(),
            TokenPair::new("tok3", "refresh-3")
        );
        assert_eq!(h.reissues.load(Ordering::SeqCst), 1);
    }
}

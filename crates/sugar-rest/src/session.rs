//! OAuth2 session lifecycle for the SugarCRM REST API.

use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument, trace, warn};

use sugar_core::error::{AuthError, Error};
use sugar_core::{
    AccessToken, ApiErrorKind, BaseUrl, Body, Credentials, RefreshToken, TokenPair, Transport,
    form,
};

use crate::dispatcher::{Dispatcher, RequestSpec};
use crate::endpoints::{OAUTH_TOKEN, PING, TokenRequest, TokenResponse};

/// How long a successful liveness probe is trusted by default.
pub const DEFAULT_LIVENESS_TTL: Duration = Duration::from_secs(300);

/// Credentials, tokens and the liveness memo of one API session.
///
/// The session logs in lazily: [`ensure_authenticated`](Self::ensure_authenticated)
/// runs the password grant when no access token is held, and otherwise
/// probes `ping` to find out whether the server still accepts the token,
/// falling back to the refresh grant on a 401. A successful probe is trusted
/// for the liveness TTL (capped at the token's expiry) or until a request
/// observes a 401, whichever comes first.
///
/// # Thread Safety
///
/// State lives behind async locks, and the guard and token exchange are
/// serialized so that concurrent callers never interleave a token
/// read-modify-write.
pub struct Session<T> {
    dispatcher: Dispatcher<T>,
    state: RwLock<SessionState>,
    auth_gate: Mutex<()>,
}

struct SessionState {
    credentials: Credentials,
    tokens: TokenPair,
    liveness: Liveness,
    liveness_ttl: Duration,
}

/// Outcome of the last liveness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Liveness {
    Unconfirmed,
    Until(Instant),
    /// Neither the TTL nor the token expiry bounds the memo.
    Indefinite,
}

impl<T: Transport> Session<T> {
    /// Create an unauthenticated session against `base_url`.
    pub fn new(base_url: BaseUrl, transport: T) -> Self {
        Self {
            dispatcher: Dispatcher::new(base_url, transport),
            state: RwLock::new(SessionState {
                credentials: Credentials::default(),
                tokens: TokenPair::default(),
                liveness: Liveness::Unconfirmed,
                liveness_ttl: DEFAULT_LIVENESS_TTL,
            }),
            auth_gate: Mutex::new(()),
        }
    }

    /// Returns the dispatcher requests of this session go through.
    pub fn dispatcher(&self) -> &Dispatcher<T> {
        &self.dispatcher
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Point the session at a different API base URL.
    pub async fn set_url(&self, base_url: BaseUrl) {
        self.dispatcher.set_base_url(base_url).await;
    }

    pub async fn base_url(&self) -> BaseUrl {
        self.dispatcher.base_url().await
    }

    /// Replace the username and password, keeping client identity and platform.
    pub async fn set_credentials(&self, username: impl Into<String>, password: impl Into<String>) {
        let mut state = self.state.write().await;
        state.credentials.set_username(username);
        state.credentials.set_password(password);
    }

    pub async fn set_username(&self, username: impl Into<String>) {
        self.state.write().await.credentials.set_username(username);
    }

    pub async fn set_password(&self, password: impl Into<String>) {
        self.state.write().await.credentials.set_password(password);
    }

    pub async fn username(&self) -> String {
        self.state.read().await.credentials.username().to_string()
    }

    /// Set the platform sent with the password grant.
    ///
    /// Returns `false` and leaves the platform unchanged if `platform` is empty.
    pub async fn set_platform(&self, platform: impl Into<String>) -> bool {
        self.state.write().await.credentials.set_platform(platform)
    }

    pub async fn platform(&self) -> String {
        self.state.read().await.credentials.platform().to_string()
    }

    /// Set how long a successful liveness probe is trusted.
    ///
    /// `Duration::ZERO` probes before every request.
    pub async fn set_liveness_ttl(&self, ttl: Duration) {
        let mut state = self.state.write().await;
        state.liveness_ttl = ttl;
        state.liveness = Liveness::Unconfirmed;
    }

    // ========================================================================
    // Tokens
    // ========================================================================

    /// Returns true if an access token is held.
    ///
    /// A refresh token alone does not count.
    pub async fn check(&self) -> bool {
        self.state.read().await.tokens.is_checked_in()
    }

    /// Returns the current access token.
    pub async fn token(&self) -> Option<AccessToken> {
        self.state.read().await.tokens.access_token.clone()
    }

    /// Returns the current refresh token.
    pub async fn refresh_token(&self) -> Option<RefreshToken> {
        self.state.read().await.tokens.refresh_token.clone()
    }

    /// Use `token` as the access token for all subsequent requests.
    ///
    /// Returns `false` and changes nothing if `token` is empty.
    pub async fn set_token(&self, token: impl Into<String>) -> bool {
        let token = token.into();
        if token.is_empty() {
            return false;
        }
        let mut state = self.state.write().await;
        state.tokens.access_token = Some(AccessToken::new(token));
        state.tokens.expires_at = None;
        state.liveness = Liveness::Unconfirmed;
        true
    }

    /// Returns `false` and changes nothing if `token` is empty.
    pub async fn set_refresh_token(&self, token: impl Into<String>) -> bool {
        let token = token.into();
        if token.is_empty() {
            return false;
        }
        self.state.write().await.tokens.refresh_token = Some(RefreshToken::new(token));
        true
    }

    // ========================================================================
    // Authentication
    // ========================================================================

    /// Exchange credentials (or, with `use_refresh`, the refresh token) for
    /// a new token pair.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidCredentials`] if the server rejects the grant,
    ///   answers without an access token, or no refresh token is held for a
    ///   refresh.
    /// - [`AuthError::Unreachable`] if the server cannot be reached or fails
    ///   with a server error.
    pub async fn authenticate(&self, use_refresh: bool) -> Result<(), AuthError> {
        let _gate = self.auth_gate.lock().await;
        self.authenticate_locked(use_refresh).await
    }

    /// Make sure the session holds a token the server accepts.
    ///
    /// Logs in when no access token is held. Otherwise probes `ping` unless
    /// a recent probe succeeded; a 401 from the probe triggers the refresh
    /// grant, any other probe failure is reported as unreachable.
    #[instrument(skip(self))]
    pub async fn ensure_authenticated(&self) -> Result<(), AuthError> {
        let _gate = self.auth_gate.lock().await;

        if !self.check().await {
            debug!("No access token, logging in");
            return self.authenticate_locked(false).await;
        }

        if self.is_alive().await {
            trace!("Session recently confirmed alive");
            return Ok(());
        }

        match self.probe().await {
            Ok(()) => {
                self.arm_liveness().await;
                Ok(())
            }
            Err(e) if e.is_unauthorized() => {
                info!("Access token rejected, refreshing");
                self.authenticate_locked(true).await?;
                self.arm_liveness().await;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Liveness probe failed");
                self.mark_stale().await;
                Err(AuthError::Unreachable {
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Forget the last successful probe so the next guard call probes again.
    pub(crate) async fn mark_stale(&self) {
        self.state.write().await.liveness = Liveness::Unconfirmed;
    }

    #[instrument(skip(self))]
    async fn authenticate_locked(&self, use_refresh: bool) -> Result<(), AuthError> {
        info!("Requesting OAuth2 token");

        let fields = {
            let state = self.state.read().await;
            let credentials = &state.credentials;
            let request = if use_refresh {
                let Some(refresh_token) = state.tokens.refresh_token.as_ref() else {
                    warn!("Refresh requested without a refresh token");
                    return Err(AuthError::InvalidCredentials);
                };
                TokenRequest::RefreshToken {
                    client_id: credentials.client_id(),
                    client_secret: credentials.client_secret(),
                    refresh_token: refresh_token.as_str(),
                }
            } else {
                TokenRequest::Password {
                    client_id: credentials.client_id(),
                    client_secret: credentials.client_secret(),
                    username: credentials.username(),
                    password: credentials.password(),
                    platform: credentials.platform(),
                }
            };
            form::to_pairs(&request).map_err(|_| AuthError::InvalidCredentials)?
        };

        let spec = RequestSpec::post(OAUTH_TOKEN).with_body(Body::Form(fields));
        let response = match self.dispatcher.fetch(spec, None).await {
            Ok(response) => response,
            Err(e) => return Err(token_exchange_error(e)),
        };

        let Ok(body) = serde_json::from_slice::<TokenResponse>(&response.body) else {
            warn!("Token response is not valid JSON");
            return Err(AuthError::InvalidCredentials);
        };

        let Some(access_token) = body.access_token.filter(|t| !t.is_empty()) else {
            warn!("Token response carries no access token");
            return Err(AuthError::InvalidCredentials);
        };

        let mut state = self.state.write().await;
        // A response without a refresh token keeps the one already held.
        let refresh_token = body
            .refresh_token
            .filter(|t| !t.is_empty())
            .map(RefreshToken::new)
            .or_else(|| state.tokens.refresh_token.take());
        state.tokens = TokenPair::issued(
            AccessToken::new(access_token),
            refresh_token,
            body.expires_in,
        );

        debug!("Token stored");
        Ok(())
    }

    async fn probe(&self) -> Result<(), Error> {
        let token = self.token().await;
        self.dispatcher
            .fetch(RequestSpec::get(PING), token.as_ref())
            .await
            .map(|_| ())
    }

    async fn is_alive(&self) -> bool {
        match self.state.read().await.liveness {
            Liveness::Unconfirmed => false,
            Liveness::Until(until) => Instant::now() < until,
            Liveness::Indefinite => true,
        }
    }

    async fn arm_liveness(&self) {
        let mut state = self.state.write().await;
        if state.liveness_ttl.is_zero() {
            state.liveness = Liveness::Unconfirmed;
            return;
        }

        // A TTL too large to add to the clock does not bound the memo.
        let ttl_end = Instant::now().checked_add(state.liveness_ttl);
        state.liveness = match (ttl_end, state.tokens.expires_at) {
            (Some(until), Some(expires_at)) => Liveness::Until(until.min(expires_at)),
            (Some(until), None) | (None, Some(until)) => Liveness::Until(until),
            (None, None) => Liveness::Indefinite,
        };
    }
}

fn token_exchange_error(err: Error) -> AuthError {
    match err {
        Error::Api(api)
            if api.kind != ApiErrorKind::Unreachable
                && api.status.is_some_and(|s| s < 500) =>
        {
            warn!(error = %api, "Token request rejected");
            AuthError::InvalidCredentials
        }
        other => AuthError::Unreachable {
            reason: other.to_string(),
        },
    }
}

// Custom Debug impl that hides sensitive data
impl<T> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("tokens", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

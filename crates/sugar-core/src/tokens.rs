//! Token types for SugarCRM OAuth2 authentication.

use std::fmt;
use std::time::{Duration, Instant};

/// An access token sent as the `OAuth-Token` header on authenticated requests.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Treat as opaque; do not parse or inspect
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Create a new access token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value for use in request headers.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Hide token value in Debug output
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
    }
}

/// A refresh token for obtaining new access tokens.
///
/// Refresh tokens are longer-lived and exchanged through the
/// `refresh_token` grant without resupplying the password.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Treat as opaque; do not parse or inspect
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshToken(String);

impl RefreshToken {
    /// Create a new refresh token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value for use in refresh requests.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Hide token value in Debug output
impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefreshToken").field(&"[REDACTED]").finish()
    }
}

/// The tokens held by a session.
///
/// A successful token exchange replaces the whole pair; the session is
/// considered checked in exactly when a non-empty access token is present.
#[derive(Debug, Clone, Default)]
pub struct TokenPair {
    pub access_token: Option<AccessToken>,
    pub refresh_token: Option<RefreshToken>,
    /// When the server said the access token stops being valid.
    pub expires_at: Option<Instant>,
}

impl TokenPair {
    /// Build a pair from a token exchange response.
    ///
    /// An `expires_in` too large to represent is treated as no known expiry.
    pub fn issued(
        access_token: AccessToken,
        refresh_token: Option<RefreshToken>,
        expires_in: Option<u64>,
    ) -> Self {
        Self {
            access_token: Some(access_token),
            refresh_token,
            expires_at: expires_in
                .and_then(|secs| Instant::now().checked_add(Duration::from_secs(secs))),
        }
    }

    /// Returns true if a non-empty access token is present.
    pub fn is_checked_in(&self) -> bool {
        self.access_token
            .as_ref()
            .is_some_and(|t| !t.as_str().is_empty())
    }
}

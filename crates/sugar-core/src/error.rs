//! Error types for the sugar workspace.
//!
//! This module provides a unified error type with explicit variants for
//! authentication, API, input validation and decoding errors.

use std::fmt;
use thiserror::Error;

/// The unified error type for sugar operations.
///
/// Callers that only care about success or failure can collapse a
/// `Result<_, Error>` into an [`ApiResult`](crate::ApiResult).
#[derive(Debug, Error)]
pub enum Error {
    /// The transport could not be set up.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The session could not be established or refreshed.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// The API answered with a non-success status or could not be reached.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Input validation errors (base URL, verb, payload shape).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// A success response carried a body that is not JSON.
    #[error("failed to decode response: {message}")]
    Decode { message: String },

    /// Local file errors during upload or download.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns true if the server rejected the request as unauthorized.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Api(e) if e.kind == ApiErrorKind::Unauthorized)
    }

    /// Returns the API error kind, if this is an API error.
    pub fn api_kind(&self) -> Option<ApiErrorKind> {
        match self {
            Error::Api(e) => Some(e.kind),
            _ => None,
        }
    }
}

/// Transport-level errors reported by a [`Transport`](crate::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Request could not be built or the response could not be read.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Authentication failures from the OAuth2 token exchange or the session guard.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The server rejected the credentials or returned no access token.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The server could not be reached or did not answer usefully.
    #[error("server unreachable: {reason}")]
    Unreachable { reason: String },
}

/// Classification of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// HTTP 401.
    Unauthorized,
    /// HTTP 404.
    NotFound,
    /// Any other non-success status.
    Other,
    /// The request never got a response.
    Unreachable,
}

/// An API call that did not succeed.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status code, absent when the server was unreachable.
    pub status: Option<u16>,
    /// Error classification.
    pub kind: ApiErrorKind,
    /// Error code from the response body (if present).
    pub error: Option<String>,
    /// Error message from the response body, or the transport failure.
    pub message: Option<String>,
}

impl ApiError {
    /// Create an error from a non-success HTTP status.
    pub fn from_status(status: u16, error: Option<String>, message: Option<String>) -> Self {
        let kind = match status {
            401 => ApiErrorKind::Unauthorized,
            404 => ApiErrorKind::NotFound,
            _ => ApiErrorKind::Other,
        };
        Self {
            status: Some(status),
            kind,
            error,
            message,
        }
    }

    /// Create an error for a request that never got a response.
    pub fn unreachable(err: &TransportError) -> Self {
        Self {
            status: None,
            kind: ApiErrorKind::Unreachable,
            error: None,
            message: Some(err.to_string()),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "HTTP {}", status)?,
            None => write!(f, "unreachable")?,
        }
        if let Some(ref error) = self.error {
            write!(f, " [{}]", error)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid base URL.
    #[error("invalid base URL '{value}': {reason}")]
    BaseUrl { value: String, reason: String },

    /// Unsupported HTTP verb.
    #[error("unsupported method '{value}'")]
    Method { value: String },

    /// Payload that cannot be sent as form fields or query parameters.
    #[error("invalid payload: {reason}")]
    Payload { reason: String },
}

//! sugar-core - Core SugarCRM REST types and traits.
//!
//! This crate holds everything that does not need an HTTP stack: credentials
//! and token types, the validated base URL, the request/response shapes a
//! [`Transport`] works with, and the error taxonomy shared by the workspace.

pub mod credentials;
pub mod error;
pub mod form;
pub mod http;
pub mod result;
pub mod tokens;
pub mod traits;
pub mod types;

pub use credentials::Credentials;
pub use error::{ApiError, ApiErrorKind, AuthError, Error, InvalidInputError, TransportError};
pub use http::{Body, FilePart, HttpRequest, HttpResponse, Method, MultipartForm};
pub use result::ApiResult;
pub use tokens::{AccessToken, RefreshToken, TokenPair};
pub use traits::Transport;
pub use types::BaseUrl;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

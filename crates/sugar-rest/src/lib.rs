//! sugar-rest - SugarCRM REST API client.
//!
//! This library authenticates against the SugarCRM OAuth2 endpoint, keeps
//! the session's token alive and maps record, relationship, file and
//! metadata operations onto REST calls. All operations go through a
//! [`SugarClient`].
//!
//! # Example
//!
//! ```no_run
//! use serde_json::json;
//! use sugar_rest::{ApiResult, BaseUrl, SugarClient};
//!
//! # async fn example() -> Result<(), sugar_rest::Error> {
//! let client = SugarClient::new(BaseUrl::new("https://crm.example.com/rest/v10")?)?;
//! client.session().set_credentials("admin", "secret").await;
//!
//! // Logs in on first use.
//! let accounts = client.search("Accounts", &json!({"q": "Acme", "max_num": 5})).await?;
//! for record in accounts["records"].as_array().into_iter().flatten() {
//!     println!("{}: {}", record["id"], record["name"]);
//! }
//!
//! // Callers that only need success or failure:
//! if ApiResult::from(client.retrieve("Accounts", "missing").await).is_failure() {
//!     println!("no such account");
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod dispatcher;
pub mod endpoints;
mod session;
mod transport;

pub use client::SugarClient;
pub use dispatcher::{Dispatcher, RequestSpec};
pub use session::{DEFAULT_LIVENESS_TTL, Session};
pub use transport::{DEFAULT_TIMEOUT, ReqwestTransport};

// Re-export core types so most callers only need this crate
pub use sugar_core::{
    AccessToken, ApiError, ApiErrorKind, ApiResult, AuthError, BaseUrl, Credentials, Error,
    Method, RefreshToken, Result, Transport,
};

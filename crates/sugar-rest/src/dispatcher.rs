//! Translation of logical API calls into transport requests.

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, instrument, trace, warn};

use sugar_core::error::{ApiError, Error};
use sugar_core::{AccessToken, BaseUrl, Body, HttpRequest, HttpResponse, Method, Result, Transport};

use crate::endpoints::{ErrorResponse, OAUTH_TOKEN_HEADER};

/// One API call: verb, path below the base URL, query and payload.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Body,
}

impl RequestSpec {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: Body::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }
}

/// Sends [`RequestSpec`]s through a [`Transport`] and normalizes the outcome.
///
/// Non-success statuses become [`ApiError`]s classified by status code; a
/// request that gets no response at all becomes an `Unreachable` error.
pub struct Dispatcher<T> {
    transport: T,
    base_url: RwLock<BaseUrl>,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(base_url: BaseUrl, transport: T) -> Self {
        Self {
            transport,
            base_url: RwLock::new(base_url),
        }
    }

    /// Returns the base URL requests are resolved against.
    pub async fn base_url(&self) -> BaseUrl {
        self.base_url.read().await.clone()
    }

    /// Point subsequent requests at a different base URL.
    pub async fn set_base_url(&self, base_url: BaseUrl) {
        *self.base_url.write().await = base_url;
    }

    /// Send a request and return the raw success response.
    ///
    /// `token`, when given, is attached as the `OAuth-Token` header.
    #[instrument(skip(self, spec, token), fields(method = %spec.method, path = %spec.path))]
    pub async fn fetch(&self, spec: RequestSpec, token: Option<&AccessToken>) -> Result<HttpResponse> {
        let url = self.base_url.read().await.endpoint(&spec.path);

        let mut request = HttpRequest::new(spec.method, url);
        request.query = spec.query;
        request.body = spec.body;
        if let Some(token) = token {
            request
                .headers
                .push((OAUTH_TOKEN_HEADER.to_string(), token.as_str().to_string()));
        }

        debug!(authenticated = token.is_some(), "Dispatching request");

        let response = self.transport.execute(request).await.map_err(|e| {
            warn!(error = %e, "Request failed before a response arrived");
            ApiError::unreachable(&e)
        })?;

        trace!(status = response.status, "Response");

        if response.is_success() {
            Ok(response)
        } else {
            Err(Error::Api(parse_error_response(&response)))
        }
    }

    /// Send a request and decode the success body as JSON.
    pub async fn send(&self, spec: RequestSpec, token: Option<&AccessToken>) -> Result<Value> {
        let response = self.fetch(spec, token).await?;
        decode_body(&response.body)
    }
}

/// Decode a success body. An empty body decodes to `null`.
pub(crate) fn decode_body(body: &[u8]) -> Result<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }

    serde_json::from_slice(body).map_err(|e| Error::Decode {
        message: e.to_string(),
    })
}

fn parse_error_response(response: &HttpResponse) -> ApiError {
    match serde_json::from_slice::<ErrorResponse>(&response.body) {
        Ok(body) => ApiError::from_status(response.status, body.error, body.error_message),
        Err(_) => ApiError::from_status(response.status, None, None),
    }
}

impl<T> std::fmt::Debug for Dispatcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;
    use sugar_core::{ApiErrorKind, TransportError};

    use super::*;

    /// Transport that replays canned responses and records every request.
    #[derive(Default)]
    pub(crate) struct StubTransport {
        responses: Mutex<VecDeque<std::result::Result<HttpResponse, TransportError>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl StubTransport {
        pub(crate) fn reply(self, status: u16, body: &str) -> Self {
            self.responses
                .lock()
                .unwrap()
                .push_back(Ok(HttpResponse::new(status, body.as_bytes().to_vec())));
            self
        }

        pub(crate) fn reply_json(self, status: u16, body: Value) -> Self {
            self.reply(status, &body.to_string())
        }

        pub(crate) fn fail(self, err: TransportError) -> Self {
            self.responses.lock().unwrap().push_back(Err(err));
            self
        }

        pub(crate) fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn execute(
            &self,
            request: HttpRequest,
        ) -> std::result::Result<HttpResponse, TransportError> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Connection {
                    message: "no stubbed response left".to_string(),
                }))
        }
    }

    fn base() -> BaseUrl {
        BaseUrl::new("https://crm.example.com/rest/v10").unwrap()
    }

    #[tokio::test]
    async fn attaches_token_header() {
        let stub = std::sync::Arc::new(StubTransport::default().reply_json(200, json!({"id": "1"})));
        let dispatcher = Dispatcher::new(base(), stub.clone());

        let token = AccessToken::new("T");
        let value = dispatcher
            .send(RequestSpec::get("Accounts/1"), Some(&token))
            .await
            .unwrap();

        assert_eq!(value, json!({"id": "1"}));
        let requests = stub.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "https://crm.example.com/rest/v10/Accounts/1");
        assert_eq!(requests[0].header("OAuth-Token"), Some("T"));
    }

    #[tokio::test]
    async fn no_header_without_token() {
        let stub = std::sync::Arc::new(StubTransport::default().reply(200, "{}"));
        let dispatcher = Dispatcher::new(base(), stub.clone());

        dispatcher.send(RequestSpec::get("ping"), None).await.unwrap();

        assert!(stub.requests()[0].header("OAuth-Token").is_none());
    }

    #[tokio::test]
    async fn classifies_failures() {
        let stub = StubTransport::default()
            .reply(401, "")
            .reply_json(
                404,
                json!({"error": "not_found", "error_message": "Could not find record"}),
            )
            .reply(500, "Internal Server Error")
            .fail(TransportError::Timeout);
        let dispatcher = Dispatcher::new(base(), stub);

        let kinds = [
            ApiErrorKind::Unauthorized,
            ApiErrorKind::NotFound,
            ApiErrorKind::Other,
            ApiErrorKind::Unreachable,
        ];
        for expected in kinds {
            let err = dispatcher
                .send(RequestSpec::get("Accounts/1"), None)
                .await
                .unwrap_err();
            assert_eq!(err.api_kind(), Some(expected));
        }
    }

    #[tokio::test]
    async fn error_body_is_kept() {
        let stub = StubTransport::default().reply_json(
            404,
            json!({"error": "not_found", "error_message": "Could not find record"}),
        );
        let dispatcher = Dispatcher::new(base(), stub);

        let err = dispatcher
            .send(RequestSpec::get("Accounts/1"), None)
            .await
            .unwrap_err();
        let Error::Api(api) = err else {
            panic!("expected an API error");
        };
        assert_eq!(api.status, Some(404));
        assert_eq!(api.error.as_deref(), Some("not_found"));
        assert_eq!(api.message.as_deref(), Some("Could not find record"));
    }

    #[tokio::test]
    async fn empty_and_undecodable_bodies() {
        let stub = StubTransport::default().reply(200, "  ").reply(200, "<html>");
        let dispatcher = Dispatcher::new(base(), stub);

        let empty = dispatcher.send(RequestSpec::get("ping"), None).await.unwrap();
        assert_eq!(empty, Value::Null);

        let err = dispatcher
            .send(RequestSpec::get("ping"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[tokio::test]
    async fn base_url_can_change() {
        let stub = std::sync::Arc::new(StubTransport::default().reply(200, "{}"));
        let dispatcher = Dispatcher::new(base(), stub.clone());

        dispatcher
            .set_base_url(BaseUrl::new("https://other.example.com/rest/v11").unwrap())
            .await;
        dispatcher.send(RequestSpec::get("ping"), None).await.unwrap();

        assert_eq!(stub.requests()[0].url, "https://other.example.com/rest/v11/ping");
    }
}

//! SugarCRM REST client: resource, relationship, file and metadata operations.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use sugar_core::{
    BaseUrl, Body, Credentials, FilePart, HttpResponse, InvalidInputError, Method, MultipartForm,
    Result, Transport, form,
};

use crate::dispatcher::{RequestSpec, decode_body};
use crate::endpoints::{
    LANG, METADATA, favorite_path, file_path, files_path, link_path, record_path,
    related_record_path,
};
use crate::session::Session;
use crate::transport::ReqwestTransport;

/// Form field of an upload that overrides the file name sent to the server.
const UPLOAD_FILENAME_PARAM: &str = "filename";

/// A client for one SugarCRM REST session.
///
/// Every operation first makes sure the session holds an accepted token
/// (see [`Session::ensure_authenticated`]) and fails without sending
/// anything if it cannot. A 401 on the operation itself is returned to the
/// caller and forces the next operation to re-check the session.
///
/// Clients are cheap to clone and share one session.
///
/// # Example
///
/// ```no_run
/// use serde_json::json;
/// use sugar_rest::{BaseUrl, Credentials, SugarClient};
///
/// # async fn example() -> Result<(), sugar_rest::Error> {
/// let base = BaseUrl::new("https://crm.example.com/rest/v10")?;
/// let client = SugarClient::login(base, Credentials::new("admin", "secret")).await?;
///
/// let account = client.create("Accounts", &json!({"name": "Acme"})).await?;
/// println!("created {}", account["id"]);
/// # Ok(())
/// # }
/// ```
pub struct SugarClient<T = ReqwestTransport> {
    inner: Arc<Session<T>>,
}

impl<T> Clone for SugarClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl SugarClient<ReqwestTransport> {
    /// Create a client using the default reqwest transport.
    ///
    /// No request is sent until the first operation.
    pub fn new(base_url: BaseUrl) -> Result<Self> {
        Ok(Self::with_transport(base_url, ReqwestTransport::new()?))
    }

    /// Create a client and log in with `credentials` right away.
    #[instrument(skip(credentials), fields(%base_url, username = %credentials.username()))]
    pub async fn login(base_url: BaseUrl, credentials: Credentials) -> Result<Self> {
        info!("Creating new session");

        let client = Self::new(base_url)?;
        let session = client.session();
        session
            .set_credentials(credentials.username(), credentials.password())
            .await;
        session.set_platform(credentials.platform()).await;
        session.authenticate(false).await?;

        Ok(client)
    }
}

impl<T: Transport> SugarClient<T> {
    /// Create a client over a custom transport.
    pub fn with_transport(base_url: BaseUrl, transport: T) -> Self {
        Self {
            inner: Arc::new(Session::new(base_url, transport)),
        }
    }

    /// Returns the session: credentials, tokens and authentication.
    pub fn session(&self) -> &Session<T> {
        &self.inner
    }

    // ========================================================================
    // Records
    // ========================================================================

    /// Create a record. Fields are sent form-encoded.
    #[instrument(skip(self, fields))]
    pub async fn create<F: Serialize + ?Sized>(&self, module: &str, fields: &F) -> Result<Value> {
        debug!("Creating record");
        let spec = RequestSpec::post(module).with_body(Body::Form(form::to_pairs(fields)?));
        self.call_json(spec).await
    }

    /// Fetch a single record.
    #[instrument(skip(self))]
    pub async fn retrieve(&self, module: &str, record: &str) -> Result<Value> {
        debug!("Retrieving record");
        self.call_json(RequestSpec::get(record_path(module, record)))
            .await
    }

    /// Update a record. Fields are sent as a JSON body.
    #[instrument(skip(self, fields))]
    pub async fn update<F: Serialize + ?Sized>(
        &self,
        module: &str,
        record: &str,
        fields: &F,
    ) -> Result<Value> {
        debug!("Updating record");
        let spec = RequestSpec::put(record_path(module, record)).with_body(json_body(fields)?);
        self.call_json(spec).await
    }

    /// Delete a record.
    #[instrument(skip(self))]
    pub async fn delete(&self, module: &str, record: &str) -> Result<()> {
        debug!("Deleting record");
        self.inner.ensure_authenticated().await?;
        self.send(RequestSpec::delete(record_path(module, record)))
            .await
            .map(|_| ())
    }

    /// List records of a module. `params` become query parameters
    /// (`q`, `max_num`, `offset`, `fields`, `order_by`, `favorites`, `deleted`, ...).
    #[instrument(skip(self, params))]
    pub async fn search<P: Serialize + ?Sized>(&self, module: &str, params: &P) -> Result<Value> {
        debug!("Searching records");
        let spec = RequestSpec::get(module).with_query(form::to_pairs(params)?);
        self.call_json(spec).await
    }

    /// Mark a record as a favorite of the current user.
    #[instrument(skip(self))]
    pub async fn favorite(&self, module: &str, record: &str) -> Result<Value> {
        self.call_json(RequestSpec::put(favorite_path(module, record)))
            .await
    }

    #[instrument(skip(self))]
    pub async fn unfavorite(&self, module: &str, record: &str) -> Result<Value> {
        self.call_json(RequestSpec::delete(favorite_path(module, record)))
            .await
    }

    // ========================================================================
    // Relationships
    // ========================================================================

    /// List the records linked to `record` through `link`.
    #[instrument(skip(self))]
    pub async fn related(&self, module: &str, record: &str, link: &str) -> Result<Value> {
        self.call_json(RequestSpec::get(link_path(module, record, link)))
            .await
    }

    /// Link two records. Relationship fields are sent form-encoded.
    #[instrument(skip(self, fields))]
    pub async fn relate<F: Serialize + ?Sized>(
        &self,
        module: &str,
        record: &str,
        link: &str,
        related_record: &str,
        fields: &F,
    ) -> Result<Value> {
        debug!("Relating records");
        let spec = RequestSpec::post(related_record_path(module, record, link, related_record))
            .with_body(Body::Form(form::to_pairs(fields)?));
        self.call_json(spec).await
    }

    /// Remove the link between two records.
    #[instrument(skip(self))]
    pub async fn unrelate(
        &self,
        module: &str,
        record: &str,
        link: &str,
        related_record: &str,
    ) -> Result<Value> {
        debug!("Unrelating records");
        self.call_json(RequestSpec::delete(related_record_path(
            module,
            record,
            link,
            related_record,
        )))
        .await
    }

    /// Update the fields stored on a relationship. Sent as a JSON body.
    #[instrument(skip(self, fields))]
    pub async fn update_relationship<F: Serialize + ?Sized>(
        &self,
        module: &str,
        record: &str,
        link: &str,
        related_record: &str,
        fields: &F,
    ) -> Result<Value> {
        let spec = RequestSpec::put(related_record_path(module, record, link, related_record))
            .with_body(json_body(fields)?);
        self.call_json(spec).await
    }

    // ========================================================================
    // Files
    // ========================================================================

    /// List the file fields of a record.
    #[instrument(skip(self))]
    pub async fn files(&self, module: &str, record: &str) -> Result<Value> {
        self.call_json(RequestSpec::get(files_path(module, record)))
            .await
    }

    /// Upload `path` into the file field `field` of a record.
    ///
    /// `params` are sent as extra form fields. A `filename` param, if
    /// present, is not sent as a field but replaces the file name reported
    /// for the upload. The content type is guessed from the path.
    #[instrument(skip(self, path, params), fields(path = %path.as_ref().display()))]
    pub async fn upload<P: Serialize + ?Sized>(
        &self,
        module: &str,
        record: &str,
        field: &str,
        path: impl AsRef<Path>,
        params: &P,
    ) -> Result<Value> {
        let path = path.as_ref();
        let mut fields = form::to_pairs(params)?;
        let file_name = match fields.iter().position(|(k, _)| k == UPLOAD_FILENAME_PARAM) {
            Some(index) => fields.remove(index).1,
            None => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| field.to_string()),
        };
        let content_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let data = tokio::fs::read(path).await?;

        self.inner.ensure_authenticated().await?;

        debug!(%file_name, %content_type, len = data.len(), "Uploading file");

        let spec = RequestSpec::post(file_path(module, record, field)).with_body(Body::Multipart(
            MultipartForm {
                fields,
                file: FilePart {
                    name: field.to_string(),
                    file_name,
                    content_type,
                    data,
                },
            },
        ));
        let response = self.send(spec).await?;
        decode_body(&response.body)
    }

    /// Download the content of a file field into `destination`.
    ///
    /// The whole body is buffered in memory before it is written out.
    /// Returns the number of bytes written.
    #[instrument(skip(self, destination), fields(destination = %destination.as_ref().display()))]
    pub async fn download(
        &self,
        module: &str,
        record: &str,
        field: &str,
        destination: impl AsRef<Path>,
    ) -> Result<u64> {
        self.inner.ensure_authenticated().await?;

        let response = self
            .send(RequestSpec::get(file_path(module, record, field)))
            .await?;
        tokio::fs::write(destination.as_ref(), &response.body).await?;

        debug!(len = response.body.len(), "File downloaded");
        Ok(response.body.len() as u64)
    }

    /// Remove the file stored in a file field.
    #[instrument(skip(self))]
    pub async fn delete_file(&self, module: &str, record: &str, field: &str) -> Result<Value> {
        self.call_json(RequestSpec::delete(file_path(module, record, field)))
            .await
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    /// Fetch the server metadata.
    #[instrument(skip(self))]
    pub async fn metadata(&self) -> Result<Value> {
        self.call_json(RequestSpec::get(METADATA)).await
    }

    /// Fetch the language strings for `language`, e.g.
    /// [`DEFAULT_LANGUAGE`](crate::endpoints::DEFAULT_LANGUAGE).
    #[instrument(skip(self))]
    pub async fn lang(&self, language: &str) -> Result<Value> {
        self.call_json(RequestSpec::get(format!("{}/{}", LANG, language)))
            .await
    }

    /// Call an arbitrary endpoint.
    ///
    /// For `GET`, `data` is sent as query parameters; for other verbs as a
    /// JSON body.
    #[instrument(skip(self, data))]
    pub async fn call<D: Serialize + ?Sized>(
        &self,
        path: &str,
        method: Method,
        data: &D,
    ) -> Result<Value> {
        let spec = match method {
            Method::Get => RequestSpec::get(path).with_query(form::to_pairs(data)?),
            Method::Post | Method::Put | Method::Delete => {
                RequestSpec::new(method, path).with_body(json_body(data)?)
            }
        };
        self.call_json(spec).await
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    async fn call_json(&self, spec: RequestSpec) -> Result<Value> {
        self.inner.ensure_authenticated().await?;
        let response = self.send(spec).await?;
        decode_body(&response.body)
    }

    /// Send with the current token, without running the guard.
    async fn send(&self, spec: RequestSpec) -> Result<HttpResponse> {
        let token = self.inner.token().await;
        let result = self.inner.dispatcher().fetch(spec, token.as_ref()).await;
        if let Err(ref e) = result
            && e.is_unauthorized()
        {
            self.inner.mark_stale().await;
        }
        result
    }
}

fn json_body<F: Serialize + ?Sized>(fields: &F) -> Result<Body> {
    let bytes = serde_json::to_vec(fields).map_err(|e| InvalidInputError::Payload {
        reason: e.to_string(),
    })?;
    Ok(Body::Json(bytes))
}

impl<T> std::fmt::Debug for SugarClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SugarClient")
            .field("session", &self.inner)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use sugar_core::{ApiResult, Error};

    use super::*;
    use crate::dispatcher::tests::StubTransport;

    async fn authenticated(stub: &Arc<StubTransport>) -> SugarClient<Arc<StubTransport>> {
        let base = BaseUrl::new("https://crm.example.com/rest/v10").unwrap();
        let client = SugarClient::with_transport(base, stub.clone());
        client.session().set_token("T").await;
        client
    }

    #[tokio::test]
    async fn guard_failure_sends_no_resource_request() {
        let stub = Arc::new(StubTransport::default().reply(503, ""));
        let client = authenticated(&stub).await;

        let err = client.retrieve("Accounts", "123").await.unwrap_err();

        assert!(matches!(err, Error::Auth(_)));
        let requests = stub.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].url.ends_with("/ping"));
    }

    #[tokio::test]
    async fn unauthorized_call_forces_a_new_probe() {
        let stub = Arc::new(
            StubTransport::default()
                .reply(200, "\"pong\"")
                .reply(401, "")
                .reply(200, "\"pong\"")
                .reply_json(200, json!({"id": "123"})),
        );
        let client = authenticated(&stub).await;

        let first = client.retrieve("Accounts", "123").await.unwrap_err();
        assert!(first.is_unauthorized());
        client.retrieve("Accounts", "123").await.unwrap();

        let urls: Vec<String> = stub.requests().into_iter().map(|r| r.url).collect();
        assert!(urls[0].ends_with("/ping"));
        assert!(urls[1].ends_with("/Accounts/123"));
        assert!(urls[2].ends_with("/ping"));
        assert!(urls[3].ends_with("/Accounts/123"));
    }

    #[tokio::test]
    async fn call_get_uses_query_and_others_use_json() {
        let stub = Arc::new(
            StubTransport::default()
                .reply(200, "\"pong\"")
                .reply_json(200, json!({"records": []}))
                .reply_json(200, json!({"ok": true})),
        );
        let client = authenticated(&stub).await;

        client
            .call("Accounts/filter", Method::Get, &json!({"max_num": 1}))
            .await
            .unwrap();
        client
            .call("Accounts/filter", Method::Post, &json!({"max_num": 1}))
            .await
            .unwrap();

        let requests = stub.requests();
        assert_eq!(
            requests[1].query,
            vec![("max_num".to_string(), "1".to_string())]
        );
        assert!(matches!(requests[1].body, Body::Empty));
        let Body::Json(ref bytes) = requests[2].body else {
            panic!("expected a JSON body");
        };
        assert_eq!(serde_json::from_slice::<Value>(bytes).unwrap(), json!({"max_num": 1}));
    }

    #[tokio::test]
    async fn delete_collapses_to_true() {
        let stub = Arc::new(
            StubTransport::default()
                .reply(200, "\"pong\"")
                .reply(200, ""),
        );
        let client = authenticated(&stub).await;

        let result = ApiResult::from(client.delete("Accounts", "123").await);

        assert_eq!(result, ApiResult::Value(json!(true)));
        assert_eq!(stub.requests()[1].method, Method::Delete);
    }

    #[tokio::test]
    async fn favorite_paths() {
        let stub = Arc::new(
            StubTransport::default()
                .reply(200, "\"pong\"")
                .reply_json(200, json!({"my_favorite": true}))
                .reply_json(200, json!({"my_favorite": false})),
        );
        let client = authenticated(&stub).await;

        client.favorite("Accounts", "1").await.unwrap();
        client.unfavorite("Accounts", "1").await.unwrap();

        let requests = stub.requests();
        assert_eq!(requests[1].method, Method::Put);
        assert!(requests[1].url.ends_with("/Accounts/1/favorite"));
        assert_eq!(requests[2].method, Method::Delete);
        assert!(requests[2].url.ends_with("/Accounts/1/favorite"));
    }

    #[tokio::test]
    async fn non_map_payload_is_rejected_before_sending() {
        let stub = Arc::new(StubTransport::default().reply(200, "\"pong\""));
        let client = authenticated(&stub).await;

        let err = client.create("Accounts", &json!("Acme")).await.unwrap_err();

        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(stub.requests().is_empty());
    }

    #[tokio::test]
    async fn upload_rejects_bad_params_before_sending() {
        let stub = Arc::new(StubTransport::default().reply(200, "\"pong\""));
        let client = authenticated(&stub).await;

        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("notes.txt");
        std::fs::write(&local, "hello").unwrap();

        let err = client
            .upload("Notes", "n1", "filename", &local, &json!(["not", "a", "map"]))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(stub.requests().is_empty());
    }

    #[tokio::test]
    async fn upload_of_missing_file_sends_nothing() {
        let stub = Arc::new(StubTransport::default().reply(200, "\"pong\""));
        let client = authenticated(&stub).await;

        let dir = tempfile::tempdir().unwrap();
        let err = client
            .upload("Notes", "n1", "filename", dir.path().join("missing.txt"), &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Io(_)));
        assert!(stub.requests().is_empty());
    }
}

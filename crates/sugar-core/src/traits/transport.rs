//! HTTP transport trait.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

/// Something that can perform an HTTP request.
///
/// Connection pooling, TLS, redirects and timeouts are the transport's
/// business. Any response that arrives, whatever its status, is returned as
/// `Ok`; `Err` means no response was obtained.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request).await
    }
}

//! The client abstraction every decorator wraps.

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use tracing::trace;

use crate::request::request_target;
use crate::{HttpClientError, Request, RequestTarget, Response, Result};

/// Anything that can execute a request and produce a response or an error.
///
/// Responses with a status code >= 400 are *not* errors; only failures to
/// obtain a response are.
#[async_trait]
pub trait Client: Send + Sync {
    /// Execute the request.
    async fn execute(&self, request: Request) -> Result<Response>;
}

/// A type-erased client shared between decorator layers.
pub type SharedClient = Arc<dyn Client>;

#[async_trait]
impl<C: Client + ?Sized> Client for Arc<C> {
    async fn execute(&self, request: Request) -> Result<Response> {
        (**self).execute(request).await
    }
}

#[async_trait]
impl<C: Client + ?Sized> Client for Box<C> {
    async fn execute(&self, request: Request) -> Result<Response> {
        (**self).execute(request).await
    }
}

/// The platform transport. The request target must be absolute by the time
/// it reaches this layer.
#[async_trait]
impl Client for reqwest::Client {
    async fn execute(&self, request: Request) -> Result<Response> {
        if request.uri().scheme().is_none()
            || request.extensions().get::<RequestTarget>().is_some()
        {
            return Err(HttpClientError::InvalidUrl(format!(
                "request target {} is relative and no base address was applied",
                request_target(&request)
            )));
        }

        trace!(method = %request.method(), uri = %request.uri(), "Dispatching request");
        let request = reqwest::Request::try_from(request)?;
        Ok(reqwest::Client::execute(self, request).await?)
    }
}

type BoxedClientFn = Box<dyn Fn(Request) -> BoxFuture<'static, Result<Response>> + Send + Sync>;

/// A client backed by an async closure.
///
/// ```
/// use relay_http_client::{client_fn, null_response};
///
/// let client = client_fn(|_request| async { Ok(null_response()) });
/// ```
pub struct ClientFn {
    f: BoxedClientFn,
}

/// Wrap an async closure into a [`Client`].
pub fn client_fn<F, Fut>(f: F) -> ClientFn
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    ClientFn {
        f: Box::new(move |request| Box::pin(f(request))),
    }
}

#[async_trait]
impl Client for ClientFn {
    async fn execute(&self, request: Request) -> Result<Response> {
        (self.f)(request).await
    }
}

impl std::fmt::Debug for ClientFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientFn").finish_non_exhaustive()
    }
}

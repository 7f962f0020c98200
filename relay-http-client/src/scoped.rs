//! Resolving request targets against a base address.

use async_trait::async_trait;
use http::Uri;
use std::sync::Arc;
use url::Url;

use crate::{
    Client, Decorator, HttpClientError, Request, RequestTarget, Response, Result, SharedClient,
};

/// Resolves each request target as a reference against a base URL before
/// sending it.
///
/// Absolute targets are left pointing at their own destination, following
/// standard reference resolution.
#[derive(Debug, Clone)]
pub struct Scoped {
    base: Arc<Url>,
}

impl Scoped {
    /// Parse `base` and scope requests to it.
    pub fn new(base: &str) -> Result<Self> {
        Ok(Self::from_url(Url::parse(base)?))
    }

    /// Scope requests to an already parsed URL.
    pub fn from_url(base: Url) -> Self {
        Self {
            base: Arc::new(base),
        }
    }

    /// The base URL.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolve the reference `target` against the base URL.
    pub fn resolve(&self, target: &str) -> Result<Uri> {
        let resolved = self.base.join(target)?;
        Uri::try_from(resolved.as_str())
            .map_err(|e| HttpClientError::InvalidUrl(format!("{}: {}", resolved, e)))
    }
}

impl Decorator for Scoped {
    fn decorate(&self, client: SharedClient) -> SharedClient {
        Arc::new(ScopedClient {
            scope: self.clone(),
            inner: client,
        })
    }
}

struct ScopedClient {
    scope: Scoped,
    inner: SharedClient,
}

#[async_trait]
impl Client for ScopedClient {
    async fn execute(&self, mut request: Request) -> Result<Response> {
        let target = match request.extensions_mut().remove::<RequestTarget>() {
            Some(target) => target.0,
            None => request.uri().to_string(),
        };
        *request.uri_mut() = self.scope.resolve(&target)?;
        self.inner.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RequestBuilder, client_fn, null_response};
    use parking_lot::Mutex;

    fn capture() -> (SharedClient, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let client = client_fn(move |request: Request| {
            sink.lock().push(request.uri().to_string());
            async { Ok(null_response()) }
        });
        (Arc::new(client), seen)
    }

    #[test]
    fn test_invalid_base_fails_at_construction() {
        assert!(Scoped::new("not a url").is_err());
        assert!(Scoped::new("").is_err());
        assert!(Scoped::new("http://example.com").is_ok());
    }

    #[test]
    fn test_resolve_relative() {
        let scope = Scoped::new("http://example.com/api/").unwrap();
        let uri = scope.resolve("users?page=2").unwrap();
        assert_eq!(uri, "http://example.com/api/users?page=2");

        let uri = scope.resolve("/health").unwrap();
        assert_eq!(uri, "http://example.com/health");

        let uri = scope.resolve("?page=3").unwrap();
        assert_eq!(uri, "http://example.com/api/?page=3");

        let uri = scope.resolve("../v2/items").unwrap();
        assert_eq!(uri, "http://example.com/v2/items");
    }

    #[tokio::test]
    async fn test_path_relative_target_keeps_base_path() {
        let (inner, seen) = capture();
        let client = Scoped::new("http://127.0.0.1:8080/api/")
            .unwrap()
            .decorate(inner);

        for target in ["users/1", "users", "?page=2"] {
            let request = RequestBuilder::get(target).build().unwrap();
            client.execute(request).await.unwrap();
        }

        assert_eq!(
            *seen.lock(),
            vec![
                "http://127.0.0.1:8080/api/users/1".to_string(),
                "http://127.0.0.1:8080/api/users".to_string(),
                "http://127.0.0.1:8080/api/?page=2".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_resolved_request_carries_no_pending_reference() {
        let inner: SharedClient = Arc::new(client_fn(|request: Request| {
            assert!(request.extensions().get::<RequestTarget>().is_none());
            async { Ok(null_response()) }
        }));
        let client = Scoped::new("http://example.com/").unwrap().decorate(inner);

        client
            .execute(RequestBuilder::get("a/b").build().unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_relative_target_reaches_base() {
        let (inner, seen) = capture();
        let client = Scoped::new("http://127.0.0.1:8080").unwrap().decorate(inner);

        client
            .execute(RequestBuilder::get("/test").build().unwrap())
            .await
            .unwrap();

        assert_eq!(*seen.lock(), vec!["http://127.0.0.1:8080/test".to_string()]);
    }

    #[tokio::test]
    async fn test_absolute_target_is_unchanged() {
        let (inner, seen) = capture();
        let client = Scoped::new("http://first.example.com").unwrap().decorate(inner);

        client
            .execute(
                RequestBuilder::get("http://second.example.com/test2")
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            *seen.lock(),
            vec!["http://second.example.com/test2".to_string()]
        );
    }
}

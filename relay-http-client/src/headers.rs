//! Header injecting decorators.
//!
//! All of them only fill in a header the request does not already carry
//! with a non-empty value.

use async_trait::async_trait;
use base64::Engine;
use http::{HeaderName, HeaderValue, header};
use std::sync::Arc;

use crate::{Client, Decorator, Request, Response, Result, SharedClient};

/// Sets a header unless the request already has a non-empty value for it.
#[derive(Debug, Clone)]
pub struct WithHeader {
    name: HeaderName,
    value: HeaderValue,
}

impl WithHeader {
    /// Create the decorator; fails on an invalid header name or value.
    pub fn new(name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            name: HeaderName::try_from(name.as_ref())?,
            value: HeaderValue::try_from(value.as_ref())?,
        })
    }

    /// Create the decorator from typed parts.
    pub fn from_parts(name: HeaderName, value: HeaderValue) -> Self {
        Self { name, value }
    }

    fn apply(&self, request: &mut Request) {
        let present = request
            .headers()
            .get(&self.name)
            .is_some_and(|v| !v.is_empty());
        if !present {
            request
                .headers_mut()
                .insert(self.name.clone(), self.value.clone());
        }
    }
}

impl Decorator for WithHeader {
    fn decorate(&self, client: SharedClient) -> SharedClient {
        Arc::new(HeaderClient {
            headers: vec![self.clone()],
            inner: client,
        })
    }
}

struct HeaderClient {
    headers: Vec<WithHeader>,
    inner: SharedClient,
}

#[async_trait]
impl Client for HeaderClient {
    async fn execute(&self, mut request: Request) -> Result<Response> {
        for header in &self.headers {
            header.apply(&mut request);
        }
        self.inner.execute(request).await
    }
}

/// Sets `Content-Type` and `Accept` to the given media type unless present.
#[derive(Debug, Clone)]
pub struct Typed {
    content_type: HeaderValue,
}

impl Typed {
    /// Create the decorator; fails on a media type that is not a valid header value.
    pub fn new(content_type: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            content_type: HeaderValue::try_from(content_type.as_ref())?,
        })
    }

    /// `application/json` for both headers.
    pub fn json() -> Self {
        Self {
            content_type: HeaderValue::from_static("application/json"),
        }
    }
}

impl Decorator for Typed {
    fn decorate(&self, client: SharedClient) -> SharedClient {
        Arc::new(HeaderClient {
            headers: vec![
                WithHeader::from_parts(header::CONTENT_TYPE, self.content_type.clone()),
                WithHeader::from_parts(header::ACCEPT, self.content_type.clone()),
            ],
            inner: client,
        })
    }
}

/// HTTP Basic Authentication.
///
/// The credentials are only base64 encoded, not encrypted.
#[derive(Debug, Clone)]
pub struct BasicAuth {
    header: WithHeader,
}

impl BasicAuth {
    /// Create the decorator for `username` and `password`.
    pub fn new(username: impl AsRef<str>, password: impl AsRef<str>) -> Result<Self> {
        let credentials = format!("{}:{}", username.as_ref(), password.as_ref());
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
        let mut value = HeaderValue::try_from(format!("Basic {}", encoded))?;
        value.set_sensitive(true);
        Ok(Self {
            header: WithHeader::from_parts(header::AUTHORIZATION, value),
        })
    }
}

impl Decorator for BasicAuth {
    fn decorate(&self, client: SharedClient) -> SharedClient {
        self.header.decorate(client)
    }
}

/// Bearer token authentication.
#[derive(Debug, Clone)]
pub struct BearerAuth {
    header: WithHeader,
}

impl BearerAuth {
    /// Create the decorator for `token`.
    pub fn new(token: impl AsRef<str>) -> Result<Self> {
        let mut value = HeaderValue::try_from(format!("Bearer {}", token.as_ref()))?;
        value.set_sensitive(true);
        Ok(Self {
            header: WithHeader::from_parts(header::AUTHORIZATION, value),
        })
    }
}

impl Decorator for BearerAuth {
    fn decorate(&self, client: SharedClient) -> SharedClient {
        self.header.decorate(client)
    }
}

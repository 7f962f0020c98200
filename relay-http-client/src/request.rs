//! Request type and builder.

use base64::Engine;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use serde::Serialize;
use url::Url;

use crate::{Client, HttpClientError, Response, Result};

/// The request type flowing through every client layer.
///
/// The target may be relative (`/users`, `users/1`, `?page=2`) until a
/// scoping layer resolves it against a host. Bodies are buffered so requests
/// can be replayed.
pub type Request = http::Request<Bytes>;

/// A relative request target waiting to be resolved against a base address.
///
/// `http::Uri` only holds origin-form paths, so references such as
/// `users/1` or `?page=2` travel as this extension. The request URI is `/`
/// (or the path itself when it starts with `/`) until a scoping layer
/// replaces both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget(pub String);

impl RequestTarget {
    /// The reference as written.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The target of `request` as it should be resolved: the unresolved
/// reference when one is attached, the URI otherwise.
pub fn request_target(request: &Request) -> String {
    match request.extensions().get::<RequestTarget>() {
        Some(target) => target.0.clone(),
        None => request.uri().to_string(),
    }
}

/// Copy a request for another attempt.
///
/// Only the unresolved target is carried over from the extensions.
pub fn clone_request(request: &Request) -> Request {
    let mut clone = http::Request::new(request.body().clone());
    *clone.method_mut() = request.method().clone();
    *clone.uri_mut() = request.uri().clone();
    *clone.version_mut() = request.version();
    *clone.headers_mut() = request.headers().clone();
    if let Some(target) = request.extensions().get::<RequestTarget>() {
        clone.extensions_mut().insert(target.clone());
    }
    clone
}

/// HTTP request builder.
///
/// Builder errors (bad header names, unserializable bodies) are deferred to
/// [`RequestBuilder::build`].
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    uri: String,
    headers: HeaderMap,
    query: Vec<(String, String)>,
    body: Bytes,
    error: Option<HttpClientError>,
}

impl RequestBuilder {
    /// Create a new request builder.
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: Bytes::new(),
            error: None,
        }
    }

    /// Create a GET request builder.
    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(Method::GET, uri)
    }

    /// Create a POST request builder.
    pub fn post(uri: impl Into<String>) -> Self {
        Self::new(Method::POST, uri)
    }

    /// Create a PUT request builder.
    pub fn put(uri: impl Into<String>) -> Self {
        Self::new(Method::PUT, uri)
    }

    /// Create a PATCH request builder.
    pub fn patch(uri: impl Into<String>) -> Self {
        Self::new(Method::PATCH, uri)
    }

    /// Create a DELETE request builder.
    pub fn delete(uri: impl Into<String>) -> Self {
        Self::new(Method::DELETE, uri)
    }

    /// Create a HEAD request builder.
    pub fn head(uri: impl Into<String>) -> Self {
        Self::new(Method::HEAD, uri)
    }

    /// Add a header to the request.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        match (
            HeaderName::try_from(name.as_ref()),
            HeaderValue::try_from(value.as_ref()),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            (Err(e), _) => self.fail(e.into()),
            (_, Err(e)) => self.fail(e.into()),
        }
        self
    }

    /// Add multiple headers to the request.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add multiple query parameters.
    pub fn queries<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in params {
            self.query.push((k.into(), v.into()));
        }
        self
    }

    /// Set the request body as raw bytes.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the request body as text.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        self.body = Bytes::from(text.into());
        self
    }

    /// Set the request body as JSON.
    pub fn json<T: Serialize + ?Sized>(mut self, json: &T) -> Self {
        match serde_json::to_vec(json) {
            Ok(bytes) => {
                self.headers.insert(
                    http::header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
                self.body = Bytes::from(bytes);
            }
            Err(e) => self.fail(HttpClientError::Json(e.to_string())),
        }
        self
    }

    /// Set the request body as form data.
    pub fn form<T: Serialize + ?Sized>(mut self, form: &T) -> Self {
        match serde_urlencoded::to_string(form) {
            Ok(encoded) => {
                self.headers.insert(
                    http::header::CONTENT_TYPE,
                    HeaderValue::from_static("application/x-www-form-urlencoded"),
                );
                self.body = Bytes::from(encoded);
            }
            Err(e) => self.fail(HttpClientError::RequestBuild(e.to_string())),
        }
        self
    }

    /// Set bearer authentication.
    pub fn bearer_auth(self, token: impl AsRef<str>) -> Self {
        let value = format!("Bearer {}", token.as_ref());
        self.header("Authorization", value)
    }

    /// Set basic authentication.
    pub fn basic_auth(self, username: impl AsRef<str>, password: Option<&str>) -> Self {
        let credentials = format!("{}:{}", username.as_ref(), password.unwrap_or_default());
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
        self.header("Authorization", format!("Basic {}", encoded))
    }

    fn fail(&mut self, error: HttpClientError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Build the target, appending query parameters.
    fn build_target(&self) -> Result<String> {
        let mut target = self.uri.clone();

        if !self.query.is_empty() {
            let encoded = serde_urlencoded::to_string(&self.query)
                .map_err(|e| HttpClientError::RequestBuild(e.to_string()))?;
            let separator = match target.find('?') {
                Some(idx) if idx + 1 == target.len() || target.ends_with('&') => "",
                Some(_) => "&",
                None => "?",
            };
            target.push_str(separator);
            target.push_str(&encoded);
        }

        Ok(target)
    }

    /// Build the request.
    pub fn build(self) -> Result<Request> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let target = self.build_target()?;
        let mut request = http::Request::new(self.body);
        *request.method_mut() = self.method;
        *request.headers_mut() = self.headers;

        if Url::parse(&target).is_ok() {
            *request.uri_mut() = Uri::try_from(target.as_str())
                .map_err(|e| HttpClientError::InvalidUrl(format!("{}: {}", target, e)))?;
        } else {
            *request.uri_mut() = origin_form(&target).unwrap_or_else(|| Uri::from_static("/"));
            request.extensions_mut().insert(RequestTarget(target));
        }
        Ok(request)
    }

    /// Build the request and execute it with `client`.
    pub async fn send<C: Client + ?Sized>(self, client: &C) -> Result<Response> {
        let request = self.build()?;
        client.execute(request).await
    }
}

fn origin_form(target: &str) -> Option<Uri> {
    if !target.starts_with('/') || target.starts_with("//") {
        return None;
    }
    Uri::try_from(target).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_target_is_kept() {
        let request = RequestBuilder::get("/users/42").build().unwrap();
        assert_eq!(request.uri(), "/users/42");
        assert!(request.uri().scheme().is_none());
        assert_eq!(request_target(&request), "/users/42");
    }

    #[test]
    fn test_path_relative_targets_are_accepted() {
        for target in ["users/1", "?page=2", "users", "../v2/items", "//cdn.example/a"] {
            let request = RequestBuilder::get(target).build().unwrap();
            assert_eq!(request_target(&request), target);
            assert!(request.uri().authority().is_none(), "{target}");
        }

        let request = RequestBuilder::get("users").query("page", "2").build().unwrap();
        assert_eq!(request_target(&request), "users?page=2");
        assert_eq!(request.uri(), "/");
    }

    #[test]
    fn test_absolute_target_has_no_pending_reference() {
        let request = RequestBuilder::get("https://example.com/a?b=c").build().unwrap();
        assert_eq!(request.uri(), "https://example.com/a?b=c");
        assert!(request.extensions().get::<RequestTarget>().is_none());
    }

    #[test]
    fn test_query_parameters() {
        let request = RequestBuilder::get("/search")
            .query("q", "rust lang")
            .queries([("page", "2")])
            .build()
            .unwrap();
        assert_eq!(request.uri(), "/search?q=rust+lang&page=2");

        let request = RequestBuilder::get("http://example.com/search?sort=asc")
            .query("q", "x")
            .build()
            .unwrap();
        assert_eq!(request.uri(), "http://example.com/search?sort=asc&q=x");
    }

    #[test]
    fn test_json_body() {
        let request = RequestBuilder::post("/orders")
            .json(&serde_json::json!({"item": "widget", "quantity": 5}))
            .build()
            .unwrap();

        assert_eq!(
            request.headers().get(http::header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let body: serde_json::Value = serde_json::from_slice(request.body()).unwrap();
        assert_eq!(body["quantity"], 5);
    }

    #[test]
    fn test_form_body() {
        let request = RequestBuilder::post("/login")
            .form(&[("user", "ada"), ("pass", "secret")])
            .build()
            .unwrap();
        assert_eq!(request.body().as_ref(), b"user=ada&pass=secret");
    }

    #[test]
    fn test_basic_auth_header() {
        let request = RequestBuilder::get("/")
            .basic_auth("Aladdin", Some("open sesame"))
            .build()
            .unwrap();
        assert_eq!(
            request.headers().get(http::header::AUTHORIZATION).unwrap(),
            "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ=="
        );
    }

    #[test]
    fn test_invalid_header_is_reported_on_build() {
        let err = RequestBuilder::get("/")
            .header("bad header", "value")
            .build()
            .unwrap_err();
        assert!(matches!(err, HttpClientError::InvalidHeader(_)));
    }

    #[test]
    fn test_clone_request_copies_parts() {
        let original = RequestBuilder::put("items/1")
            .header("X-Trace", "abc")
            .body("payload")
            .build()
            .unwrap();

        let copy = clone_request(&original);
        assert_eq!(copy.method(), Method::PUT);
        assert_eq!(copy.uri(), "/");
        assert_eq!(request_target(&copy), "items/1");
        assert_eq!(copy.headers().get("x-trace").unwrap(), "abc");
        assert_eq!(copy.body().as_ref(), b"payload");
    }
}

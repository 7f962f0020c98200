//! A client layer that never touches the network.

use async_trait::async_trait;
use http::{HeaderMap, StatusCode, Version};
use std::sync::Arc;

use crate::{Client, Decorator, Request, Response, Result, SharedClient};

/// Answers every request with `204 No Content` without calling the wrapped
/// client. Useful for tests and for switching outgoing calls off.
#[derive(Debug, Clone, Copy, Default)]
pub struct Null;

/// The fabricated `204 No Content` response.
pub fn null_response() -> Response {
    let mut response = http::Response::new(reqwest::Body::from(Vec::<u8>::new()));
    *response.status_mut() = StatusCode::NO_CONTENT;
    *response.version_mut() = Version::HTTP_11;
    *response.headers_mut() = HeaderMap::new();
    Response::from(response)
}

impl Decorator for Null {
    fn decorate(&self, _client: SharedClient) -> SharedClient {
        Arc::new(NullClient)
    }
}

struct NullClient;

#[async_trait]
impl Client for NullClient {
    async fn execute(&self, _request: Request) -> Result<Response> {
        Ok(null_response())
    }
}

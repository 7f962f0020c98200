//! Structured request logging.

use async_trait::async_trait;
use http::header;
use std::sync::Arc;
use std::time::Instant;

use crate::{Client, Decorator, Request, Response, Result, SharedClient, request_target};

type Trigger = Arc<dyn Fn() -> bool + Send + Sync>;

/// Logs every completed call through `tracing`.
///
/// Successful calls are logged at `INFO` as `relay client response`, failed
/// ones at `WARN` as `relay client error`. Neither request nor response
/// bodies are logged. An optional trigger decides per request whether to
/// log at all.
#[derive(Clone, Default)]
pub struct Logged {
    trigger: Option<Trigger>,
    log_headers: bool,
}

impl Logged {
    /// Log every request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only log when `trigger` returns true.
    pub fn with_trigger<F>(mut self, trigger: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.trigger = Some(Arc::new(trigger));
        self
    }

    /// Also log request and response headers at `TRACE`.
    pub fn with_headers(mut self) -> Self {
        self.log_headers = true;
        self
    }
}

impl std::fmt::Debug for Logged {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logged")
            .field("trigger", &self.trigger.is_some())
            .field("log_headers", &self.log_headers)
            .finish()
    }
}

impl Decorator for Logged {
    fn decorate(&self, client: SharedClient) -> SharedClient {
        Arc::new(LoggedClient {
            config: self.clone(),
            inner: client,
        })
    }
}

struct LoggedClient {
    config: Logged,
    inner: SharedClient,
}

fn header_str<'a>(headers: &'a http::HeaderMap, name: header::HeaderName) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[async_trait]
impl Client for LoggedClient {
    async fn execute(&self, request: Request) -> Result<Response> {
        if let Some(trigger) = &self.config.trigger
            && !trigger()
        {
            return self.inner.execute(request).await;
        }

        let method = request.method().clone();
        let url = request_target(&request);
        let version = request.version();
        let request_content_length =
            header_str(request.headers(), header::CONTENT_LENGTH).to_string();

        if self.config.log_headers {
            for (name, value) in request.headers() {
                tracing::trace!(header = %name, value = ?value, "Request header");
            }
        }

        let begin = Instant::now();
        let result = self.inner.execute(request).await;
        let took_ms = begin.elapsed().as_millis() as u64;

        match &result {
            Ok(response) => {
                tracing::info!(
                    method = %method,
                    url = %url,
                    proto = ?version,
                    request_content_length = %request_content_length,
                    response_content_length = %header_str(response.headers(), header::CONTENT_LENGTH),
                    response_status = %response.status(),
                    took_ms,
                    "relay client response"
                );

                if self.config.log_headers {
                    for (name, value) in response.headers() {
                        tracing::trace!(header = %name, value = ?value, "Response header");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    method = %method,
                    url = %url,
                    proto = ?version,
                    request_content_length = %request_content_length,
                    took_ms,
                    error = %e,
                    "relay client error"
                );
            }
        }

        result
    }
}

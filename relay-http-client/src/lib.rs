//! # Relay HTTP Client
//!
//! Composable HTTP client layers on top of `reqwest`.
//!
//! Everything is built from two small traits: a [`Client`] executes a
//! request, a [`Decorator`] wraps a client in another client. Stacks are
//! assembled with [`decorate`] (or the [`Decorated`] builder), the first
//! decorator being the outermost layer.
//!
//! ## Layers
//!
//! - **Host pool**: [`StaticClientPool`] balances across hosts with an
//!   epsilon-greedy strategy that favours fast, healthy hosts
//! - **Scoping**: [`Scoped`] resolves relative targets against a base URL
//! - **Retry**: [`FaultTolerant`] retries errors with backoff
//! - **Headers**: [`WithHeader`], [`Typed`], [`BasicAuth`], [`BearerAuth`]
//! - **Logging**: [`Logged`] emits one `tracing` event per call
//! - **Null**: [`Null`] answers `204 No Content` without any I/O
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use relay_http_client::{
//!     FaultTolerant, HttpClientConfig, LinearValueCalculator, Logged, RequestBuilder,
//!     StaticClientPool, Typed, decorate, drain_close,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = HttpClientConfig::builder()
//!         .timeout(Duration::from_secs(10))
//!         .build()
//!         .build_client()?;
//!
//!     let pool = StaticClientPool::new(
//!         vec!["http://10.0.0.1:8080".into(), "http://10.0.0.2:8080".into()],
//!         Duration::from_secs(300),
//!         LinearValueCalculator,
//!     )?;
//!
//!     let client = decorate(
//!         Arc::new(transport),
//!         [
//!             Box::new(Logged::new()) as Box<dyn relay_http_client::Decorator>,
//!             Box::new(FaultTolerant::new(3, Duration::from_millis(100))),
//!             Box::new(pool),
//!             Box::new(Typed::json()),
//!         ],
//!     );
//!
//!     let response = RequestBuilder::post("/orders")
//!         .json(&serde_json::json!({"item": "widget", "quantity": 5}))
//!         .send(&client)
//!         .await?;
//!
//!     println!("Status: {}", response.status());
//!     drain_close(Some(response)).await?;
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod decorator;
mod drain;
mod error;
mod headers;
mod logged;
mod null;
mod pool;
mod request;
mod retry;
mod scoped;
mod tls;

pub use client::{Client, ClientFn, SharedClient, client_fn};
pub use config::{HostPoolConfig, HostPoolConfigBuilder, HttpClientConfig, HttpClientConfigBuilder};
pub use decorator::{Decorated, Decorator, DecoratorFn, decorate, decorator_fn};
pub use drain::{DRAIN_LIMIT, DrainBody, drain_close};
pub use error::{HttpClientError, Result};
pub use headers::{BasicAuth, BearerAuth, Typed, WithHeader};
pub use logged::Logged;
pub use null::{Null, null_response};
pub use pool::{
    DEFAULT_DECAY_DURATION, EPSILON_BUCKETS, EPSILON_DECAY, EpsilonGreedy, HostResponse, HostStats,
    INITIAL_EPSILON, INITIAL_RETRY_DELAY, LinearValueCalculator, MAX_RETRY_INTERVAL, MIN_EPSILON,
    PolynomialValueCalculator, StaticClientPool, ValueCalculator,
};
pub use request::{Request, RequestBuilder, RequestTarget, clone_request, request_target};
pub use retry::{BackoffStrategy, FaultTolerant};
pub use scoped::Scoped;
pub use tls::configure_tls;

/// Response type produced by every client.
pub type Response = reqwest::Response;

// Re-export common types
pub use bytes::Bytes;
pub use http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header};
pub use url::Url;

/// Prelude for common imports.
///
/// ```
/// use relay_http_client::prelude::*;
/// ```
pub mod prelude {
    pub use crate::client::{Client, SharedClient};
    pub use crate::config::{HostPoolConfig, HttpClientConfig};
    pub use crate::decorator::{Decorated, Decorator, decorate};
    pub use crate::drain::drain_close;
    pub use crate::error::{HttpClientError, Result};
    pub use crate::headers::{BasicAuth, BearerAuth, Typed, WithHeader};
    pub use crate::logged::Logged;
    pub use crate::null::Null;
    pub use crate::pool::{LinearValueCalculator, PolynomialValueCalculator, StaticClientPool};
    pub use crate::request::{Request, RequestBuilder};
    pub use crate::retry::{BackoffStrategy, FaultTolerant};
    pub use crate::scoped::Scoped;
    pub use crate::Response;
    pub use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
}

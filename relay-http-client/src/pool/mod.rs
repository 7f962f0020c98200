//! Adaptive multi-host pool.
//!
//! [`StaticClientPool`] spreads requests over a fixed set of base addresses.
//! Each request is sent to the host picked by an [`EpsilonGreedy`] structure,
//! scoped to that host, and its outcome is fed back into the statistics:
//! fast hosts win more traffic and failing hosts are benched for a while.
//!
//! ```rust,no_run
//! use relay_http_client::{Decorator, HttpClientConfig, LinearValueCalculator, RequestBuilder, StaticClientPool};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> relay_http_client::Result<()> {
//! let transport = HttpClientConfig::default().build_client()?;
//! let pool = StaticClientPool::new(
//!     vec!["http://10.0.0.1:8080".into(), "http://10.0.0.2:8080".into()],
//!     Duration::from_secs(60),
//!     LinearValueCalculator,
//! )?;
//!
//! let client = pool.decorate(Arc::new(transport));
//! let response = RequestBuilder::get("/status").send(&client).await?;
//! # Ok(())
//! # }
//! ```

mod epsilon;
mod value;

pub use epsilon::{
    DEFAULT_DECAY_DURATION, EPSILON_BUCKETS, EPSILON_DECAY, EpsilonGreedy, HostResponse, HostStats,
    INITIAL_EPSILON, INITIAL_RETRY_DELAY, MAX_RETRY_INTERVAL, MIN_EPSILON,
};
pub use value::{LinearValueCalculator, PolynomialValueCalculator, ValueCalculator};

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::{
    Client, Decorator, HostPoolConfig, HttpClientError, Request, Response, Result, Scoped,
    SharedClient,
};

/// Decorator balancing requests across a fixed list of hosts.
///
/// Hosts are validated once, at construction. Every client decorated with
/// the same pool shares its statistics; each decorated client keeps its own
/// per-host sub-clients.
#[derive(Debug, Clone)]
pub struct StaticClientPool {
    bases: Arc<HashMap<String, Url>>,
    pool: EpsilonGreedy,
}

impl StaticClientPool {
    /// Create a pool over `hosts`.
    ///
    /// Every host must be an absolute URL with an authority. A zero `decay_duration` selects
    /// [`DEFAULT_DECAY_DURATION`].
    pub fn new(
        hosts: Vec<String>,
        decay_duration: Duration,
        calculator: impl ValueCalculator + 'static,
    ) -> Result<Self> {
        let config = HostPoolConfig::builder(hosts)
            .decay_duration(decay_duration)
            .calculator(calculator)
            .build();
        Self::from_config(config)
    }

    /// Create a pool from a full configuration.
    pub fn from_config(config: HostPoolConfig) -> Result<Self> {
        if config.hosts.is_empty() {
            return Err(HttpClientError::EmptyHostPool);
        }

        let mut bases = HashMap::with_capacity(config.hosts.len());
        for host in &config.hosts {
            let base = Url::parse(host).map_err(|e| HttpClientError::InvalidHost {
                host: host.clone(),
                reason: e.to_string(),
            })?;
            if base.cannot_be_a_base() || base.host_str().is_none() {
                return Err(HttpClientError::InvalidHost {
                    host: host.clone(),
                    reason: "URL has no authority to resolve requests against".to_string(),
                });
            }
            bases.insert(host.clone(), base);
        }

        let pool = EpsilonGreedy::from_config(&config)?;
        debug!(hosts = ?pool.hosts(), "Created host pool");

        Ok(Self {
            bases: Arc::new(bases),
            pool,
        })
    }

    /// The selection structure, for introspection.
    pub fn pool(&self) -> &EpsilonGreedy {
        &self.pool
    }
}

impl Decorator for StaticClientPool {
    fn decorate(&self, client: SharedClient) -> SharedClient {
        Arc::new(PooledClient {
            bases: Arc::clone(&self.bases),
            pool: self.pool.clone(),
            inner: client,
            clients: Mutex::new(HashMap::new()),
        })
    }
}

struct PooledClient {
    bases: Arc<HashMap<String, Url>>,
    pool: EpsilonGreedy,
    inner: SharedClient,
    clients: Mutex<HashMap<String, SharedClient>>,
}

impl PooledClient {
    fn client_for(&self, host: &str) -> Result<SharedClient> {
        let mut clients = self.clients.lock();
        if let Some(client) = clients.get(host) {
            return Ok(Arc::clone(client));
        }

        let base = self
            .bases
            .get(host)
            .ok_or_else(|| HttpClientError::InvalidHost {
                host: host.to_string(),
                reason: "host is not part of the pool".to_string(),
            })?;

        debug!(host, "Building pool sub-client");
        let client = Scoped::from_url(base.clone()).decorate(Arc::clone(&self.inner));
        clients.insert(host.to_string(), Arc::clone(&client));
        Ok(client)
    }
}

#[async_trait]
impl Client for PooledClient {
    async fn execute(&self, request: Request) -> Result<Response> {
        let selection = self.pool.get();
        debug!(host = selection.host(), "Selected pool host");

        let client = match self.client_for(selection.host()) {
            Ok(client) => client,
            Err(e) => {
                selection.mark_failed();
                return Err(e);
            }
        };

        let result = client.execute(request).await;
        selection.mark(&result);
        result
    }
}

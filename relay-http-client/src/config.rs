//! Transport and host pool configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::pool::{DEFAULT_DECAY_DURATION, INITIAL_EPSILON};
use crate::{LinearValueCalculator, Result, ValueCalculator, tls};

/// Configuration of the underlying `reqwest` transport.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Default request timeout.
    pub timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// How long idle connections are kept.
    pub pool_idle_timeout: Duration,
    /// Maximum idle connections per host.
    pub pool_max_idle_per_host: usize,
    /// User agent string.
    pub user_agent: String,
    /// Enable gzip compression.
    pub gzip: bool,
    /// Enable brotli compression.
    pub brotli: bool,
    /// Follow redirects.
    pub follow_redirects: bool,
    /// Maximum redirects to follow.
    pub max_redirects: usize,
    /// PEM bundle replacing the built-in trusted roots.
    pub root_certs: Option<PathBuf>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 32,
            user_agent: format!("relay-http-client/{}", env!("CARGO_PKG_VERSION")),
            gzip: true,
            brotli: true,
            follow_redirects: true,
            max_redirects: 10,
            root_certs: None,
        }
    }
}

impl HttpClientConfig {
    /// Create a new configuration builder.
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }

    /// Build a `reqwest::Client` from this configuration.
    ///
    /// The result implements [`Client`](crate::Client) and is the usual
    /// innermost layer of a decorated stack.
    pub fn build_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .pool_idle_timeout(self.pool_idle_timeout)
            .pool_max_idle_per_host(self.pool_max_idle_per_host)
            .user_agent(&self.user_agent)
            .gzip(self.gzip)
            .brotli(self.brotli);

        builder = if self.follow_redirects {
            builder.redirect(reqwest::redirect::Policy::limited(self.max_redirects))
        } else {
            builder.redirect(reqwest::redirect::Policy::none())
        };

        if let Some(path) = &self.root_certs {
            builder = tls::configure_tls(builder, path)?;
        }

        Ok(builder.build()?)
    }
}

/// Builder for [`HttpClientConfig`].
#[derive(Debug, Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the default request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the connection pool idle timeout.
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.pool_idle_timeout = timeout;
        self
    }

    /// Set the maximum idle connections per host.
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.config.pool_max_idle_per_host = max;
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Enable or disable gzip compression.
    pub fn gzip(mut self, enable: bool) -> Self {
        self.config.gzip = enable;
        self
    }

    /// Enable or disable brotli compression.
    pub fn brotli(mut self, enable: bool) -> Self {
        self.config.brotli = enable;
        self
    }

    /// Enable or disable following redirects.
    pub fn follow_redirects(mut self, enable: bool) -> Self {
        self.config.follow_redirects = enable;
        self
    }

    /// Set the maximum number of redirects to follow.
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.config.max_redirects = max;
        self
    }

    /// Trust only the certificates in the given PEM bundle.
    pub fn root_certs(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.root_certs = Some(path.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// Configuration of an adaptive host pool.
#[derive(Debug, Clone)]
pub struct HostPoolConfig {
    /// Base addresses to balance across.
    pub hosts: Vec<String>,
    /// Window after which observations are forgotten. Zero means the default.
    pub decay_duration: Duration,
    /// Scores hosts from their average response time.
    pub calculator: Arc<dyn ValueCalculator>,
    /// Initial exploration rate.
    pub epsilon: f64,
    /// Seed for the random source; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl HostPoolConfig {
    /// Start a configuration for the given hosts.
    pub fn builder<I, S>(hosts: I) -> HostPoolConfigBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        HostPoolConfigBuilder {
            config: HostPoolConfig {
                hosts: hosts.into_iter().map(Into::into).collect(),
                decay_duration: DEFAULT_DECAY_DURATION,
                calculator: Arc::new(LinearValueCalculator),
                epsilon: INITIAL_EPSILON,
                seed: None,
            },
        }
    }
}

/// Builder for [`HostPoolConfig`].
#[derive(Debug)]
pub struct HostPoolConfigBuilder {
    config: HostPoolConfig,
}

impl HostPoolConfigBuilder {
    /// Set the decay window.
    pub fn decay_duration(mut self, duration: Duration) -> Self {
        self.config.decay_duration = duration;
        self
    }

    /// Set the value calculator.
    pub fn calculator(self, calculator: impl ValueCalculator + 'static) -> Self {
        self.calculator_arc(Arc::new(calculator))
    }

    /// Set a shared value calculator.
    pub fn calculator_arc(mut self, calculator: Arc<dyn ValueCalculator>) -> Self {
        self.config.calculator = calculator;
        self
    }

    /// Set the initial exploration rate.
    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.config.epsilon = epsilon;
        self
    }

    /// Fix the random seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> HostPoolConfig {
        self.config
    }
}

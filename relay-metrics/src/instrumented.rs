//! Prometheus instrumentation decorators
//!
//! Both decorators observe successful calls only; an error from the wrapped
//! client is returned untouched and leaves the collectors unchanged.

use async_trait::async_trait;
use prometheus::{CounterVec, Histogram, HistogramOpts, HistogramVec, Opts, Registry};
use relay_http_client::{
    Client, Decorator, Request, Response, SharedClient, header, request_target,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::{
    DEFAULT_DURATION_BUCKETS, DEFAULT_SIZE_BUCKETS, MetricsError, sanitize_code, sanitize_method,
};

/// Naming and bucket options shared by the collectors of [`Instrumented`].
#[derive(Debug, Clone)]
pub struct InstrumentOpts {
    /// Metric namespace; empty for none.
    pub namespace: String,
    /// Metric subsystem.
    pub subsystem: String,
    /// Constant labels attached to every collector.
    pub const_labels: HashMap<String, String>,
    /// Buckets of the duration histogram, in microseconds.
    pub duration_buckets: Vec<f64>,
    /// Buckets of the size histograms, in bytes.
    pub size_buckets: Vec<f64>,
}

impl InstrumentOpts {
    /// Subsystem `http_client` with the constant label `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            namespace: String::new(),
            subsystem: "http_client".to_string(),
            const_labels: HashMap::from([("name".to_string(), name.into())]),
            duration_buckets: DEFAULT_DURATION_BUCKETS.to_vec(),
            size_buckets: DEFAULT_SIZE_BUCKETS.to_vec(),
        }
    }

    /// Set the namespace
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the subsystem
    pub fn subsystem(mut self, subsystem: impl Into<String>) -> Self {
        self.subsystem = subsystem.into();
        self
    }

    /// Add a constant label
    pub fn const_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.const_labels.insert(name.into(), value.into());
        self
    }

    /// Set custom duration buckets
    pub fn duration_buckets(mut self, buckets: Vec<f64>) -> Self {
        self.duration_buckets = buckets;
        self
    }

    /// Set custom size buckets
    pub fn size_buckets(mut self, buckets: Vec<f64>) -> Self {
        self.size_buckets = buckets;
        self
    }

    fn opts(&self, name: &str, help: &str) -> Opts {
        Opts::new(name, help)
            .namespace(self.namespace.clone())
            .subsystem(self.subsystem.clone())
            .const_labels(self.const_labels.clone())
    }

    fn histogram(&self, name: &str, help: &str, buckets: &[f64]) -> HistogramOpts {
        HistogramOpts::from(self.opts(name, help)).buckets(buckets.to_vec())
    }
}

struct Collectors {
    requests: CounterVec,
    duration: Histogram,
    request_size: Histogram,
    response_size: Histogram,
}

/// Records request counts, durations and sizes of the decorated clients.
///
/// Registers four collectors once, when created:
/// - `requests_total` - counter partitioned by `method` and `code`
/// - `request_duration_microseconds` - histogram
/// - `request_size_bytes` - histogram of approximate request sizes
/// - `response_size_bytes` - histogram of response `Content-Length`
///
/// Every client decorated with the same value shares these collectors.
///
/// # Examples
///
/// ```
/// use relay_http_client::{Decorator, Null};
/// use relay_metrics::Instrumented;
/// use prometheus::Registry;
/// use std::sync::Arc;
///
/// let registry = Registry::new();
/// let instrumented = Instrumented::new("billing", &registry).unwrap();
/// let client = instrumented.decorate(Null.decorate(Arc::new(reqwest::Client::new())));
/// ```
#[derive(Clone)]
pub struct Instrumented {
    collectors: Arc<Collectors>,
}

impl Instrumented {
    /// Instrument under subsystem `http_client` with constant label `name`.
    pub fn new(name: impl Into<String>, registry: &Registry) -> Result<Self, MetricsError> {
        Self::with_opts(InstrumentOpts::new(name), registry)
    }

    /// Instrument with explicit options.
    pub fn with_opts(opts: InstrumentOpts, registry: &Registry) -> Result<Self, MetricsError> {
        let requests = CounterVec::new(
            opts.opts("requests_total", "Total number of HTTP requests made."),
            &["method", "code"],
        )?;
        let duration = Histogram::with_opts(opts.histogram(
            "request_duration_microseconds",
            "The HTTP request latencies in microseconds.",
            &opts.duration_buckets,
        ))?;
        let request_size = Histogram::with_opts(opts.histogram(
            "request_size_bytes",
            "The HTTP request sizes in bytes.",
            &opts.size_buckets,
        ))?;
        let response_size = Histogram::with_opts(opts.histogram(
            "response_size_bytes",
            "The HTTP response sizes in bytes.",
            &opts.size_buckets,
        ))?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(duration.clone()))?;
        registry.register(Box::new(request_size.clone()))?;
        registry.register(Box::new(response_size.clone()))?;

        debug!(
            namespace = %opts.namespace,
            subsystem = %opts.subsystem,
            labels = ?opts.const_labels,
            "Registered HTTP client collectors"
        );

        Ok(Self {
            collectors: Arc::new(Collectors {
                requests,
                duration,
                request_size,
                response_size,
            }),
        })
    }

    /// Request counter by method and code.
    pub fn requests_total(&self) -> &CounterVec {
        &self.collectors.requests
    }

    /// Request duration histogram.
    pub fn request_duration(&self) -> &Histogram {
        &self.collectors.duration
    }

    /// Request size histogram.
    pub fn request_size(&self) -> &Histogram {
        &self.collectors.request_size
    }

    /// Response size histogram.
    pub fn response_size(&self) -> &Histogram {
        &self.collectors.response_size
    }
}

impl fmt::Debug for Instrumented {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instrumented").finish_non_exhaustive()
    }
}

impl Decorator for Instrumented {
    fn decorate(&self, client: SharedClient) -> SharedClient {
        Arc::new(InstrumentedClient {
            collectors: Arc::clone(&self.collectors),
            inner: client,
        })
    }
}

struct InstrumentedClient {
    collectors: Arc<Collectors>,
    inner: SharedClient,
}

#[async_trait]
impl Client for InstrumentedClient {
    async fn execute(&self, request: Request) -> relay_http_client::Result<Response> {
        let method = sanitize_method(request.method());
        let request_size = approximate_request_size(&request);

        let begin = Instant::now();
        let response = self.inner.execute(request).await?;
        let elapsed = begin.elapsed().as_secs_f64() * 1_000_000.0;

        let code = sanitize_code(response.status());
        let collectors = &self.collectors;
        collectors
            .requests
            .with_label_values(&[method.as_str(), code.as_str()])
            .inc();
        collectors.duration.observe(elapsed);
        collectors.request_size.observe(request_size as f64);
        collectors
            .response_size
            .observe(response_content_length(&response) as f64);

        Ok(response)
    }
}

/// Records request durations by method and code.
///
/// # Examples
///
/// ```
/// use relay_metrics::InstrumentedRequestDurations;
/// use prometheus::{HistogramOpts, Registry};
///
/// let registry = Registry::new();
/// let opts = HistogramOpts::new("unused", "unused").subsystem("payments");
/// let durations = InstrumentedRequestDurations::new(opts, &registry).unwrap();
/// ```
#[derive(Clone)]
pub struct InstrumentedRequestDurations {
    durations: HistogramVec,
}

impl InstrumentedRequestDurations {
    /// Register the histogram vector. The metric name and help text of
    /// `opts` are replaced with `request_duration_microseconds`.
    pub fn new(mut opts: HistogramOpts, registry: &Registry) -> Result<Self, MetricsError> {
        opts.common_opts.name = "request_duration_microseconds".to_string();
        opts.common_opts.help = "The HTTP request duration in microseconds.".to_string();

        let durations = HistogramVec::new(opts, &["method", "code"])?;
        registry.register(Box::new(durations.clone()))?;
        Ok(Self { durations })
    }

    /// The duration histograms by method and code.
    pub fn durations(&self) -> &HistogramVec {
        &self.durations
    }
}

impl fmt::Debug for InstrumentedRequestDurations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstrumentedRequestDurations")
            .finish_non_exhaustive()
    }
}

impl Decorator for InstrumentedRequestDurations {
    fn decorate(&self, client: SharedClient) -> SharedClient {
        Arc::new(DurationsClient {
            durations: self.durations.clone(),
            inner: client,
        })
    }
}

struct DurationsClient {
    durations: HistogramVec,
    inner: SharedClient,
}

#[async_trait]
impl Client for DurationsClient {
    async fn execute(&self, request: Request) -> relay_http_client::Result<Response> {
        let method = sanitize_method(request.method());

        let begin = Instant::now();
        let response = self.inner.execute(request).await?;
        let elapsed = begin.elapsed().as_secs_f64() * 1_000_000.0;

        let code = sanitize_code(response.status());
        self.durations
            .with_label_values(&[method.as_str(), code.as_str()])
            .observe(elapsed);

        Ok(response)
    }
}

/// Size of the request as it would roughly appear on the wire: target,
/// method, protocol, headers, host and body.
fn approximate_request_size(request: &Request) -> usize {
    let uri = request.uri();
    let mut size = request_target(request).len();
    size += request.method().as_str().len();
    size += format!("{:?}", request.version()).len();
    for (name, value) in request.headers() {
        size += name.as_str().len() + value.len();
    }
    size += uri.host().map_or(0, str::len);
    size + request.body().len()
}

fn response_content_length(response: &Response) -> u64 {
    response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

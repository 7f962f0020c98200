//! Prometheus instrumentation for relay HTTP clients
//!
//! This crate provides decorators that record client-side request metrics
//! into an explicit Prometheus [`Registry`].
//!
//! # Features
//!
//! - **Request Metrics** - Counts, durations and sizes per decorated client
//! - **Duration Histograms** - Latency partitioned by method and status code
//! - **Text Export** - Render a registry in Prometheus text format
//!
//! # Quick Start
//!
//! ```no_run
//! use relay_http_client::{Decorator, HttpClientConfig, RequestBuilder};
//! use relay_metrics::*;
//! use prometheus::Registry;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Registry::new();
//! let instrumented = Instrumented::new("inventory", &registry)?;
//!
//! let transport = HttpClientConfig::default().build_client()?;
//! let client = instrumented.decorate(Arc::new(transport));
//! RequestBuilder::get("https://inventory.internal/items").send(&client).await?;
//!
//! // Export metrics
//! let metrics_text = export_metrics(&registry);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod histogram;
pub mod instrumented;
pub mod labels;

pub use error::*;
pub use histogram::*;
pub use instrumented::*;
pub use labels::*;
pub use prometheus;

use prometheus::{Encoder, Registry, TextEncoder};

/// Export metrics from a registry as Prometheus text format
///
/// # Examples
///
/// ```
/// use relay_metrics::*;
/// use prometheus::Registry;
///
/// let registry = Registry::new();
/// let metrics = export_metrics(&registry);
/// assert!(metrics.is_empty());
/// ```
pub fn export_metrics(registry: &Registry) -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer)
        .unwrap_or_else(|_| String::from("# Error converting metrics to UTF-8\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_metrics() {
        let registry = Registry::new();
        Instrumented::new("export", &registry).unwrap();

        let metrics = export_metrics(&registry);
        assert!(metrics.contains("# HELP http_client_request_duration_microseconds"));
        assert!(metrics.contains("name=\"export\""));
    }
}

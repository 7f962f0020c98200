//! Metrics error types.

use thiserror::Error;

/// Errors raised while setting up instrumentation.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Creating or registering a collector failed, for instance because a
    /// collector with the same name and labels is already registered.
    #[error("Metric registration failed: {0}")]
    Prometheus(#[from] prometheus::Error),
}

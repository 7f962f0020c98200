// Relay - composable HTTP client decorators for Rust
//
// This library wraps a transport client in small, independent layers:
// adaptive host pools, retries, scoping, headers, logging and metrics.

// Re-export the client layers
pub use relay_http_client::*;

// Re-export optional crates
#[cfg(feature = "metrics")]
pub use relay_metrics;

// Prelude for common imports
pub mod prelude {
    pub use relay_http_client::prelude::*;

    #[cfg(feature = "metrics")]
    pub use relay_metrics::{Instrumented, InstrumentedRequestDurations, export_metrics};
}

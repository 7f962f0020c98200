//! Histogram bucket layouts
//!
//! Durations are recorded in microseconds, sizes in bytes.

/// Default histogram buckets for request durations (in microseconds)
pub const DEFAULT_DURATION_BUCKETS: &[f64] = &[
    500.0,
    1_000.0,
    5_000.0,
    10_000.0,
    25_000.0,
    50_000.0,
    100_000.0,
    250_000.0,
    500_000.0,
    1_000_000.0,
    2_500_000.0,
    5_000_000.0,
    10_000_000.0,
];

/// Default histogram buckets for sizes (in bytes)
pub const DEFAULT_SIZE_BUCKETS: &[f64] = &[
    100.0, 1_000.0, 10_000.0, 100_000.0, 1_000_000.0, 10_000_000.0, 100_000_000.0,
];

//! Retrying failed requests with backoff.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{Client, Decorator, Request, Response, Result, SharedClient, clone_request};

/// Backoff strategy between attempts.
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// No delay between retries.
    None,
    /// Constant delay between retries.
    Constant(Duration),
    /// Linear backoff: the delay grows by a fixed amount per failed attempt.
    Linear {
        /// Delay increment per attempt.
        delay: Duration,
        /// Maximum delay.
        max: Duration,
    },
    /// Exponential backoff.
    Exponential {
        /// Delay after the first failure.
        initial: Duration,
        /// Maximum delay.
        max: Duration,
        /// Multiplier (typically 2.0).
        multiplier: f64,
    },
}

impl BackoffStrategy {
    /// Linear backoff without an upper bound.
    pub fn linear(delay: Duration) -> Self {
        Self::Linear {
            delay,
            max: Duration::MAX,
        }
    }

    /// Delay after the `attempt`-th failed attempt (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        match self {
            Self::None => Duration::ZERO,
            Self::Constant(d) => *d,
            Self::Linear { delay, max } => delay.saturating_mul(attempt).min(*max),
            Self::Exponential {
                initial,
                max,
                multiplier,
            } => {
                let factor = multiplier.powi(attempt as i32 - 1);
                let millis = (initial.as_millis() as f64 * factor) as u64;
                Duration::from_millis(millis).min(*max)
            }
        }
    }
}

/// Retries requests that failed with an error.
///
/// Any error triggers another attempt; responses, whatever their status,
/// end the loop. If every attempt fails the last error is returned.
#[derive(Debug, Clone)]
pub struct FaultTolerant {
    attempts: u32,
    backoff: BackoffStrategy,
}

impl FaultTolerant {
    /// Up to `attempts` attempts, sleeping `backoff * i` after the `i`-th failure.
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self::with_strategy(attempts, BackoffStrategy::linear(backoff))
    }

    /// Up to `attempts` attempts with a custom backoff strategy.
    ///
    /// Zero attempts is treated as one.
    pub fn with_strategy(attempts: u32, backoff: BackoffStrategy) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }

    /// Maximum number of attempts.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The backoff strategy.
    pub fn backoff(&self) -> &BackoffStrategy {
        &self.backoff
    }
}

impl Decorator for FaultTolerant {
    fn decorate(&self, client: SharedClient) -> SharedClient {
        Arc::new(FaultTolerantClient {
            policy: self.clone(),
            inner: client,
        })
    }
}

struct FaultTolerantClient {
    policy: FaultTolerant,
    inner: SharedClient,
}

#[async_trait]
impl Client for FaultTolerantClient {
    async fn execute(&self, request: Request) -> Result<Response> {
        let attempts = self.policy.attempts;
        let mut attempt = 1;

        loop {
            let result = self.inner.execute(clone_request(&request)).await;
            let error = match result {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };

            if attempt >= attempts {
                warn!(attempts, error = %error, "Giving up after all attempts failed");
                return Err(error);
            }

            let delay = self.policy.backoff.delay_for_attempt(attempt);
            debug!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Retrying request after error"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

//! Epsilon-greedy host selection over time-decayed response statistics.
//!
//! Each host keeps a ring of [`EPSILON_BUCKETS`] buckets holding request
//! counts and summed response times. Every `decay_duration / EPSILON_BUCKETS`
//! the ring advances by one bucket and the bucket it lands on is cleared, so
//! observations older than `decay_duration` are forgotten. Decay is applied
//! lazily whenever the structure is touched; there is no background task.
//!
//! Selection explores with probability epsilon (round-robin over live hosts,
//! decaying epsilon towards [`MIN_EPSILON`]) and otherwise exploits: every
//! host with data is scored by the [`ValueCalculator`] and one is drawn with
//! probability proportional to its score.
//!
//! A failed request marks its host dead. Dead hosts are skipped until their
//! retry time, which backs off from [`INITIAL_RETRY_DELAY`] up to
//! [`MAX_RETRY_INTERVAL`]. Hosts are never removed; if every host is dead
//! and none is due, all are revived.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::ValueCalculator;
use crate::{HostPoolConfig, HttpClientError, Result};

/// Number of time buckets kept per host.
pub const EPSILON_BUCKETS: usize = 120;

/// Exploration rate of a fresh pool.
pub const INITIAL_EPSILON: f64 = 0.3;

/// Factor applied to epsilon after each exploration.
pub const EPSILON_DECAY: f64 = 0.9;

/// Lower bound for epsilon: explore one percent of the time.
pub const MIN_EPSILON: f64 = 0.01;

/// Decay duration used when zero is configured.
pub const DEFAULT_DECAY_DURATION: Duration = Duration::from_secs(5 * 60);

/// Delay before a freshly failed host is tried again.
pub const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Upper bound for the retry delay of a host that keeps failing.
pub const MAX_RETRY_INTERVAL: Duration = Duration::from_secs(900);

#[derive(Debug)]
struct HostEntry {
    host: String,
    dead: bool,
    retry_count: u32,
    retry_delay: Duration,
    next_retry: Instant,
    cursor: usize,
    counts: [u64; EPSILON_BUCKETS],
    totals_ms: [f64; EPSILON_BUCKETS],
}

impl HostEntry {
    fn new(host: String, now: Instant) -> Self {
        Self {
            host,
            dead: false,
            retry_count: 0,
            retry_delay: INITIAL_RETRY_DELAY,
            next_retry: now,
            cursor: 0,
            counts: [0; EPSILON_BUCKETS],
            totals_ms: [0.0; EPSILON_BUCKETS],
        }
    }

    fn can_try(&self, now: Instant) -> bool {
        !self.dead || self.next_retry < now
    }

    fn schedule_retry(&mut self, now: Instant) {
        self.retry_count += 1;
        self.retry_delay = self.retry_delay.saturating_mul(2).min(MAX_RETRY_INTERVAL);
        self.next_retry = now + self.retry_delay;
    }

    fn mark_dead(&mut self, now: Instant) -> bool {
        if self.dead {
            return false;
        }
        self.dead = true;
        self.retry_count = 0;
        self.retry_delay = INITIAL_RETRY_DELAY;
        self.next_retry = now + self.retry_delay;
        true
    }

    fn advance(&mut self) {
        self.cursor = (self.cursor + 1) % EPSILON_BUCKETS;
        self.counts[self.cursor] = 0;
        self.totals_ms[self.cursor] = 0.0;
    }

    fn record(&mut self, elapsed: Duration) {
        self.counts[self.cursor] += 1;
        self.totals_ms[self.cursor] += elapsed.as_secs_f64() * 1000.0;
    }

    /// Weighted mean of the per-bucket averages, oldest bucket weighing
    /// `1/EPSILON_BUCKETS` and the current one `1`. Empty buckets after the
    /// first observation repeat the last seen average. Zero without data.
    fn weighted_average_ms(&self) -> f64 {
        let mut weighted = 0.0;
        let mut weights = 0.0;
        let mut last = None;

        for i in 1..=EPSILON_BUCKETS {
            let pos = (self.cursor + i) % EPSILON_BUCKETS;
            if self.counts[pos] > 0 {
                last = Some(self.totals_ms[pos] / self.counts[pos] as f64);
            }
            if let Some(avg) = last {
                let weight = i as f64 / EPSILON_BUCKETS as f64;
                weighted += avg * weight;
                weights += weight;
            }
        }

        if weights > 0.0 { weighted / weights } else { 0.0 }
    }
}

#[derive(Debug)]
struct PoolState {
    entries: Vec<HostEntry>,
    epsilon: f64,
    next_host: usize,
    last_decay: Instant,
    rng: StdRng,
}

impl PoolState {
    fn round_robin(&mut self, now: Instant) -> usize {
        let count = self.entries.len();
        for offset in 0..count {
            let idx = (self.next_host + offset) % count;
            let entry = &mut self.entries[idx];
            if !entry.dead {
                self.next_host = idx + 1;
                return idx;
            }
            if entry.next_retry < now {
                entry.schedule_retry(now);
                self.next_host = idx + 1;
                return idx;
            }
        }

        info!(hosts = count, "All pool hosts are down, reviving all of them");
        for entry in &mut self.entries {
            entry.dead = false;
        }
        self.next_host = 1;
        0
    }
}

#[derive(Debug)]
struct Inner {
    hosts: Vec<String>,
    bucket_duration: Duration,
    calculator: Arc<dyn ValueCalculator>,
    state: Mutex<PoolState>,
}

/// Snapshot of one host's statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct HostStats {
    /// The host identifier.
    pub host: String,
    /// Whether the host is currently considered down.
    pub dead: bool,
    /// How many times a dead host was handed out for a retry.
    pub retry_count: u32,
    /// Decaying average response time; zero without data.
    pub average_response_ms: f64,
}

/// Thread-safe epsilon-greedy selection structure over a fixed set of hosts.
///
/// Cloning is cheap and clones share all state.
#[derive(Debug, Clone)]
pub struct EpsilonGreedy {
    inner: Arc<Inner>,
}

impl EpsilonGreedy {
    /// Create a pool over `hosts` with the default exploration rate.
    pub fn new(
        hosts: Vec<String>,
        decay_duration: Duration,
        calculator: Arc<dyn ValueCalculator>,
    ) -> Result<Self> {
        let config = HostPoolConfig::builder(hosts)
            .decay_duration(decay_duration)
            .calculator_arc(calculator)
            .build();
        Self::from_config(&config)
    }

    /// Create a pool from a full configuration.
    ///
    /// Duplicate hosts are collapsed; an empty host list is an error.
    pub fn from_config(config: &HostPoolConfig) -> Result<Self> {
        let mut seen = HashSet::new();
        let hosts: Vec<String> = config
            .hosts
            .iter()
            .filter(|host| seen.insert(host.as_str()))
            .cloned()
            .collect();

        if hosts.is_empty() {
            return Err(HttpClientError::EmptyHostPool);
        }

        let decay_duration = if config.decay_duration.is_zero() {
            DEFAULT_DECAY_DURATION
        } else {
            config.decay_duration
        };
        let bucket_duration =
            (decay_duration / EPSILON_BUCKETS as u32).max(Duration::from_micros(1));

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let now = Instant::now();
        let state = PoolState {
            entries: hosts
                .iter()
                .map(|host| HostEntry::new(host.clone(), now))
                .collect(),
            epsilon: config.epsilon.clamp(MIN_EPSILON, 1.0),
            next_host: 0,
            last_decay: now,
            rng,
        };

        Ok(Self {
            inner: Arc::new(Inner {
                hosts,
                bucket_duration,
                calculator: Arc::clone(&config.calculator),
                state: Mutex::new(state),
            }),
        })
    }

    /// The hosts in the pool, in configuration order.
    pub fn hosts(&self) -> &[String] {
        &self.inner.hosts
    }

    /// Current exploration rate.
    pub fn epsilon(&self) -> f64 {
        self.inner.state.lock().epsilon
    }

    /// Override the exploration rate (clamped to `MIN_EPSILON..=1.0`).
    pub fn set_epsilon(&self, epsilon: f64) {
        self.inner.state.lock().epsilon = epsilon.clamp(MIN_EPSILON, 1.0);
    }

    /// Pick a host for the next request.
    ///
    /// The returned handle must be marked with the outcome of the request.
    pub fn get(&self) -> HostResponse {
        let now = Instant::now();
        let index = {
            let mut state = self.inner.state.lock();
            self.decay(&mut state, now);
            self.select(&mut state, now)
        };

        HostResponse {
            pool: self.clone(),
            index,
            started: now,
        }
    }

    /// Snapshot of every host's statistics.
    pub fn stats(&self) -> Vec<HostStats> {
        let mut state = self.inner.state.lock();
        self.decay(&mut state, Instant::now());
        state
            .entries
            .iter()
            .map(|entry| HostStats {
                host: entry.host.clone(),
                dead: entry.dead,
                retry_count: entry.retry_count,
                average_response_ms: entry.weighted_average_ms(),
            })
            .collect()
    }

    fn decay(&self, state: &mut PoolState, now: Instant) {
        let bucket = self.inner.bucket_duration;
        let steps = now.saturating_duration_since(state.last_decay).as_nanos() / bucket.as_nanos();
        if steps == 0 {
            return;
        }

        let clears = steps.min(EPSILON_BUCKETS as u128) as usize;
        for entry in &mut state.entries {
            for _ in 0..clears {
                entry.advance();
            }
        }

        state.last_decay = if clears == EPSILON_BUCKETS {
            now
        } else {
            state.last_decay + bucket * clears as u32
        };
    }

    fn select(&self, state: &mut PoolState, now: Instant) -> usize {
        if state.rng.random::<f64>() < state.epsilon {
            state.epsilon = (state.epsilon * EPSILON_DECAY).max(MIN_EPSILON);
            return state.round_robin(now);
        }

        let mut candidates = Vec::with_capacity(state.entries.len());
        let mut total = 0.0;
        for (idx, entry) in state.entries.iter().enumerate() {
            if !entry.can_try(now) {
                continue;
            }
            let avg = entry.weighted_average_ms();
            if avg <= 0.0 {
                continue;
            }
            let value = self.inner.calculator.value(avg);
            if value.is_finite() && value > 0.0 {
                candidates.push((idx, value));
                total += value;
            }
        }

        let Some(&(last, _)) = candidates.last() else {
            return state.round_robin(now);
        };

        let mut chosen = last;
        let pick = state.rng.random::<f64>() * total;
        let mut ceiling = 0.0;
        for &(idx, value) in &candidates {
            ceiling += value;
            if pick < ceiling {
                chosen = idx;
                break;
            }
        }

        let entry = &mut state.entries[chosen];
        if entry.dead {
            entry.schedule_retry(now);
        }
        chosen
    }

    fn record_success(&self, index: usize, elapsed: Duration) {
        let mut state = self.inner.state.lock();
        self.decay(&mut state, Instant::now());
        let entry = &mut state.entries[index];
        if entry.dead {
            debug!(host = %entry.host, "Pool host recovered");
        }
        entry.dead = false;
        entry.record(elapsed);
    }

    fn record_failure(&self, index: usize) {
        let now = Instant::now();
        let mut state = self.inner.state.lock();
        self.decay(&mut state, now);
        let entry = &mut state.entries[index];
        if entry.mark_dead(now) {
            warn!(
                host = %entry.host,
                retry_in_secs = entry.retry_delay.as_secs(),
                "Marking pool host as dead"
            );
        }
    }
}

/// A host selection waiting for the outcome of its request.
///
/// The response time is measured from selection to [`HostResponse::mark`].
#[derive(Debug)]
#[must_use = "report the request outcome with `mark`"]
pub struct HostResponse {
    pool: EpsilonGreedy,
    index: usize,
    started: Instant,
}

impl HostResponse {
    /// The selected host.
    pub fn host(&self) -> &str {
        &self.pool.inner.hosts[self.index]
    }

    /// Report the outcome of the request sent to this host.
    pub fn mark<T, E>(self, result: &std::result::Result<T, E>) {
        match result {
            Ok(_) => self.mark_success(),
            Err(_) => self.mark_failed(),
        }
    }

    /// Report a successful request.
    pub fn mark_success(self) {
        let elapsed = self.started.elapsed();
        self.pool.record_success(self.index, elapsed);
    }

    /// Report a failed request.
    pub fn mark_failed(self) {
        self.pool.record_failure(self.index);
    }
}

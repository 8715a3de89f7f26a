//! Per-provider circuit breaker.
//!
//! Tracks consecutive failures and blocks a provider once a threshold
//! is reached. After a cooldown the breaker admits a single probe
//! (half-open); the probe's outcome decides whether it closes again.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Consecutive failures before the breaker opens.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// How long an open breaker blocks before admitting a probe.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

/// Observable breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Circuit breaker for a single provider.
///
/// The open→half-open transition is a view: it is computed on read
/// from `opened_at` and the cooldown, so no timer task is needed.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_count: u32,
    failure_threshold: u32,
    cooldown: Duration,
    opened_at: Option<Instant>,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_FAILURE_THRESHOLD, DEFAULT_COOLDOWN)
    }

    pub fn with_settings(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            failure_count: 0,
            failure_threshold,
            cooldown,
            opened_at: None,
        }
    }

    /// Current state, resolving cooldown expiry on read.
    pub fn state(&self) -> CircuitState {
        match self.opened_at {
            None => CircuitState::Closed,
            Some(opened) if opened.elapsed() >= self.cooldown => CircuitState::HalfOpen,
            Some(_) => CircuitState::Open,
        }
    }

    /// Whether a request against this provider may proceed.
    /// Closed and half-open admit; open blocks.
    pub fn allow_request(&self) -> bool {
        self.state() != CircuitState::Open
    }

    /// Record a successful outcome. Closes the breaker and clears the
    /// failure count.
    pub fn record_success(&mut self) {
        self.failure_count = 0;
        self.opened_at = None;
    }

    /// Record a failed outcome.
    ///
    /// - closed: count the failure, open at the threshold
    /// - half-open: the probe failed, restart the cooldown
    /// - open: count it, stay open
    pub fn record_failure(&mut self) {
        match self.state() {
            CircuitState::HalfOpen => {
                self.failure_count += 1;
                self.opened_at = Some(Instant::now());
            }
            CircuitState::Closed => {
                self.failure_count += 1;
                if self.failure_count >= self.failure_threshold {
                    self.opened_at = Some(Instant::now());
                }
            }
            CircuitState::Open => {
                self.failure_count += 1;
            }
        }
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    /// Serializable snapshot for the providers-health API.
    pub fn snapshot(&self) -> BreakerSnapshot {
        BreakerSnapshot {
            state: self.state(),
            failure_count: self.failure_count,
            failure_threshold: self.failure_threshold,
            cooldown_seconds: self.cooldown.as_secs(),
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time breaker view, safe to serialize into API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub failure_count: u32,
    pub failure_threshold: u32,
    pub cooldown_seconds: u64,
}

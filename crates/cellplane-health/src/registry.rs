//! Process-wide provider health registry.
//!
//! Combines the operator-set health bit with the circuit breaker into
//! a single eligibility check. Guarded by one reader-writer lock; the
//! lock is never held across I/O.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::breaker::{BreakerSnapshot, CircuitBreaker, CircuitState};

struct Inner {
    health: HashMap<String, bool>,
    breakers: HashMap<String, CircuitBreaker>,
}

/// Health bits and circuit breakers for every provider seen so far.
///
/// Unknown providers default to healthy with a closed breaker.
pub struct HealthRegistry {
    inner: RwLock<Inner>,
    failure_threshold: u32,
    cooldown: Duration,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::with_breaker_settings(
            crate::breaker::DEFAULT_FAILURE_THRESHOLD,
            crate::breaker::DEFAULT_COOLDOWN,
        )
    }

    /// Custom breaker settings, used by tests and by deployments with
    /// unusual failure characteristics.
    pub fn with_breaker_settings(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            inner: RwLock::new(Inner {
                health: HashMap::new(),
                breakers: HashMap::new(),
            }),
            failure_threshold,
            cooldown,
        }
    }

    /// Operator override of a provider's health bit.
    pub fn set_health(&self, provider: &str, healthy: bool) {
        let mut inner = self.inner.write().expect("health lock poisoned");
        inner.health.insert(provider.to_string(), healthy);
        info!(%provider, healthy, "provider health set");
    }

    /// Current health bit (defaults to true).
    pub fn health(&self, provider: &str) -> bool {
        let inner = self.inner.read().expect("health lock poisoned");
        inner.health.get(provider).copied().unwrap_or(true)
    }

    /// Record a successful orchestrator interaction for a provider.
    pub fn record_success(&self, provider: &str) {
        let mut inner = self.inner.write().expect("health lock poisoned");
        let breaker = self.breaker_mut(&mut inner, provider);
        breaker.record_success();
    }

    /// Record a failed orchestrator interaction for a provider.
    pub fn record_failure(&self, provider: &str) {
        let mut inner = self.inner.write().expect("health lock poisoned");
        let breaker = self.breaker_mut(&mut inner, provider);
        let was_blocked = !breaker.allow_request();
        breaker.record_failure();
        if !was_blocked && !breaker.allow_request() {
            warn!(
                %provider,
                failures = breaker.failure_count(),
                "circuit breaker opened"
            );
        }
    }

    /// Whether candidates from this provider may be scheduled:
    /// health bit set AND breaker in closed or half-open state.
    pub fn is_eligible(&self, provider: &str) -> bool {
        let inner = self.inner.read().expect("health lock poisoned");
        let healthy = inner.health.get(provider).copied().unwrap_or(true);
        let breaker_ok = inner
            .breakers
            .get(provider)
            .map(CircuitBreaker::allow_request)
            .unwrap_or(true);
        healthy && breaker_ok
    }

    /// Breaker state for one provider (closed for unknown providers).
    pub fn breaker_state(&self, provider: &str) -> CircuitState {
        let inner = self.inner.read().expect("health lock poisoned");
        inner
            .breakers
            .get(provider)
            .map(CircuitBreaker::state)
            .unwrap_or(CircuitState::Closed)
    }

    /// Point-in-time view of every tracked provider.
    pub fn snapshot(&self) -> HealthSnapshot {
        let inner = self.inner.read().expect("health lock poisoned");
        HealthSnapshot {
            providers: inner
                .health
                .iter()
                .map(|(p, h)| (p.clone(), *h))
                .collect(),
            circuit_breakers: inner
                .breakers
                .iter()
                .map(|(p, b)| (p.clone(), b.snapshot()))
                .collect(),
        }
    }

    fn breaker_mut<'a>(&self, inner: &'a mut Inner, provider: &str) -> &'a mut CircuitBreaker {
        inner
            .breakers
            .entry(provider.to_string())
            .or_insert_with(|| {
                CircuitBreaker::with_settings(self.failure_threshold, self.cooldown)
            })
    }
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable registry view for the providers-health API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub providers: BTreeMap<String, bool>,
    pub circuit_breakers: BTreeMap<String, BreakerSnapshot>,
}

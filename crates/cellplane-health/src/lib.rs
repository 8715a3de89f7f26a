//! cellplane-health — provider eligibility for the scheduler.
//!
//! Two independent bits decide whether a provider's candidates may be
//! scheduled:
//! - An operator-set health bit (defaults to healthy).
//! - A circuit breaker fed by claim-apply outcomes.
//!
//! A provider is eligible iff it is healthy AND its breaker is not open.

pub mod breaker;
pub mod registry;

pub use breaker::{BreakerSnapshot, CircuitBreaker, CircuitState};
pub use registry::{HealthRegistry, HealthSnapshot};

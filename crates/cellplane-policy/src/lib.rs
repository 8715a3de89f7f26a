//! cellplane-policy — the criticality framework and candidate catalog.
//!
//! Holds the read-only policy data loaded at process start:
//! - The tier table: per-tier RTO/RPO targets, hard gates, scoring
//!   weights, and the cross-cloud failover requirement.
//! - The cell catalog: per-cell pools of placement candidates.
//!
//! Also owns the two policy resolution functions the scheduler calls:
//! [`effective_gates`] (tier gates plus HA enforcement) and
//! [`effective_weights`] (experiment substitution plus the cost
//! optimization flag's redistribution).

pub mod cells;
pub mod config;
pub mod error;
pub mod tiers;

pub use cells::CellCatalog;
pub use config::PolicyConfig;
pub use error::{PolicyError, PolicyResult};
pub use tiers::{effective_gates, effective_weights, TierSpec, TierTable};

/// Feature flag consulted by the scheduler: when set, boost the cost
/// weight by 0.20 and redistribute the deduction across the other
/// dimensions.
pub const PREFER_COST_OPTIMIZATION: &str = "prefer_cost_optimization";

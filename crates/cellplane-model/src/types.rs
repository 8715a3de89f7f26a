//! Core vocabulary: tiers, environments, capabilities, scoring dimensions,
//! and candidate catalog entries.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Cloud provider identifier ("aws", "gcp", "oci", ...).
///
/// Kept as a string: the provider set is open, unlike [`Capability`].
pub type Provider = String;

/// Cloud region identifier ("us-east-1", "europe-west1", ...).
pub type Region = String;

// ── Tier ──────────────────────────────────────────────────────────

/// Criticality tier of a workload. Maps to RTO/RPO targets, hard
/// gates, and scoring weights via the policy tier table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Low,
    Medium,
    Critical,
    BusinessCritical,
}

impl Tier {
    pub const ALL: [Tier; 4] = [
        Tier::Low,
        Tier::Medium,
        Tier::Critical,
        Tier::BusinessCritical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Low => "low",
            Tier::Medium => "medium",
            Tier::Critical => "critical",
            Tier::BusinessCritical => "business_critical",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Tier::Low),
            "medium" => Ok(Tier::Medium),
            "critical" => Ok(Tier::Critical),
            "business_critical" => Ok(Tier::BusinessCritical),
            other => Err(format!("unknown tier: {other}")),
        }
    }
}

// ── Environment ───────────────────────────────────────────────────

/// Deployment environment for a requested service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Dev,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev" => Ok(Environment::Dev),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

// ── Capability ────────────────────────────────────────────────────

/// Closed capability vocabulary used by placement gates.
///
/// Gates may only reference capabilities in this set; candidates
/// advertise a subset of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Pitr,
    MultiAz,
    PrivateNetworking,
    CrossRegionReplication,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Pitr => "pitr",
            Capability::MultiAz => "multi_az",
            Capability::PrivateNetworking => "private_networking",
            Capability::CrossRegionReplication => "cross_region_replication",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pitr" => Ok(Capability::Pitr),
            "multi_az" => Ok(Capability::MultiAz),
            "private_networking" => Ok(Capability::PrivateNetworking),
            "cross_region_replication" => Ok(Capability::CrossRegionReplication),
            other => Err(format!("unknown capability: {other}")),
        }
    }
}

// ── Dimensions ────────────────────────────────────────────────────

/// A value per scoring dimension. Used both for tier weights (summing
/// to 1.0) and for candidate baseline scores (each in [0, 1]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub latency: f64,
    pub dr: f64,
    pub maturity: f64,
    pub cost: f64,
}

/// Tolerance for "weights sum to 1.0" checks.
pub const WEIGHT_EPSILON: f64 = 1e-9;

impl Dimensions {
    pub const fn new(latency: f64, dr: f64, maturity: f64, cost: f64) -> Self {
        Self {
            latency,
            dr,
            maturity,
            cost,
        }
    }

    pub fn sum(&self) -> f64 {
        self.latency + self.dr + self.maturity + self.cost
    }

    /// Weighted sum of `self` (baseline scores) against `weights`.
    pub fn dot(&self, weights: &Dimensions) -> f64 {
        self.latency * weights.latency
            + self.dr * weights.dr
            + self.maturity * weights.maturity
            + self.cost * weights.cost
    }

    /// Whether this is a valid weight vector (sums to 1.0 within
    /// [`WEIGHT_EPSILON`], all components non-negative).
    pub fn is_weight_vector(&self) -> bool {
        (self.sum() - 1.0).abs() <= WEIGHT_EPSILON
            && self.latency >= 0.0
            && self.dr >= 0.0
            && self.maturity >= 0.0
            && self.cost >= 0.0
    }

    /// Round every component to 4 decimals (audit-record precision).
    pub fn round4(self) -> Self {
        Self {
            latency: round4(self.latency),
            dr: round4(self.dr),
            maturity: round4(self.maturity),
            cost: round4(self.cost),
        }
    }
}

/// Round to 4 decimal places.
pub fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

// ── Candidate ─────────────────────────────────────────────────────

/// A provider/region/cluster combination eligible for placement.
///
/// Immutable once loaded from configuration, except for the operator
/// controlled `healthy` bit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub provider: Provider,
    pub region: Region,
    pub runtime_cluster: String,
    /// Opaque provider-specific network settings (VPC ids, subnets, ...).
    pub network: BTreeMap<String, String>,
    pub capabilities: BTreeSet<Capability>,
    /// Baseline scores per dimension, each in [0, 1].
    pub baseline_scores: Dimensions,
    #[serde(default = "default_true")]
    pub healthy: bool,
}

fn default_true() -> bool {
    true
}

impl Candidate {
    /// Stable identifier used in logs and audit records.
    pub fn id(&self) -> String {
        format!("{}/{}", self.provider, self.region)
    }
}

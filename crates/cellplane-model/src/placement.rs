//! Placement decisions and the audit record that explains them.
//!
//! The `PlacementReason` is the ground truth for "why did this workload
//! land where it did". It is serialized (canonical, sorted keys) into a
//! Claim annotation, so its wire form is part of the external contract.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{Capability, Dimensions, Provider, Region, Tier};

// ── Placement ─────────────────────────────────────────────────────

/// The chosen provider/region/cluster/network for a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub provider: Provider,
    pub region: Region,
    pub runtime_cluster: String,
    pub network: BTreeMap<String, String>,
}

// ── Experiment arm ────────────────────────────────────────────────

/// Which side of an A/B experiment a request landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arm {
    Control,
    Variant,
}

impl Arm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Arm::Control => "control",
            Arm::Variant => "variant",
        }
    }
}

/// Deterministic experiment assignment recorded in the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentArm {
    pub experiment_id: String,
    pub arm: Arm,
}

// ── Scored / excluded candidates ──────────────────────────────────

/// Per-candidate scoring breakdown for the audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCandidate {
    pub provider: Provider,
    pub region: Region,
    pub runtime_cluster: String,
    pub sub_scores: Dimensions,
    pub total_score: f64,
}

/// A candidate rejected by the gate filter, with the capabilities it
/// was missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExcludedCandidate {
    pub provider: Provider,
    pub region: Region,
    pub gate_failures: Vec<Capability>,
}

/// Winner summary inside the reason record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedCandidate {
    pub provider: Provider,
    pub region: Region,
    pub total_score: f64,
}

// ── PlacementReason ───────────────────────────────────────────────

/// The audit record of a scheduling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementReason {
    pub tier: Tier,
    pub rto_minutes: u32,
    pub rpo_minutes: u32,
    /// Hard gates applied (tier requirements plus HA enforcement).
    pub gates: Vec<Capability>,
    pub ha_enforced: bool,
    /// The weights actually used for scoring, after experiment and
    /// flag adjustments.
    pub weights: Dimensions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experiment_arm: Option<ExperimentArm>,
    pub selected: SelectedCandidate,
    /// Top-ranked survivors (at most 3), best first.
    pub top3: Vec<ScoredCandidate>,
    pub excluded: Vec<ExcludedCandidate>,
    pub candidates_evaluated: usize,
    pub candidates_healthy: usize,
    pub candidates_passed_gates: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failover: Option<Placement>,
    /// Set when the tier requires cross-cloud failover but no
    /// candidate on another provider survived the gates.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub failover_unavailable: bool,
}

/// A full scheduling outcome: where to place, and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementDecision {
    pub placement: Placement,
    pub reason: PlacementReason,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_reason() -> PlacementReason {
        PlacementReason {
            tier: Tier::Medium,
            rto_minutes: 120,
            rpo_minutes: 15,
            gates: vec![Capability::Pitr, Capability::PrivateNetworking],
            ha_enforced: false,
            weights: Dimensions::new(0.25, 0.25, 0.25, 0.25),
            experiment_arm: None,
            selected: SelectedCandidate {
                provider: "aws".into(),
                region: "us-east-1".into(),
                total_score: 0.825,
            },
            top3: vec![],
            excluded: vec![],
            candidates_evaluated: 7,
            candidates_healthy: 7,
            candidates_passed_gates: 5,
            failover: None,
            failover_unavailable: false,
        }
    }

    #[test]
    fn reason_serializes_camel_case() {
        let json = serde_json::to_string(&sample_reason()).unwrap();
        assert!(json.contains("\"rtoMinutes\":120"));
        assert!(json.contains("\"haEnforced\":false"));
        assert!(json.contains("\"candidatesPassedGates\":5"));
    }

    #[test]
    fn absent_failover_and_arm_are_omitted() {
        let json = serde_json::to_string(&sample_reason()).unwrap();
        assert!(!json.contains("failover"));
        assert!(!json.contains("experimentArm"));
    }

    #[test]
    fn failover_unavailable_only_appears_when_set() {
        let mut reason = sample_reason();
        assert!(!serde_json::to_string(&reason)
            .unwrap()
            .contains("failoverUnavailable"));
        reason.failover_unavailable = true;
        assert!(serde_json::to_string(&reason)
            .unwrap()
            .contains("\"failoverUnavailable\":true"));
    }

    #[test]
    fn reason_round_trips() {
        let reason = sample_reason();
        let json = serde_json::to_string(&reason).unwrap();
        let back: PlacementReason = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reason);
    }
}

//! Criticality tiers: RTO/RPO targets, hard gates, and scoring weights.
//!
//! Every tier's weight vector sums to 1.0. Gates are hard: a candidate
//! missing a required capability is excluded, never merely penalized.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use cellplane_model::{Capability, Dimensions, Tier};

use crate::error::{PolicyError, PolicyResult};

/// Immutable specification of one criticality tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierSpec {
    pub id: Tier,
    pub rto_minutes: u32,
    pub rpo_minutes: u32,
    /// Hard gates: candidates missing any of these are rejected.
    pub required_capabilities: BTreeSet<Capability>,
    /// Scoring weights per dimension, summing to 1.0.
    pub weights: Dimensions,
    /// Whether the scheduler must attempt a cross-cloud failover pick.
    pub failover_required: bool,
}

/// The canonical tier table, loaded once at startup and read-only
/// afterwards.
#[derive(Debug, Clone)]
pub struct TierTable {
    specs: BTreeMap<Tier, TierSpec>,
}

impl TierTable {
    /// The builtin four-tier table.
    pub fn builtin() -> Self {
        use Capability::*;
        let specs = [
            TierSpec {
                id: Tier::Low,
                rto_minutes: 30,
                rpo_minutes: 5,
                required_capabilities: BTreeSet::from([Pitr, MultiAz, PrivateNetworking]),
                weights: Dimensions::new(0.30, 0.30, 0.25, 0.15),
                failover_required: true,
            },
            TierSpec {
                id: Tier::Medium,
                rto_minutes: 120,
                rpo_minutes: 15,
                required_capabilities: BTreeSet::from([Pitr, PrivateNetworking]),
                weights: Dimensions::new(0.25, 0.25, 0.25, 0.25),
                failover_required: false,
            },
            TierSpec {
                id: Tier::Critical,
                rto_minutes: 480,
                rpo_minutes: 60,
                required_capabilities: BTreeSet::from([PrivateNetworking]),
                weights: Dimensions::new(0.15, 0.15, 0.20, 0.50),
                failover_required: false,
            },
            TierSpec {
                id: Tier::BusinessCritical,
                rto_minutes: 15,
                rpo_minutes: 1,
                required_capabilities: BTreeSet::from([
                    Pitr,
                    MultiAz,
                    PrivateNetworking,
                    CrossRegionReplication,
                ]),
                weights: Dimensions::new(0.25, 0.40, 0.25, 0.10),
                failover_required: true,
            },
        ];
        Self {
            specs: specs.into_iter().map(|s| (s.id, s)).collect(),
        }
    }

    /// Replace a tier's spec (config overrides). The weights must sum
    /// to 1.0.
    pub fn set(&mut self, spec: TierSpec) -> PolicyResult<()> {
        if !spec.weights.is_weight_vector() {
            return Err(PolicyError::InvalidWeights {
                tier: spec.id.to_string(),
                sum: spec.weights.sum(),
            });
        }
        self.specs.insert(spec.id, spec);
        Ok(())
    }

    /// Look up a tier's spec. The builtin table covers every [`Tier`]
    /// variant, so this never fails after construction.
    pub fn spec(&self, tier: Tier) -> &TierSpec {
        &self.specs[&tier]
    }

    /// All specs in tier order.
    pub fn list(&self) -> impl Iterator<Item = &TierSpec> {
        self.specs.values()
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self::builtin()
    }
}

// ── Resolution ────────────────────────────────────────────────────

/// Hard gates for a request: the tier's requirements, plus `multi_az`
/// when the request asked for HA.
pub fn effective_gates(spec: &TierSpec, ha: bool) -> BTreeSet<Capability> {
    let mut gates = spec.required_capabilities.clone();
    if ha {
        gates.insert(Capability::MultiAz);
    }
    gates
}

/// Cost-weight boost applied by the `prefer_cost_optimization` flag.
const COST_BOOST: f64 = 0.20;

/// Resolve the weights used for scoring.
///
/// Starts from the tier weights; an experiment variant substitutes its
/// own vector; the cost flag then adds [`COST_BOOST`] to cost and
/// deducts it evenly from the other three dimensions. Negative results
/// clamp to zero, with a renormalization pass so the vector still sums
/// to 1.0.
pub fn effective_weights(
    spec: &TierSpec,
    variant_weights: Option<Dimensions>,
    prefer_cost: bool,
) -> Dimensions {
    let mut w = variant_weights.unwrap_or(spec.weights);
    if prefer_cost {
        let share = COST_BOOST / 3.0;
        w.cost += COST_BOOST;
        w.latency -= share;
        w.dr -= share;
        w.maturity -= share;

        if w.latency < 0.0 || w.dr < 0.0 || w.maturity < 0.0 {
            w.latency = w.latency.max(0.0);
            w.dr = w.dr.max(0.0);
            w.maturity = w.maturity.max(0.0);
            let sum = w.sum();
            w.latency /= sum;
            w.dr /= sum;
            w.maturity /= sum;
            w.cost /= sum;
        }
    }
    w
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_covers_all_tiers() {
        let table = TierTable::builtin();
        for tier in Tier::ALL {
            let spec = table.spec(tier);
            assert!(spec.weights.is_weight_vector(), "{tier} weights invalid");
        }
    }

    #[test]
    fn failover_required_for_low_and_business_critical() {
        let table = TierTable::builtin();
        assert!(table.spec(Tier::Low).failover_required);
        assert!(table.spec(Tier::BusinessCritical).failover_required);
        assert!(!table.spec(Tier::Medium).failover_required);
        assert!(!table.spec(Tier::Critical).failover_required);
    }

    #[test]
    fn ha_adds_multi_az_gate() {
        let table = TierTable::builtin();
        let spec = table.spec(Tier::Critical);
        assert!(!spec.required_capabilities.contains(&Capability::MultiAz));

        let gates = effective_gates(spec, true);
        assert!(gates.contains(&Capability::MultiAz));
        assert!(gates.contains(&Capability::PrivateNetworking));
    }

    #[test]
    fn ha_false_leaves_gates_unchanged() {
        let table = TierTable::builtin();
        let spec = table.spec(Tier::Medium);
        assert_eq!(effective_gates(spec, false), spec.required_capabilities);
    }

    #[test]
    fn weights_default_to_tier() {
        let table = TierTable::builtin();
        let spec = table.spec(Tier::Medium);
        let w = effective_weights(spec, None, false);
        assert_eq!(w, spec.weights);
    }

    #[test]
    fn variant_weights_substitute() {
        let table = TierTable::builtin();
        let spec = table.spec(Tier::Critical);
        let variant = Dimensions::new(0.10, 0.10, 0.20, 0.60);
        let w = effective_weights(spec, Some(variant), false);
        assert_eq!(w, variant);
    }

    #[test]
    fn cost_flag_redistributes_evenly() {
        // critical: {0.15, 0.15, 0.20, 0.50} → {0.0833.., 0.0833.., 0.1333.., 0.70}
        let table = TierTable::builtin();
        let spec = table.spec(Tier::Critical);
        let w = effective_weights(spec, None, true);

        assert!((w.cost - 0.70).abs() < 1e-9);
        assert!((w.latency - (0.15 - 0.20 / 3.0)).abs() < 1e-9);
        assert!((w.dr - (0.15 - 0.20 / 3.0)).abs() < 1e-9);
        assert!((w.maturity - (0.20 - 0.20 / 3.0)).abs() < 1e-9);
        assert!(w.is_weight_vector());
    }

    #[test]
    fn cost_flag_clamps_and_renormalizes_extreme_profiles() {
        let mut table = TierTable::builtin();
        table
            .set(TierSpec {
                id: Tier::Critical,
                rto_minutes: 480,
                rpo_minutes: 60,
                required_capabilities: BTreeSet::new(),
                weights: Dimensions::new(0.02, 0.02, 0.06, 0.90),
                failover_required: false,
            })
            .unwrap();

        let w = effective_weights(table.spec(Tier::Critical), None, true);
        assert!(w.latency >= 0.0 && w.dr >= 0.0 && w.maturity >= 0.0);
        assert!(w.is_weight_vector());
        assert!(w.cost > 0.9);
    }

    #[test]
    fn cost_flag_applies_after_variant_substitution() {
        let table = TierTable::builtin();
        let spec = table.spec(Tier::Medium);
        let variant = Dimensions::new(0.25, 0.25, 0.25, 0.25);
        let w = effective_weights(spec, Some(variant), true);
        assert!((w.cost - 0.45).abs() < 1e-9);
        assert!(w.is_weight_vector());
    }

    #[test]
    fn set_rejects_unbalanced_weights() {
        let mut table = TierTable::builtin();
        let result = table.set(TierSpec {
            id: Tier::Low,
            rto_minutes: 30,
            rpo_minutes: 5,
            required_capabilities: BTreeSet::new(),
            weights: Dimensions::new(0.5, 0.5, 0.5, 0.5),
            failover_required: true,
        });
        assert!(matches!(result, Err(PolicyError::InvalidWeights { .. })));
    }
}

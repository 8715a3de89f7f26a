//! The scheduling pipeline.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info};

use cellplane_experiments::{ExperimentStore, FlagStore};
use cellplane_health::HealthRegistry;
use cellplane_model::{
    round4, Candidate, ExcludedCandidate, ExperimentArm, Placement, PlacementDecision,
    PlacementReason, ScoredCandidate, SelectedCandidate, ServiceRequest,
};
use cellplane_policy::{
    effective_gates, effective_weights, CellCatalog, PolicyError, TierTable,
    PREFER_COST_OPTIMIZATION,
};

use crate::error::{ScheduleError, ScheduleResult};

/// The placement decision engine.
///
/// Pure per invocation: all mutable state lives in the injected
/// registries, which the scheduler only reads.
pub struct Scheduler {
    tiers: Arc<TierTable>,
    cells: Arc<CellCatalog>,
    health: Arc<HealthRegistry>,
    experiments: Arc<ExperimentStore>,
    flags: Arc<FlagStore>,
}

impl Scheduler {
    pub fn new(
        tiers: Arc<TierTable>,
        cells: Arc<CellCatalog>,
        health: Arc<HealthRegistry>,
        experiments: Arc<ExperimentStore>,
        flags: Arc<FlagStore>,
    ) -> Self {
        Self {
            tiers,
            cells,
            health,
            experiments,
            flags,
        }
    }

    /// Run the full pipeline for a validated request.
    ///
    /// `exclude_providers` removes providers up front (used by forced
    /// failover); pass an empty set for normal creates.
    pub fn schedule(
        &self,
        request: &ServiceRequest,
        exclude_providers: &BTreeSet<String>,
    ) -> ScheduleResult<PlacementDecision> {
        let spec = self.tiers.spec(request.tier);
        let pool = self.cells.candidates(&request.cell).map_err(|e| match e {
            PolicyError::UnknownCell(c) => ScheduleError::UnknownCell(c),
            // A configured-but-empty cell behaves like a pool where
            // nothing survived filtering.
            PolicyError::EmptyCell(_) => ScheduleError::NoViableCandidate {
                excluded: Vec::new(),
                candidates_evaluated: 0,
                candidates_healthy: 0,
            },
            other => ScheduleError::UnknownCell(other.to_string()),
        })?;
        let candidates_evaluated = pool.len();

        // 1. Health filter.
        let healthy: Vec<&Candidate> = pool
            .iter()
            .filter(|c| {
                if exclude_providers.contains(&c.provider) {
                    debug!(candidate = %c.id(), "excluded by request");
                    return false;
                }
                if !c.healthy {
                    debug!(candidate = %c.id(), "candidate marked unhealthy");
                    return false;
                }
                if !self.health.is_eligible(&c.provider) {
                    debug!(candidate = %c.id(), "provider blocked");
                    return false;
                }
                true
            })
            .collect();
        let candidates_healthy = healthy.len();

        // 2. Arm assignment and weight resolution.
        let assignment = self.experiments.assign_arm(request.tier, &request.name);
        let variant_weights = assignment.as_ref().and_then(|a| a.variant_weights);
        let prefer_cost = self.flags.get(PREFER_COST_OPTIMIZATION);
        let weights = effective_weights(spec, variant_weights, prefer_cost);
        let experiment_arm = assignment.map(|a| ExperimentArm {
            experiment_id: a.experiment_id,
            arm: a.arm,
        });

        // 3. Gate filter.
        let gates = effective_gates(spec, request.ha);
        let mut excluded = Vec::new();
        let mut survivors = Vec::new();
        for candidate in healthy {
            let missing: Vec<_> = gates
                .iter()
                .filter(|g| !candidate.capabilities.contains(g))
                .copied()
                .collect();
            if missing.is_empty() {
                survivors.push(candidate);
            } else {
                debug!(candidate = %candidate.id(), ?missing, "gate failure");
                excluded.push(ExcludedCandidate {
                    provider: candidate.provider.clone(),
                    region: candidate.region.clone(),
                    gate_failures: missing,
                });
            }
        }

        // 4. Scoring.
        let mut ranked: Vec<(ScoredCandidate, &Candidate)> = survivors
            .into_iter()
            .map(|c| {
                let sub_scores = c.baseline_scores.round4();
                let total_score = round4(c.baseline_scores.dot(&weights));
                (
                    ScoredCandidate {
                        provider: c.provider.clone(),
                        region: c.region.clone(),
                        runtime_cluster: c.runtime_cluster.clone(),
                        sub_scores,
                        total_score,
                    },
                    c,
                )
            })
            .collect();

        // 5. Ranking: total desc, dr desc, (provider, region) asc.
        ranked.sort_by(|(a, _), (b, _)| {
            b.total_score
                .total_cmp(&a.total_score)
                .then_with(|| b.sub_scores.dr.total_cmp(&a.sub_scores.dr))
                .then_with(|| match a.provider.cmp(&b.provider) {
                    Ordering::Equal => a.region.cmp(&b.region),
                    other => other,
                })
        });

        // 6. Selection.
        let Some(&(ref winner_score, winner)) = ranked.first() else {
            return Err(ScheduleError::NoViableCandidate {
                excluded,
                candidates_evaluated,
                candidates_healthy,
            });
        };
        let candidates_passed_gates = ranked.len();

        // 7. Failover selection.
        let failover = if spec.failover_required {
            ranked
                .iter()
                .find(|(_, c)| c.provider != winner.provider)
                .map(|&(_, c)| placement_for(c))
        } else {
            None
        };
        let failover_unavailable = spec.failover_required && failover.is_none();

        let placement = placement_for(winner);
        let reason = PlacementReason {
            tier: spec.id,
            rto_minutes: spec.rto_minutes,
            rpo_minutes: spec.rpo_minutes,
            gates: gates.into_iter().collect(),
            ha_enforced: request.ha,
            weights,
            experiment_arm,
            selected: SelectedCandidate {
                provider: winner_score.provider.clone(),
                region: winner_score.region.clone(),
                total_score: winner_score.total_score,
            },
            top3: ranked.iter().take(3).map(|(s, _)| s.clone()).collect(),
            excluded,
            candidates_evaluated,
            candidates_healthy,
            candidates_passed_gates,
            failover,
            failover_unavailable,
        };

        info!(
            namespace = %request.namespace,
            name = %request.name,
            tier = %request.tier,
            provider = %placement.provider,
            region = %placement.region,
            score = reason.selected.total_score,
            "placement decided"
        );

        Ok(PlacementDecision { placement, reason })
    }
}

fn placement_for(candidate: &Candidate) -> Placement {
    Placement {
        provider: candidate.provider.clone(),
        region: candidate.region.clone(),
        runtime_cluster: candidate.runtime_cluster.clone(),
        network: candidate.network.clone(),
    }
}

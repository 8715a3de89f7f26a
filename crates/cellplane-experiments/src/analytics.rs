//! Placement analytics: distributions and running means.
//!
//! Counters are monotonic and process-local; a restart resets them.
//! Means use Welford's update so nothing accumulates unboundedly.

use std::collections::BTreeMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use cellplane_model::{ExperimentArm, Tier};

/// One successful placement, as fed to the recorder.
#[derive(Debug, Clone)]
pub struct PlacementRecord {
    pub provider: String,
    pub region: String,
    pub tier: Tier,
    pub total_score: f64,
    pub experiment: Option<ExperimentArm>,
}

#[derive(Debug, Clone, Copy, Default)]
struct RunningMean {
    count: u64,
    mean: f64,
}

impl RunningMean {
    fn update(&mut self, x: f64) {
        self.count += 1;
        self.mean += (x - self.mean) / self.count as f64;
    }
}

#[derive(Default)]
struct Inner {
    total_placements: u64,
    total_requests: u64,
    gate_rejections: u64,
    provider_counts: BTreeMap<String, u64>,
    region_counts: BTreeMap<String, u64>,
    tier_counts: BTreeMap<String, u64>,
    provider_scores: BTreeMap<String, RunningMean>,
    experiments: BTreeMap<String, BTreeMap<String, RunningMean>>,
}

/// In-memory recorder of placement outcomes.
pub struct AnalyticsRecorder {
    inner: RwLock<Inner>,
}

impl AnalyticsRecorder {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Record a successful placement.
    pub fn record_placement(&self, record: &PlacementRecord) {
        let mut inner = self.inner.write().expect("analytics lock poisoned");
        inner.total_placements += 1;
        inner.total_requests += 1;

        *inner
            .provider_counts
            .entry(record.provider.clone())
            .or_default() += 1;
        *inner
            .region_counts
            .entry(format!("{}/{}", record.provider, record.region))
            .or_default() += 1;
        *inner
            .tier_counts
            .entry(record.tier.as_str().to_string())
            .or_default() += 1;
        inner
            .provider_scores
            .entry(record.provider.clone())
            .or_default()
            .update(record.total_score);

        if let Some(exp) = &record.experiment {
            inner
                .experiments
                .entry(exp.experiment_id.clone())
                .or_default()
                .entry(exp.arm.as_str().to_string())
                .or_default()
                .update(record.total_score);
        }
    }

    /// Record a request that died in the gate filter (no viable
    /// candidate). Counts toward the rejection rate.
    pub fn record_gate_rejection(&self) {
        let mut inner = self.inner.write().expect("analytics lock poisoned");
        inner.gate_rejections += 1;
        inner.total_requests += 1;
    }

    /// Immutable point-in-time summary.
    pub fn snapshot(&self) -> AnalyticsSummary {
        let inner = self.inner.read().expect("analytics lock poisoned");
        let total = inner.total_placements;

        let distribution = |counts: &BTreeMap<String, u64>| {
            counts
                .iter()
                .map(|(k, &count)| {
                    let percentage = if total > 0 {
                        round1(count as f64 / total as f64 * 100.0)
                    } else {
                        0.0
                    };
                    (k.clone(), Share { count, percentage })
                })
                .collect()
        };

        AnalyticsSummary {
            total_placements: total,
            total_requests: inner.total_requests,
            gate_rejection_rate: if inner.total_requests > 0 {
                round4(inner.gate_rejections as f64 / inner.total_requests as f64)
            } else {
                0.0
            },
            provider_distribution: distribution(&inner.provider_counts),
            region_distribution: distribution(&inner.region_counts),
            tier_distribution: distribution(&inner.tier_counts),
            avg_score_by_provider: inner
                .provider_scores
                .iter()
                .map(|(p, m)| (p.clone(), round4(m.mean)))
                .collect(),
            experiments: inner
                .experiments
                .iter()
                .map(|(id, arms)| {
                    let arms = arms
                        .iter()
                        .map(|(arm, m)| {
                            (
                                arm.clone(),
                                ArmSummary {
                                    count: m.count,
                                    avg_score: round4(m.mean),
                                },
                            )
                        })
                        .collect();
                    (id.clone(), arms)
                })
                .collect(),
        }
    }

    /// Drop all counters.
    pub fn reset(&self) {
        *self.inner.write().expect("analytics lock poisoned") = Inner::default();
    }
}

impl Default for AnalyticsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

/// Count plus share of total placements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Share {
    pub count: u64,
    pub percentage: f64,
}

/// Per-arm counters for one experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmSummary {
    pub count: u64,
    pub avg_score: f64,
}

/// Serializable analytics snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total_placements: u64,
    pub total_requests: u64,
    pub gate_rejection_rate: f64,
    pub provider_distribution: BTreeMap<String, Share>,
    pub region_distribution: BTreeMap<String, Share>,
    pub tier_distribution: BTreeMap<String, Share>,
    pub avg_score_by_provider: BTreeMap<String, f64>,
    pub experiments: BTreeMap<String, BTreeMap<String, ArmSummary>>,
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

//! A/B experiments on placement scoring weights.
//!
//! Traffic splits deterministically: the bucket for a request is a
//! 64-bit FNV-1a hash of `"{experiment_id}:{request_name}"`, reduced
//! modulo 10_000. The hash is fixed by this module (not the standard
//! library's) so arm assignment survives process restarts and appears
//! verbatim in audit annotations.

use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::info;

use cellplane_model::{Arm, Dimensions, Tier};

use crate::error::{ExperimentError, ExperimentResult};

// ── Bucketing hash ────────────────────────────────────────────────

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a over a byte string.
pub fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Deterministic bucket in [0, 1) for a request under an experiment.
pub fn bucket(experiment_id: &str, request_name: &str) -> f64 {
    let key = format!("{experiment_id}:{request_name}");
    (fnv1a64(key.as_bytes()) % 10_000) as f64 / 10_000.0
}

// ── Experiment spec ───────────────────────────────────────────────

/// An A/B experiment comparing tier weights (control) against a
/// variant weight vector on a fraction of traffic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSpec {
    pub id: String,
    pub description: String,
    pub variant_weights: Dimensions,
    /// Fraction of traffic assigned to the variant, in [0, 1].
    pub traffic_percentage: f64,
    /// Optional tier scope; `None` applies to every tier.
    #[serde(default)]
    pub tier: Option<Tier>,
    /// Unix timestamp (seconds) of registration.
    #[serde(default)]
    pub created_at: u64,
}

impl ExperimentSpec {
    fn matches_tier(&self, tier: Tier) -> bool {
        self.tier.map_or(true, |t| t == tier)
    }

    /// Arm for a request name under this experiment.
    pub fn assign(&self, request_name: &str) -> Arm {
        if bucket(&self.id, request_name) < self.traffic_percentage {
            Arm::Variant
        } else {
            Arm::Control
        }
    }
}

/// Outcome of arm assignment across the active experiments.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentAssignment {
    pub experiment_id: String,
    pub arm: Arm,
    /// Weight override; populated only for the variant arm.
    pub variant_weights: Option<Dimensions>,
}

// ── Store ─────────────────────────────────────────────────────────

/// Mutable registry of experiments, iterated in creation order.
pub struct ExperimentStore {
    inner: RwLock<Vec<ExperimentSpec>>,
}

impl ExperimentStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Vec::new()),
        }
    }

    /// Register an experiment. Ids must be unique, variant weights
    /// must sum to 1.0, and the traffic fraction must be in [0, 1].
    pub fn create(&self, mut spec: ExperimentSpec) -> ExperimentResult<ExperimentSpec> {
        if !(0.0..=1.0).contains(&spec.traffic_percentage) {
            return Err(ExperimentError::InvalidTraffic(spec.traffic_percentage));
        }
        let sum = spec.variant_weights.sum();
        if (sum - 1.0).abs() > 0.01 {
            return Err(ExperimentError::InvalidWeights(sum));
        }

        let mut experiments = self.inner.write().expect("experiments lock poisoned");
        if experiments.iter().any(|e| e.id == spec.id) {
            return Err(ExperimentError::DuplicateId(spec.id));
        }
        if spec.created_at == 0 {
            spec.created_at = epoch_secs();
        }
        info!(
            id = %spec.id,
            traffic = spec.traffic_percentage,
            tier = ?spec.tier,
            "experiment created"
        );
        experiments.push(spec.clone());
        Ok(spec)
    }

    pub fn get(&self, id: &str) -> Option<ExperimentSpec> {
        let experiments = self.inner.read().expect("experiments lock poisoned");
        experiments.iter().find(|e| e.id == id).cloned()
    }

    /// All experiments in creation order.
    pub fn list(&self) -> Vec<ExperimentSpec> {
        self.inner
            .read()
            .expect("experiments lock poisoned")
            .clone()
    }

    pub fn delete(&self, id: &str) -> bool {
        let mut experiments = self.inner.write().expect("experiments lock poisoned");
        let before = experiments.len();
        experiments.retain(|e| e.id != id);
        before != experiments.len()
    }

    /// Assign a request to an experiment arm.
    ///
    /// Experiments are walked in creation order; the first one that
    /// buckets the request into its variant wins. If none does, the
    /// request is counted as control under the first tier-matching
    /// experiment, so analytics see both arms. With no tier-matching
    /// experiment at all, there is no assignment.
    pub fn assign_arm(&self, tier: Tier, request_name: &str) -> Option<ExperimentAssignment> {
        let experiments = self.inner.read().expect("experiments lock poisoned");
        let mut first_match: Option<&ExperimentSpec> = None;

        for exp in experiments.iter().filter(|e| e.matches_tier(tier)) {
            first_match.get_or_insert(exp);
            if exp.assign(request_name) == Arm::Variant {
                return Some(ExperimentAssignment {
                    experiment_id: exp.id.clone(),
                    arm: Arm::Variant,
                    variant_weights: Some(exp.variant_weights),
                });
            }
        }

        first_match.map(|exp| ExperimentAssignment {
            experiment_id: exp.id.clone(),
            arm: Arm::Control,
            variant_weights: None,
        })
    }
}

impl Default for ExperimentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

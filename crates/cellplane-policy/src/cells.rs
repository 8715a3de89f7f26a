//! The cell catalog: per-cell pools of placement candidates.
//!
//! A cell is the only spatial knob developers get. Each cell maps to a
//! static pool of provider/region candidates with known capabilities
//! and baseline scores; the pool is loaded at startup and read-only.

use std::collections::{BTreeMap, BTreeSet};

use cellplane_model::{Candidate, Capability, Dimensions};

use crate::error::{PolicyError, PolicyResult};

/// Candidate pools keyed by cell name.
#[derive(Debug, Clone, Default)]
pub struct CellCatalog {
    cells: BTreeMap<String, Vec<Candidate>>,
}

impl CellCatalog {
    /// The builtin catalog: one shared pool of seven candidates across
    /// AWS, GCP, and OCI, registered under the `payments` cell.
    pub fn builtin() -> Self {
        let mut catalog = Self::default();
        catalog.insert("payments", builtin_pool());
        catalog
    }

    pub fn insert(&mut self, cell: &str, candidates: Vec<Candidate>) {
        self.cells.insert(cell.to_string(), candidates);
    }

    /// Candidate pool for a cell.
    pub fn candidates(&self, cell: &str) -> PolicyResult<&[Candidate]> {
        let pool = self
            .cells
            .get(cell)
            .ok_or_else(|| PolicyError::UnknownCell(cell.to_string()))?;
        if pool.is_empty() {
            return Err(PolicyError::EmptyCell(cell.to_string()));
        }
        Ok(pool)
    }

    pub fn cell_names(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }
}

fn candidate(
    provider: &str,
    region: &str,
    runtime_cluster: &str,
    network: &[(&str, &str)],
    capabilities: &[Capability],
    baseline_scores: Dimensions,
) -> Candidate {
    Candidate {
        provider: provider.to_string(),
        region: region.to_string(),
        runtime_cluster: runtime_cluster.to_string(),
        network: network
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        capabilities: BTreeSet::from_iter(capabilities.iter().copied()),
        baseline_scores,
        healthy: true,
    }
}

/// The builtin seven-candidate pool (AWS ×3, GCP ×2, OCI ×2).
pub fn builtin_pool() -> Vec<Candidate> {
    use Capability::*;
    vec![
        candidate(
            "aws",
            "us-east-1",
            "aws-use1-prod-01",
            &[("vpc_id", "vpc-aws-use1"), ("subnet_group", "db-private-use1")],
            &[Pitr, MultiAz, PrivateNetworking, CrossRegionReplication],
            Dimensions::new(0.90, 0.95, 0.95, 0.50),
        ),
        candidate(
            "aws",
            "eu-west-1",
            "aws-euw1-prod-01",
            &[("vpc_id", "vpc-aws-euw1"), ("subnet_group", "db-private-euw1")],
            &[Pitr, MultiAz, PrivateNetworking, CrossRegionReplication],
            Dimensions::new(0.70, 0.90, 0.90, 0.45),
        ),
        candidate(
            "aws",
            "us-west-2",
            "aws-usw2-prod-01",
            &[("vpc_id", "vpc-aws-usw2"), ("subnet_group", "db-private-usw2")],
            &[Pitr, MultiAz, PrivateNetworking],
            Dimensions::new(0.85, 0.90, 0.90, 0.55),
        ),
        candidate(
            "gcp",
            "us-central1",
            "gcp-usc1-prod-01",
            &[("vpc_name", "vpc-gcp-usc1"), ("subnet", "db-private-usc1")],
            &[Pitr, MultiAz, PrivateNetworking],
            Dimensions::new(0.88, 0.85, 0.88, 0.65),
        ),
        candidate(
            "gcp",
            "europe-west1",
            "gcp-euw1-prod-01",
            &[("vpc_name", "vpc-gcp-euw1"), ("subnet", "db-private-euw1")],
            &[Pitr, MultiAz, PrivateNetworking],
            Dimensions::new(0.72, 0.82, 0.85, 0.60),
        ),
        candidate(
            "oci",
            "us-ashburn-1",
            "oci-iad-prod-01",
            &[("vcn_id", "vcn-oci-iad"), ("subnet_id", "db-private-iad")],
            &[Pitr, PrivateNetworking],
            Dimensions::new(0.80, 0.70, 0.65, 0.85),
        ),
        candidate(
            "oci",
            "eu-frankfurt-1",
            "oci-fra-prod-01",
            &[("vcn_id", "vcn-oci-fra"), ("subnet_id", "db-private-fra")],
            &[Pitr, PrivateNetworking],
            Dimensions::new(0.68, 0.65, 0.60, 0.90),
        ),
    ]
}

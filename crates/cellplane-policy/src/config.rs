//! policy.toml configuration parser.
//!
//! The file admits tier overrides and cell candidate pools. Anything
//! not configured falls back to the builtin table and catalog, so an
//! empty (or absent) file yields a fully working control plane.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use cellplane_model::{Candidate, Capability, Dimensions, Tier};

use crate::cells::CellCatalog;
use crate::error::PolicyResult;
use crate::tiers::{TierSpec, TierTable};

/// Root of a policy.toml document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub tiers: BTreeMap<Tier, TierConfig>,
    #[serde(default)]
    pub cells: BTreeMap<String, CellConfig>,
}

/// Per-tier override block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierConfig {
    pub rto_minutes: u32,
    pub rpo_minutes: u32,
    pub required_capabilities: Vec<Capability>,
    pub weights: Dimensions,
    #[serde(default)]
    pub failover_required: bool,
}

/// Candidate pool for one cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellConfig {
    pub candidates: Vec<Candidate>,
}

impl PolicyConfig {
    pub fn from_file(path: &Path) -> PolicyResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> PolicyResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Materialize the runtime tables: builtin defaults with this
    /// config's overrides applied on top.
    pub fn into_tables(self) -> PolicyResult<(TierTable, CellCatalog)> {
        let mut tiers = TierTable::builtin();
        for (id, cfg) in self.tiers {
            tiers.set(TierSpec {
                id,
                rto_minutes: cfg.rto_minutes,
                rpo_minutes: cfg.rpo_minutes,
                required_capabilities: cfg.required_capabilities.into_iter().collect(),
                weights: cfg.weights,
                failover_required: cfg.failover_required,
            })?;
        }

        let cells = if self.cells.is_empty() {
            CellCatalog::builtin()
        } else {
            let mut catalog = CellCatalog::default();
            for (name, cfg) in self.cells {
                catalog.insert(&name, cfg.candidates);
            }
            catalog
        };

        Ok((tiers, cells))
    }
}

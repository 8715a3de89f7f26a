//! The developer-facing request contract.
//!
//! Developers specify *what* they need (cell, tier, environment, ha,
//! product parameters). The control plane decides *where* it runs:
//! provider, region, runtime cluster, and network are forbidden inbound.

use serde_json::Map;

use crate::types::{Environment, Tier};

/// Inbound keys that are decided by the control plane and must never
/// appear in a request body.
pub const FORBIDDEN_FIELDS: [&str; 5] = [
    "provider",
    "region",
    "runtimeCluster",
    "runtime_cluster",
    "network",
];

/// A validated service request, common to every product.
///
/// Product-specific parameters stay as raw JSON here; the product
/// registry type-checks them against the product's parameter specs.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRequest {
    pub product: String,
    pub namespace: String,
    pub name: String,
    pub cell: String,
    pub tier: Tier,
    pub environment: Environment,
    pub ha: bool,
    pub params: Map<String, serde_json::Value>,
}

/// Whether `s` is a valid Kubernetes-style resource name:
/// lowercase alphanumerics and dashes, must start and end with an
/// alphanumeric, at most 63 characters.
pub fn is_valid_resource_name(s: &str) -> bool {
    if s.is_empty() || s.len() > 63 {
        return false;
    }
    let bytes = s.as_bytes();
    let alnum = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    if !alnum(bytes[0]) || !alnum(bytes[bytes.len() - 1]) {
        return false;
    }
    bytes.iter().all(|&b| alnum(b) || b == b'-')
}

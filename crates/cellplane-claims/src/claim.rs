//! The Claim document model.
//!
//! Claims follow the Kubernetes object shape (apiVersion, kind,
//! metadata, spec). All maps are BTreeMaps and the placement-reason
//! annotation is canonical JSON (keys sorted), so re-emitting a Claim
//! for the same inputs yields byte-identical serialization.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Annotation key carrying the placement audit record.
pub const PLACEMENT_REASON_ANNOTATION: &str = "platform.example.org/placement-reason";

/// Label prefix for the common metadata labels.
pub const LABEL_PREFIX: &str = "platform.example.org";

/// A declarative claim for one service instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub api_version: String,
    pub kind: String,
    pub metadata: ClaimMetadata,
    pub spec: ClaimSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimMetadata {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimSpec {
    pub parameters: BTreeMap<String, serde_json::Value>,
    pub composition_selector: CompositionSelector,
    pub write_connection_secret_to_ref: SecretRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionSelector {
    pub match_labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretRef {
    pub name: String,
}

impl Claim {
    /// A string parameter from `spec.parameters`.
    pub fn parameter_str(&self, key: &str) -> Option<&str> {
        self.spec.parameters.get(key).and_then(|v| v.as_str())
    }

    /// A boolean parameter from `spec.parameters`.
    pub fn parameter_bool(&self, key: &str) -> Option<bool> {
        self.spec.parameters.get(key).and_then(|v| v.as_bool())
    }

    /// The placement-reason annotation, parsed.
    pub fn placement_reason(&self) -> Option<serde_json::Value> {
        self.metadata
            .annotations
            .get(PLACEMENT_REASON_ANNOTATION)
            .and_then(|raw| serde_json::from_str(raw).ok())
    }
}

/// Serialize with sorted object keys.
///
/// Round-tripping through `serde_json::Value` re-keys every object
/// into the (BTreeMap-backed) default map, so key order is always
/// ascending regardless of struct field order.
pub fn canonical_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let value = serde_json::to_value(value)?;
    serde_json::to_string(&value)
}

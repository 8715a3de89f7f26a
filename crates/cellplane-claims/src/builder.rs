//! Build a Claim from a request, its validated parameters, and the
//! scheduler's decision.
//!
//! Pure function: the same inputs always produce the same document,
//! down to the bytes of the placement-reason annotation.

use std::collections::BTreeMap;

use cellplane_model::{PlacementDecision, ServiceRequest, Value};
use cellplane_products::ProductDefinition;

use crate::claim::{
    canonical_json, Claim, ClaimMetadata, ClaimSpec, CompositionSelector, SecretRef,
    LABEL_PREFIX, PLACEMENT_REASON_ANNOTATION,
};

/// Assemble the Claim document for a placement decision.
pub fn build_claim(
    product: &ProductDefinition,
    request: &ServiceRequest,
    validated_params: &BTreeMap<String, Value>,
    decision: &PlacementDecision,
) -> Claim {
    let placement = &decision.placement;

    // Common fields first, then product parameters, then the decided
    // placement fields. Developers can never set the placement keys:
    // the handler rejects them inbound.
    let mut parameters: BTreeMap<String, serde_json::Value> = BTreeMap::from([
        ("cell".to_string(), request.cell.clone().into()),
        (
            "environment".to_string(),
            request.environment.as_str().into(),
        ),
        ("tier".to_string(), request.tier.as_str().into()),
        ("ha".to_string(), request.ha.into()),
        ("provider".to_string(), placement.provider.clone().into()),
        ("region".to_string(), placement.region.clone().into()),
        (
            "runtimeCluster".to_string(),
            placement.runtime_cluster.clone().into(),
        ),
        (
            "network".to_string(),
            serde_json::to_value(&placement.network).unwrap_or_default(),
        ),
    ]);
    for (name, value) in validated_params {
        parameters.insert(name.clone(), value.to_json());
    }

    let reason_json = canonical_json(&decision.reason)
        .expect("placement reason serializes to JSON");

    Claim {
        api_version: product.api_version.clone(),
        kind: product.kind.clone(),
        metadata: ClaimMetadata {
            namespace: request.namespace.clone(),
            name: request.name.clone(),
            labels: BTreeMap::from([
                (format!("{LABEL_PREFIX}/cell"), request.cell.clone()),
                (
                    format!("{LABEL_PREFIX}/environment"),
                    request.environment.to_string(),
                ),
                (format!("{LABEL_PREFIX}/tier"), request.tier.to_string()),
                (format!("{LABEL_PREFIX}/product"), product.name.clone()),
            ]),
            annotations: BTreeMap::from([(
                PLACEMENT_REASON_ANNOTATION.to_string(),
                reason_json,
            )]),
        },
        spec: ClaimSpec {
            parameters,
            composition_selector: CompositionSelector {
                match_labels: BTreeMap::from([
                    (
                        format!("{}/provider", product.composition_group),
                        placement.provider.clone(),
                    ),
                    (
                        format!("{}/class", product.composition_group),
                        product.composition_class.clone(),
                    ),
                ]),
            },
            write_connection_secret_to_ref: SecretRef {
                name: product.secret_name(&request.name),
            },
        },
    }
}

//! Service lifecycle handlers: create, status, failover, products.
//!
//! Each handler validates, consults the sticky store, and only then
//! lets the scheduler run. Sticky placements are never rescheduled on
//! the create path; failover is the explicit, destructive override.

use std::collections::{BTreeMap, BTreeSet};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use cellplane_claims::{build_claim, ApplyOutcome, Claim};
use cellplane_experiments::PlacementRecord;
use cellplane_model::{
    is_valid_resource_name, Environment, Placement, PlacementDecision, PlacementReason,
    ServiceRequest, Tier, Value as ParamValue, FORBIDDEN_FIELDS,
};
use cellplane_products::{validate_params, ProductDefinition};
use cellplane_scheduler::ScheduleError;

use crate::error::ApiError;
use crate::AppContext;

/// Request keys handled by the common layer, not product validation.
const COMMON_FIELDS: [&str; 6] = ["cell", "tier", "environment", "ha", "namespace", "name"];

// ── Small endpoints ───────────────────────────────────────────────

/// GET /
pub async fn root() -> impl IntoResponse {
    Json(json!({"service": "cellplane-controlplane", "status": "running"}))
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// GET /api/products
pub async fn list_products(State(ctx): State<AppContext>) -> impl IntoResponse {
    let products: Vec<&ProductDefinition> = ctx.products.list().collect();
    Json(json!({ "products": products }))
}

// ── Request parsing ───────────────────────────────────────────────

/// Validate the common contract and the product parameters.
fn parse_request(
    product: &ProductDefinition,
    product_name: &str,
    body: &serde_json::Value,
) -> Result<(ServiceRequest, BTreeMap<String, ParamValue>), ApiError> {
    let Some(object) = body.as_object() else {
        return Err(ApiError::Validation(vec![
            "request body must be a JSON object".to_string(),
        ]));
    };

    // Developer contract: placement fields are decided here, never
    // accepted inbound.
    let present: Vec<&str> = FORBIDDEN_FIELDS
        .iter()
        .copied()
        .filter(|f| object.contains_key(*f))
        .collect();
    if !present.is_empty() {
        return Err(ApiError::Validation(vec![format!(
            "fields {present:?} are decided by the control plane and must not be provided"
        )]));
    }

    let mut errors = Vec::new();

    let cell = object
        .get("cell")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    if cell.is_empty() {
        errors.push("cell is required".to_string());
    }

    let name = object
        .get("name")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    if !is_valid_resource_name(&name) {
        errors.push("name must be a valid resource name".to_string());
    }

    let namespace = object
        .get("namespace")
        .and_then(|v| v.as_str())
        .unwrap_or("default")
        .to_string();
    if !is_valid_resource_name(&namespace) {
        errors.push("namespace must be a valid resource name".to_string());
    }

    let tier = match object.get("tier").and_then(|v| v.as_str()) {
        Some(raw) => match raw.parse::<Tier>() {
            Ok(tier) => Some(tier),
            Err(_) => {
                errors.push("tier must be one of low, medium, critical, business_critical"
                    .to_string());
                None
            }
        },
        None => {
            errors.push("tier is required".to_string());
            None
        }
    };

    let environment = match object.get("environment").and_then(|v| v.as_str()) {
        Some(raw) => match raw.parse::<Environment>() {
            Ok(env) => Some(env),
            Err(_) => {
                errors.push("environment must be one of dev, staging, production".to_string());
                None
            }
        },
        None => {
            errors.push("environment is required".to_string());
            None
        }
    };

    let ha = match object.get("ha") {
        None => false,
        Some(serde_json::Value::Bool(b)) => *b,
        Some(_) => {
            errors.push("ha must be a boolean".to_string());
            false
        }
    };

    let mut params = serde_json::Map::new();
    for (key, value) in object {
        if !COMMON_FIELDS.contains(&key.as_str()) {
            params.insert(key.clone(), value.clone());
        }
    }

    let validated = match validate_params(product, &params) {
        Ok(resolved) => resolved,
        Err(param_errors) => {
            errors.extend(param_errors.iter().map(ToString::to_string));
            BTreeMap::new()
        }
    };

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    Ok((
        ServiceRequest {
            product: product_name.to_string(),
            namespace,
            name,
            cell,
            tier: tier.expect("validated"),
            environment: environment.expect("validated"),
            ha,
            params,
        },
        validated,
    ))
}

// ── Response bodies ───────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CreateResponse {
    status: &'static str,
    sticky: bool,
    product: String,
    placement: Placement,
    reason: PlacementReason,
    claim: Claim,
    applied: bool,
    namespace: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct StickyResponse {
    status: &'static str,
    sticky: bool,
    product: String,
    message: &'static str,
    placement: Placement,
    reason: serde_json::Value,
    namespace: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    product: String,
    claim: Claim,
    #[serde(rename = "connectionSecret")]
    connection_secret: ConnectionSecret,
}

#[derive(Debug, Serialize)]
struct ConnectionSecret {
    name: String,
    namespace: String,
    exists: bool,
}

#[derive(Debug, Serialize)]
struct FailoverResponse {
    status: &'static str,
    product: String,
    previous_provider: String,
    placement: Placement,
    reason: PlacementReason,
    claim: Claim,
    applied: bool,
    namespace: String,
    name: String,
}

/// Optional failover body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailoverBody {
    #[serde(default, alias = "exclude_providers")]
    pub exclude_providers: BTreeSet<String>,
}

// ── Create ────────────────────────────────────────────────────────

/// POST /api/services/{product}
pub async fn create_service(
    State(ctx): State<AppContext>,
    Path(product_name): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, ApiError> {
    create_inner(&ctx, &product_name, body).await
}

/// POST /api/mysql (legacy alias)
pub async fn create_mysql(
    State(ctx): State<AppContext>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, ApiError> {
    create_inner(&ctx, "mysql", body).await
}

async fn create_inner(
    ctx: &AppContext,
    product_name: &str,
    body: serde_json::Value,
) -> Result<Response, ApiError> {
    let product = lookup_product(ctx, product_name)?;
    let (request, validated) = parse_request(product, product_name, &body)?;

    // Sticky check: an existing claim is returned unchanged, with no
    // scheduling run at all.
    if let Some(existing) = ctx
        .store
        .get_claim(product, &request.namespace, &request.name)
        .await?
    {
        let reason = existing.placement_reason().unwrap_or(json!({}));
        return Ok((
            StatusCode::OK,
            Json(StickyResponse {
                status: "exists",
                sticky: true,
                product: product_name.to_string(),
                message: "claim already exists; returning existing placement (sticky)",
                placement: placement_from_claim(&existing),
                reason,
                namespace: request.namespace,
                name: request.name,
            }),
        )
            .into_response());
    }

    let decision = schedule_recorded(ctx, &request, &BTreeSet::new())?;
    let claim = build_claim(product, &request, &validated, &decision);
    let applied = apply_recorded(ctx, product, &claim, &decision).await?;
    record_placement(ctx, &request, &decision);

    Ok((
        StatusCode::CREATED,
        Json(CreateResponse {
            status: "created",
            sticky: false,
            product: product_name.to_string(),
            placement: decision.placement,
            reason: decision.reason,
            claim,
            applied,
            namespace: request.namespace,
            name: request.name,
        }),
    )
        .into_response())
}

// ── Status ────────────────────────────────────────────────────────

/// GET /api/services/{product}/{namespace}/{name}
pub async fn service_status(
    State(ctx): State<AppContext>,
    Path((product_name, namespace, name)): Path<(String, String, String)>,
) -> Result<Response, ApiError> {
    status_inner(&ctx, &product_name, &namespace, &name).await
}

/// GET /api/status/mysql/{namespace}/{name} (legacy alias)
pub async fn mysql_status(
    State(ctx): State<AppContext>,
    Path((namespace, name)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    status_inner(&ctx, "mysql", &namespace, &name).await
}

async fn status_inner(
    ctx: &AppContext,
    product_name: &str,
    namespace: &str,
    name: &str,
) -> Result<Response, ApiError> {
    let product = lookup_product(ctx, product_name)?;
    let claim = ctx
        .store
        .get_claim(product, namespace, name)
        .await?
        .ok_or_else(|| not_found(product, namespace, name))?;

    let secret_name = product.secret_name(name);
    let exists = ctx
        .store
        .connection_secret_exists(namespace, &secret_name)
        .await?;

    Ok(Json(StatusResponse {
        product: product_name.to_string(),
        claim,
        connection_secret: ConnectionSecret {
            name: secret_name,
            namespace: namespace.to_string(),
            exists,
        },
    })
    .into_response())
}

// ── Failover ──────────────────────────────────────────────────────

/// POST /api/services/{product}/{namespace}/{name}/failover
pub async fn service_failover(
    State(ctx): State<AppContext>,
    Path((product_name, namespace, name)): Path<(String, String, String)>,
    body: Option<Json<FailoverBody>>,
) -> Result<Response, ApiError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    failover_inner(&ctx, &product_name, &namespace, &name, body).await
}

/// POST /api/mysql/{namespace}/{name}/failover (legacy alias)
pub async fn mysql_failover(
    State(ctx): State<AppContext>,
    Path((namespace, name)): Path<(String, String)>,
    body: Option<Json<FailoverBody>>,
) -> Result<Response, ApiError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    failover_inner(&ctx, "mysql", &namespace, &name, body).await
}

async fn failover_inner(
    ctx: &AppContext,
    product_name: &str,
    namespace: &str,
    name: &str,
    body: FailoverBody,
) -> Result<Response, ApiError> {
    let product = lookup_product(ctx, product_name)?;
    let existing = ctx
        .store
        .get_claim(product, namespace, name)
        .await?
        .ok_or_else(|| not_found(product, namespace, name))?;

    let previous_provider = existing
        .parameter_str("provider")
        .unwrap_or("unknown")
        .to_string();

    let request = request_from_claim(product_name, &existing, namespace, name);
    let validated = params_from_claim(product, &existing);

    let decision = schedule_recorded(ctx, &request, &body.exclude_providers)?;

    // Destructive by design: the old claim goes away before the new
    // placement is applied.
    if let Err(e) = ctx.store.delete_claim(product, namespace, name).await {
        warn!(%namespace, %name, error = %e, "could not delete claim during failover");
    }

    let claim = build_claim(product, &request, &validated, &decision);
    let applied = apply_recorded(ctx, product, &claim, &decision).await?;
    record_placement(ctx, &request, &decision);

    Ok(Json(FailoverResponse {
        status: "failover_complete",
        product: product_name.to_string(),
        previous_provider,
        placement: decision.placement,
        reason: decision.reason,
        claim,
        applied,
        namespace: namespace.to_string(),
        name: name.to_string(),
    })
    .into_response())
}

// ── Shared helpers ────────────────────────────────────────────────

fn lookup_product<'a>(
    ctx: &'a AppContext,
    name: &str,
) -> Result<&'a ProductDefinition, ApiError> {
    ctx.products.get(name).ok_or_else(|| ApiError::UnknownProduct {
        name: name.to_string(),
        available: ctx.products.names(),
    })
}

fn not_found(product: &ProductDefinition, namespace: &str, name: &str) -> ApiError {
    ApiError::NotFound(format!("{} '{namespace}/{name}' not found", product.kind))
}

fn schedule_recorded(
    ctx: &AppContext,
    request: &ServiceRequest,
    exclude: &BTreeSet<String>,
) -> Result<PlacementDecision, ApiError> {
    ctx.scheduler.schedule(request, exclude).map_err(|e| {
        if matches!(e, ScheduleError::NoViableCandidate { .. }) {
            ctx.analytics.record_gate_rejection();
        }
        ApiError::from(e)
    })
}

/// Apply a claim, feeding the provider's circuit breaker with the
/// outcome.
async fn apply_recorded(
    ctx: &AppContext,
    product: &ProductDefinition,
    claim: &Claim,
    decision: &PlacementDecision,
) -> Result<bool, ApiError> {
    match ctx.store.apply_claim(product, claim).await {
        Ok(ApplyOutcome::Applied) => {
            ctx.health.record_success(&decision.placement.provider);
            Ok(true)
        }
        Ok(ApplyOutcome::StandaloneOnly) => {
            ctx.health.record_success(&decision.placement.provider);
            Ok(false)
        }
        Err(e) => {
            ctx.health.record_failure(&decision.placement.provider);
            Err(e.into())
        }
    }
}

fn record_placement(ctx: &AppContext, request: &ServiceRequest, decision: &PlacementDecision) {
    ctx.analytics.record_placement(&PlacementRecord {
        provider: decision.placement.provider.clone(),
        region: decision.placement.region.clone(),
        tier: request.tier,
        total_score: decision.reason.selected.total_score,
        experiment: decision.reason.experiment_arm.clone(),
    });
}

fn placement_from_claim(claim: &Claim) -> Placement {
    let network = claim
        .spec
        .parameters
        .get("network")
        .and_then(|v| v.as_object())
        .map(|obj| {
            obj.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default();
    Placement {
        provider: claim.parameter_str("provider").unwrap_or("unknown").to_string(),
        region: claim.parameter_str("region").unwrap_or("unknown").to_string(),
        runtime_cluster: claim
            .parameter_str("runtimeCluster")
            .unwrap_or("unknown")
            .to_string(),
        network,
    }
}

/// Rebuild the original request from a stored claim (failover path).
fn request_from_claim(
    product_name: &str,
    claim: &Claim,
    namespace: &str,
    name: &str,
) -> ServiceRequest {
    ServiceRequest {
        product: product_name.to_string(),
        namespace: namespace.to_string(),
        name: name.to_string(),
        cell: claim.parameter_str("cell").unwrap_or_default().to_string(),
        tier: claim
            .parameter_str("tier")
            .and_then(|t| t.parse().ok())
            .unwrap_or(Tier::Medium),
        environment: claim
            .parameter_str("environment")
            .and_then(|e| e.parse().ok())
            .unwrap_or(Environment::Production),
        ha: claim.parameter_bool("ha").unwrap_or(false),
        params: serde_json::Map::new(),
    }
}

/// Pull the product's declared parameters back out of a stored claim.
fn params_from_claim(
    product: &ProductDefinition,
    claim: &Claim,
) -> BTreeMap<String, ParamValue> {
    product
        .parameters
        .iter()
        .filter_map(|spec| {
            claim
                .spec
                .parameters
                .get(&spec.name)
                .and_then(ParamValue::from_json)
                .map(|v| (spec.name.clone(), v))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use cellplane_claims::{MemoryClaimStore, StandaloneStore};
    use cellplane_policy::{CellCatalog, TierTable};
    use cellplane_products::ProductRegistry;

    fn context_with_store(store: Arc<MemoryClaimStore>) -> AppContext {
        AppContext::new(
            TierTable::builtin(),
            CellCatalog::builtin(),
            ProductRegistry::builtin(),
            store,
        )
    }

    fn context() -> AppContext {
        context_with_store(Arc::new(MemoryClaimStore::new()))
    }

    fn mysql_body(name: &str) -> serde_json::Value {
        json!({
            "cell": "payments",
            "tier": "medium",
            "environment": "production",
            "size": "medium",
            "storageGB": 50,
            "ha": true,
            "namespace": "default",
            "name": name,
        })
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn create_returns_201_with_placement() {
        let ctx = context();
        let resp = create_inner(&ctx, "mysql", mysql_body("orders-db"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body = body_json(resp).await;
        assert_eq!(body["status"], "created");
        assert_eq!(body["sticky"], false);
        assert_eq!(body["applied"], true);
        assert_eq!(body["placement"]["provider"], "aws");
        assert_eq!(body["placement"]["region"], "us-east-1");
        assert_eq!(body["claim"]["kind"], "MySQLInstanceClaim");
        assert_eq!(body["reason"]["candidatesPassedGates"], 5);
    }

    #[tokio::test]
    async fn repeated_create_is_sticky_even_after_health_flip() {
        let ctx = context();
        let first = create_inner(&ctx, "mysql", mysql_body("orders-db"))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);
        let first = body_json(first).await;
        let provider = first["placement"]["provider"].as_str().unwrap().to_string();

        // Health flips after placement; sticky must still win.
        ctx.health.set_health(&provider, false);

        let second = create_inner(&ctx, "mysql", mysql_body("orders-db"))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::OK);
        let second = body_json(second).await;
        assert_eq!(second["status"], "exists");
        assert_eq!(second["sticky"], true);
        assert_eq!(second["placement"]["provider"], provider);
    }

    #[tokio::test]
    async fn forbidden_fields_are_rejected() {
        let ctx = context();
        let mut body = mysql_body("orders-db");
        body["provider"] = json!("aws");
        let err = create_inner(&ctx, "mysql", body).await.unwrap_err();
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn validation_errors_are_collected() {
        let ctx = context();
        let body = json!({
            "cell": "payments",
            "tier": "platinum",
            "environment": "production",
            "size": "gigantic",
            "name": "orders-db",
        });
        let err = create_inner(&ctx, "mysql", body).await.unwrap_err();
        match err {
            ApiError::Validation(details) => {
                assert!(details.iter().any(|d| d.contains("tier")));
                assert!(details.iter().any(|d| d.contains("size")));
                assert!(details.iter().any(|d| d.contains("storageGB")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_product_is_404() {
        let ctx = context();
        let err = create_inner(&ctx, "quantumdb", mysql_body("orders-db"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::UnknownProduct { .. }));
    }

    #[tokio::test]
    async fn all_providers_unhealthy_is_422() {
        let ctx = context();
        for p in ["aws", "gcp", "oci"] {
            ctx.health.set_health(p, false);
        }
        let err = create_inner(&ctx, "mysql", mysql_body("orders-db"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NoViableCandidate { .. }));
        // The rejection is visible in analytics.
        assert_eq!(ctx.analytics.snapshot().gate_rejection_rate, 1.0);
    }

    #[tokio::test]
    async fn status_404_when_claim_absent() {
        let ctx = context();
        let err = status_inner(&ctx, "mysql", "default", "ghost-db")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn status_reports_secret_presence_without_contents() {
        let store = Arc::new(MemoryClaimStore::new());
        let ctx = context_with_store(store.clone());
        create_inner(&ctx, "mysql", mysql_body("orders-db"))
            .await
            .unwrap();

        let resp = status_inner(&ctx, "mysql", "default", "orders-db")
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["connectionSecret"]["name"], "orders-db-conn");
        assert_eq!(body["connectionSecret"]["exists"], false);

        store.put_secret("default", "orders-db-conn").await;
        let resp = status_inner(&ctx, "mysql", "default", "orders-db")
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["connectionSecret"]["exists"], true);
        // Presence only: no secret payload anywhere in the response.
        assert!(body["connectionSecret"].get("data").is_none());
    }

    #[tokio::test]
    async fn failover_excludes_previous_provider_on_request() {
        let ctx = context();
        create_inner(&ctx, "mysql", mysql_body("orders-db"))
            .await
            .unwrap();

        let body = FailoverBody {
            exclude_providers: BTreeSet::from(["aws".to_string()]),
        };
        let resp = failover_inner(&ctx, "mysql", "default", "orders-db", body)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_json(resp).await;
        assert_eq!(body["status"], "failover_complete");
        assert_eq!(body["previous_provider"], "aws");
        assert_ne!(body["placement"]["provider"], "aws");
    }

    #[tokio::test]
    async fn failover_without_claim_is_404() {
        let ctx = context();
        let err = failover_inner(&ctx, "mysql", "default", "ghost-db", FailoverBody::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn failover_replaces_the_stored_claim() {
        let store = Arc::new(MemoryClaimStore::new());
        let ctx = context_with_store(store.clone());
        create_inner(&ctx, "mysql", mysql_body("orders-db"))
            .await
            .unwrap();

        let body = FailoverBody {
            exclude_providers: BTreeSet::from(["aws".to_string()]),
        };
        failover_inner(&ctx, "mysql", "default", "orders-db", body)
            .await
            .unwrap();

        // The stored claim now reflects the new provider; storageGB
        // survived the rebuild.
        let resp = status_inner(&ctx, "mysql", "default", "orders-db")
            .await
            .unwrap();
        let claim = &body_json(resp).await["claim"];
        assert_ne!(claim["spec"]["parameters"]["provider"], "aws");
        assert_eq!(claim["spec"]["parameters"]["storageGB"], 50);
    }

    #[tokio::test]
    async fn standalone_store_returns_claim_without_applying() {
        let ctx = AppContext::new(
            TierTable::builtin(),
            CellCatalog::builtin(),
            ProductRegistry::builtin(),
            Arc::new(StandaloneStore::new()),
        );
        let resp = create_inner(&ctx, "mysql", mysql_body("orders-db"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = body_json(resp).await;
        assert_eq!(body["applied"], false);
        assert_eq!(body["claim"]["metadata"]["name"], "orders-db");
    }

    #[tokio::test]
    async fn webapp_product_flows_through_the_same_pipeline() {
        let ctx = context();
        let body = json!({
            "cell": "payments",
            "tier": "low",
            "environment": "production",
            "image": "registry.example.org/shop:v4",
            "name": "shop-web",
        });
        let resp = create_inner(&ctx, "webapp", body).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body = body_json(resp).await;
        assert_eq!(body["claim"]["kind"], "WebAppClaim");
        assert_eq!(body["claim"]["spec"]["parameters"]["port"], 8080);
        // Low tier carries a cross-cloud failover in the reason.
        assert!(body["reason"]["failover"].is_object());
    }

    #[tokio::test]
    async fn missing_crd_surfaces_as_dependency_missing() {
        use async_trait::async_trait;
        use cellplane_claims::{ApplyOutcome, ClaimStore, StoreError};

        struct CrdlessStore;

        #[async_trait]
        impl ClaimStore for CrdlessStore {
            async fn get_claim(
                &self,
                product: &ProductDefinition,
                _namespace: &str,
                _name: &str,
            ) -> Result<Option<Claim>, StoreError> {
                Err(StoreError::DependencyMissing {
                    kind: product.kind.clone(),
                })
            }

            async fn apply_claim(
                &self,
                product: &ProductDefinition,
                _claim: &Claim,
            ) -> Result<ApplyOutcome, StoreError> {
                Err(StoreError::DependencyMissing {
                    kind: product.kind.clone(),
                })
            }

            async fn delete_claim(
                &self,
                product: &ProductDefinition,
                _namespace: &str,
                _name: &str,
            ) -> Result<bool, StoreError> {
                Err(StoreError::DependencyMissing {
                    kind: product.kind.clone(),
                })
            }

            async fn connection_secret_exists(
                &self,
                _namespace: &str,
                _name: &str,
            ) -> Result<bool, StoreError> {
                Ok(false)
            }
        }

        let ctx = AppContext::new(
            TierTable::builtin(),
            CellCatalog::builtin(),
            ProductRegistry::builtin(),
            Arc::new(CrdlessStore),
        );
        let err = create_inner(&ctx, "mysql", mysql_body("orders-db"))
            .await
            .unwrap_err();
        match err {
            ApiError::DependencyMissing(kind) => assert_eq!(kind, "MySQLInstanceClaim"),
            other => panic!("expected DependencyMissing, got {other:?}"),
        }
        let resp = ApiError::DependencyMissing("MySQLInstanceClaim".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::FAILED_DEPENDENCY);
    }

    #[tokio::test]
    async fn create_records_analytics() {
        let ctx = context();
        create_inner(&ctx, "mysql", mysql_body("orders-db"))
            .await
            .unwrap();
        let snap = ctx.analytics.snapshot();
        assert_eq!(snap.total_placements, 1);
        assert_eq!(snap.provider_distribution["aws"].count, 1);
    }
}

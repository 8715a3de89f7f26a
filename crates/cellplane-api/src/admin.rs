//! Operator endpoints: provider health, experiments, flags, analytics.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use cellplane_experiments::{ExperimentError, ExperimentSpec};
use cellplane_model::{Dimensions, Tier};

use crate::error::ApiError;
use crate::AppContext;

// ── Provider health ───────────────────────────────────────────────

/// GET /api/providers/health
pub async fn providers_health(State(ctx): State<AppContext>) -> impl IntoResponse {
    Json(ctx.health.snapshot())
}

#[derive(Debug, Deserialize)]
pub struct HealthUpdate {
    pub healthy: bool,
}

/// PUT /api/providers/{provider}/health
pub async fn set_provider_health(
    State(ctx): State<AppContext>,
    Path(provider): Path<String>,
    Json(update): Json<HealthUpdate>,
) -> impl IntoResponse {
    ctx.health.set_health(&provider, update.healthy);
    Json(json!({
        "provider": provider,
        "healthy": update.healthy,
    }))
}

// ── Experiments ───────────────────────────────────────────────────

/// GET /api/experiments
pub async fn list_experiments(State(ctx): State<AppContext>) -> impl IntoResponse {
    Json(json!({ "experiments": ctx.experiments.list() }))
}

#[derive(Debug, Deserialize)]
pub struct ExperimentCreate {
    pub id: String,
    pub description: String,
    pub variant_weights: Dimensions,
    pub traffic_percentage: f64,
    #[serde(default)]
    pub tier: Option<Tier>,
}

/// POST /api/experiments
pub async fn create_experiment(
    State(ctx): State<AppContext>,
    Json(body): Json<ExperimentCreate>,
) -> Result<Response, ApiError> {
    let spec = ExperimentSpec {
        id: body.id,
        description: body.description,
        variant_weights: body.variant_weights,
        traffic_percentage: body.traffic_percentage,
        tier: body.tier,
        created_at: 0,
    };
    match ctx.experiments.create(spec) {
        Ok(created) => Ok((
            StatusCode::CREATED,
            Json(json!({"status": "created", "experiment": created})),
        )
            .into_response()),
        Err(e @ (ExperimentError::InvalidTraffic(_) | ExperimentError::InvalidWeights(_))) => {
            Err(ApiError::Validation(vec![e.to_string()]))
        }
        Err(e @ ExperimentError::DuplicateId(_)) => Err(ApiError::Validation(vec![e.to_string()])),
        Err(e) => Err(ApiError::Internal(e.to_string())),
    }
}

/// GET /api/experiments/{id}
pub async fn get_experiment(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    match ctx.experiments.get(&id) {
        Some(spec) => Ok(Json(json!({ "experiment": spec })).into_response()),
        None => Err(ApiError::NotFound(format!("experiment '{id}' not found"))),
    }
}

/// DELETE /api/experiments/{id}
pub async fn delete_experiment(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    if ctx.experiments.delete(&id) {
        Ok(Json(json!({"status": "deleted", "id": id})).into_response())
    } else {
        Err(ApiError::NotFound(format!("experiment '{id}' not found")))
    }
}

// ── Feature flags ─────────────────────────────────────────────────

/// GET /api/flags
pub async fn list_flags(State(ctx): State<AppContext>) -> impl IntoResponse {
    Json(json!({ "flags": ctx.flags.list() }))
}

#[derive(Debug, Deserialize)]
pub struct FlagUpdate {
    pub enabled: bool,
}

/// PUT /api/flags/{name}
pub async fn set_flag(
    State(ctx): State<AppContext>,
    Path(name): Path<String>,
    Json(update): Json<FlagUpdate>,
) -> impl IntoResponse {
    ctx.flags.set(&name, update.enabled);
    Json(json!({"flag": name, "enabled": update.enabled}))
}

/// DELETE /api/flags/{name}
pub async fn delete_flag(
    State(ctx): State<AppContext>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    if ctx.flags.delete(&name) {
        Ok(Json(json!({"status": "deleted", "flag": name})).into_response())
    } else {
        Err(ApiError::NotFound(format!("flag '{name}' not found")))
    }
}

// ── Analytics ─────────────────────────────────────────────────────

/// GET /api/analytics
pub async fn analytics_snapshot(State(ctx): State<AppContext>) -> impl IntoResponse {
    Json(ctx.analytics.snapshot())
}

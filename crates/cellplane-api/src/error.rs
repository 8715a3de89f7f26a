//! API error taxonomy and its HTTP mapping.
//!
//! Taxonomy errors return structured bodies `{error, kind, details}`.
//! Unexpected errors map to 500 with a generic message; the detail is
//! logged, never exposed.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use cellplane_model::ExcludedCandidate;

/// Structured error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Everything a handler can fail with.
#[derive(Debug)]
pub enum ApiError {
    Validation(Vec<String>),
    UnknownProduct { name: String, available: Vec<String> },
    UnknownCell(String),
    DependencyMissing(String),
    NoViableCandidate {
        excluded: Vec<ExcludedCandidate>,
        candidates_evaluated: usize,
        candidates_healthy: usize,
    },
    NotFound(String),
    Upstream(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(details) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "Validation failed".to_string(),
                    kind: "validation",
                    details: Some(serde_json::json!(details)),
                },
            ),
            ApiError::UnknownProduct { name, available } => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: format!("unknown product: '{name}'"),
                    kind: "unknown_product",
                    details: Some(serde_json::json!({ "available": available })),
                },
            ),
            ApiError::UnknownCell(cell) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: format!("unknown cell: '{cell}'"),
                    kind: "unknown_cell",
                    details: None,
                },
            ),
            ApiError::DependencyMissing(kind) => (
                StatusCode::FAILED_DEPENDENCY,
                ErrorBody {
                    error: format!(
                        "{kind} CRD is not installed; install the orchestrator CRD and retry"
                    ),
                    kind: "dependency_missing",
                    details: None,
                },
            ),
            ApiError::NoViableCandidate {
                excluded,
                candidates_evaluated,
                candidates_healthy,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorBody {
                    error: "no viable candidate passed health and gate filtering".to_string(),
                    kind: "no_viable_candidate",
                    details: Some(serde_json::json!({
                        "excluded": excluded,
                        "candidates_evaluated": candidates_evaluated,
                        "candidates_healthy": candidates_healthy,
                    })),
                },
            ),
            ApiError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: what,
                    kind: "not_found",
                    details: None,
                },
            ),
            ApiError::Upstream(message) => (
                StatusCode::BAD_GATEWAY,
                ErrorBody {
                    error: message,
                    kind: "upstream",
                    details: Some(serde_json::json!({ "retry_after_seconds": 5 })),
                },
            ),
            ApiError::Internal(detail) => {
                error!(%detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "internal error".to_string(),
                        kind: "internal",
                        details: None,
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<cellplane_claims::StoreError> for ApiError {
    fn from(e: cellplane_claims::StoreError) -> Self {
        use cellplane_claims::StoreError;
        match e {
            StoreError::DependencyMissing { kind } => ApiError::DependencyMissing(kind),
            StoreError::UpstreamTransient(m) | StoreError::Upstream(m) => ApiError::Upstream(m),
        }
    }
}

impl From<cellplane_scheduler::ScheduleError> for ApiError {
    fn from(e: cellplane_scheduler::ScheduleError) -> Self {
        use cellplane_scheduler::ScheduleError;
        match e {
            ScheduleError::UnknownCell(c) => ApiError::UnknownCell(c),
            ScheduleError::NoViableCandidate {
                excluded,
                candidates_evaluated,
                candidates_healthy,
            } => ApiError::NoViableCandidate {
                excluded,
                candidates_evaluated,
                candidates_healthy,
            },
        }
    }
}

//! cellplane-api — REST surface of the control plane.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/health` | Liveness/readiness |
//! | GET | `/api/products` | List registered products |
//! | POST | `/api/services/{product}` | Create a service instance |
//! | GET | `/api/services/{product}/{ns}/{name}` | Claim status |
//! | POST | `/api/services/{product}/{ns}/{name}/failover` | Forced reschedule |
//! | POST | `/api/mysql` | Legacy alias for the mysql product |
//! | GET | `/api/status/mysql/{ns}/{name}` | Legacy mysql status |
//! | POST | `/api/mysql/{ns}/{name}/failover` | Legacy mysql failover |
//! | GET/PUT | `/api/providers/health`, `/api/providers/{p}/health` | Provider health |
//! | GET/POST/DELETE | `/api/experiments[/{id}]` | Experiment CRUD |
//! | GET/PUT/DELETE | `/api/flags[/{name}]` | Flag CRUD |
//! | GET | `/api/analytics` | Analytics snapshot |

pub mod admin;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;

use cellplane_claims::{ClaimStore, StoreClient};
use cellplane_experiments::{AnalyticsRecorder, ExperimentStore, FlagStore};
use cellplane_health::HealthRegistry;
use cellplane_policy::{CellCatalog, TierTable};
use cellplane_products::ProductRegistry;
use cellplane_scheduler::Scheduler;

pub use error::ApiError;

/// Shared state injected into every handler.
///
/// Each service is explicitly owned here (no process-wide singletons),
/// so tests and embeddings build isolated contexts.
#[derive(Clone)]
pub struct AppContext {
    pub products: Arc<ProductRegistry>,
    pub scheduler: Arc<Scheduler>,
    pub health: Arc<HealthRegistry>,
    pub experiments: Arc<ExperimentStore>,
    pub flags: Arc<FlagStore>,
    pub analytics: Arc<AnalyticsRecorder>,
    pub store: StoreClient,
}

impl AppContext {
    /// Wire a context from policy tables, a product registry, and a
    /// claim store.
    pub fn new(
        tiers: TierTable,
        cells: CellCatalog,
        products: ProductRegistry,
        store: Arc<dyn ClaimStore>,
    ) -> Self {
        let tiers = Arc::new(tiers);
        let cells = Arc::new(cells);
        let health = Arc::new(HealthRegistry::new());
        let experiments = Arc::new(ExperimentStore::new());
        let flags = Arc::new(FlagStore::new());
        let scheduler = Arc::new(Scheduler::new(
            tiers.clone(),
            cells,
            health.clone(),
            experiments.clone(),
            flags.clone(),
        ));
        Self {
            products: Arc::new(products),
            scheduler,
            health,
            experiments,
            flags,
            analytics: Arc::new(AnalyticsRecorder::new()),
            store: StoreClient::new(store),
        }
    }
}

/// Build the complete API router.
pub fn build_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/api/products", get(handlers::list_products))
        .route("/api/services/{product}", post(handlers::create_service))
        .route(
            "/api/services/{product}/{namespace}/{name}",
            get(handlers::service_status),
        )
        .route(
            "/api/services/{product}/{namespace}/{name}/failover",
            post(handlers::service_failover),
        )
        .route("/api/mysql", post(handlers::create_mysql))
        .route(
            "/api/status/mysql/{namespace}/{name}",
            get(handlers::mysql_status),
        )
        .route(
            "/api/mysql/{namespace}/{name}/failover",
            post(handlers::mysql_failover),
        )
        .route("/api/providers/health", get(admin::providers_health))
        .route(
            "/api/providers/{provider}/health",
            put(admin::set_provider_health),
        )
        .route(
            "/api/experiments",
            get(admin::list_experiments).post(admin::create_experiment),
        )
        .route(
            "/api/experiments/{id}",
            get(admin::get_experiment).delete(admin::delete_experiment),
        )
        .route("/api/flags", get(admin::list_flags))
        .route(
            "/api/flags/{name}",
            put(admin::set_flag).delete(admin::delete_flag),
        )
        .route("/api/analytics", get(admin::analytics_snapshot))
        .with_state(ctx)
}

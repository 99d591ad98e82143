//! # mportal-api: Member Portal API Service
//!
//! Staff-facing HTTP service for member registration: intake and
//! validation, StoreHub customer sync, and recovery of failed syncs.
//!
//! ## API Surface
//!
//! | Prefix                    | Module                        | Domain                |
//! |---------------------------|-------------------------------|-----------------------|
//! | `/v1/registrations*`      | [`routes::registrations`]     | Registration intake   |
//! | `/v1/submissions/*`       | [`routes::submissions`]       | Recovery views        |
//! | `/v1/call-logs`           | [`routes::submissions`]       | StoreHub call log     |
//! | `/api/storehub/*`         | [`routes::storehub`]          | Sync actions          |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → Handler
//! ```
//!
//! Health probes, `/metrics`, and the batch recovery endpoint sit outside
//! staff auth; the batch endpoint checks its own shared secret.

pub mod auth;
pub mod call_log;
pub mod db;
pub mod error;
pub mod extractors;
pub mod lifecycle;
pub mod metrics;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod submissions;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use crate::auth::AuthConfig;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    // Staff-authenticated routes.
    let api = Router::new()
        .merge(routes::registrations::router())
        .merge(routes::submissions::router())
        .merge(routes::storehub::router())
        .merge(openapi::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(axum::Extension(auth_config));

    // Secret-guarded batch recovery.
    let batch = routes::storehub::batch_router();

    // Unauthenticated probes and scrape endpoint.
    let ops = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(render_metrics));

    Router::new()
        .merge(ops)
        .merge(batch)
        .merge(api)
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(middleware::tracing_layer::layer())
        .with_state(state)
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 503 while an attached database is unreachable.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!(error = %e, "readiness check failed: database unreachable");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unavailable");
        }
    }
    (StatusCode::OK, "ready")
}

/// GET /metrics: Prometheus text exposition.
async fn render_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed".to_string(),
        ),
    }
}

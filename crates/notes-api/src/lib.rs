//! # notes-api: Axum Service for Personal Notes
//!
//! JWT-authenticated, owner-scoped CRUD over notes, with cursor pagination
//! and a uniform error envelope.
//!
//! ## API Surface
//!
//! | Path                  | Module               | Auth    |
//! |-----------------------|----------------------|---------|
//! | `/notes`, `/notes/:id` | [`routes::notes`]   | Bearer  |
//! | `/auth/token*`        | [`routes::auth`]     | none    |
//! | `/schema`, `/docs`    | [`openapi`]          | none    |
//! | `/healthz`, `/health/*` | this module        | none    |
//! | `/metrics`            | this module          | none    |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware (notes only) → Handler
//! ```

pub mod access;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Router};
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::middleware::metrics::ApiMetrics;
use crate::state::AppState;

/// Request bodies above this size are rejected before deserialization.
const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Assemble the full application router.
///
/// Only `/notes` sits behind the auth middleware. Token endpoints, docs,
/// health probes, and `/metrics` are public.
pub fn app(state: AppState) -> Router {
    let metrics_on = state.config.metrics_enabled;

    let notes = routes::notes::router()
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(from_fn(auth::auth_middleware))
        .layer(Extension(state.tokens.clone()));

    let mut router = Router::new()
        .merge(notes)
        .merge(routes::auth::router())
        .merge(openapi::router())
        .route("/healthz", get(readiness))
        .route("/health/readiness", get(readiness))
        .route("/health/liveness", get(liveness))
        .fallback(not_found);

    if metrics_on {
        let metrics = ApiMetrics::new();
        router = router
            .route("/metrics", get(prometheus_metrics))
            .layer(from_fn(middleware::metrics::metrics_middleware))
            .layer(Extension(metrics));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// GET /metrics: Prometheus scrape endpoint.
///
/// Refreshes store gauges from `AppState`, then encodes the registry.
async fn prometheus_metrics(
    State(state): State<AppState>,
    Extension(metrics): Extension<ApiMetrics>,
) -> impl IntoResponse {
    metrics.notes_stored_total().set(state.notes.len() as f64);
    metrics
        .jwt_secret_ephemeral()
        .set(if state.config.jwt_secret_ephemeral { 1.0 } else { 0.0 });

    match metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode Prometheus metrics: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}

/// Unmatched paths get the same envelope as a missing note.
async fn not_found() -> AppError {
    AppError::NotFound
}

/// Liveness probe. 200 while the process runs.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe. 200 "ready" when the note store is reachable, 503 with
/// a diagnostic otherwise.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = db::ping(pool).await {
            tracing::warn!("database health check failed: {e}");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }

    (StatusCode::OK, "ready").into_response()
}

//! HTTP API for the storefront order core.
//!
//! Exposes order placement, order retrieval and a minimal catalog surface
//! over axum, with structured logging (tracing) and Prometheus metrics.
//! Responses use the service envelope: `{"ok": true, "data": ...}` on
//! success, `{"ok": false, "error": ...}` on failure.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use metrics_exporter_prometheus::PrometheusHandle;
use orders::{OrderCoordinator, OrderQueries};
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create::<S>))
        .route("/orders", get(routes::orders::list::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}", patch(routes::orders::edit::<S>))
        .route(
            "/users/{user_id}/orders",
            get(routes::orders::list_by_user::<S>),
        )
        .route("/products", post(routes::products::create::<S>))
        .route("/products", get(routes::products::list::<S>))
        .route("/products/{id}", get(routes::products::get::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the shared application state over the given store.
pub fn create_state<S: Store + Clone>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState {
        coordinator: OrderCoordinator::new(store.clone()),
        queries: OrderQueries::new(store.clone()),
        store,
    })
}

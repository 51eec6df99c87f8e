//! HTTP API server with observability for the order and inventory engine.
//!
//! Provides REST endpoints for the catalog, carts, orders and requests,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod identity;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::{
    InMemoryCart, LogNotifier, Notifier, OrderService, PricingConfig, RequestService, Store,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub orders: OrderService<S>,
    pub requests: RequestService<S>,
    pub carts: InMemoryCart,
    pub notifier: Arc<dyn Notifier>,
}

impl<S: Store> AppState<S> {
    /// Returns the store shared by both services.
    pub fn store(&self) -> &S {
        self.orders.store()
    }
}

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
        .route("/catalog/items", post(routes::catalog::upsert::<S>))
        .route("/catalog/items/{id}", get(routes::catalog::get::<S>))
        .route(
            "/cart",
            get(routes::cart::get::<S>).delete(routes::cart::clear::<S>),
        )
        .route("/cart/items", post(routes::cart::add_item::<S>))
        .route(
            "/orders",
            post(routes::orders::checkout::<S>).get(routes::orders::list::<S>),
        )
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route("/orders/{id}/summary", get(routes::orders::summary::<S>))
        .route("/orders/{id}/events", get(routes::orders::events::<S>))
        .route("/orders/{id}/decision", post(routes::orders::decide::<S>))
        .route(
            "/orders/{id}/fulfillment",
            post(routes::orders::update_fulfillment::<S>),
        )
        .route(
            "/orders/{id}/payment",
            post(routes::orders::update_payment::<S>),
        )
        .route(
            "/requests",
            post(routes::requests::create::<S>).get(routes::requests::list::<S>),
        )
        .route(
            "/requests/{id}",
            get(routes::requests::get::<S>).delete(routes::requests::delete::<S>),
        )
        .route(
            "/requests/{id}/decision",
            post(routes::requests::decide::<S>),
        )
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

/// Creates the application state with in-memory carts and log delivery of
/// order summaries.
pub fn create_default_state<S: Store + Clone + 'static>(
    store: S,
    pricing: PricingConfig,
) -> Arc<AppState<S>> {
    create_state(store, pricing, Arc::new(LogNotifier))
}

/// Creates the application state with the given summary notifier.
pub fn create_state<S: Store + Clone + 'static>(
    store: S,
    pricing: PricingConfig,
    notifier: Arc<dyn Notifier>,
) -> Arc<AppState<S>> {
    Arc::new(AppState {
        orders: OrderService::with_pricing(store.clone(), pricing),
        requests: RequestService::new(store),
        carts: InMemoryCart::new(),
        notifier,
    })
}

//! Router assembly for the envlease HTTP API.
//!
//! [`build_router`] wires all handler functions to their routes with
//! CORS and tracing middleware layers.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Builds the complete axum router with all API routes.
///
/// Routes use axum 0.8 `/{param}` path syntax. Caller identity comes from
/// the `X-User-Id` header.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Resource management
        .route(
            "/resources",
            get(handlers::resources::list_resources).post(handlers::resources::create_resource),
        )
        .route(
            "/resources/{name}",
            get(handlers::resources::describe_resource)
                .delete(handlers::resources::delete_resource),
        )
        .route(
            "/resources/{name}/status",
            get(handlers::resources::resource_status),
        )
        // Leases
        .route(
            "/resources/{name}/reserve",
            post(handlers::leases::reserve),
        )
        .route(
            "/resources/{name}/release",
            post(handlers::leases::release),
        )
        // Watches
        .route("/resources/{name}/watch", post(handlers::leases::watch))
        .route(
            "/resources/{name}/unwatch",
            post(handlers::leases::unwatch),
        )
        // Audit history
        .route(
            "/logs/reservations",
            get(handlers::logs::reservation_log),
        )
        .route("/logs/watches", get(handlers::logs::watch_log))
        // Admin
        .route("/admin", post(handlers::admin::execute))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

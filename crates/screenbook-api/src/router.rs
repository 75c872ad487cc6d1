//! Route definitions for the Screenbook HTTP API.
//!
//! All routes are mounted under `/api`. The router receives `AppState`
//! and passes it to all handlers via Axum's `State` extractor.

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(availability_routes())
        .merge(reservation_routes())
        .merge(webhook_routes())
        .merge(admin_routes())
        .merge(health_routes());

    let cors = build_cors_layer(&state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Availability queries
fn availability_routes() -> Router<AppState> {
    Router::new().route(
        "/availability/{date}",
        get(handlers::availability::day_availability),
    )
}

/// Hold, list, release, cancel
fn reservation_routes() -> Router<AppState> {
    Router::new()
        .route("/reservations/hold", post(handlers::reservation::hold_slot))
        .route("/reservations", get(handlers::reservation::list_reservations))
        .route(
            "/reservations/{id}/release",
            post(handlers::reservation::release_slot),
        )
        .route(
            "/reservations/{id}/cancel",
            post(handlers::reservation::cancel_reservation),
        )
}

/// Payment provider callbacks
fn webhook_routes() -> Router<AppState> {
    Router::new().route("/webhooks/payment", post(handlers::webhook::payment_succeeded))
}

/// Operator endpoints
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/schedules", post(handlers::admin::publish_schedule))
        .route(
            "/admin/schedules/{date}",
            delete(handlers::admin::unpublish_schedule),
        )
        .route(
            "/admin/reservations/{id}/cancel",
            post(handlers::admin::cancel_reservation),
        )
}

/// Liveness
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

/// Build the CORS layer from configuration.
fn build_cors_layer(state: &AppState) -> CorsLayer {
    use axum::http::HeaderValue;
    use tower_http::cors::Any;

    let cors_config = &state.config.server.cors;

    let mut cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if cors_config.allowed_origins.contains(&"*".to_string()) {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = cors_config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    cors
}

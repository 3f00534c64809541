//! API layer - HTTP handlers and routing
//!
//! All endpoints live under /api/v1. Authentication endpoints are
//! public; every entity router requires a valid session.

pub mod auth;
pub mod categories;
pub mod failed_logins;
pub mod files;
pub mod middleware;
pub mod permissions;
pub mod posts;
pub mod responses;
pub mod roles;
pub mod tags;
pub mod users;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Entity routes (need a valid session)
    let protected_routes = Router::new()
        .nest("/users", users::router())
        .nest("/roles", roles::router())
        .nest("/permissions", permissions::router())
        .nest("/categories", categories::router())
        .nest("/tags", tags::router())
        .nest("/posts", posts::router())
        .nest("/failed-logins", failed_logins::router())
        .nest("/files", files::router())
        .nest("/auth", auth::protected_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ));

    Router::new()
        .nest("/auth", auth::public_router())
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let mut cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);
    if let Ok(origin) = cors_origin.parse::<HeaderValue>() {
        cors = cors.allow_origin(origin);
    }

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

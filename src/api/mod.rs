//! API layer - HTTP handlers and routing
//!
//! All endpoints live under `/api/v1`. Apart from sign-up, sign-in, the
//! email token flows and the newsletter form, every endpoint needs a
//! session; `/admin` additionally needs the admin role. Uploaded files are
//! served from `/uploads`.

pub mod admin;
pub mod articles;
pub mod auth;
pub mod courses;
pub mod dashboard;
pub mod middleware;
pub mod newsletter;
pub mod profile;
pub mod reels;
pub mod shop;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::services::storage::PUBLIC_PREFIX;

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (need admin role)
    let admin_routes = admin::routes()
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes (need a session)
    let protected_routes = Router::new()
        .merge(auth::protected_routes())
        .merge(dashboard::routes())
        .merge(articles::routes())
        .merge(courses::routes())
        .merge(reels::routes())
        .merge(shop::routes())
        .merge(profile::routes(state.upload_config.max_file_size))
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .merge(auth::public_routes())
        .merge(newsletter::routes())
        .merge(admin_routes)
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> anyhow::Result<Router> {
    // Credentialed CORS: the session cookie must reach the API
    let origin = cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin '{}'", cors_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    let uploads = ServeDir::new(state.storage.root());

    Ok(Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .nest_service(PUBLIC_PREFIX, uploads)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

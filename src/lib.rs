//! Web service starter with email/password registration, login and
//! stateless bearer-token authentication.
//!
//! Public routes (`/register`, `/login`, `/health`) are open; everything mounted in the
//! private group sits behind [`middleware::require_auth`].

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use handlers::http::AppState;
pub use services::AuthService;

use axum::routing::{get, post};
use handlers::http;
use tower_http::trace::TraceLayer;

/// Build the API router with the built-in private routes only. Used by main and by integration tests.
pub fn create_app(state: AppState) -> axum::Router {
    create_app_with_private(state, axum::Router::new())
}

/// Build the API router, mounting `private` behind the bearer-token middleware.
pub fn create_app_with_private(
    state: AppState,
    private: axum::Router<AppState>,
) -> axum::Router {
    let public_routes = axum::Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/health", get(http::health));

    let private_routes = axum::Router::new()
        .route("/me", get(handlers::me))
        .merge(private)
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    axum::Router::new()
        .merge(public_routes)
        .merge(private_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

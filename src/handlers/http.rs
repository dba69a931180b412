//! HTTP handlers: shared state and health.

use axum::{http::StatusCode, Json};
use serde_json::json;
use std::sync::Arc;

use crate::auth::TokenService;
use crate::repositories::UserStore;
use crate::services::AuthService;

/// Shared application state for HTTP handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
}

impl AppState {
    pub fn new(auth_service: AuthService) -> Self {
        Self { auth_service }
    }

    pub fn auth_service(&self) -> &AuthService {
        &self.auth_service
    }

    pub fn users(&self) -> &Arc<dyn UserStore> {
        self.auth_service.users()
    }

    pub fn tokens(&self) -> &Arc<dyn TokenService> {
        self.auth_service.tokens()
    }
}

/// GET /health — liveness probe.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "service": "authstarter" })),
    )
}

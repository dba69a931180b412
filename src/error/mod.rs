//! Application error types and their client-facing HTTP mapping.
//!
//! Lower layers raise [`HashError`], [`TokenError`] and [`StoreError`]; they are
//! folded into [`AppError`] at the service/middleware boundary. The response body
//! only ever carries a stable message; the detail goes to the server log.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::auth::{HashError, TokenError};
use crate::repositories::StoreError;

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Account already exists")]
    DuplicateIdentity,

    /// Unknown email and wrong password both end up here.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Client-visible collapse of every token failure.
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Password hashing error: {0}")]
    Hashing(#[from] HashError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateIdentity => AppError::DuplicateIdentity,
            other => AppError::Store(other),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateIdentity => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Hashing(_)
            | AppError::Token(_)
            | AppError::Store(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand to the client.
    pub fn client_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::NotFound(what) => format!("{} not found", what),
            AppError::DuplicateIdentity
            | AppError::InvalidCredentials
            | AppError::Unauthenticated => self.to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }

        let body = Json(json!({ "error": self.client_message() }));
        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

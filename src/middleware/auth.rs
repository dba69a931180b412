//! Auth middleware: bearer-token gate for the private route group.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::{TokenError, TokenService};
use crate::error::AppError;
use crate::handlers::http::AppState;

/// Identity of the caller, attached by [`require_auth`] for the lifetime of one request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

/// Middleware: reject the request with 401 unless it carries a valid bearer token.
///
/// Only the signature and expiry are checked; the user store is not consulted.
pub async fn require_auth(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or_else(|| {
        debug!(path = %request.uri().path(), "rejected request: missing or malformed Authorization header");
        AppError::Unauthenticated
    })?;

    let user_id = state
        .tokens()
        .validate(bearer.token(), Utc::now())
        .map_err(|e| {
            match e {
                TokenError::Expired => debug!(path = %request.uri().path(), "rejected request: token expired"),
                other => warn!(path = %request.uri().path(), reason = %other, "rejected request: bad token"),
            }
            AppError::Unauthenticated
        })?;

    request.extensions_mut().insert(AuthUser(user_id));
    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or(AppError::Unauthenticated)
    }
}

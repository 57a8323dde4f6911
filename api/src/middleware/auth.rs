use axum::{
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};
use common::auth::bearer_token;
use common::errors::{ApiError, AuthError};

use crate::handlers::ErrorResponse;
use crate::state::AppState;

/// Validates the bearer JWT and stores its claims in the request extensions
#[tracing::instrument(skip(state, req, next))]
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ErrorResponse> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingCredentials)
        .map_err(ApiError::from)?;

    let token = bearer_token(header).map_err(|e| {
        tracing::warn!("Invalid authorization header format");
        ApiError::from(e)
    })?;

    let claims = state.jwt.decode_token(token).map_err(|e| {
        tracing::warn!(error = %e, "Rejected bearer token");
        ApiError::from(e)
    })?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

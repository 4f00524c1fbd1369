use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::UserContext;

#[derive(Clone)]
pub struct AuthState {
    pub services: Arc<AppServices>,
}

/// Resolve the bearer token to a fresh `UserContext` or reject with 401.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())?;

    let user_id = state.services.tokens.validate(token, Utc::now()).map_err(|e| {
        tracing::debug!(error = %e, "rejected bearer token");
        ApiError::from(e)
    })?;

    // Fresh read: permission edits apply to the next request.
    let user = state
        .services
        .accounts
        .current_user(user_id)
        .await?
        .ok_or_else(|| ApiError::unauthenticated("User not found"))?;

    req.extensions_mut().insert(UserContext::new(user));

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    let not_authenticated = || ApiError::unauthenticated("Not authenticated");

    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(not_authenticated)?;

    let header = header.to_str().map_err(|_| not_authenticated())?;

    let header = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .ok_or_else(not_authenticated)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(not_authenticated());
    }

    Ok(token)
}

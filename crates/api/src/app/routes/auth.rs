use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    routing::{get, post},
};
use chrono::Utc;

use outpost_auth::{NewUser, PasswordChange, PublicUser, Registration};

use crate::app::dto::{LoginRequest, MessageResponse, TokenResponse};
use crate::app::errors::ApiError;
use crate::app::extract::ApiJson;
use crate::app::services::AppServices;
use crate::context::UserContext;

/// Sign-up and login; no token required.
pub fn public_router() -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn router() -> Router {
    Router::new()
        .route("/auth/me", get(me))
        .route("/auth/change-password", post(change_password))
}

/// Self-service sign-up. Privilege fields in the body are ignored.
pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<Registration>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = services.accounts.register(NewUser::from(body)).await?;
    Ok(Json(user))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = services
        .accounts
        .authenticate(&body.username, &body.password)
        .await?;
    let token = services.tokens.issue(user.id, Utc::now()).map_err(|e| {
        tracing::error!(error = %e, "token signing failed");
        ApiError::Internal
    })?;
    tracing::info!(user_id = %user.id, "login");
    Ok(Json(TokenResponse::bearer(token, user.to_public())))
}

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = services
        .accounts
        .get(ctx.user_id())
        .await?
        .ok_or_else(|| ApiError::not_found("user"))?;
    Ok(Json(user))
}

pub async fn change_password(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
    ApiJson(body): ApiJson<PasswordChange>,
) -> Result<Json<MessageResponse>, ApiError> {
    services.accounts.change_password(ctx.user_id(), body).await?;
    Ok(Json(MessageResponse::new("Password changed successfully")))
}

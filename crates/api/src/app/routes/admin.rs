use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    routing::{get, put},
};

use outpost_auth::{Access, NewUser, PublicUser, UserUpdate};
use outpost_core::UserId;

use crate::app::dto::MessageResponse;
use crate::app::errors::ApiError;
use crate::app::extract::{ApiJson, parse_id};
use crate::app::routes::common::deleted;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::UserContext;

pub fn router() -> Router {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", put(update_user).delete(delete_user))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    authz::require(&ctx, Access::Admin)?;
    Ok(Json(services.accounts.list().await?))
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
    ApiJson(body): ApiJson<NewUser>,
) -> Result<Json<PublicUser>, ApiError> {
    authz::require(&ctx, Access::Admin)?;
    Ok(Json(services.accounts.register(body).await?))
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UserUpdate>,
) -> Result<Json<PublicUser>, ApiError> {
    authz::require(&ctx, Access::Admin)?;
    let user_id: UserId = parse_id(&id)?;
    Ok(Json(services.accounts.update(user_id, body).await?))
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    authz::require(&ctx, Access::Admin)?;
    let user_id: UserId = parse_id(&id)?;
    if !services.accounts.delete(user_id).await? {
        return Err(ApiError::not_found("user"));
    }
    Ok(deleted("User"))
}

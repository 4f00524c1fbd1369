use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    routing::{get, put},
};
use chrono::Utc;

use outpost_auth::{Access, Permission};
use outpost_board::{NewRoute, RoutePatch, TrainRoute};
use outpost_core::RouteId;
use outpost_infra::{LIST_LIMIT, ListOrder};

use crate::app::dto::MessageResponse;
use crate::app::errors::ApiError;
use crate::app::extract::{ApiJson, parse_id};
use crate::app::routes::common::deleted;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::UserContext;

const ZUG: Access = Access::Section(Permission::Zug);

pub fn router() -> Router {
    Router::new()
        .route("/routes", get(list_routes).post(create_route))
        .route("/routes/:id", put(update_route).delete(delete_route))
}

pub async fn list_routes(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
) -> Result<Json<Vec<TrainRoute>>, ApiError> {
    authz::require(&ctx, ZUG)?;
    Ok(Json(services.stores.routes.list(ListOrder::Oldest, LIST_LIMIT).await?))
}

pub async fn create_route(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
    ApiJson(body): ApiJson<NewRoute>,
) -> Result<Json<TrainRoute>, ApiError> {
    authz::require(&ctx, ZUG)?;
    let route = body.into_route(ctx.username(), Utc::now())?;
    Ok(Json(services.stores.routes.insert(route).await?))
}

/// Merge update; a present `stops` list replaces the old one.
pub async fn update_route(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<RoutePatch>,
) -> Result<Json<TrainRoute>, ApiError> {
    authz::require(&ctx, ZUG)?;
    let route_id: RouteId = parse_id(&id)?;
    let route = services
        .stores
        .routes
        .update(route_id, Box::new(move |r: &mut TrainRoute| patch.apply(r)))
        .await?;
    Ok(Json(route))
}

pub async fn delete_route(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    authz::require(&ctx, ZUG)?;
    let route_id: RouteId = parse_id(&id)?;
    if !services.stores.routes.delete(route_id).await? {
        return Err(ApiError::not_found("route"));
    }
    Ok(deleted("Route"))
}

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    routing::{get, put},
};
use chrono::Utc;

use outpost_auth::{Access, Permission};
use outpost_board::{MapMarker, MarkerPatch, NewMarker};
use outpost_core::MarkerId;
use outpost_infra::{LIST_LIMIT, ListOrder};

use crate::app::dto::MessageResponse;
use crate::app::errors::ApiError;
use crate::app::extract::{ApiJson, parse_id};
use crate::app::routes::common::deleted;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::UserContext;

const MAP: Access = Access::Section(Permission::Map);

pub fn router() -> Router {
    Router::new()
        .route("/markers", get(list_markers).post(create_marker))
        .route("/markers/:id", put(update_marker).delete(delete_marker))
}

pub async fn list_markers(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
) -> Result<Json<Vec<MapMarker>>, ApiError> {
    authz::require(&ctx, MAP)?;
    let markers = services.stores.markers.list(ListOrder::Oldest, LIST_LIMIT).await?;
    Ok(Json(markers))
}

pub async fn create_marker(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
    ApiJson(body): ApiJson<NewMarker>,
) -> Result<Json<MapMarker>, ApiError> {
    authz::require(&ctx, MAP)?;
    let marker = body.into_marker(ctx.username(), Utc::now())?;
    Ok(Json(services.stores.markers.insert(marker).await?))
}

pub async fn update_marker(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<MarkerPatch>,
) -> Result<Json<MapMarker>, ApiError> {
    authz::require(&ctx, MAP)?;
    let marker_id: MarkerId = parse_id(&id)?;
    let marker = services
        .stores
        .markers
        .update(marker_id, Box::new(move |m: &mut MapMarker| patch.apply(m)))
        .await?;
    Ok(Json(marker))
}

pub async fn delete_marker(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    authz::require(&ctx, MAP)?;
    let marker_id: MarkerId = parse_id(&id)?;
    if !services.stores.markers.delete(marker_id).await? {
        return Err(ApiError::not_found("marker"));
    }
    Ok(deleted("Marker"))
}

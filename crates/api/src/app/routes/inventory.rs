use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    routing::{get, post, put},
};
use chrono::Utc;

use outpost_auth::{Access, Permission};
use outpost_core::ItemId;
use outpost_infra::{LIST_LIMIT, ListOrder};
use outpost_inventory::{InventoryItem, ItemPatch, NewItem};

use crate::app::dto::{MessageResponse, StockRequest, StockResponse};
use crate::app::errors::ApiError;
use crate::app::extract::{ApiJson, parse_id};
use crate::app::routes::common::deleted;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::UserContext;

const HUNTER: Access = Access::Section(Permission::Hunter);

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/stock", post(adjust_stock))
        .route("/:id", put(update_item).delete(delete_item))
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
) -> Result<Json<Vec<InventoryItem>>, ApiError> {
    authz::require(&ctx, HUNTER)?;
    let items = services.stores.items.list(ListOrder::Oldest, LIST_LIMIT).await?;
    Ok(Json(items))
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
    ApiJson(body): ApiJson<NewItem>,
) -> Result<Json<InventoryItem>, ApiError> {
    authz::require(&ctx, HUNTER)?;
    let item = body.into_item(Utc::now())?;
    let item = services.stores.items.insert(item).await?;
    Ok(Json(item))
}

/// Direct field edit. A `stock` set here bypasses the ledger and writes no
/// protocol entry.
pub async fn update_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<ItemPatch>,
) -> Result<Json<InventoryItem>, ApiError> {
    authz::require(&ctx, HUNTER)?;
    let item_id: ItemId = parse_id(&id)?;
    if patch.stock.is_some() {
        tracing::info!(%item_id, user = ctx.username(), "stock set directly, outside the ledger");
    }
    let item = services
        .stores
        .items
        .update(item_id, Box::new(move |item: &mut InventoryItem| patch.apply(item)))
        .await?;
    Ok(Json(item))
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    authz::require(&ctx, HUNTER)?;
    let item_id: ItemId = parse_id(&id)?;
    if !services.stores.items.delete(item_id).await? {
        return Err(ApiError::not_found("item"));
    }
    Ok(deleted("Item"))
}

pub async fn adjust_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
    ApiJson(body): ApiJson<StockRequest>,
) -> Result<Json<StockResponse>, ApiError> {
    authz::require(&ctx, HUNTER)?;
    let change = services
        .ledger
        .adjust_stock(body.item_id, body.quantity, body.is_personal_use, ctx.user())
        .await?;
    Ok(Json(StockResponse {
        message: "Stock updated successfully",
        new_stock: change.new_stock(),
    }))
}

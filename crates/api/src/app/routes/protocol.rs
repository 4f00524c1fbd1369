use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    routing::{delete, get},
};

use outpost_auth::{Access, Permission};
use outpost_core::LogEntryId;
use outpost_infra::{LIST_LIMIT, ListOrder};
use outpost_inventory::ProtocolLogEntry;

use crate::app::dto::MessageResponse;
use crate::app::errors::ApiError;
use crate::app::extract::parse_id;
use crate::app::routes::common::deleted;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::UserContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_entries))
        .route("/:id", delete(delete_entry))
}

/// Newest entries first, capped at the listing limit.
pub async fn list_entries(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
) -> Result<Json<Vec<ProtocolLogEntry>>, ApiError> {
    authz::require(&ctx, Access::Section(Permission::Hunter))?;
    let entries = services
        .stores
        .protocol
        .list(ListOrder::Newest, LIST_LIMIT)
        .await?;
    Ok(Json(entries))
}

pub async fn delete_entry(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    authz::require(&ctx, Access::Admin)?;
    let entry_id: LogEntryId = parse_id(&id)?;
    if !services.stores.protocol.delete(entry_id).await? {
        return Err(ApiError::not_found("log entry"));
    }
    tracing::info!(%entry_id, admin = ctx.username(), "protocol entry deleted");
    Ok(deleted("Log entry"))
}

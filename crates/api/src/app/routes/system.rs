use std::sync::Arc;

use axum::{Json, extract::Extension};

use outpost_auth::CurrentUser;

use crate::app::dto::HealthResponse;
use crate::app::services::AppServices;
use crate::context::UserContext;

pub async fn health(Extension(services): Extension<Arc<AppServices>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        storage: services.storage_kind(),
    })
}

/// The caller as the auth middleware resolved it for this request.
pub async fn whoami(Extension(ctx): Extension<UserContext>) -> Json<CurrentUser> {
    Json(ctx.user().clone())
}

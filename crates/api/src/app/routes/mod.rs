use axum::{Router, routing::get};

pub mod admin;
pub mod auth;
pub mod common;
pub mod inventory;
pub mod map;
pub mod protocol;
pub mod system;
pub mod zug;

/// Routes reachable without a token.
pub fn public_router() -> Router {
    auth::public_router()
}

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .merge(auth::router())
        .nest("/admin", admin::router())
        .nest("/inventory", inventory::router())
        .nest("/protocol", protocol::router())
        .nest("/map", map::router())
        .nest("/zug", zug::router())
}

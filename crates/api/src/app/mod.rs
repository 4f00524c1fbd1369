//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: stores, account/ledger services and the token service
//! - `routes/`: HTTP routes + handlers (one file per section)
//! - `dto.rs`: request/response shapes that are not domain types
//! - `errors.rs`: `{"detail": ...}` error responses
//! - `extract.rs`: JSON and path-id extraction with 400 rejections

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use outpost_infra::{AccountError, AppConfig, CorsOrigins, Stores};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod extract;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Seeds the bootstrap admin when one is configured.
pub async fn build_app(config: &AppConfig, stores: Stores) -> Result<Router, AccountError> {
    let services = Arc::new(services::AppServices::new(config, stores));

    if let Some(admin) = &config.bootstrap_admin {
        if services.accounts.ensure_admin(admin).await? {
            tracing::info!(username = %admin.username, "bootstrap admin created");
        }
    }

    let auth_state = middleware::AuthState {
        services: services.clone(),
    };

    // Protected routes: bearer token + fresh user read.
    let protected = routes::router().route_layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));
    let api = routes::public_router().merge(protected);

    let root = Router::new().route("/health", get(routes::system::health));
    let root = if config.api_prefix.is_empty() {
        root.merge(api)
    } else {
        root.nest(&config.api_prefix, api)
    };

    Ok(root.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(&config.cors_origins))
            .layer(Extension(services)),
    ))
}

fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match origins {
        CorsOrigins::Any => layer.allow_origin(Any),
        CorsOrigins::List(list) => {
            let values: Vec<HeaderValue> = list
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(v) => Some(v),
                    Err(_) => {
                        tracing::warn!(%origin, "ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            layer.allow_origin(AllowOrigin::list(values))
        }
    }
}

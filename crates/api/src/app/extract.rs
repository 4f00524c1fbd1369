//! Request extractors with API-shaped rejections.

use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::Json;

use outpost_core::Identifier;

use crate::app::errors::ApiError;

/// `Json<T>` whose rejections (bad syntax, wrong shape, unknown permission
/// tag, missing content type) become 400 `{"detail": ...}` responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
        }
    }
}

/// Parse a path segment into a typed id; malformed ids are 400.
pub fn parse_id<I: Identifier>(raw: &str) -> Result<I, ApiError> {
    raw.parse::<I>().map_err(ApiError::from)
}

//! API-side authorization guard.
//!
//! Every section handler calls [`require`] exactly once, before touching a
//! store.

use outpost_auth::{Access, authorize};

use crate::app::errors::ApiError;
use crate::context::UserContext;

/// Check the caller against `access`, logging denials.
pub fn require(ctx: &UserContext, access: Access) -> Result<(), ApiError> {
    authorize(ctx.user(), access).map_err(|e| {
        tracing::warn!(
            user_id = %ctx.user_id(),
            username = ctx.username(),
            ?access,
            reason = %e,
            "access denied"
        );
        ApiError::from(e)
    })
}

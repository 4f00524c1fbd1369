//! Error responses.
//!
//! Every failure leaves the API as `{"detail": "<message>"}` with the status
//! chosen here. Store and commit failures are logged and reported as 500s
//! without internals.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use outpost_auth::{AuthzError, TokenError};
use outpost_core::DomainError;
use outpost_infra::{AccountError, StoreError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthenticated(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Insufficient stock")]
    InsufficientStock,

    #[error("Incorrect old password")]
    IncorrectPassword,

    #[error("{0}")]
    Validation(String),

    #[error("Stock update could not be committed")]
    LedgerCommitFailed,

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated(_) | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_)
            | Self::InsufficientStock
            | Self::IncorrectPassword
            | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::LedgerCommitFailed | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    /// `NotFound` with the conventional "<Kind> not found" detail.
    pub fn not_found(kind: &str) -> Self {
        Self::NotFound(format!("{} not found", capitalize(kind)))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        json_error(self.status(), self.to_string())
    }
}

pub fn json_error(status: StatusCode, detail: impl Into<String>) -> Response {
    (status, axum::Json(json!({ "detail": detail.into() }))).into_response()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversions from lower layers
// ─────────────────────────────────────────────────────────────────────────────

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => Self::Validation(msg),
            DomainError::NotFound(kind) => Self::not_found(kind),
            DomainError::Conflict(msg) => Self::Conflict(msg),
            DomainError::InsufficientStock { .. } => Self::InsufficientStock,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(kind) => Self::not_found(kind),
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::Domain(e) => e.into(),
            StoreError::CommitFailed(msg) => {
                tracing::error!(error = %msg, "ledger commit failed");
                Self::LedgerCommitFailed
            }
            StoreError::Backend(msg) => {
                tracing::error!(error = %msg, "store failure");
                Self::Internal
            }
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::UsernameTaken => Self::Conflict("Username already exists".to_string()),
            AccountError::InvalidCredentials => Self::InvalidCredentials,
            AccountError::IncorrectPassword => Self::IncorrectPassword,
            AccountError::Domain(e) => e.into(),
            AccountError::Store(e) => e.into(),
            other @ (AccountError::Password(_) | AccountError::Task(_)) => {
                tracing::error!(error = %other, "account operation failed");
                Self::Internal
            }
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::MissingPermission(p) => {
                Self::Forbidden(format!("No permission for {} section", p.section()))
            }
            AuthzError::AdminRequired => Self::Forbidden("Admin access required".to_string()),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => Self::unauthenticated("Token expired"),
            TokenError::Malformed(_) | TokenError::Signing(_) => {
                Self::unauthenticated("Invalid token")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outpost_auth::Permission;

    #[test]
    fn statuses_follow_the_error_kind() {
        assert_eq!(ApiError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::InsufficientStock.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::IncorrectPassword.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::LedgerCommitFailed.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ApiError::from(AccountError::UsernameTaken).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn not_found_details_name_the_record() {
        assert_eq!(ApiError::from(StoreError::NotFound("item")).to_string(), "Item not found");
        assert_eq!(
            ApiError::from(StoreError::NotFound("log entry")).to_string(),
            "Log entry not found"
        );
    }

    #[test]
    fn permission_denials_name_the_section() {
        let err = ApiError::from(AuthzError::MissingPermission(Permission::Hunter));
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "No permission for Hunter section");
    }

    #[test]
    fn domain_rejections_inside_store_errors_keep_their_meaning() {
        let err = ApiError::from(StoreError::Domain(DomainError::InsufficientStock {
            available: 1,
            requested: -2,
        }));
        assert!(matches!(err, ApiError::InsufficientStock));
    }

    #[test]
    fn backend_failures_hide_details() {
        let err = ApiError::from(StoreError::backend("connection refused on 10.0.0.3"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Internal server error");
    }
}
